//! Per-entity skill state as an ECS component.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;
use ember_core::SkillId;

use crate::{
    Loadout, LoadoutError, LoadoutSlot, SkillCatalog, SkillDefinition, SkillInstance,
};

/// Every skill an entity knows plus its loadout.
///
/// Instances are created lazily the first time a skill is equipped (or
/// learned) and are never removed while the entity exists.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SkillBook {
    instances: BTreeMap<SkillId, SkillInstance>,
    loadout: Loadout,
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        instances: BTreeMap<SkillId, SkillInstance>,
        loadout: Loadout,
    ) -> Self {
        Self { instances, loadout }
    }

    /// The instance of `def`, created at level 1 if the entity did not know it.
    pub fn get_or_create_instance(&mut self, def: &SkillDefinition) -> &mut SkillInstance {
        self.instances
            .entry(def.id)
            .or_insert_with(|| SkillInstance::new(def.id))
    }

    /// Marks a skill (typically a passive) as known without equipping it.
    pub fn learn(&mut self, def: &SkillDefinition) {
        self.get_or_create_instance(def);
    }

    pub fn instance(&self, skill: SkillId) -> Option<&SkillInstance> {
        self.instances.get(&skill)
    }

    pub fn instance_mut(&mut self, skill: SkillId) -> Option<&mut SkillInstance> {
        self.instances.get_mut(&skill)
    }

    /// Overwrites the local copy with one received from the host.
    pub fn replace_instance(&mut self, instance: SkillInstance) {
        self.instances.insert(instance.skill_id(), instance);
    }

    pub fn knows(&self, skill: SkillId) -> bool {
        self.instances.contains_key(&skill)
    }

    /// Known instances in id order.
    pub fn instances(&self) -> impl Iterator<Item = &SkillInstance> {
        self.instances.values()
    }

    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    /// Overwrites the loadout with one received from the host.
    pub fn replace_loadout(&mut self, loadout: Loadout) {
        self.loadout = loadout;
    }

    /// Castable skill of `slot`.
    pub fn active_skill(&self, slot: LoadoutSlot) -> Option<SkillId> {
        self.loadout.active(slot)
    }

    /// Equips `skill` into the active position of `slot`, creating its
    /// instance on first equip.
    pub fn equip(
        &mut self,
        catalog: &SkillCatalog,
        slot: LoadoutSlot,
        skill: SkillId,
    ) -> Result<Option<SkillId>, LoadoutError> {
        let def = catalog
            .get(skill)
            .ok_or(LoadoutError::UnknownSkill(skill))?;
        let replaced = self.loadout.equip(slot, def)?;
        self.get_or_create_instance(def);
        Ok(replaced)
    }

    /// Selects the castable index of `slot`.
    pub fn rotate(&mut self, slot: LoadoutSlot, index: u8) -> Result<(), LoadoutError> {
        self.loadout.rotate(slot, index)
    }
}
