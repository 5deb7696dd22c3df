//! Three-slot rotating loadout.

use ember_core::SkillId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SkillCategory, SkillDefinition};

/// Skills stored per slot.
pub const SLOT_SET_SIZE: usize = 3;

// ---------------------------------------------------------------------------
// LoadoutSlot
// ---------------------------------------------------------------------------

/// One of the three castable slots. Each accepts exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadoutSlot {
    Utility,
    Combat,
    Ultimate,
}

impl LoadoutSlot {
    pub const ALL: [LoadoutSlot; 3] = [
        LoadoutSlot::Utility,
        LoadoutSlot::Combat,
        LoadoutSlot::Ultimate,
    ];

    /// Category a skill must have to be equipped here.
    pub fn category(self) -> SkillCategory {
        match self {
            LoadoutSlot::Utility => SkillCategory::Utility,
            LoadoutSlot::Combat => SkillCategory::Combat,
            LoadoutSlot::Ultimate => SkillCategory::Ultimate,
        }
    }

    /// The slot that holds skills of `category`.
    pub fn for_category(category: SkillCategory) -> Self {
        match category {
            SkillCategory::Utility => LoadoutSlot::Utility,
            SkillCategory::Combat => LoadoutSlot::Combat,
            SkillCategory::Ultimate => LoadoutSlot::Ultimate,
        }
    }

    fn index(self) -> usize {
        match self {
            LoadoutSlot::Utility => 0,
            LoadoutSlot::Combat => 1,
            LoadoutSlot::Ultimate => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected loadout mutation. Nothing is changed when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LoadoutError {
    #[error("{skill} is a {category:?} skill and cannot go in the {slot:?} slot")]
    CategoryMismatch {
        skill: SkillId,
        slot: LoadoutSlot,
        category: SkillCategory,
    },

    #[error("{0} is passive and cannot be equipped")]
    PassiveSkill(SkillId),

    #[error("active index {0} out of range")]
    IndexOutOfRange(u8),

    #[error("unknown skill {0}")]
    UnknownSkill(SkillId),
}

// ---------------------------------------------------------------------------
// SlotSet / Loadout
// ---------------------------------------------------------------------------

/// Three stored skills plus the index of the castable one.
///
/// Invariant: only `set[active_index]` is executable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSet {
    pub set: [Option<SkillId>; SLOT_SET_SIZE],
    pub active_index: u8,
}

impl SlotSet {
    /// The castable skill, if one is stored at the active index.
    pub fn active(&self) -> Option<SkillId> {
        self.set.get(self.active_index as usize).copied().flatten()
    }

    pub fn contains(&self, skill: SkillId) -> bool {
        self.set.contains(&Some(skill))
    }
}

/// The full three-slot loadout of one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    slots: [SlotSet; 3],
}

impl Loadout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, slot: LoadoutSlot) -> &SlotSet {
        &self.slots[slot.index()]
    }

    /// Castable skill of `slot`.
    pub fn active(&self, slot: LoadoutSlot) -> Option<SkillId> {
        self.slot(slot).active()
    }

    /// Writes `def` into the active position of `slot`.
    ///
    /// Returns the skill it replaced. Ownership of the entity is checked by
    /// the caller; this only enforces category and passivity.
    pub fn equip(
        &mut self,
        slot: LoadoutSlot,
        def: &SkillDefinition,
    ) -> Result<Option<SkillId>, LoadoutError> {
        if def.passive {
            return Err(LoadoutError::PassiveSkill(def.id));
        }
        if def.category != slot.category() {
            return Err(LoadoutError::CategoryMismatch {
                skill: def.id,
                slot,
                category: def.category,
            });
        }
        let set = &mut self.slots[slot.index()];
        let index = set.active_index as usize;
        Ok(set.set[index].replace(def.id))
    }

    /// Selects which stored skill of `slot` is castable.
    pub fn rotate(&mut self, slot: LoadoutSlot, index: u8) -> Result<(), LoadoutError> {
        if index as usize >= SLOT_SET_SIZE {
            return Err(LoadoutError::IndexOutOfRange(index));
        }
        self.slots[slot.index()].active_index = index;
        Ok(())
    }

    /// The slot where `skill` is currently castable, if any.
    pub fn slot_of_active(&self, skill: SkillId) -> Option<LoadoutSlot> {
        LoadoutSlot::ALL
            .into_iter()
            .find(|slot| self.active(*slot) == Some(skill))
    }

    /// Rebuilds a loadout from persisted sets, dropping entries `keep` rejects
    /// and clamping bad indices to 0.
    pub(crate) fn sanitized(&self, keep: impl Fn(LoadoutSlot, SkillId) -> bool) -> Self {
        let mut out = Loadout::default();
        for slot in LoadoutSlot::ALL {
            let source = self.slot(slot);
            let target = &mut out.slots[slot.index()];
            for (i, entry) in source.set.iter().enumerate() {
                target.set[i] = entry.filter(|skill| keep(slot, *skill));
            }
            target.active_index = if (source.active_index as usize) < SLOT_SET_SIZE {
                source.active_index
            } else {
                0
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::sample_definition;

    #[test]
    fn test_equip_writes_active_index() {
        let def = sample_definition();
        let mut loadout = Loadout::new();
        loadout.rotate(LoadoutSlot::Combat, 2).unwrap();
        assert_eq!(loadout.equip(LoadoutSlot::Combat, &def), Ok(None));
        assert_eq!(loadout.slot(LoadoutSlot::Combat).set, [None, None, Some(def.id)]);
        assert_eq!(loadout.active(LoadoutSlot::Combat), Some(def.id));
    }

    #[test]
    fn test_only_active_index_is_castable() {
        let def = sample_definition();
        let mut loadout = Loadout::new();
        loadout.equip(LoadoutSlot::Combat, &def).unwrap();
        loadout.rotate(LoadoutSlot::Combat, 1).unwrap();
        assert_eq!(loadout.active(LoadoutSlot::Combat), None);
        assert!(loadout.slot(LoadoutSlot::Combat).contains(def.id));
        assert_eq!(loadout.slot_of_active(def.id), None);

        loadout.rotate(LoadoutSlot::Combat, 0).unwrap();
        assert_eq!(loadout.slot_of_active(def.id), Some(LoadoutSlot::Combat));
    }

    #[test]
    fn test_equip_rejects_wrong_category() {
        let def = sample_definition();
        let mut loadout = Loadout::new();
        let err = loadout.equip(LoadoutSlot::Ultimate, &def).unwrap_err();
        assert_eq!(
            err,
            LoadoutError::CategoryMismatch {
                skill: def.id,
                slot: LoadoutSlot::Ultimate,
                category: SkillCategory::Combat,
            }
        );
        assert_eq!(loadout, Loadout::new());
    }

    #[test]
    fn test_equip_rejects_passive() {
        let mut def = sample_definition();
        def.passive = true;
        let mut loadout = Loadout::new();
        assert_eq!(
            loadout.equip(LoadoutSlot::Combat, &def),
            Err(LoadoutError::PassiveSkill(def.id))
        );
    }

    #[test]
    fn test_rotate_rejects_out_of_range() {
        let mut loadout = Loadout::new();
        assert_eq!(
            loadout.rotate(LoadoutSlot::Utility, 3),
            Err(LoadoutError::IndexOutOfRange(3))
        );
        assert_eq!(loadout.slot(LoadoutSlot::Utility).active_index, 0);
    }

    #[test]
    fn test_equip_replaces_previous() {
        let def = sample_definition();
        let mut other = sample_definition();
        other.id = SkillId(42);
        let mut loadout = Loadout::new();
        loadout.equip(LoadoutSlot::Combat, &def).unwrap();
        assert_eq!(loadout.equip(LoadoutSlot::Combat, &other), Ok(Some(def.id)));
    }
}
