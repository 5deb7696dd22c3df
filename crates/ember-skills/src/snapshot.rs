//! Persistence boundary: skill progress and loadout, never cooldowns.

use std::collections::BTreeMap;

use ember_core::SkillId;
use serde::{Deserialize, Serialize};

use crate::{Loadout, SkillBook, SkillCatalog, SkillInstance};

/// Saved progress of one skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProgress {
    pub level: u32,
    pub xp: u32,
}

/// Serializable form of a [`SkillBook`] for an external save/load layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSnapshot {
    pub progress: BTreeMap<SkillId, SkillProgress>,
    pub loadout: Loadout,
}

impl SkillSnapshot {
    /// Captures level and XP of every known skill plus the loadout.
    pub fn capture(book: &SkillBook) -> Self {
        Self {
            progress: book
                .instances()
                .map(|inst| {
                    (
                        inst.skill_id(),
                        SkillProgress {
                            level: inst.level(),
                            xp: inst.xp(),
                        },
                    )
                })
                .collect(),
            loadout: *book.loadout(),
        }
    }

    /// Rebuilds a book against `catalog`.
    ///
    /// Unknown skills are dropped, levels are clamped to the current
    /// definitions, equipped entries that no longer fit their slot are
    /// cleared, and every cooldown starts ready.
    pub fn restore(&self, catalog: &SkillCatalog) -> SkillBook {
        let mut instances = BTreeMap::new();
        for (id, progress) in &self.progress {
            match catalog.get(*id) {
                Some(def) => {
                    instances.insert(
                        *id,
                        SkillInstance::with_progress(def, progress.level, progress.xp),
                    );
                }
                None => tracing::warn!(skill = %id, "dropping saved progress for unknown skill"),
            }
        }

        let loadout = self.loadout.sanitized(|slot, skill| {
            catalog
                .get(skill)
                .is_some_and(|def| !def.passive && def.category == slot.category())
        });
        // Equipped skills always have an instance.
        for slot in crate::LoadoutSlot::ALL {
            for skill in loadout.slot(slot).set.iter().flatten() {
                if let Some(def) = catalog.get(*skill) {
                    instances
                        .entry(*skill)
                        .or_insert_with(|| SkillInstance::new(def.id));
                }
            }
        }

        SkillBook::from_parts(instances, loadout)
    }
}

#[cfg(test)]
mod tests {
    use ember_core::GameTime;

    use super::*;
    use crate::LoadoutSlot;

    #[test]
    fn test_snapshot_excludes_cooldowns() {
        let catalog = SkillCatalog::builtin().unwrap();
        let cleave = catalog.get(SkillId(1)).unwrap();
        let mut book = SkillBook::new();
        book.equip(&catalog, LoadoutSlot::Combat, SkillId(1)).unwrap();
        let inst = book.get_or_create_instance(cleave);
        inst.add_experience(cleave, 130);
        inst.mark_activated(GameTime::from_secs(3));

        let json = serde_json::to_string(&SkillSnapshot::capture(&book)).unwrap();
        assert!(!json.contains("last_activation"));

        let snapshot: SkillSnapshot = serde_json::from_str(&json).unwrap();
        let restored = snapshot.restore(&catalog);
        let inst = restored.instance(SkillId(1)).unwrap();
        assert_eq!(inst.level(), 2);
        assert_eq!(inst.xp(), 30);
        assert_eq!(inst.last_activation(), None);
        assert_eq!(restored.active_skill(LoadoutSlot::Combat), Some(SkillId(1)));
    }

    #[test]
    fn test_restore_drops_unknown_and_clamps() {
        let catalog = SkillCatalog::builtin().unwrap();
        let mut snapshot = SkillSnapshot::default();
        snapshot
            .progress
            .insert(SkillId(1), SkillProgress { level: 40, xp: 0 });
        snapshot
            .progress
            .insert(SkillId(999), SkillProgress { level: 2, xp: 5 });

        let book = snapshot.restore(&catalog);
        assert_eq!(book.instance(SkillId(1)).unwrap().level(), 3);
        assert!(!book.knows(SkillId(999)));
    }

    #[test]
    fn test_restore_clears_misplaced_loadout_entries() {
        let catalog = SkillCatalog::builtin().unwrap();
        let mut book = SkillBook::new();
        book.equip(&catalog, LoadoutSlot::Combat, SkillId(1)).unwrap();
        let mut snapshot = SkillSnapshot::capture(&book);
        // Forge a save that puts an unknown id in the Utility slot.
        let json = serde_json::to_string(&snapshot)
            .unwrap()
            .replacen("null", "555", 1);
        snapshot = serde_json::from_str(&json).unwrap();
        assert!(snapshot.loadout.slot(LoadoutSlot::Utility).set[0].is_some());

        let restored = snapshot.restore(&catalog);
        assert_eq!(restored.active_skill(LoadoutSlot::Utility), None);
        assert_eq!(restored.active_skill(LoadoutSlot::Combat), Some(SkillId(1)));
    }
}
