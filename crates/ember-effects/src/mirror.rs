//! Client-side presentation mirror of another session's effect tables.
//!
//! The host broadcasts an [`EffectSnapshot`] after a resolution touches an
//! entity. Clients fold it into an [`EffectMirror`] and use it for things
//! like an invulnerability shimmer. A mirror may be stale and is never an
//! input to damage.

use std::collections::BTreeMap;

use ember_core::{EntityId, GameTime};
use serde::{Deserialize, Serialize};

use crate::{EffectCategory, EffectTable};

/// One effect as seen by clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MirroredEffect {
    pub category: EffectCategory,
    pub magnitude: f32,
    pub expires_at: GameTime,
}

/// Active effects of one entity at the host instant `taken_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectSnapshot {
    pub taken_at: GameTime,
    pub effects: Vec<MirroredEffect>,
}

impl EffectSnapshot {
    /// Captures the active effects of `table`.
    pub fn capture(table: &EffectTable, now: GameTime) -> Self {
        Self {
            taken_at: now,
            effects: table
                .iter_active(now)
                .map(|effect| MirroredEffect {
                    category: effect.category,
                    magnitude: effect.magnitude,
                    expires_at: effect.expires_at,
                })
                .collect(),
        }
    }
}

/// Read-only, possibly-stale copy of remote effect tables.
#[derive(Debug, Clone, Default)]
pub struct EffectMirror {
    entities: BTreeMap<EntityId, EffectSnapshot>,
}

impl EffectMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the mirror of `entity`, ignoring snapshots older than the current one.
    pub fn update(&mut self, entity: EntityId, snapshot: EffectSnapshot) {
        match self.entities.get(&entity) {
            Some(current) if current.taken_at > snapshot.taken_at => {}
            _ => {
                self.entities.insert(entity, snapshot);
            }
        }
    }

    /// Forgets an entity (despawned).
    pub fn forget(&mut self, entity: EntityId) {
        self.entities.remove(&entity);
    }

    /// Presentation hint: does the mirror believe `category` is active on `entity`?
    pub fn shows(&self, entity: EntityId, category: EffectCategory, now: GameTime) -> bool {
        self.entities.get(&entity).is_some_and(|snapshot| {
            snapshot
                .effects
                .iter()
                .any(|e| e.category == category && now <= e.expires_at)
        })
    }

    /// Presentation hint for the invulnerability shimmer.
    pub fn looks_invulnerable(&self, entity: EntityId, now: GameTime) -> bool {
        self.shows(entity, EffectCategory::Invulnerability, now)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_capture_and_mirror() {
        let mut table = EffectTable::new();
        let now = GameTime::from_secs(2);
        table.apply(
            EffectCategory::Invulnerability,
            1.0,
            Duration::from_secs(1),
            now,
            None,
        );
        let snapshot = EffectSnapshot::capture(&table, now);
        assert_eq!(snapshot.effects.len(), 1);

        let mut mirror = EffectMirror::new();
        mirror.update(EntityId(1), snapshot);
        assert!(mirror.looks_invulnerable(EntityId(1), now));
        assert!(!mirror.looks_invulnerable(EntityId(1), GameTime::from_secs(4)));
        assert!(!mirror.looks_invulnerable(EntityId(2), now));
    }

    #[test]
    fn test_stale_snapshot_ignored() {
        let mut mirror = EffectMirror::new();
        let newer = EffectSnapshot {
            taken_at: GameTime::from_secs(5),
            effects: vec![],
        };
        let older = EffectSnapshot {
            taken_at: GameTime::from_secs(3),
            effects: vec![MirroredEffect {
                category: EffectCategory::Slow,
                magnitude: 0.5,
                expires_at: GameTime::from_secs(10),
            }],
        };
        mirror.update(EntityId(1), newer);
        mirror.update(EntityId(1), older);
        assert!(!mirror.shows(EntityId(1), EffectCategory::Slow, GameTime::from_secs(6)));
    }

    #[test]
    fn test_snapshot_wire_roundtrip() {
        let snapshot = EffectSnapshot {
            taken_at: GameTime::from_millis(1234),
            effects: vec![MirroredEffect {
                category: EffectCategory::Taunt,
                magnitude: 1.0,
                expires_at: GameTime::from_millis(4234),
            }],
        };
        let bytes = postcard::to_allocvec(&snapshot).unwrap();
        let back: EffectSnapshot = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back, snapshot);
    }
}
