//! Per-entity effect table with overwrite semantics.

use std::time::Duration;

use bevy_ecs::prelude::*;
use ember_core::{EntityId, GameTime};
use serde::{Deserialize, Serialize};

use crate::EffectCategory;

// ---------------------------------------------------------------------------
// TemporaryEffect
// ---------------------------------------------------------------------------

/// One active, time-bounded modifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporaryEffect {
    /// Which slot this effect occupies.
    pub category: EffectCategory,
    /// Strength; interpretation depends on the category.
    pub magnitude: f32,
    /// When the effect was (last) applied.
    pub applied_at: GameTime,
    /// Last instant at which the effect is still active.
    pub expires_at: GameTime,
    /// Entity that applied it (the taunter for `Taunt`).
    pub source: Option<EntityId>,
}

impl TemporaryEffect {
    /// Active while `now <= expires_at`.
    pub fn is_active(&self, now: GameTime) -> bool {
        now <= self.expires_at
    }

    /// Time left before expiry.
    pub fn remaining(&self, now: GameTime) -> Duration {
        self.expires_at.saturating_since(now)
    }
}

// ---------------------------------------------------------------------------
// EffectTable
// ---------------------------------------------------------------------------

/// Typed map `category -> effect` for one entity.
///
/// Invariant: at most one effect per category. [`apply`](Self::apply)
/// replaces both magnitude and expiry of an existing entry; durations never
/// stack or extend additively.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct EffectTable {
    slots: [Option<TemporaryEffect>; EffectCategory::COUNT],
}

impl EffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites the effect of `category`.
    pub fn apply(
        &mut self,
        category: EffectCategory,
        magnitude: f32,
        duration: Duration,
        now: GameTime,
        source: Option<EntityId>,
    ) -> TemporaryEffect {
        let effect = TemporaryEffect {
            category,
            magnitude,
            applied_at: now,
            expires_at: now + duration,
            source,
        };
        let previous = self.slots[category.slot()].replace(effect);
        if let Some(previous) = previous.filter(|p| p.is_active(now)) {
            tracing::trace!(
                ?category,
                old = previous.magnitude,
                new = magnitude,
                "effect overwritten"
            );
        }
        effect
    }

    /// Magnitude of the active effect, or `None`. Clears the slot if it has expired.
    pub fn active_magnitude(&mut self, category: EffectCategory, now: GameTime) -> Option<f32> {
        self.active(category, now).map(|effect| effect.magnitude)
    }

    /// The active effect of `category`, clearing it lazily if expired.
    pub fn active(&mut self, category: EffectCategory, now: GameTime) -> Option<TemporaryEffect> {
        let slot = &mut self.slots[category.slot()];
        match slot {
            Some(effect) if effect.is_active(now) => Some(*effect),
            Some(_) => {
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Non-clearing read; expired entries are reported as absent.
    pub fn peek(&self, category: EffectCategory, now: GameTime) -> Option<&TemporaryEffect> {
        self.slots[category.slot()]
            .as_ref()
            .filter(|effect| effect.is_active(now))
    }

    /// Removes an effect regardless of expiry (cleanse).
    pub fn remove(&mut self, category: EffectCategory) -> Option<TemporaryEffect> {
        self.slots[category.slot()].take()
    }

    /// Eagerly drops every expired effect. Returns the removed categories.
    pub fn expire(&mut self, now: GameTime) -> Vec<EffectCategory> {
        let mut removed = Vec::new();
        for slot in self.slots.iter_mut() {
            if let Some(effect) = slot
                && !effect.is_active(now)
            {
                removed.push(effect.category);
                *slot = None;
            }
        }
        removed
    }

    /// Active effects in category order.
    pub fn iter_active(&self, now: GameTime) -> impl Iterator<Item = &TemporaryEffect> {
        self.slots
            .iter()
            .flatten()
            .filter(move |effect| effect.is_active(now))
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
