//! Gameplay-mutation interface used by resolutions.

use std::time::Duration;

use ember_core::{EntityId, GameTime};
use ember_effects::EffectCategory;
use ember_movement::ObstacleQuery;
use ember_targeting::EntityIndex;
use glam::Vec3;

/// The stats/health collaborator plus the read views a resolution needs.
///
/// Only the authoritative host hands one of these to an executor.
pub trait CombatWorld {
    /// Live entities for targeting.
    fn index(&self) -> &dyn EntityIndex;

    /// Static obstacles for path planning.
    fn obstacles(&self) -> &dyn ObstacleQuery;

    /// Applies `amount` raw damage after the target's modifiers. Returns the
    /// damage actually dealt.
    fn apply_damage(&mut self, source: EntityId, target: EntityId, amount: f32, now: GameTime)
    -> f32;

    /// Restores up to `amount` health. Returns the amount healed.
    fn apply_healing(&mut self, source: EntityId, target: EntityId, amount: f32) -> f32;

    /// Pushes `target` by `vector`, clipped against obstacles. Returns
    /// `false` if the target is missing or immune.
    fn apply_knockback(&mut self, target: EntityId, vector: Vec3, now: GameTime) -> bool;

    /// Creates or overwrites a temporary effect on `target`.
    fn apply_effect(
        &mut self,
        target: EntityId,
        category: EffectCategory,
        magnitude: f32,
        duration: Duration,
        now: GameTime,
        source: Option<EntityId>,
    ) -> bool;
}
