//! Aggregated stat view over an [`EffectTable`].

use ember_core::{EntityId, GameTime};

use crate::{EffectCategory, EffectTable};

/// Stat multipliers derived from the active effects at one instant.
///
/// Built fresh for every query; never store one across ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatModifiers {
    /// Multiplier on movement speed (`>= 0`).
    pub movement_speed: f32,
    /// Multiplier on incoming damage, in `[0, 1]`.
    pub damage_taken: f32,
    /// Multiplier on attack speed (`>= 1` unless tables carry negative buffs).
    pub attack_speed: f32,
    /// Invulnerable entities ignore damage and knockback.
    pub invulnerable: bool,
    /// Who the entity is forced to attack, if taunted.
    pub taunted_by: Option<EntityId>,
}

impl Default for StatModifiers {
    fn default() -> Self {
        Self {
            movement_speed: 1.0,
            damage_taken: 1.0,
            attack_speed: 1.0,
            invulnerable: false,
            taunted_by: None,
        }
    }
}

impl StatModifiers {
    /// Aggregates `table` at `now`, clearing expired entries on the way.
    pub fn from_table(table: &mut EffectTable, now: GameTime) -> Self {
        let speed = table
            .active_magnitude(EffectCategory::SpeedBuff, now)
            .unwrap_or(0.0);
        let slow = table
            .active_magnitude(EffectCategory::Slow, now)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        let reduction = table
            .active_magnitude(EffectCategory::DamageReduction, now)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        let attack_speed = table
            .active_magnitude(EffectCategory::AttackSpeedBuff, now)
            .unwrap_or(0.0);
        let invulnerable = table
            .active(EffectCategory::Invulnerability, now)
            .is_some();
        let taunted_by = table
            .active(EffectCategory::Taunt, now)
            .and_then(|effect| effect.source);

        Self {
            movement_speed: ((1.0 + speed) * (1.0 - slow)).max(0.0),
            damage_taken: if invulnerable { 0.0 } else { 1.0 - reduction },
            attack_speed: (1.0 + attack_speed).max(0.0),
            invulnerable,
            taunted_by,
        }
    }

    /// Applies `damage_taken` to a raw damage amount.
    pub fn mitigate(&self, raw: f32) -> f32 {
        (raw * self.damage_taken).max(0.0)
    }
}
