use serde::{Deserialize, Serialize};

/// Kind of temporary effect. An entity holds at most one effect per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectCategory {
    /// Movement speed bonus; magnitude is a fraction (0.3 = +30%).
    SpeedBuff,
    /// Incoming damage reduction; magnitude is a fraction in `[0, 1]`.
    DamageReduction,
    /// Movement speed penalty; magnitude is a fraction in `[0, 1]`.
    Slow,
    /// Ignores all damage and knockback. Magnitude unused.
    Invulnerability,
    /// Forced to attack the effect's source. Magnitude unused.
    Taunt,
    /// Attack speed bonus; magnitude is a fraction.
    AttackSpeedBuff,
}

impl EffectCategory {
    /// Number of categories; sizes the per-entity table.
    pub const COUNT: usize = 6;

    /// Every category, in table order.
    pub const ALL: [EffectCategory; Self::COUNT] = [
        EffectCategory::SpeedBuff,
        EffectCategory::DamageReduction,
        EffectCategory::Slow,
        EffectCategory::Invulnerability,
        EffectCategory::Taunt,
        EffectCategory::AttackSpeedBuff,
    ];

    /// Slot of this category in an [`EffectTable`](crate::EffectTable).
    pub(crate) fn slot(self) -> usize {
        match self {
            EffectCategory::SpeedBuff => 0,
            EffectCategory::DamageReduction => 1,
            EffectCategory::Slow => 2,
            EffectCategory::Invulnerability => 3,
            EffectCategory::Taunt => 4,
            EffectCategory::AttackSpeedBuff => 5,
        }
    }

    /// `true` for effects that help the bearer.
    pub fn is_beneficial(self) -> bool {
        !matches!(self, EffectCategory::Slow | EffectCategory::Taunt)
    }
}
