//! Immutable skill definitions.

use std::time::Duration;

use ember_core::{CharacterClass, SkillId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SkillCategory
// ---------------------------------------------------------------------------

/// Which loadout slot a skill belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    Utility,
    Combat,
    Ultimate,
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Why a caster may not use a skill right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateReason {
    /// No class assigned yet.
    NoClass,
    /// The skill belongs to another class.
    WrongClass { required: CharacterClass },
    /// Character level below the skill's requirement.
    LevelTooLow { required: u32, actual: u32 },
    /// The caster is dead.
    Dead,
    /// Passive skills are never activated.
    Passive,
    /// The skill is not the active skill of its slot.
    NotEquipped,
}

impl std::fmt::Display for GateReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateReason::NoClass => write!(f, "no class assigned"),
            GateReason::WrongClass { required } => write!(f, "requires class {required:?}"),
            GateReason::LevelTooLow { required, actual } => {
                write!(f, "requires level {required}, caster is {actual}")
            }
            GateReason::Dead => write!(f, "caster is dead"),
            GateReason::Passive => write!(f, "passive skill"),
            GateReason::NotEquipped => write!(f, "skill is not active in its slot"),
        }
    }
}

/// Class and character-level requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillGate {
    /// `None` means any class, but a class must still be assigned.
    pub class: Option<CharacterClass>,
    pub min_level: u32,
}

impl Default for SkillGate {
    fn default() -> Self {
        Self {
            class: None,
            min_level: 1,
        }
    }
}

impl SkillGate {
    /// Checks a caster's class and character level.
    pub fn check(&self, class: Option<CharacterClass>, level: u32) -> Result<(), GateReason> {
        let Some(class) = class else {
            return Err(GateReason::NoClass);
        };
        if let Some(required) = self.class
            && required != class
        {
            return Err(GateReason::WrongClass { required });
        }
        if level < self.min_level {
            return Err(GateReason::LevelTooLow {
                required: self.min_level,
                actual: level,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scaling and tuning
// ---------------------------------------------------------------------------

/// Per-level multipliers applied to the base values of a definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelScaling {
    pub cooldown: f32,
    pub damage: f32,
    pub duration: f32,
    pub range: f32,
}

impl Default for LevelScaling {
    fn default() -> Self {
        Self {
            cooldown: 1.0,
            damage: 1.0,
            duration: 1.0,
            range: 1.0,
        }
    }
}

/// Ability-specific base numbers. Executors read only what they need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillTuning {
    /// Damage (or healing) per target.
    pub damage: f32,
    /// Reach: cone range, path length, line length.
    pub range: f32,
    /// Circle radius.
    pub radius: f32,
    /// Line width.
    pub width: f32,
    /// Cone half angle in degrees.
    pub half_angle_deg: f32,
    /// Effect or movement duration in milliseconds.
    pub duration_ms: u64,
    /// Primary effect magnitude (buff fraction, slow fraction, knockback distance).
    pub magnitude: f32,
    /// Secondary effect magnitude (second buff, self buff).
    pub secondary_magnitude: f32,
    /// Target count at which the bonus condition is met (0 = never).
    pub bonus_threshold: u32,
    /// Damage multiplier when the bonus condition is met.
    pub bonus_multiplier: f32,
}

impl Default for SkillTuning {
    fn default() -> Self {
        Self {
            damage: 0.0,
            range: 0.0,
            radius: 0.0,
            width: 0.0,
            half_angle_deg: 0.0,
            duration_ms: 0,
            magnitude: 0.0,
            secondary_magnitude: 0.0,
            bonus_threshold: 0,
            bonus_multiplier: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// SkillDefinition
// ---------------------------------------------------------------------------

/// Static description of one ability. Never mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    pub category: SkillCategory,
    /// Passive skills can be known and levelled but never equipped or cast.
    pub passive: bool,
    pub gate: SkillGate,
    /// Cooldown at level 1, before scaling.
    pub base_cooldown: Duration,
    pub max_level: u32,
    /// One row per level; row 0 is level 1.
    pub scaling: Vec<LevelScaling>,
    /// XP needed to leave level `i + 1`; `max_level - 1` entries.
    pub xp_thresholds: Vec<u32>,
    /// XP granted per successful cast.
    pub xp_per_cast: u32,
    /// Extra XP per entity affected.
    pub xp_per_target: u32,
    pub tuning: SkillTuning,
}

impl SkillDefinition {
    /// Scaling row of `level`, clamped into `1..=max_level`.
    pub fn scaling_at(&self, level: u32) -> LevelScaling {
        let index = level.clamp(1, self.max_level.max(1)) as usize - 1;
        self.scaling.get(index).copied().unwrap_or_default()
    }

    /// `base_cooldown * levelMultiplier(level)`, rounded to whole microseconds.
    pub fn cooldown_at(&self, level: u32) -> Duration {
        let multiplier = f64::from(self.scaling_at(level).cooldown.max(0.0));
        let micros = self.base_cooldown.as_micros() as f64 * multiplier;
        Duration::from_micros(micros.round() as u64)
    }

    /// Base damage scaled for `level`.
    pub fn damage_at(&self, level: u32) -> f32 {
        self.tuning.damage * self.scaling_at(level).damage
    }

    /// Base range scaled for `level`.
    pub fn range_at(&self, level: u32) -> f32 {
        self.tuning.range * self.scaling_at(level).range
    }

    /// Circle radius scaled for `level` (uses the range multiplier).
    pub fn radius_at(&self, level: u32) -> f32 {
        self.tuning.radius * self.scaling_at(level).range
    }

    /// Effect duration scaled for `level`.
    pub fn duration_at(&self, level: u32) -> Duration {
        let ms = self.tuning.duration_ms as f64 * f64::from(self.scaling_at(level).duration);
        Duration::from_micros((ms * 1000.0).round().max(0.0) as u64)
    }

    /// XP needed to advance from `level`, or `None` at the level cap.
    pub fn xp_to_next(&self, level: u32) -> Option<u32> {
        if level >= self.max_level {
            return None;
        }
        self.xp_thresholds.get(level.max(1) as usize - 1).copied()
    }
}

/// Three-level cone skill used by unit tests across the crate.
#[cfg(test)]
pub(crate) fn sample_definition() -> SkillDefinition {
    SkillDefinition {
        id: SkillId(1),
        name: "Cleave".into(),
        category: SkillCategory::Combat,
        passive: false,
        gate: SkillGate {
            class: Some(CharacterClass::Warrior),
            min_level: 2,
        },
        base_cooldown: Duration::from_secs(5),
        max_level: 3,
        scaling: vec![
            LevelScaling::default(),
            LevelScaling {
                cooldown: 0.9,
                damage: 1.2,
                ..LevelScaling::default()
            },
            LevelScaling {
                cooldown: 0.8,
                damage: 1.5,
                range: 1.25,
                ..LevelScaling::default()
            },
        ],
        xp_thresholds: vec![100, 250],
        xp_per_cast: 10,
        xp_per_target: 5,
        tuning: SkillTuning {
            damage: 20.0,
            range: 6.0,
            half_angle_deg: 60.0,
            duration_ms: 2000,
            ..SkillTuning::default()
        },
    }
}
