//! Runtime progress of one entity in one skill.

use std::time::Duration;

use ember_core::{GameTime, SkillId};
use serde::{Deserialize, Serialize};

use crate::SkillDefinition;

/// Level, XP, and cooldown state for one (entity, skill) pair.
///
/// `last_activation` is the only field that decides cooldown state. On the
/// host it is authoritative; on clients the whole instance is a mirror that
/// may briefly run ahead (optimistic activation) or behind (in-flight sync).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInstance {
    skill_id: SkillId,
    current_level: u32,
    current_xp: u32,
    last_activation: Option<GameTime>,
}

impl SkillInstance {
    /// Fresh level-1 instance that has never been activated.
    pub fn new(skill_id: SkillId) -> Self {
        Self {
            skill_id,
            current_level: 1,
            current_xp: 0,
            last_activation: None,
        }
    }

    /// Instance restored from persisted progress. The level is clamped to
    /// `1..=def.max_level`; at the cap XP above the last threshold is kept.
    pub fn with_progress(def: &SkillDefinition, level: u32, xp: u32) -> Self {
        Self {
            skill_id: def.id,
            current_level: level.clamp(1, def.max_level.max(1)),
            current_xp: xp,
            last_activation: None,
        }
    }

    pub fn skill_id(&self) -> SkillId {
        self.skill_id
    }

    pub fn level(&self) -> u32 {
        self.current_level
    }

    pub fn xp(&self) -> u32 {
        self.current_xp
    }

    pub fn last_activation(&self) -> Option<GameTime> {
        self.last_activation
    }

    /// Full cooldown at the current level.
    pub fn cooldown(&self, def: &SkillDefinition) -> Duration {
        def.cooldown_at(self.current_level)
    }

    /// Cooldown left at `now`, floored at zero. Never-activated skills are ready.
    pub fn remaining_cooldown(&self, def: &SkillDefinition, now: GameTime) -> Duration {
        match self.last_activation {
            Some(at) => self.cooldown(def).saturating_sub(now.saturating_since(at)),
            None => Duration::ZERO,
        }
    }

    /// `true` once the remaining cooldown reaches zero.
    pub fn is_ready(&self, def: &SkillDefinition, now: GameTime) -> bool {
        self.remaining_cooldown(def, now).is_zero()
    }

    /// Starts the cooldown window at `now`.
    pub fn mark_activated(&mut self, now: GameTime) {
        self.last_activation = Some(now);
    }

    /// Adds XP and applies every level-up it pays for, up to the level cap.
    ///
    /// Returns the number of levels gained. XP left over below the next
    /// threshold is kept.
    pub fn add_experience(&mut self, def: &SkillDefinition, amount: u32) -> u32 {
        self.current_xp = self.current_xp.saturating_add(amount);
        let start = self.current_level;
        while let Some(threshold) = def.xp_to_next(self.current_level) {
            if self.current_xp < threshold {
                break;
            }
            self.current_xp -= threshold;
            self.current_level += 1;
        }
        let gained = self.current_level - start;
        if gained > 0 {
            tracing::debug!(
                skill = %self.skill_id,
                level = self.current_level,
                xp = self.current_xp,
                gained,
                "skill levelled up"
            );
        }
        gained
    }
}
