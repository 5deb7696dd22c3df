//! Dash and Evasive Roll: clipped straight-line movement.

use ember_core::EntityId;
use ember_effects::EffectCategory;
use ember_movement::{PathMode, plan_path};
use ember_net::{PathPayload, ReplicationPayload};

use super::{DASH_SKIN, millis_u32};
use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

/// A movement ability stopped by obstacles. The roll variant also makes the
/// caster invulnerable while it moves.
#[derive(Debug, Clone, Copy)]
pub struct DashExecutor {
    animation: &'static str,
    trail: &'static str,
    invulnerable: bool,
}

impl DashExecutor {
    pub const fn dash() -> Self {
        Self {
            animation: "dash",
            trail: "dash_trail",
            invulnerable: false,
        }
    }

    pub const fn roll() -> Self {
        Self {
            animation: "roll",
            trail: "roll_dust",
            invulnerable: true,
        }
    }
}

impl SkillExecutor for DashExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, self.animation);
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let duration = ctx.def.duration_at(ctx.level);
        let path = plan_path(
            ctx.origin,
            ctx.facing,
            ctx.def.range_at(ctx.level),
            PathMode::Clipped { skin: DASH_SKIN },
            ctx.world.obstacles(),
        );
        if self.invulnerable {
            ctx.world.apply_effect(
                ctx.caster,
                EffectCategory::Invulnerability,
                ctx.def.tuning.magnitude,
                duration,
                ctx.now,
                Some(ctx.caster),
            );
        }
        tracing::trace!(caster = %ctx.caster, blocked = path.blocked, length = path.length(), "dash planned");

        let mut payload = ctx.base_payload();
        payload.path = Some(PathPayload {
            start: path.start,
            end: path.end,
            duration_ms: millis_u32(duration),
            piercing: false,
        });
        payload.bonus = path.blocked;
        payload.magnitude = path.length();
        Resolution {
            payload,
            affected: vec![ctx.caster],
        }
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, self.animation);
        if let Some(path) = payload.path {
            fx.spawn_effect(self.trail, path.start, payload.facing, payload.magnitude);
        }
    }
}
