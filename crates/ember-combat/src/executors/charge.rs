//! Charge: piercing rush that damages and shoves enemies along its line.

use ember_core::EntityId;
use ember_movement::{PathMode, plan_path};
use ember_net::{PathPayload, ReplicationPayload};
use ember_targeting::{Line, TargetFilter};

use super::millis_u32;
use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct ChargeExecutor;

impl SkillExecutor for ChargeExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "charge_windup");
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let path = plan_path(
            ctx.origin,
            ctx.facing,
            ctx.def.range_at(ctx.level),
            PathMode::Piercing,
            ctx.world.obstacles(),
        );
        let targets = ctx.select(
            Line::new(path.start, path.end, ctx.def.tuning.width),
            TargetFilter::Enemies,
        );

        let damage = ctx.def.damage_at(ctx.level);
        let shove = ctx.facing * ctx.def.tuning.magnitude;
        for hit in &targets {
            ctx.world.apply_damage(ctx.caster, hit.entity, damage, ctx.now);
            ctx.world.apply_knockback(hit.entity, shove, ctx.now);
        }

        let mut resolution = Resolution {
            payload: ctx.base_payload(),
            affected: Vec::new(),
        };
        resolution.record_targets(&targets);
        resolution.touch(ctx.caster);
        resolution.payload.path = Some(PathPayload {
            start: path.start,
            end: path.end,
            duration_ms: millis_u32(ctx.def.duration_at(ctx.level)),
            piercing: true,
        });
        resolution.payload.magnitude = ctx.def.tuning.width;
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "charge");
        if let Some(path) = payload.path {
            fx.spawn_effect("charge_streak", path.start, payload.facing, payload.magnitude);
        }
        for point in &payload.impact_points {
            fx.spawn_effect("charge_impact", *point, payload.facing, 1.0);
        }
    }
}
