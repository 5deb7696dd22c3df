//! Cleave: frontal cone that damages every enemy in reach.

use ember_core::EntityId;
use ember_net::ReplicationPayload;
use ember_targeting::{Cone, TargetFilter};

use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct CleaveExecutor;

impl SkillExecutor for CleaveExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "cleave");
        fx.spawn_effect(
            "cleave_swing",
            ctx.position,
            ctx.facing,
            ctx.def.range_at(ctx.level),
        );
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let range = ctx.def.range_at(ctx.level);
        let cone = Cone::new(ctx.origin, ctx.facing, ctx.def.tuning.half_angle_deg, range);
        let targets = ctx.select(cone, TargetFilter::Enemies);

        let damage = ctx.def.damage_at(ctx.level);
        for hit in &targets {
            ctx.world.apply_damage(ctx.caster, hit.entity, damage, ctx.now);
        }

        let mut resolution = Resolution {
            payload: ctx.base_payload(),
            affected: Vec::new(),
        };
        resolution.record_targets(&targets);
        resolution.payload.magnitude = range;
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "cleave");
        fx.spawn_effect("cleave_arc", payload.origin, payload.facing, payload.magnitude);
        for point in &payload.impact_points {
            fx.spawn_effect("cleave_hit", *point, payload.facing, 1.0);
        }
    }
}
