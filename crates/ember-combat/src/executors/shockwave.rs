//! Shockwave: area damage and slow, harder when it catches a crowd.

use ember_core::EntityId;
use ember_effects::EffectCategory;
use ember_net::ReplicationPayload;
use ember_targeting::{Circle, TargetFilter};

use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShockwaveExecutor;

impl SkillExecutor for ShockwaveExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "slam");
        fx.spawn_effect("ground_crack", ctx.position, ctx.facing, 1.0);
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let radius = ctx.def.radius_at(ctx.level);
        let enemies = ctx.select(Circle::new(ctx.origin, radius), TargetFilter::Enemies);
        let tuning = ctx.def.tuning;
        let bonus = tuning.bonus_threshold > 0 && enemies.len() >= tuning.bonus_threshold as usize;
        let damage = if bonus {
            ctx.def.damage_at(ctx.level) * tuning.bonus_multiplier
        } else {
            ctx.def.damage_at(ctx.level)
        };
        let duration = ctx.def.duration_at(ctx.level);
        for hit in &enemies {
            ctx.world.apply_damage(ctx.caster, hit.entity, damage, ctx.now);
            ctx.world.apply_effect(
                hit.entity,
                EffectCategory::Slow,
                tuning.magnitude,
                duration,
                ctx.now,
                Some(ctx.caster),
            );
        }

        let mut resolution = Resolution {
            payload: ctx.base_payload(),
            affected: Vec::new(),
        };
        resolution.record_targets(&enemies);
        resolution.payload.bonus = bonus;
        resolution.payload.magnitude = radius;
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "slam");
        let ring = if payload.bonus {
            "shockwave_ring_empowered"
        } else {
            "shockwave_ring"
        };
        fx.spawn_effect(ring, payload.origin, payload.facing, payload.magnitude);
        for point in &payload.impact_points {
            fx.spawn_effect("shockwave_hit", *point, payload.facing, 1.0);
        }
    }
}
