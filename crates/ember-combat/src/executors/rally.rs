//! Rallying Cry: movement and attack-speed buff on nearby allies.

use ember_core::EntityId;
use ember_effects::EffectCategory;
use ember_net::ReplicationPayload;
use ember_targeting::{Circle, TargetFilter};

use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct RallyExecutor;

impl SkillExecutor for RallyExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "shout");
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let radius = ctx.def.radius_at(ctx.level);
        let allies = ctx.select(
            Circle::new(ctx.origin, radius),
            TargetFilter::Allies {
                include_caster: true,
            },
        );
        let duration = ctx.def.duration_at(ctx.level);
        let tuning = ctx.def.tuning;
        for hit in &allies {
            ctx.world.apply_effect(
                hit.entity,
                EffectCategory::SpeedBuff,
                tuning.magnitude,
                duration,
                ctx.now,
                Some(ctx.caster),
            );
            ctx.world.apply_effect(
                hit.entity,
                EffectCategory::AttackSpeedBuff,
                tuning.secondary_magnitude,
                duration,
                ctx.now,
                Some(ctx.caster),
            );
        }

        let mut resolution = Resolution {
            payload: ctx.base_payload(),
            affected: Vec::new(),
        };
        resolution.record_targets(&allies);
        resolution.payload.magnitude = radius;
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "shout");
        fx.spawn_effect("rally_ring", payload.origin, payload.facing, payload.magnitude);
        for point in &payload.impact_points {
            fx.spawn_effect("rally_glow", *point, payload.facing, 1.0);
        }
    }
}
