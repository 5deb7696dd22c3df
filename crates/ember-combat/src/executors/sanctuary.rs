//! Sanctuary: heal allies around the caster and shield them briefly.

use ember_core::EntityId;
use ember_effects::EffectCategory;
use ember_net::ReplicationPayload;
use ember_targeting::{Circle, TargetFilter};

use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct SanctuaryExecutor;

impl SkillExecutor for SanctuaryExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "invoke");
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let radius = ctx.def.radius_at(ctx.level);
        let allies = ctx.select(
            Circle::new(ctx.origin, radius),
            TargetFilter::Allies {
                include_caster: true,
            },
        );
        let heal = ctx.def.damage_at(ctx.level);
        let duration = ctx.def.duration_at(ctx.level);
        for hit in &allies {
            ctx.world.apply_healing(ctx.caster, hit.entity, heal);
            ctx.world.apply_effect(
                hit.entity,
                EffectCategory::Invulnerability,
                1.0,
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
        resolution.payload.magnitude = heal;
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "invoke");
        fx.spawn_effect("sanctuary_dome", payload.origin, payload.facing, payload.magnitude);
        for point in &payload.impact_points {
            fx.spawn_effect("heal_burst", *point, payload.facing, 1.0);
        }
    }
}
