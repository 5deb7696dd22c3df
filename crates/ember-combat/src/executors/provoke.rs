//! Provoke: taunt nearby enemies, brace the caster.

use ember_core::EntityId;
use ember_effects::EffectCategory;
use ember_net::ReplicationPayload;
use ember_targeting::{Circle, TargetFilter};

use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct ProvokeExecutor;

impl SkillExecutor for ProvokeExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "taunt");
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let radius = ctx.def.radius_at(ctx.level);
        let enemies = ctx.select(Circle::new(ctx.origin, radius), TargetFilter::Enemies);
        let duration = ctx.def.duration_at(ctx.level);
        for hit in &enemies {
            ctx.world.apply_effect(
                hit.entity,
                EffectCategory::Taunt,
                1.0,
                duration,
                ctx.now,
                Some(ctx.caster),
            );
        }
        ctx.world.apply_effect(
            ctx.caster,
            EffectCategory::DamageReduction,
            ctx.def.tuning.secondary_magnitude,
            duration,
            ctx.now,
            Some(ctx.caster),
        );

        let mut resolution = Resolution {
            payload: ctx.base_payload(),
            affected: Vec::new(),
        };
        resolution.record_targets(&enemies);
        resolution.touch(ctx.caster);
        resolution.payload.magnitude = radius;
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "taunt");
        fx.spawn_effect("provoke_pulse", payload.origin, payload.facing, payload.magnitude);
        for point in &payload.impact_points {
            fx.spawn_effect("provoke_mark", *point, payload.facing, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use ember_core::{GameTime, Side};
    use glam::Vec3;

    use super::*;
    use crate::arena::{ActorSpec, ArenaWorld};
    use crate::executors::PROVOKE;
    use crate::executors::testing::resolve_in;

    #[test]
    fn test_taunts_enemies_and_braces_caster() {
        let mut world = ArenaWorld::new();
        let caster = world.spawn(ActorSpec::new(Side::Party, Vec3::ZERO));
        let foe = world.spawn(ActorSpec::new(Side::Hostile, Vec3::new(0.0, 0.0, -6.0)));
        let bystander = world.spawn(ActorSpec::new(Side::Neutral, Vec3::new(1.0, 0.0, 0.0)));
        let now = GameTime::ZERO;

        let res = resolve_in(&mut world, &ProvokeExecutor, PROVOKE, caster, 1, now);

        assert_eq!(res.target_count(), 1);
        assert_eq!(res.affected, vec![foe, caster]);
        assert_eq!(world.modifiers(foe, now).unwrap().taunted_by, Some(caster));
        assert_eq!(world.modifiers(bystander, now).unwrap().taunted_by, None);
        let braced = world.modifiers(caster, now).unwrap();
        assert!((braced.damage_taken - 0.65).abs() < 1e-5);
    }
}
