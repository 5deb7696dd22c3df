//! Piercing Lance: thrust that hits every enemy on a line.

use ember_core::EntityId;
use ember_net::ReplicationPayload;
use ember_targeting::{Line, TargetFilter};

use crate::executor::{PredictContext, ResolveContext, Resolution, SkillExecutor};
use crate::Presentation;

#[derive(Debug, Clone, Copy, Default)]
pub struct LanceExecutor;

impl SkillExecutor for LanceExecutor {
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation) {
        fx.play_animation(ctx.caster, "thrust");
    }

    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution {
        let end = ctx.origin + ctx.facing * ctx.def.range_at(ctx.level);
        let targets = ctx.select(
            Line::new(ctx.origin, end, ctx.def.tuning.width),
            TargetFilter::Enemies,
        );
        let damage = ctx.def.damage_at(ctx.level);
        for hit in &targets {
            ctx.world.apply_damage(ctx.caster, hit.entity, damage, ctx.now);
        }

        let mut resolution = Resolution {
            payload: ctx.base_payload(),
            affected: Vec::new(),
        };
        resolution.record_targets(&targets);
        resolution.payload.magnitude = ctx.origin.distance(end);
        resolution
    }

    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation) {
        fx.play_animation(caster, "thrust");
        fx.spawn_effect("lance_beam", payload.origin, payload.facing, payload.magnitude);
        for point in &payload.impact_points {
            fx.spawn_effect("lance_hit", *point, payload.facing, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use ember_core::{GameTime, Side};
    use glam::Vec3;

    use super::*;
    use crate::arena::{ActorSpec, ArenaWorld};
    use crate::executors::PIERCING_LANCE;
    use crate::executors::testing::resolve_in;

    #[test]
    fn test_line_hits_every_enemy_in_order() {
        let mut world = ArenaWorld::new();
        let caster = world.spawn(ActorSpec::new(Side::Party, Vec3::ZERO).facing(Vec3::X));
        let far = world.spawn(ActorSpec::new(Side::Hostile, Vec3::new(9.5, 0.0, 0.4)));
        let near = world.spawn(ActorSpec::new(Side::Hostile, Vec3::new(2.0, 0.0, -0.5)));
        let wide = world.spawn(ActorSpec::new(Side::Hostile, Vec3::new(5.0, 0.0, 0.6)));
        let past = world.spawn(ActorSpec::new(Side::Hostile, Vec3::new(10.5, 0.0, 0.0)));

        let res = resolve_in(&mut world, &LanceExecutor, PIERCING_LANCE, caster, 1, GameTime::ZERO);

        // Sorted by id, not by distance.
        assert_eq!(res.affected, vec![far, near]);
        assert_eq!(
            res.payload.impact_points,
            vec![Vec3::new(9.5, 0.0, 0.4), Vec3::new(2.0, 0.0, -0.5)]
        );
        assert_eq!(world.health(wide).unwrap().current, 100.0);
        assert_eq!(world.health(past).unwrap().current, 100.0);
        assert_eq!(world.health(near).unwrap().current, 65.0);
    }
}
