//! Reference world collaborator: a `bevy_ecs` world of arena actors.
//!
//! Every session (host and clients) keeps one. On the host it is the
//! authoritative state; on clients it is a mirror fed by broadcasts.

use std::time::Duration;

use bevy_ecs::prelude::*;
use ember_core::{CharacterClass, EntityId, GameTime, SessionId, Side};
use ember_effects::{EffectCategory, EffectTable, StatModifiers};
use ember_movement::{Aabb, MovementBody, MovementState, ObstacleQuery, PathMode, plan_path};
use ember_skills::SkillBook;
use ember_targeting::{EntityIndex, EntityView};
use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::CombatWorld;
use crate::components::{Allegiance, Character, Facing, Health, NetId, Ownership, Position};

/// Gap kept between a knocked-back body and the obstacle that stopped it.
const KNOCKBACK_SKIN: f32 = 0.3;

// ---------------------------------------------------------------------------
// ActorSpec
// ---------------------------------------------------------------------------

/// Everything needed to spawn an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSpec {
    pub side: Side,
    pub position: Vec3,
    pub facing: Vec3,
    pub max_health: f32,
    pub owner: Option<SessionId>,
    pub class: Option<CharacterClass>,
    pub level: u32,
}

impl ActorSpec {
    pub fn new(side: Side, position: Vec3) -> Self {
        Self {
            side,
            position,
            facing: Vec3::Z,
            max_health: 100.0,
            owner: None,
            class: None,
            level: 1,
        }
    }

    pub fn owned_by(mut self, session: SessionId) -> Self {
        self.owner = Some(session);
        self
    }

    pub fn class(mut self, class: CharacterClass, level: u32) -> Self {
        self.class = Some(class);
        self.level = level;
        self
    }

    pub fn facing(mut self, facing: Vec3) -> Self {
        self.facing = facing;
        self
    }

    pub fn health(mut self, max_health: f32) -> Self {
        self.max_health = max_health;
        self
    }
}

// ---------------------------------------------------------------------------
// ArenaWorld
// ---------------------------------------------------------------------------

/// ECS world plus the `EntityId -> Entity` map and static obstacles.
#[derive(Default)]
pub struct ArenaWorld {
    world: World,
    ids: FxHashMap<EntityId, Entity>,
    next_id: u64,
    obstacles: Vec<Aabb>,
}

impl ArenaWorld {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            ids: FxHashMap::default(),
            next_id: 1,
            obstacles: Vec::new(),
        }
    }

    /// Spawns an actor under the next free id.
    pub fn spawn(&mut self, spec: ActorSpec) -> EntityId {
        let id = EntityId(self.next_id.max(1));
        self.spawn_with_id(id, spec)
    }

    /// Spawns an actor under an id chosen elsewhere (mirrors copy host ids).
    /// An existing actor with the same id is replaced.
    pub fn spawn_with_id(&mut self, id: EntityId, spec: ActorSpec) -> EntityId {
        self.despawn(id);
        let entity = self
            .world
            .spawn((
                NetId(id),
                Position(spec.position),
                Facing(spec.facing),
                Allegiance(spec.side),
                Health::full(spec.max_health),
                Ownership(spec.owner),
                Character {
                    class: spec.class,
                    level: spec.level,
                },
                MovementState::FREE,
                EffectTable::new(),
                SkillBook::new(),
            ))
            .id();
        self.ids.insert(id, entity);
        self.next_id = self.next_id.max(id.0 + 1);
        tracing::trace!(%id, side = ?spec.side, "actor spawned");
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        match self.ids.remove(&id) {
            Some(entity) => self.world.despawn(entity),
            None => false,
        }
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains_key(&id)
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.ids.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn add_obstacle(&mut self, obstacle: Aabb) {
        self.obstacles.push(obstacle);
    }

    /// The underlying ECS world.
    pub fn ecs(&self) -> &World {
        &self.world
    }

    fn get<T: Component>(&self, id: EntityId) -> Option<&T> {
        let entity = *self.ids.get(&id)?;
        self.world.get::<T>(entity)
    }

    fn get_mut<T: Component>(&mut self, id: EntityId) -> Option<&mut T> {
        let entity = *self.ids.get(&id)?;
        self.world.get_mut::<T>(entity).map(Mut::into_inner)
    }

    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.get::<Position>(id).map(|p| p.0)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) -> bool {
        self.get_mut::<Position>(id)
            .map(|p| p.0 = position)
            .is_some()
    }

    /// Normalized facing.
    pub fn facing(&self, id: EntityId) -> Option<Vec3> {
        self.get::<Facing>(id).map(|f| f.direction())
    }

    pub fn set_facing(&mut self, id: EntityId, facing: Vec3) -> bool {
        self.get_mut::<Facing>(id).map(|f| f.0 = facing).is_some()
    }

    pub fn side(&self, id: EntityId) -> Option<Side> {
        self.get::<Allegiance>(id).map(|a| a.0)
    }

    pub fn health(&self, id: EntityId) -> Option<Health> {
        self.get::<Health>(id).copied()
    }

    /// Overwrites current health (mirrors apply host broadcasts with this).
    pub fn set_health(&mut self, id: EntityId, current: f32) -> bool {
        self.get_mut::<Health>(id)
            .map(|h| h.current = current.clamp(0.0, h.max))
            .is_some()
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get::<Health>(id).is_some_and(Health::is_alive)
    }

    pub fn ownership(&self, id: EntityId) -> Option<Ownership> {
        self.get::<Ownership>(id).copied()
    }

    /// Entities a session controls, ascending.
    pub fn owned_by(&self, session: SessionId) -> Vec<EntityId> {
        self.ids()
            .into_iter()
            .filter(|id| self.ownership(*id).is_some_and(|o| o.0 == Some(session)))
            .collect()
    }

    pub fn character(&self, id: EntityId) -> Option<Character> {
        self.get::<Character>(id).copied()
    }

    pub fn set_character(&mut self, id: EntityId, character: Character) -> bool {
        self.get_mut::<Character>(id).map(|c| *c = character).is_some()
    }

    pub fn skill_book(&self, id: EntityId) -> Option<&SkillBook> {
        self.get::<SkillBook>(id)
    }

    pub fn skill_book_mut(&mut self, id: EntityId) -> Option<&mut SkillBook> {
        self.get_mut::<SkillBook>(id)
    }

    pub fn effects(&self, id: EntityId) -> Option<&EffectTable> {
        self.get::<EffectTable>(id)
    }

    pub fn effects_mut(&mut self, id: EntityId) -> Option<&mut EffectTable> {
        self.get_mut::<EffectTable>(id)
    }

    /// Aggregated modifiers of `id` at `now`, read fresh from its effect table.
    pub fn modifiers(&mut self, id: EntityId, now: GameTime) -> Option<StatModifiers> {
        self.effects_mut(id)
            .map(|table| StatModifiers::from_table(table, now))
    }

    /// Drops expired effects on every entity. Returns who lost what.
    pub fn expire_effects(&mut self, now: GameTime) -> Vec<(EntityId, Vec<EffectCategory>)> {
        let mut expired = Vec::new();
        for id in self.ids() {
            if let Some(table) = self.effects_mut(id) {
                let removed = table.expire(now);
                if !removed.is_empty() {
                    expired.push((id, removed));
                }
            }
        }
        expired
    }
}

// ---------------------------------------------------------------------------
// Collaborator interfaces
// ---------------------------------------------------------------------------

impl EntityIndex for ArenaWorld {
    fn for_each_entity(&self, visit: &mut dyn FnMut(&EntityView)) {
        for id in self.ids.keys() {
            if let Some(view) = self.entity(*id) {
                visit(&view);
            }
        }
    }

    fn entity(&self, id: EntityId) -> Option<EntityView> {
        Some(EntityView {
            id,
            position: self.position(id)?,
            side: self.side(id)?,
            alive: self.is_alive(id),
        })
    }
}

impl MovementBody for ArenaWorld {
    fn generation(&self, entity: EntityId) -> Option<u64> {
        self.ids.get(&entity).map(|e| e.to_bits())
    }

    fn position(&self, entity: EntityId) -> Option<Vec3> {
        ArenaWorld::position(self, entity)
    }

    fn teleport(&mut self, entity: EntityId, position: Vec3) -> bool {
        self.set_position(entity, position)
    }

    fn movement_state(&self, entity: EntityId) -> Option<MovementState> {
        self.get::<MovementState>(entity).copied()
    }

    fn set_movement_state(&mut self, entity: EntityId, state: MovementState) -> bool {
        self.get_mut::<MovementState>(entity)
            .map(|s| *s = state)
            .is_some()
    }
}

impl ObstacleQuery for ArenaWorld {
    fn first_hit(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<f32> {
        self.obstacles.first_hit(origin, direction, max_distance)
    }
}

impl CombatWorld for ArenaWorld {
    fn index(&self) -> &dyn EntityIndex {
        self
    }

    fn obstacles(&self) -> &dyn ObstacleQuery {
        &self.obstacles
    }

    fn apply_damage(
        &mut self,
        source: EntityId,
        target: EntityId,
        amount: f32,
        now: GameTime,
    ) -> f32 {
        if !self.is_alive(target) {
            return 0.0;
        }
        let Some(mods) = self.modifiers(target, now) else {
            return 0.0;
        };
        let Some(health) = self.get_mut::<Health>(target) else {
            return 0.0;
        };
        let dealt = mods.mitigate(amount).min(health.current);
        health.current -= dealt;
        let killed = !health.is_alive();
        tracing::trace!(%source, %target, raw = amount, dealt, "damage applied");
        if killed {
            tracing::info!(%source, %target, "target killed");
        }
        dealt
    }

    fn apply_healing(&mut self, source: EntityId, target: EntityId, amount: f32) -> f32 {
        let Some(health) = self.get_mut::<Health>(target) else {
            return 0.0;
        };
        if !health.is_alive() {
            return 0.0;
        }
        let healed = amount.max(0.0).min(health.max - health.current);
        health.current += healed;
        tracing::trace!(%source, %target, healed, "healing applied");
        healed
    }

    fn apply_knockback(&mut self, target: EntityId, vector: Vec3, now: GameTime) -> bool {
        if !self.is_alive(target) {
            return false;
        }
        let Some(mods) = self.modifiers(target, now) else {
            return false;
        };
        if mods.invulnerable {
            return false;
        }
        let Some(start) = ArenaWorld::position(self, target) else {
            return false;
        };
        let path = plan_path(
            start,
            vector,
            vector.length(),
            PathMode::Clipped {
                skin: KNOCKBACK_SKIN,
            },
            &self.obstacles,
        );
        self.set_position(target, path.end)
    }

    fn apply_effect(
        &mut self,
        target: EntityId,
        category: EffectCategory,
        magnitude: f32,
        duration: Duration,
        now: GameTime,
        source: Option<EntityId>,
    ) -> bool {
        match self.effects_mut(target) {
            Some(table) => {
                table.apply(category, magnitude, duration, now, source);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> (ArenaWorld, EntityId, EntityId) {
        let mut world = ArenaWorld::new();
        let hero = world.spawn(
            ActorSpec::new(Side::Party, Vec3::ZERO)
                .owned_by(SessionId(1))
                .class(CharacterClass::Warrior, 3),
        );
        let dummy = world.spawn(ActorSpec::new(Side::Hostile, Vec3::new(0.0, 0.0, 3.0)).health(50.0));
        (world, hero, dummy)
    }

    #[test]
    fn test_spawn_assigns_ascending_ids() {
        let (world, hero, dummy) = arena();
        assert_eq!(hero, EntityId(1));
        assert_eq!(dummy, EntityId(2));
        assert_eq!(world.ids(), vec![hero, dummy]);
        assert_eq!(world.owned_by(SessionId(1)), vec![hero]);
        assert_eq!(world.ownership(dummy).unwrap().controller(), SessionId::HOST);
    }

    #[test]
    fn test_damage_respects_modifiers_and_kills() {
        let (mut world, hero, dummy) = arena();
        let now = GameTime::from_secs(1);
        world.apply_effect(
            dummy,
            EffectCategory::DamageReduction,
            0.5,
            Duration::from_secs(5),
            now,
            None,
        );
        assert!((world.apply_damage(hero, dummy, 40.0, now) - 20.0).abs() < 1e-4);
        assert!(world.is_alive(dummy));
        assert!((world.apply_damage(hero, dummy, 200.0, now) - 30.0).abs() < 1e-4);
        assert!(!world.is_alive(dummy));
        assert_eq!(world.apply_damage(hero, dummy, 10.0, now), 0.0);
        // Dead entities drop out of targeting views.
        assert!(!world.entity(dummy).unwrap().alive);
    }

    #[test]
    fn test_invulnerable_ignores_damage_and_knockback() {
        let (mut world, hero, dummy) = arena();
        let now = GameTime::ZERO;
        world.apply_effect(
            dummy,
            EffectCategory::Invulnerability,
            1.0,
            Duration::from_secs(1),
            now,
            None,
        );
        assert_eq!(world.apply_damage(hero, dummy, 40.0, now), 0.0);
        assert!(!world.apply_knockback(dummy, Vec3::X * 3.0, now));
        assert_eq!(world.position(dummy), Some(Vec3::new(0.0, 0.0, 3.0)));
    }

    #[test]
    fn test_knockback_clipped_by_obstacle() {
        let (mut world, _, dummy) = arena();
        world.add_obstacle(Aabb::new(Vec3::new(2.0, -1.0, 0.0), Vec3::new(3.0, 2.0, 6.0)));
        assert!(world.apply_knockback(dummy, Vec3::X * 5.0, GameTime::ZERO));
        let x = world.position(dummy).unwrap().x;
        assert!((x - 1.7).abs() < 1e-4);
    }

    #[test]
    fn test_healing_capped_at_max() {
        let (mut world, hero, _) = arena();
        world.apply_damage(EntityId(99), hero, 30.0, GameTime::ZERO);
        assert!((world.apply_healing(hero, hero, 50.0) - 30.0).abs() < 1e-4);
        assert_eq!(world.health(hero).unwrap().current, 100.0);
    }

    #[test]
    fn test_expire_effects_reports_removed() {
        let (mut world, hero, dummy) = arena();
        world.apply_effect(
            hero,
            EffectCategory::SpeedBuff,
            0.3,
            Duration::from_secs(1),
            GameTime::ZERO,
            None,
        );
        world.apply_effect(
            dummy,
            EffectCategory::Slow,
            0.3,
            Duration::from_secs(10),
            GameTime::ZERO,
            None,
        );
        let expired = world.expire_effects(GameTime::from_secs(2));
        assert_eq!(expired, vec![(hero, vec![EffectCategory::SpeedBuff])]);
    }

    #[test]
    fn test_despawn_and_respawn_with_id() {
        let (mut world, _, dummy) = arena();
        assert!(world.despawn(dummy));
        assert!(!world.contains(dummy));
        assert!(!world.despawn(dummy));
        world.spawn_with_id(EntityId(10), ActorSpec::new(Side::Neutral, Vec3::ONE));
        assert_eq!(world.spawn(ActorSpec::new(Side::Neutral, Vec3::ONE)), EntityId(11));
    }
}
