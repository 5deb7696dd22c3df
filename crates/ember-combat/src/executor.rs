//! The three-phase executor contract and the id → executor registry.
//!
//! Every ability runs the same protocol skeleton; an executor only decides
//! which targeting shape to use, what the resolution does to the targets, and
//! what the replay looks like.

use std::collections::BTreeMap;
use std::time::Duration;

use ember_core::{EntityId, GameTime, SkillId, Side};
use ember_movement::{Easing, MovementSequence};
use ember_net::ReplicationPayload;
use ember_skills::SkillDefinition;
use ember_targeting::{Shape, TargetFilter, TargetSet, select};
use glam::Vec3;

use crate::executors;
use crate::{CombatWorld, Presentation};

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// What the owning session knows when it predicts.
#[derive(Debug, Clone, Copy)]
pub struct PredictContext<'a> {
    pub caster: EntityId,
    pub position: Vec3,
    pub facing: Vec3,
    pub level: u32,
    pub def: &'a SkillDefinition,
}

/// Host-side resolution input. Only the authoritative host builds one.
pub struct ResolveContext<'a> {
    pub caster: EntityId,
    pub side: Side,
    pub origin: Vec3,
    /// Unit length.
    pub facing: Vec3,
    pub level: u32,
    pub def: &'a SkillDefinition,
    pub now: GameTime,
    pub world: &'a mut dyn CombatWorld,
}

impl ResolveContext<'_> {
    /// Payload with the caster pose filled in.
    pub fn base_payload(&self) -> ReplicationPayload {
        ReplicationPayload {
            origin: self.origin,
            facing: self.facing,
            ..ReplicationPayload::default()
        }
    }

    /// Runs a targeting query for the caster.
    pub fn select(&self, shape: impl Into<Shape>, filter: TargetFilter) -> TargetSet {
        select(
            self.world.index(),
            &shape.into(),
            self.caster,
            self.side,
            filter,
        )
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Broadcast verbatim to every session.
    pub payload: ReplicationPayload,
    /// Entities whose health, position, or effects changed. Host-only; never
    /// replicated as references.
    pub affected: Vec<EntityId>,
}

impl Resolution {
    pub fn target_count(&self) -> u32 {
        self.payload.target_count
    }

    /// Records `targets` as hit: count, impact points, affected ids.
    pub fn record_targets(&mut self, targets: &TargetSet) {
        self.payload.target_count = u32::try_from(targets.len()).unwrap_or(u32::MAX);
        self.payload.impact_points = targets.positions();
        self.affected.extend(targets.entities());
    }

    /// Marks `entity` as changed (deduplicated).
    pub fn touch(&mut self, entity: EntityId) {
        if !self.affected.contains(&entity) {
            self.affected.push(entity);
        }
    }
}

// ---------------------------------------------------------------------------
// SkillExecutor
// ---------------------------------------------------------------------------

/// Predict / resolve / replay for one ability.
pub trait SkillExecutor: Send + Sync {
    /// Owning session only: animation and instantaneous cosmetic VFX.
    fn predict(&self, ctx: &PredictContext<'_>, fx: &mut dyn Presentation);

    /// Host only: targeting plus every gameplay mutation. Runs to completion.
    fn resolve(&self, ctx: &mut ResolveContext<'_>) -> Resolution;

    /// Every session, including the host: VFX from the payload. Must not
    /// mutate gameplay state.
    fn replay(&self, caster: EntityId, payload: &ReplicationPayload, fx: &mut dyn Presentation);
}

/// The movement sequence a payload asks every session to replay, if any.
pub fn movement_for(caster: EntityId, payload: &ReplicationPayload) -> Option<MovementSequence> {
    let path = payload.path?;
    Some(
        MovementSequence::new(
            caster,
            path.start,
            path.end,
            Duration::from_millis(u64::from(path.duration_ms)),
        )
        .with_easing(Easing::EaseOut),
    )
}

// ---------------------------------------------------------------------------
// ExecutorRegistry
// ---------------------------------------------------------------------------

/// Maps skill ids to executor singletons.
#[derive(Default)]
pub struct ExecutorRegistry {
    executors: BTreeMap<SkillId, Box<dyn SkillExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in ability.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        executors::register_standard(&mut registry);
        registry
    }

    /// Registers `executor` for `id`, returning the one it replaced.
    pub fn register(
        &mut self,
        id: SkillId,
        executor: Box<dyn SkillExecutor>,
    ) -> Option<Box<dyn SkillExecutor>> {
        self.executors.insert(id, executor)
    }

    pub fn get(&self, id: SkillId) -> Option<&dyn SkillExecutor> {
        self.executors.get(&id).map(|e| e.as_ref())
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.executors.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.executors.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.executors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("skills", &self.executors.keys().collect::<Vec<_>>())
            .finish()
    }
}
