//! Authoritative host: validates requests, resolves, replicates.
//!
//! Everything here runs on one logical thread per host tick. Requests are
//! handled strictly in arrival order, so a second activation inside one
//! cooldown window always sees the first one's `last_activation`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use ember_core::{EntityId, GameTime, SessionId, SkillId};
use ember_effects::EffectSnapshot;
use ember_movement::{MovementSequencer, TickReport};
use ember_net::{Broadcast, ClientRequest, HostEndpoint, HostNotice};
use ember_skills::{
    GateReason, Loadout, LoadoutError, LoadoutSlot, SkillBook, SkillCatalog, SkillDefinition,
    SkillInstance,
};
use ember_targeting::EntityIndex;
use glam::Vec3;

use crate::arena::{ActorSpec, ArenaWorld};
use crate::executor::{ExecutorRegistry, ResolveContext, Resolution, movement_for};
use crate::hostiles::HostileBrain;
use crate::presentation::{NullPresentation, Presentation};
use crate::ActivationError;

// ---------------------------------------------------------------------------
// Outbound traffic
// ---------------------------------------------------------------------------

/// A message the host wants delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Host → owning session.
    Notice { to: SessionId, notice: HostNotice },
    /// Host → every session.
    Broadcast(Broadcast),
}

/// Running counters, for the simulation summary and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub resolved: u64,
    /// Rejections the requester was told about.
    pub rejected: u64,
    /// Requests dropped without a reply (authority, unknown entity).
    pub dropped: u64,
    pub loadout_changes: u64,
}

// ---------------------------------------------------------------------------
// SkillHost
// ---------------------------------------------------------------------------

/// The single writer of gameplay truth.
pub struct SkillHost {
    world: ArenaWorld,
    catalog: Arc<SkillCatalog>,
    executors: Arc<ExecutorRegistry>,
    sequencer: MovementSequencer,
    hostiles: HostileBrain,
    presentation: Box<dyn Presentation>,
    outbox: Vec<Outbound>,
    experience_multiplier: f32,
    stats: HostStats,
}

impl SkillHost {
    pub fn new(catalog: Arc<SkillCatalog>, executors: Arc<ExecutorRegistry>) -> Self {
        Self {
            world: ArenaWorld::new(),
            catalog,
            executors,
            sequencer: MovementSequencer::new(),
            hostiles: HostileBrain::new(),
            presentation: Box::new(NullPresentation),
            outbox: Vec::new(),
            experience_multiplier: 1.0,
            stats: HostStats::default(),
        }
    }

    /// Scales every XP grant.
    pub fn with_experience_multiplier(mut self, multiplier: f32) -> Self {
        self.experience_multiplier = multiplier.max(0.0);
        self
    }

    /// Where the host's own replay phase draws.
    pub fn with_presentation(mut self, presentation: Box<dyn Presentation>) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn world(&self) -> &ArenaWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ArenaWorld {
        &mut self.world
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    pub fn sequencer(&self) -> &MovementSequencer {
        &self.sequencer
    }

    pub fn spawn(&mut self, spec: ActorSpec) -> EntityId {
        self.world.spawn(spec)
    }

    /// Host-side setup: equips `skill` for `entity` without an authority
    /// check and tells the owner. An entity without a skill book reports
    /// the skill as unknown.
    pub fn assign_skill(
        &mut self,
        entity: EntityId,
        slot: LoadoutSlot,
        skill: SkillId,
    ) -> Result<Option<SkillId>, LoadoutError> {
        let catalog = Arc::clone(&self.catalog);
        let book = self
            .world
            .skill_book_mut(entity)
            .ok_or(LoadoutError::UnknownSkill(skill))?;
        let previous = book.equip(&catalog, slot, skill)?;
        let loadout = *book.loadout();
        self.notify_owner(entity, HostNotice::LoadoutSync { entity, loadout });
        Ok(previous)
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Handles one request from `from`. The session id comes from the
    /// transport, never from the payload.
    pub fn handle_request(&mut self, from: SessionId, request: ClientRequest, now: GameTime) {
        match request {
            ClientRequest::ActivateSkill {
                entity,
                skill,
                slot,
                sequence,
            } => {
                // Outcomes are already logged and queued for delivery.
                let _ = self.activate(from, entity, skill, slot, sequence, now);
            }
            ClientRequest::EquipSkill {
                entity,
                slot,
                skill,
            } => {
                self.change_loadout(from, entity, |book, catalog| {
                    book.equip(catalog, slot, skill).map(|_| ())
                });
            }
            ClientRequest::RotateLoadout {
                entity,
                slot,
                index,
            } => {
                self.change_loadout(from, entity, |book, _| book.rotate(slot, index));
            }
        }
    }

    /// Validates and resolves one activation. Nothing is mutated unless every
    /// check passes.
    pub fn activate(
        &mut self,
        from: SessionId,
        entity: EntityId,
        skill: SkillId,
        slot: LoadoutSlot,
        sequence: u32,
        now: GameTime,
    ) -> Result<Resolution, ActivationError> {
        if let Err(err) = self.validate(from, entity, skill, slot, now) {
            self.report_rejection(from, entity, skill, sequence, &err);
            return Err(err);
        }
        self.resolve(entity, skill, now)
    }

    /// Every check an activation must pass, in order. Read-only.
    pub fn validate(
        &self,
        from: SessionId,
        entity: EntityId,
        skill: SkillId,
        slot: LoadoutSlot,
        now: GameTime,
    ) -> Result<(), ActivationError> {
        self.authorize(from, entity)?;
        let def = self
            .catalog
            .get(skill)
            .ok_or(ActivationError::UnknownSkill(skill))?;
        if def.passive {
            return Err(ActivationError::GateRejected(GateReason::Passive));
        }
        if !self.executors.contains(skill) {
            return Err(ActivationError::UnknownSkill(skill));
        }
        if !self.world.is_alive(entity) {
            return Err(ActivationError::GateRejected(GateReason::Dead));
        }
        let character = self.world.character(entity).unwrap_or_default();
        def.gate
            .check(character.class, character.level)
            .map_err(ActivationError::GateRejected)?;

        let book = self
            .world
            .skill_book(entity)
            .ok_or(ActivationError::UnknownEntity(entity))?;
        if book.active_skill(slot) != Some(skill) {
            return Err(ActivationError::GateRejected(GateReason::NotEquipped));
        }
        let remaining = book
            .instance(skill)
            .map_or(Duration::ZERO, |instance| instance.remaining_cooldown(def, now));
        if !remaining.is_zero() {
            return Err(ActivationError::CooldownRejected { remaining });
        }
        Ok(())
    }

    /// Only the owning session (or the host, for unowned entities) may act.
    fn authorize(&self, from: SessionId, entity: EntityId) -> Result<(), ActivationError> {
        let owner = self
            .world
            .ownership(entity)
            .ok_or(ActivationError::UnknownEntity(entity))?
            .controller();
        if owner != from {
            return Err(ActivationError::AuthorityViolation {
                entity,
                owner,
                from,
            });
        }
        Ok(())
    }

    fn report_rejection(
        &mut self,
        from: SessionId,
        entity: EntityId,
        skill: SkillId,
        sequence: u32,
        err: &ActivationError,
    ) {
        match err {
            ActivationError::AuthorityViolation { .. } => {
                tracing::warn!(session = %from, %entity, %skill, %err, "request dropped");
            }
            ActivationError::UnknownEntity(_) => {
                tracing::warn!(session = %from, %entity, %skill, "request for unknown entity dropped");
            }
            ActivationError::UnknownSkill(_) => {
                tracing::error!(session = %from, %entity, %skill, "activation of unknown skill");
            }
            ActivationError::GateRejected(_) | ActivationError::CooldownRejected { .. } => {
                tracing::debug!(session = %from, %entity, %skill, %err, "activation rejected");
            }
        }
        let Some(reason) = err.reject_reason() else {
            self.stats.dropped += 1;
            return;
        };
        self.stats.rejected += 1;
        let mirror = self
            .world
            .skill_book(entity)
            .and_then(|book| book.instance(skill))
            .cloned();
        if !from.is_host() {
            self.outbox.push(Outbound::Notice {
                to: from,
                notice: HostNotice::ActivationRejected {
                    entity,
                    skill,
                    sequence,
                    reason,
                    mirror,
                },
            });
        }
    }

    /// Mutation half of an activation. Callers have validated.
    fn resolve(
        &mut self,
        entity: EntityId,
        skill: SkillId,
        now: GameTime,
    ) -> Result<Resolution, ActivationError> {
        let catalog = Arc::clone(&self.catalog);
        let executors = Arc::clone(&self.executors);
        let def = catalog
            .get(skill)
            .ok_or(ActivationError::UnknownSkill(skill))?;
        let executor = executors
            .get(skill)
            .ok_or(ActivationError::UnknownSkill(skill))?;
        let view = self
            .world
            .entity(entity)
            .ok_or(ActivationError::UnknownEntity(entity))?;
        let facing = self.world.facing(entity).unwrap_or(Vec3::Z);

        let level = {
            let book = self
                .world
                .skill_book_mut(entity)
                .ok_or(ActivationError::UnknownEntity(entity))?;
            let instance = book.get_or_create_instance(def);
            instance.mark_activated(now);
            instance.level()
        };

        let mut ctx = ResolveContext {
            caster: entity,
            side: view.side,
            origin: view.position,
            facing,
            level,
            def,
            now,
            world: &mut self.world,
        };
        let resolution = executor.resolve(&mut ctx);

        let instance = self.grant_experience(entity, def, resolution.target_count());
        tracing::info!(
            caster = %entity,
            skill = %skill,
            name = %def.name,
            level,
            targets = resolution.target_count(),
            bonus = resolution.payload.bonus,
            "skill resolved"
        );

        if let Some(instance) = instance {
            self.notify_owner(entity, HostNotice::InstanceSync { entity, instance });
        }
        self.outbox.push(Outbound::Broadcast(Broadcast::SkillResolved {
            caster: entity,
            skill,
            level,
            payload: resolution.payload.clone(),
        }));
        for affected in &resolution.affected {
            self.push_entity_state(*affected, now);
        }

        // Local replay: VFX and movement only.
        executor.replay(entity, &resolution.payload, self.presentation.as_mut());
        if let Some(sequence) = movement_for(entity, &resolution.payload) {
            self.sequencer.start(&mut self.world, sequence);
        }
        self.stats.resolved += 1;
        Ok(resolution)
    }

    /// `(xp_per_cast + xp_per_target * targets) * multiplier`. Returns the
    /// updated instance.
    fn grant_experience(
        &mut self,
        entity: EntityId,
        def: &SkillDefinition,
        targets: u32,
    ) -> Option<SkillInstance> {
        let base = def
            .xp_per_cast
            .saturating_add(def.xp_per_target.saturating_mul(targets));
        let amount = (base as f32 * self.experience_multiplier).round() as u32;
        let instance = self.world.skill_book_mut(entity)?.instance_mut(def.id)?;
        let gained = instance.add_experience(def, amount);
        if gained > 0 {
            tracing::info!(%entity, skill = %def.id, level = instance.level(), "skill levelled up");
        }
        Some(instance.clone())
    }

    fn change_loadout(
        &mut self,
        from: SessionId,
        entity: EntityId,
        change: impl FnOnce(&mut SkillBook, &SkillCatalog) -> Result<(), LoadoutError>,
    ) -> Option<Result<Loadout, LoadoutError>> {
        if let Err(err) = self.authorize(from, entity) {
            tracing::warn!(session = %from, %entity, %err, "loadout request dropped");
            self.stats.dropped += 1;
            return None;
        }
        let catalog = Arc::clone(&self.catalog);
        let book = self.world.skill_book_mut(entity)?;
        let outcome = change(book, &catalog);
        let loadout = *book.loadout();
        let notice = match &outcome {
            Ok(()) => {
                self.stats.loadout_changes += 1;
                tracing::debug!(%entity, "loadout changed");
                HostNotice::LoadoutSync { entity, loadout }
            }
            Err(error) => {
                tracing::debug!(%entity, %error, "loadout change rejected");
                HostNotice::LoadoutRejected {
                    entity,
                    error: error.clone(),
                    loadout,
                }
            }
        };
        self.notify_owner(entity, notice);
        Some(outcome.map(|()| loadout))
    }

    // -----------------------------------------------------------------------
    // Tick and sessions
    // -----------------------------------------------------------------------

    /// Expires effects, runs hostiles, and advances movement sequences by
    /// one tick.
    pub fn tick(&mut self, dt: Duration, now: GameTime) -> TickReport {
        for (entity, expired) in self.world.expire_effects(now) {
            tracing::trace!(%entity, ?expired, "effects expired");
            self.push_effects(entity, now);
        }
        let hostiles = self.hostiles.tick(&mut self.world, dt, now);
        let touched: BTreeSet<EntityId> = hostiles
            .moved
            .iter()
            .copied()
            .chain(hostiles.strikes.iter().map(|strike| strike.target))
            .collect();
        for entity in touched {
            self.push_entity_state(entity, now);
        }
        self.sequencer.tick(&mut self.world, dt)
    }

    /// Forgets a session: interrupts movement on everything it owns.
    pub fn disconnect(&mut self, session: SessionId) -> usize {
        let mut interrupted = 0;
        for entity in self.world.owned_by(session) {
            if self.sequencer.interrupt(&mut self.world, entity) {
                interrupted += 1;
            }
        }
        tracing::info!(%session, interrupted, "session disconnected");
        interrupted
    }

    /// Releases every movement lease. Call before dropping the host.
    pub fn shutdown(&mut self) -> usize {
        self.sequencer.interrupt_all(&mut self.world)
    }

    /// Removes an entity. A running movement sequence is dropped next tick.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        self.world.despawn(entity)
    }

    // -----------------------------------------------------------------------
    // Outbox
    // -----------------------------------------------------------------------

    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Polls requests due at `tick`, handles them in arrival order, and sends
    /// everything queued.
    pub fn pump(&mut self, endpoint: &mut HostEndpoint, tick: u64, now: GameTime) {
        for (from, request) in endpoint.poll_requests(tick) {
            self.handle_request(from, request, now);
        }
        self.flush(endpoint, tick);
    }

    /// Sends the outbox. Returns how many messages could not be delivered.
    pub fn flush(&mut self, endpoint: &HostEndpoint, tick: u64) -> usize {
        let mut failed = 0;
        for outbound in self.drain_outbox() {
            match outbound {
                Outbound::Notice { to, notice } => {
                    if let Err(err) = endpoint.send_to(to, notice, tick) {
                        tracing::warn!(session = %to, %err, "notice not delivered");
                        failed += 1;
                    }
                }
                Outbound::Broadcast(broadcast) => {
                    endpoint.broadcast(broadcast, tick);
                }
            }
        }
        failed
    }

    fn notify_owner(&mut self, entity: EntityId, notice: HostNotice) {
        let Some(owner) = self.world.ownership(entity).and_then(|o| o.0) else {
            return;
        };
        if !owner.is_host() {
            self.outbox.push(Outbound::Notice { to: owner, notice });
        }
    }

    fn push_entity_state(&mut self, entity: EntityId, now: GameTime) {
        if let (Some(position), Some(health)) = (self.world.position(entity), self.world.health(entity)) {
            self.outbox.push(Outbound::Broadcast(Broadcast::EntityState {
                entity,
                position,
                health: health.current,
                alive: health.is_alive(),
            }));
        }
        self.push_effects(entity, now);
    }

    fn push_effects(&mut self, entity: EntityId, now: GameTime) {
        if let Some(table) = self.world.effects(entity) {
            let snapshot = EffectSnapshot::capture(table, now);
            self.outbox.push(Outbound::Broadcast(Broadcast::EffectSnapshot {
                entity,
                snapshot,
            }));
        }
    }
}

impl std::fmt::Debug for SkillHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillHost")
            .field("entities", &self.world.len())
            .field("moving", &self.sequencer.len())
            .field("queued", &self.outbox.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod host_tests;
