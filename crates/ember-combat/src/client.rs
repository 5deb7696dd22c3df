//! Owning-session side of the protocol: local gating, prediction, and replay.
//!
//! Everything a client holds about gameplay is a mirror. The optimistic
//! cooldown start written at prediction time is never rolled back; the host's
//! `ActivationRejected` or `InstanceSync` notice simply overwrites it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ember_core::{EntityId, GameTime, SessionId, SkillId};
use ember_effects::EffectMirror;
use ember_movement::{MovementSequencer, TickReport};
use ember_net::{Broadcast, ClientEndpoint, ClientRequest, HostNotice, Message, RejectReason};
use ember_skills::{GateReason, Loadout, LoadoutSlot, SkillCatalog};

use crate::arena::ArenaWorld;
use crate::executor::{ExecutorRegistry, PredictContext, movement_for};
use crate::presentation::{Presentation, PresentationLog};
use crate::ActivationError;

/// Per-(entity, skill) protocol state. `Predicting` never outlives one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SkillPhase {
    #[default]
    Ready,
    Predicting,
    AwaitingResolution { sequence: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    pub predicted: u64,
    /// Activations stopped by the local gate; nothing was sent.
    pub gated: u64,
    pub rejected: u64,
    pub replayed: u64,
}

/// One session's view of the arena plus its pending requests.
pub struct SkillClient<P: Presentation = PresentationLog> {
    session: SessionId,
    world: ArenaWorld,
    catalog: Arc<SkillCatalog>,
    executors: Arc<ExecutorRegistry>,
    sequencer: MovementSequencer,
    effects: EffectMirror,
    phases: BTreeMap<(EntityId, SkillId), SkillPhase>,
    next_sequence: u32,
    outbox: Vec<ClientRequest>,
    presentation: P,
    stats: ClientStats,
}

impl<P: Presentation> SkillClient<P> {
    pub fn new(
        session: SessionId,
        catalog: Arc<SkillCatalog>,
        executors: Arc<ExecutorRegistry>,
        presentation: P,
    ) -> Self {
        Self {
            session,
            world: ArenaWorld::new(),
            catalog,
            executors,
            sequencer: MovementSequencer::new(),
            effects: EffectMirror::new(),
            phases: BTreeMap::new(),
            next_sequence: 1,
            outbox: Vec::new(),
            presentation,
            stats: ClientStats::default(),
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// The mirrored arena. Possibly stale; never gameplay truth.
    pub fn world(&self) -> &ArenaWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ArenaWorld {
        &mut self.world
    }

    pub fn effect_mirror(&self) -> &EffectMirror {
        &self.effects
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    pub fn sequencer(&self) -> &MovementSequencer {
        &self.sequencer
    }

    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    pub fn phase(&self, entity: EntityId, skill: SkillId) -> SkillPhase {
        self.phases
            .get(&(entity, skill))
            .copied()
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Predict + request
    // -----------------------------------------------------------------------

    /// Casts the active skill of `slot`. On success the prediction has played,
    /// the mirror's cooldown has started, and a request is queued; the
    /// request's sequence number is returned. On failure only a local message
    /// is shown.
    pub fn activate(
        &mut self,
        entity: EntityId,
        slot: LoadoutSlot,
        now: GameTime,
    ) -> Result<u32, ActivationError> {
        match self.gate(entity, slot, now) {
            Ok(skill) => Ok(self.predict(entity, skill, slot, now)),
            Err(err) => {
                self.stats.gated += 1;
                tracing::debug!(session = %self.session, %entity, ?slot, %err, "activation gated locally");
                self.presentation.local_message(entity, &err.to_string());
                Err(err)
            }
        }
    }

    /// Local gate against the mirror. Same order as the host.
    fn gate(
        &self,
        entity: EntityId,
        slot: LoadoutSlot,
        now: GameTime,
    ) -> Result<SkillId, ActivationError> {
        let owner = self
            .world
            .ownership(entity)
            .ok_or(ActivationError::UnknownEntity(entity))?
            .controller();
        if owner != self.session {
            return Err(ActivationError::AuthorityViolation {
                entity,
                owner,
                from: self.session,
            });
        }
        let book = self
            .world
            .skill_book(entity)
            .ok_or(ActivationError::UnknownEntity(entity))?;
        let skill = book
            .active_skill(slot)
            .ok_or(ActivationError::GateRejected(GateReason::NotEquipped))?;
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
        let remaining = book
            .instance(skill)
            .map_or(Duration::ZERO, |instance| instance.remaining_cooldown(def, now));
        if !remaining.is_zero() {
            return Err(ActivationError::CooldownRejected { remaining });
        }
        Ok(skill)
    }

    fn predict(&mut self, entity: EntityId, skill: SkillId, slot: LoadoutSlot, now: GameTime) -> u32 {
        self.phases.insert((entity, skill), SkillPhase::Predicting);
        let catalog = Arc::clone(&self.catalog);
        let executors = Arc::clone(&self.executors);

        let position = self.world.position(entity).unwrap_or_default();
        let facing = self.world.facing(entity).unwrap_or(glam::Vec3::Z);
        let mut level = 1;
        if let Some(def) = catalog.get(skill) {
            if let Some(book) = self.world.skill_book_mut(entity) {
                let instance = book.get_or_create_instance(def);
                instance.mark_activated(now);
                level = instance.level();
            }
            if let Some(executor) = executors.get(skill) {
                let ctx = PredictContext {
                    caster: entity,
                    position,
                    facing,
                    level,
                    def,
                };
                executor.predict(&ctx, &mut self.presentation);
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.phases
            .insert((entity, skill), SkillPhase::AwaitingResolution { sequence });
        self.outbox.push(ClientRequest::ActivateSkill {
            entity,
            skill,
            slot,
            sequence,
        });
        self.stats.predicted += 1;
        tracing::debug!(session = %self.session, %entity, %skill, sequence, "activation predicted");
        sequence
    }

    /// Asks the host to equip `skill`. The mirror changes only when the host
    /// answers.
    pub fn request_equip(&mut self, entity: EntityId, slot: LoadoutSlot, skill: SkillId) {
        self.outbox.push(ClientRequest::EquipSkill {
            entity,
            slot,
            skill,
        });
    }

    pub fn request_rotate(&mut self, entity: EntityId, slot: LoadoutSlot, index: u8) {
        self.outbox.push(ClientRequest::RotateLoadout {
            entity,
            slot,
            index,
        });
    }

    /// Hands out queued requests.
    pub fn drain_requests(&mut self) -> Vec<ClientRequest> {
        std::mem::take(&mut self.outbox)
    }

    // -----------------------------------------------------------------------
    // Host traffic
    // -----------------------------------------------------------------------

    pub fn handle(&mut self, message: Message) {
        match message {
            Message::Notice(notice) => self.handle_notice(notice),
            Message::Broadcast(broadcast) => self.handle_broadcast(broadcast),
            Message::Request(request) => {
                tracing::warn!(session = %self.session, ?request, "client ignoring request");
            }
        }
    }

    fn handle_notice(&mut self, notice: HostNotice) {
        match notice {
            HostNotice::ActivationRejected {
                entity,
                skill,
                sequence,
                reason,
                mirror,
            } => {
                if self.phase(entity, skill) == (SkillPhase::AwaitingResolution { sequence }) {
                    self.phases.insert((entity, skill), SkillPhase::Ready);
                }
                if let (Some(instance), Some(book)) = (mirror, self.world.skill_book_mut(entity)) {
                    book.replace_instance(instance);
                }
                self.stats.rejected += 1;
                tracing::debug!(session = %self.session, %entity, %skill, sequence, ?reason, "activation rejected by host");
                self.presentation.local_message(entity, &describe(reason));
            }
            HostNotice::InstanceSync { entity, instance } => {
                if let Some(book) = self.world.skill_book_mut(entity) {
                    book.replace_instance(instance);
                }
            }
            HostNotice::LoadoutSync { entity, loadout } => {
                self.apply_loadout(entity, loadout);
            }
            HostNotice::LoadoutRejected {
                entity,
                error,
                loadout,
            } => {
                self.apply_loadout(entity, loadout);
                self.presentation.local_message(entity, &error.to_string());
            }
        }
    }

    fn apply_loadout(&mut self, entity: EntityId, loadout: Loadout) {
        let catalog = Arc::clone(&self.catalog);
        let Some(book) = self.world.skill_book_mut(entity) else {
            return;
        };
        book.replace_loadout(loadout);
        for slot in LoadoutSlot::ALL {
            for skill in loadout.slot(slot).set.iter().flatten() {
                if let Some(def) = catalog.get(*skill) {
                    book.get_or_create_instance(def);
                }
            }
        }
    }

    fn handle_broadcast(&mut self, broadcast: Broadcast) {
        match broadcast {
            Broadcast::SkillResolved {
                caster,
                skill,
                level,
                payload,
            } => {
                let executors = Arc::clone(&self.executors);
                match executors.get(skill) {
                    Some(executor) => executor.replay(caster, &payload, &mut self.presentation),
                    None => tracing::warn!(%caster, %skill, "no executor to replay"),
                }
                if let Some(sequence) = movement_for(caster, &payload) {
                    self.sequencer.start(&mut self.world, sequence);
                }
                if matches!(self.phase(caster, skill), SkillPhase::AwaitingResolution { .. }) {
                    self.phases.insert((caster, skill), SkillPhase::Ready);
                }
                self.stats.replayed += 1;
                tracing::trace!(session = %self.session, %caster, %skill, level, "resolution replayed");
            }
            Broadcast::EntityState {
                entity,
                position,
                health,
                alive,
            } => {
                // A running local sequence owns the position until it ends.
                if !self.sequencer.is_moving(entity) {
                    self.world.set_position(entity, position);
                }
                self.world
                    .set_health(entity, if alive { health } else { 0.0 });
            }
            Broadcast::EffectSnapshot { entity, snapshot } => {
                self.effects.update(entity, snapshot);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tick and transport
    // -----------------------------------------------------------------------

    /// Advances local movement replays.
    pub fn tick(&mut self, dt: Duration) -> TickReport {
        self.sequencer.tick(&mut self.world, dt)
    }

    /// Handles everything due at `tick`, then sends queued requests.
    pub fn pump(&mut self, endpoint: &mut ClientEndpoint, tick: u64) {
        for message in endpoint.poll(tick) {
            self.handle(message);
        }
        self.flush(endpoint, tick);
    }

    /// Sends queued requests. Returns how many failed.
    pub fn flush(&mut self, endpoint: &ClientEndpoint, tick: u64) -> usize {
        let mut failed = 0;
        for request in self.drain_requests() {
            if let Err(err) = endpoint.send(request, tick) {
                tracing::warn!(session = %self.session, %err, "request not sent");
                failed += 1;
            }
        }
        failed
    }

    /// Releases every local movement lease.
    pub fn shutdown(&mut self) -> usize {
        self.sequencer.interrupt_all(&mut self.world)
    }
}

fn describe(reason: RejectReason) -> String {
    match reason {
        RejectReason::Cooldown { remaining_ms } => format!("not ready ({remaining_ms} ms)"),
        RejectReason::Gate(gate) => gate.to_string(),
        RejectReason::UnknownSkill => "unknown skill".to_owned(),
    }
}

impl<P: Presentation> std::fmt::Debug for SkillClient<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillClient")
            .field("session", &self.session)
            .field("entities", &self.world.len())
            .field("pending", &self.outbox.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;
