//! Scripted party-versus-dummies encounter over the loopback transport.
//!
//! Session 1 plays a warrior that cleaves, charges, drops a shockwave, and
//! double-sends a cleave. Every further session plays a rogue; the last one
//! disconnects halfway through an evasive roll.

use std::fmt;
use std::sync::Arc;

use ember_combat::executors::{CHARGE, CLEAVE, DASH, EVASIVE_ROLL, PIERCING_LANCE, SHOCKWAVE};
use ember_combat::{ActorSpec, ClientStats, ExecutorRegistry, HostStats, SkillClient, SkillHost};
use ember_config::Config;
use ember_core::{CharacterClass, EntityId, GameTime, SessionId, Side, SkillId, TickSchedule};
use ember_movement::Aabb;
use ember_net::LoopbackNetwork;
use ember_skills::{LoadoutSlot, SkillCatalog};
use glam::Vec3;
use tracing::{debug, info, warn};

const DUMMY_POSITIONS: [Vec3; 5] = [
    Vec3::new(0.0, 0.0, 3.0),
    Vec3::new(1.5, 0.0, 4.5),
    Vec3::new(-1.5, 0.0, 4.5),
    Vec3::new(0.0, 0.0, 10.0),
    Vec3::new(0.5, 0.0, 12.0),
];

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Cast(LoadoutSlot),
    /// Casts, then sends the same request a second time in the same tick.
    CastTwice(LoadoutSlot),
    Rotate(LoadoutSlot, u8),
    Equip(LoadoutSlot, SkillId),
    Disconnect,
}

#[derive(Debug, Clone, Copy)]
struct Cue {
    tick: u64,
    session: SessionId,
    action: Action,
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Remaining health of one actor at the end of the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RosterEntry {
    pub entity: EntityId,
    pub side: Side,
    pub current: f32,
    pub max: f32,
}

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session: SessionId,
    pub stats: ClientStats,
    pub connected: bool,
}

/// What the run did, printed by the binary.
#[derive(Debug, Clone)]
pub struct Summary {
    pub ticks: u64,
    pub elapsed: GameTime,
    pub host: HostStats,
    pub sessions: Vec<SessionSummary>,
    pub roster: Vec<RosterEntry>,
    /// Movement sequences still running at shutdown.
    pub interrupted: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "encounter: {} ticks ({:.2} s)",
            self.ticks,
            self.elapsed.as_secs_f64()
        )?;
        writeln!(
            f,
            "host: {} resolved, {} rejected, {} dropped, {} loadout changes",
            self.host.resolved, self.host.rejected, self.host.dropped, self.host.loadout_changes
        )?;
        for s in &self.sessions {
            writeln!(
                f,
                "session {}: {} predicted, {} gated, {} rejected, {} replayed{}",
                s.session.0,
                s.stats.predicted,
                s.stats.gated,
                s.stats.rejected,
                s.stats.replayed,
                if s.connected { "" } else { " (disconnected)" }
            )?;
        }
        writeln!(f, "roster:")?;
        for entry in &self.roster {
            writeln!(
                f,
                "  {:<5} {:<8} {:>6.1} / {:.1}",
                entry.entity.to_string(),
                format!("{:?}", entry.side),
                entry.current,
                entry.max
            )?;
        }
        write!(f, "movement interrupted at shutdown: {}", self.interrupted)
    }
}

// ---------------------------------------------------------------------------
// Encounter
// ---------------------------------------------------------------------------

pub struct Encounter {
    net: LoopbackNetwork,
    host: SkillHost,
    clients: Vec<SkillClient>,
    connected: Vec<bool>,
    /// Controlled actor of each session, indexed by `session - 1`.
    heroes: Vec<EntityId>,
    schedule: TickSchedule,
    script: Vec<Cue>,
    cursor: usize,
    total_ticks: u64,
}

impl Encounter {
    pub fn new(config: &Config, catalog: SkillCatalog) -> Self {
        let catalog = Arc::new(catalog);
        let executors = Arc::new(ExecutorRegistry::standard());
        let sessions = config.simulation.client_count.max(1);
        let net = LoopbackNetwork::new(
            sessions,
            config.network.latency_ticks,
            config.network.queue_capacity,
        );
        let host = SkillHost::new(Arc::clone(&catalog), Arc::clone(&executors))
            .with_experience_multiplier(config.skills.experience_multiplier);
        let clients = net
            .clients
            .iter()
            .map(|endpoint| {
                SkillClient::new(
                    endpoint.session(),
                    Arc::clone(&catalog),
                    Arc::clone(&executors),
                    Default::default(),
                )
            })
            .collect();

        let schedule = TickSchedule::with_tick_rate(config.simulation.tick_rate);
        let total_ticks =
            (config.simulation.duration_secs * config.simulation.tick_rate as f32).ceil() as u64;

        let mut encounter = Self {
            net,
            host,
            clients,
            connected: vec![true; sessions as usize],
            heroes: Vec::new(),
            schedule,
            script: Vec::new(),
            cursor: 0,
            total_ticks,
        };
        encounter.populate(sessions);
        encounter.script = encounter.build_script(sessions, config.network.latency_ticks);
        info!(
            actors = encounter.host.world().len(),
            cues = encounter.script.len(),
            total_ticks,
            "encounter ready"
        );
        encounter
    }

    /// Spawns on the host and mirrors the actor into every session.
    fn spawn(&mut self, spec: ActorSpec) -> EntityId {
        let id = self.host.spawn(spec.clone());
        for client in &mut self.clients {
            client.world_mut().spawn_with_id(id, spec.clone());
        }
        id
    }

    fn equip(&mut self, entity: EntityId, slot: LoadoutSlot, skill: SkillId) {
        if let Err(e) = self.host.assign_skill(entity, slot, skill) {
            warn!(%entity, %skill, %e, "starting loadout rejected");
        }
    }

    fn populate(&mut self, sessions: u32) {
        let warrior = self.spawn(
            ActorSpec::new(Side::Party, Vec3::ZERO)
                .owned_by(SessionId(1))
                .class(CharacterClass::Warrior, 3)
                .facing(Vec3::Z)
                .health(160.0),
        );
        self.equip(warrior, LoadoutSlot::Combat, CLEAVE);
        self.equip(warrior, LoadoutSlot::Utility, DASH);
        self.equip(warrior, LoadoutSlot::Ultimate, SHOCKWAVE);
        self.heroes.push(warrior);

        for n in 2..=sessions {
            let x = 2.0 + 3.0 * (n - 2) as f32;
            let rogue = self.spawn(
                ActorSpec::new(Side::Party, Vec3::new(x, 0.0, -2.0))
                    .owned_by(SessionId(n))
                    .class(CharacterClass::Rogue, 2)
                    .facing(Vec3::X),
            );
            self.equip(rogue, LoadoutSlot::Combat, PIERCING_LANCE);
            self.equip(rogue, LoadoutSlot::Utility, EVASIVE_ROLL);
            self.heroes.push(rogue);
        }

        for position in DUMMY_POSITIONS {
            self.spawn(ActorSpec::new(Side::Hostile, position).facing(Vec3::NEG_Z));
        }

        // Pillar in the first rogue's roll path. Only the host plans paths.
        self.host.world_mut().add_obstacle(Aabb::new(
            Vec3::new(4.0, -1.0, -3.0),
            Vec3::new(5.0, 2.0, -1.0),
        ));
    }

    fn build_script(&self, sessions: u32, latency_ticks: u32) -> Vec<Cue> {
        let tick_secs = self.schedule.tick_duration().as_secs_f64();
        let at = |secs: f64| (secs / tick_secs).round() as u64;
        // Host resolves a request sent at tick t on t + latency; leave the
        // sequence a couple of ticks to get going before pulling the plug.
        let mid_flight = u64::from(latency_ticks) + 2;

        let cue = |secs: f64, session: SessionId, action: Action| Cue {
            tick: at(secs),
            session,
            action,
        };

        let warrior = SessionId(1);
        let mut script = vec![
            cue(0.2, warrior, Action::Rotate(LoadoutSlot::Combat, 1)),
            cue(0.2, warrior, Action::Equip(LoadoutSlot::Combat, CHARGE)),
            cue(0.2, warrior, Action::Rotate(LoadoutSlot::Combat, 0)),
            cue(0.5, warrior, Action::Cast(LoadoutSlot::Combat)),
            cue(1.0, warrior, Action::Rotate(LoadoutSlot::Combat, 1)),
            cue(1.5, warrior, Action::Cast(LoadoutSlot::Combat)),
            cue(2.5, warrior, Action::Cast(LoadoutSlot::Ultimate)),
            cue(3.0, warrior, Action::Rotate(LoadoutSlot::Combat, 0)),
            cue(6.0, warrior, Action::CastTwice(LoadoutSlot::Combat)),
            cue(7.0, warrior, Action::Cast(LoadoutSlot::Utility)),
        ];

        for n in 2..=sessions {
            let rogue = SessionId(n);
            script.push(cue(1.0, rogue, Action::Cast(LoadoutSlot::Combat)));
            if n == sessions {
                script.push(cue(4.0, rogue, Action::Cast(LoadoutSlot::Utility)));
                script.push(Cue {
                    tick: at(4.0) + mid_flight,
                    session: rogue,
                    action: Action::Disconnect,
                });
            }
        }
        if sessions == 1 {
            script.push(Cue {
                tick: at(7.0) + mid_flight,
                session: warrior,
                action: Action::Disconnect,
            });
        }

        // Stable: cues in the same tick keep their listed order.
        script.sort_by_key(|cue| cue.tick);
        script
    }

    // -----------------------------------------------------------------------
    // Run
    // -----------------------------------------------------------------------

    /// Plays the whole script and shuts every session down.
    pub fn run(mut self) -> Summary {
        while self.schedule.total_ticks() < self.total_ticks {
            self.step();
        }
        let mut interrupted = self.host.shutdown();
        for client in &mut self.clients {
            interrupted += client.shutdown();
        }
        self.summary(interrupted)
    }

    fn step(&mut self) {
        let tick = self.schedule.total_ticks();
        let now = self.schedule.now();
        let dt = self.schedule.tick_duration();

        while let Some(cue) = self.script.get(self.cursor).copied() {
            if cue.tick > tick {
                break;
            }
            self.cursor += 1;
            self.perform(cue, tick, now);
        }

        for ((client, endpoint), connected) in self
            .clients
            .iter_mut()
            .zip(self.net.clients.iter_mut())
            .zip(&self.connected)
        {
            if *connected {
                client.pump(endpoint, tick);
            }
        }
        self.host.pump(&mut self.net.host, tick, now);
        let report = self.host.tick(dt, now);
        if !report.finished.is_empty() {
            debug!(tick, finished = ?report.finished, "host movement finished");
        }
        self.host.flush(&self.net.host, tick);
        for client in &mut self.clients {
            client.tick(dt);
        }
        self.schedule.step();
    }

    fn perform(&mut self, cue: Cue, tick: u64, now: GameTime) {
        let index = cue.session.0 as usize - 1;
        if !self.connected.get(index).copied().unwrap_or(false) {
            return;
        }
        let hero = self.heroes[index];
        let client = &mut self.clients[index];
        debug!(tick, session = %cue.session, action = ?cue.action, "cue");
        match cue.action {
            Action::Cast(slot) => {
                if let Err(e) = client.activate(hero, slot, now) {
                    info!(session = %cue.session, %hero, ?slot, %e, "scripted cast gated");
                }
            }
            Action::CastTwice(slot) => {
                if let Err(e) = client.activate(hero, slot, now) {
                    info!(session = %cue.session, %hero, ?slot, %e, "scripted cast gated");
                    return;
                }
                let endpoint = &self.net.clients[index];
                for request in client.drain_requests() {
                    for copy in [request.clone(), request] {
                        if let Err(e) = endpoint.send(copy, tick) {
                            warn!(session = %cue.session, %e, "request not sent");
                        }
                    }
                }
            }
            Action::Rotate(slot, position) => client.request_rotate(hero, slot, position),
            Action::Equip(slot, skill) => client.request_equip(hero, slot, skill),
            Action::Disconnect => {
                let interrupted = self.host.disconnect(cue.session);
                self.net.host.disconnect(cue.session);
                self.connected[index] = false;
                info!(session = %cue.session, interrupted, "scripted disconnect");
            }
        }
    }

    fn summary(&self, interrupted: usize) -> Summary {
        let world = self.host.world();
        let roster = world
            .ids()
            .into_iter()
            .filter_map(|entity| {
                let health = world.health(entity)?;
                Some(RosterEntry {
                    entity,
                    side: world.side(entity)?,
                    current: health.current,
                    max: health.max,
                })
            })
            .collect();
        Summary {
            ticks: self.schedule.total_ticks(),
            elapsed: self.schedule.now(),
            host: self.host.stats(),
            sessions: self
                .clients
                .iter()
                .zip(&self.connected)
                .map(|(client, connected)| SessionSummary {
                    session: client.session(),
                    stats: client.stats(),
                    connected: *connected,
                })
                .collect(),
            roster,
            interrupted,
        }
    }
}
