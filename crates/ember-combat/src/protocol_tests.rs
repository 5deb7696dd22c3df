//! Host and client sessions wired over the loopback transport.

use std::sync::Arc;
use std::time::Duration;

use ember_core::{CharacterClass, EntityId, GameTime, SessionId, Side, SkillId};
use ember_movement::{MovementBody, MovementState};
use ember_net::{ClientRequest, LoopbackNetwork};
use ember_skills::{LoadoutSlot, SkillCatalog};
use glam::Vec3;

use crate::executors::{CLEAVE, DASH, PROVOKE, SHOCKWAVE};
use crate::{ActorSpec, ExecutorRegistry, SkillClient, SkillHost, SkillPhase};

const DT: Duration = Duration::from_millis(50);
const PLAYER: SessionId = SessionId(1);
const OBSERVER: SessionId = SessionId(2);

struct Match {
    net: LoopbackNetwork,
    host: SkillHost,
    clients: Vec<SkillClient>,
    tick: u64,
}

impl Match {
    /// Two client sessions, one tick of latency each way.
    fn new() -> Self {
        let catalog = Arc::new(SkillCatalog::builtin().unwrap());
        let executors = Arc::new(ExecutorRegistry::standard());
        let net = LoopbackNetwork::new(2, 1, 64);
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
        Self {
            net,
            host: SkillHost::new(catalog, executors),
            clients,
            tick: 0,
        }
    }

    fn now(&self) -> GameTime {
        GameTime(self.tick * DT.as_micros() as u64)
    }

    /// Spawns on the host and mirrors the actor into every session.
    fn spawn(&mut self, spec: ActorSpec) -> EntityId {
        let id = self.host.spawn(spec.clone());
        for client in &mut self.clients {
            client.world_mut().spawn_with_id(id, spec.clone());
        }
        id
    }

    fn client(&mut self, session: SessionId) -> &mut SkillClient {
        &mut self.clients[session.0 as usize - 1]
    }

    fn step(&mut self) {
        let tick = self.tick;
        let now = self.now();
        for (client, endpoint) in self.clients.iter_mut().zip(&mut self.net.clients) {
            client.pump(endpoint, tick);
        }
        self.host.pump(&mut self.net.host, tick, now);
        self.host.tick(DT, now);
        self.host.flush(&self.net.host, tick);
        for client in &mut self.clients {
            client.tick(DT);
        }
        self.tick += 1;
    }

    fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Raw request from `session`, bypassing its local gate.
    fn send_raw(&self, session: SessionId, request: ClientRequest) {
        self.net.clients[session.0 as usize - 1]
            .send(request, self.tick)
            .unwrap();
    }
}

/// A level-3 warrior owned by `PLAYER` with Cleave, Dash, and Shockwave,
/// whose loadout has already reached the owning session.
fn warrior(game: &mut Match) -> EntityId {
    let hero = game.spawn(
        ActorSpec::new(Side::Party, Vec3::ZERO)
            .owned_by(PLAYER)
            .class(CharacterClass::Warrior, 3),
    );
    game.host.assign_skill(hero, LoadoutSlot::Combat, CLEAVE).unwrap();
    game.host.assign_skill(hero, LoadoutSlot::Utility, DASH).unwrap();
    game.host
        .assign_skill(hero, LoadoutSlot::Ultimate, SHOCKWAVE)
        .unwrap();
    game.host.flush(&game.net.host, game.tick);
    game.run(2);
    hero
}

fn dummies(game: &mut Match, distances: &[f32]) -> Vec<EntityId> {
    distances
        .iter()
        .map(|z| game.spawn(ActorSpec::new(Side::Hostile, Vec3::new(0.0, 0.0, *z))))
        .collect()
}

#[test]
fn test_loadout_reaches_owner_only() {
    let mut game = Match::new();
    let hero = warrior(&mut game);

    let book = game.client(PLAYER).world().skill_book(hero).unwrap();
    assert_eq!(book.active_skill(LoadoutSlot::Utility), Some(DASH));
    assert!(book.knows(SHOCKWAVE));
    let observer = game.client(OBSERVER).world().skill_book(hero).unwrap();
    assert_eq!(observer.active_skill(LoadoutSlot::Combat), None);
}

#[test]
fn test_cone_activation_end_to_end() {
    let mut game = Match::new();
    let hero = warrior(&mut game);
    let targets = dummies(&mut game, &[2.0, 5.0, 8.0]);

    let now = game.now();
    let sequence = game
        .client(PLAYER)
        .activate(hero, LoadoutSlot::Combat, now)
        .unwrap();
    assert_eq!(
        game.client(PLAYER).phase(hero, CLEAVE),
        SkillPhase::AwaitingResolution { sequence }
    );

    // Request out, resolution on the host, replication back.
    game.run(3);

    assert_eq!(game.host.stats().resolved, 1);
    let host_world = game.host.world();
    assert!(host_world.health(targets[0]).unwrap().current < 100.0);
    assert!(host_world.health(targets[1]).unwrap().current < 100.0);
    assert_eq!(host_world.health(targets[2]).unwrap().current, 100.0);

    let player = game.client(PLAYER);
    assert_eq!(player.phase(hero, CLEAVE), SkillPhase::Ready);
    assert_eq!(player.presentation().effect_count("cleave_hit"), 2);
    assert_eq!(player.presentation().effect_count("cleave_swing"), 1);
    let player_health = player.world().health(targets[0]).unwrap().current;

    let observer = game.client(OBSERVER);
    assert_eq!(observer.stats().replayed, 1);
    assert_eq!(observer.presentation().effect_count("cleave_hit"), 2);
    assert_eq!(observer.presentation().effect_count("cleave_swing"), 0);
    assert_eq!(observer.world().health(targets[0]).unwrap().current, player_health);
    assert_eq!(observer.world().health(targets[2]).unwrap().current, 100.0);
}

#[test]
fn test_duplicate_request_resolves_once() {
    let mut game = Match::new();
    let hero = warrior(&mut game);
    let targets = dummies(&mut game, &[2.0]);

    let now = game.now();
    game.client(PLAYER)
        .activate(hero, LoadoutSlot::Combat, now)
        .unwrap();
    game.step();
    // A retransmission lands one host tick after the original.
    game.send_raw(
        PLAYER,
        ClientRequest::ActivateSkill {
            entity: hero,
            skill: CLEAVE,
            slot: LoadoutSlot::Combat,
            sequence: 2,
        },
    );
    game.run(3);

    let stats = game.host.stats();
    assert_eq!((stats.resolved, stats.rejected), (1, 1));
    // One level-1 Cleave hit.
    assert_eq!(game.host.world().health(targets[0]).unwrap().current, 70.0);

    let host_instance = game
        .host
        .world()
        .skill_book(hero)
        .unwrap()
        .instance(CLEAVE)
        .unwrap()
        .clone();
    let player = game.client(PLAYER);
    assert_eq!(player.stats().rejected, 1);
    assert_eq!(player.stats().replayed, 1);
    assert_eq!(
        player.world().skill_book(hero).unwrap().instance(CLEAVE),
        Some(&host_instance)
    );
    assert!(player.presentation().messages().any(|m| m.contains("not ready")));
}

#[test]
fn test_foreign_session_cannot_cast() {
    let mut game = Match::new();
    let hero = warrior(&mut game);
    let targets = dummies(&mut game, &[2.0]);

    game.send_raw(
        OBSERVER,
        ClientRequest::ActivateSkill {
            entity: hero,
            skill: CLEAVE,
            slot: LoadoutSlot::Combat,
            sequence: 1,
        },
    );
    game.run(3);

    assert_eq!(game.host.stats().dropped, 1);
    assert_eq!(game.host.world().health(targets[0]).unwrap().current, 100.0);
    assert_eq!(
        game.host
            .world()
            .skill_book(hero)
            .unwrap()
            .instance(CLEAVE)
            .unwrap()
            .last_activation(),
        None
    );
    // Silently dropped: neither session hears about it.
    assert_eq!(game.client(OBSERVER).stats().rejected, 0);
    assert_eq!(game.client(PLAYER).stats().rejected, 0);
}

#[test]
fn test_unknown_skill_reported_to_owner() {
    let mut game = Match::new();
    let hero = warrior(&mut game);

    game.send_raw(
        PLAYER,
        ClientRequest::ActivateSkill {
            entity: hero,
            skill: SkillId(999),
            slot: LoadoutSlot::Combat,
            sequence: 7,
        },
    );
    game.run(3);

    assert_eq!(game.host.stats().rejected, 1);
    let player = game.client(PLAYER);
    assert_eq!(player.stats().rejected, 1);
    assert!(player.presentation().messages().any(|m| m == "unknown skill"));
}

#[test]
fn test_dash_replays_on_every_session() {
    let mut game = Match::new();
    let hero = warrior(&mut game);

    let now = game.now();
    game.client(PLAYER)
        .activate(hero, LoadoutSlot::Utility, now)
        .unwrap();
    game.run(10);

    let end = game.host.world().position(hero).unwrap();
    assert!((end.z - 6.0).abs() < 1e-4, "dash ended at {end}");
    assert!(!game.host.sequencer().is_moving(hero));
    for session in [PLAYER, OBSERVER] {
        let client = game.client(session);
        assert!(!client.sequencer().is_moving(hero));
        assert_eq!(client.world().position(hero), Some(end));
        assert_eq!(
            MovementBody::movement_state(client.world(), hero),
            Some(MovementState::FREE)
        );
    }
}

#[test]
fn test_disconnect_mid_dash_restores_state() {
    let mut game = Match::new();
    let hero = warrior(&mut game);

    let now = game.now();
    game.client(PLAYER)
        .activate(hero, LoadoutSlot::Utility, now)
        .unwrap();
    // Request arrives and the host starts moving the warrior.
    game.run(2);
    assert!(game.host.sequencer().is_moving(hero));
    assert_eq!(
        MovementBody::movement_state(game.host.world(), hero),
        Some(MovementState::EXCLUSIVE)
    );

    assert_eq!(game.host.disconnect(PLAYER), 1);
    assert!(game.net.host.disconnect(PLAYER));
    let stopped = game.host.world().position(hero).unwrap();
    game.run(6);

    assert!(!game.host.sequencer().is_moving(hero));
    assert_eq!(
        MovementBody::movement_state(game.host.world(), hero),
        Some(MovementState::FREE)
    );
    assert_eq!(game.host.world().position(hero), Some(stopped));
    assert!(stopped.z < 6.0);
}

#[test]
fn test_equip_round_trip() {
    let mut game = Match::new();
    let hero = warrior(&mut game);

    game.client(PLAYER)
        .request_equip(hero, LoadoutSlot::Combat, PROVOKE);
    game.client(PLAYER)
        .request_equip(hero, LoadoutSlot::Utility, CLEAVE);
    game.run(3);

    assert_eq!(game.host.stats().loadout_changes, 1);
    let player = game.client(PLAYER);
    let book = player.world().skill_book(hero).unwrap();
    assert_eq!(book.active_skill(LoadoutSlot::Combat), Some(PROVOKE));
    assert_eq!(book.active_skill(LoadoutSlot::Utility), Some(DASH));
    assert!(player.presentation().messages().any(|m| m.contains("cannot go in")));
}
