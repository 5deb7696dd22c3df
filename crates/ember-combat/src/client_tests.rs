use ember_core::{CharacterClass, Side};
use ember_effects::{EffectCategory, EffectSnapshot, MirroredEffect};
use ember_movement::{MovementBody, MovementState};
use ember_net::{PathPayload, ReplicationPayload};
use ember_skills::{LoadoutError, SkillInstance};
use glam::Vec3;

use super::*;
use crate::arena::ActorSpec;
use crate::executors::{CLEAVE, DASH, PROVOKE};

const PLAYER: SessionId = SessionId(1);
const HERO: EntityId = EntityId(1);
const DUMMY: EntityId = EntityId(2);

fn catalog() -> Arc<SkillCatalog> {
    Arc::new(SkillCatalog::builtin().unwrap())
}

/// Client mirror with the player's warrior (Cleave, Dash equipped) and one
/// hostile dummy in front of it.
fn client() -> SkillClient {
    let catalog = catalog();
    let mut client = SkillClient::new(
        PLAYER,
        Arc::clone(&catalog),
        Arc::new(ExecutorRegistry::standard()),
        PresentationLog::new(),
    );
    let world = client.world_mut();
    world.spawn_with_id(
        HERO,
        ActorSpec::new(Side::Party, Vec3::ZERO)
            .owned_by(PLAYER)
            .class(CharacterClass::Warrior, 3),
    );
    world.spawn_with_id(DUMMY, ActorSpec::new(Side::Hostile, Vec3::new(0.0, 0.0, 3.0)));
    let book = world.skill_book_mut(HERO).unwrap();
    book.equip(&catalog, LoadoutSlot::Combat, CLEAVE).unwrap();
    book.equip(&catalog, LoadoutSlot::Utility, DASH).unwrap();
    client
}

fn mirror_instance(client: &SkillClient, skill: SkillId) -> SkillInstance {
    client
        .world()
        .skill_book(HERO)
        .unwrap()
        .instance(skill)
        .unwrap()
        .clone()
}

// ---------------------------------------------------------------------------
// Predict
// ---------------------------------------------------------------------------

#[test]
fn test_prediction_starts_cooldown_and_queues_request() {
    let mut client = client();
    let now = GameTime::from_secs(3);

    let sequence = client.activate(HERO, LoadoutSlot::Combat, now).unwrap();

    assert_eq!(sequence, 1);
    assert_eq!(
        client.phase(HERO, CLEAVE),
        SkillPhase::AwaitingResolution { sequence: 1 }
    );
    assert_eq!(mirror_instance(&client, CLEAVE).last_activation(), Some(now));
    assert_eq!(client.presentation().animation_count(HERO, "cleave"), 1);
    assert_eq!(client.presentation().effect_count("cleave_swing"), 1);
    assert_eq!(
        client.drain_requests(),
        vec![ClientRequest::ActivateSkill {
            entity: HERO,
            skill: CLEAVE,
            slot: LoadoutSlot::Combat,
            sequence: 1,
        }]
    );
    // Prediction never touches gameplay state.
    assert_eq!(client.world().health(DUMMY).unwrap().current, 100.0);
}

#[test]
fn test_local_cooldown_blocks_resend() {
    let mut client = client();
    let now = GameTime::from_secs(3);
    client.activate(HERO, LoadoutSlot::Combat, now).unwrap();
    client.drain_requests();

    let err = client.activate(HERO, LoadoutSlot::Combat, now).unwrap_err();

    assert!(matches!(err, ActivationError::CooldownRejected { .. }));
    assert!(client.drain_requests().is_empty());
    assert_eq!(client.stats().gated, 1);
    assert_eq!(client.presentation().messages().count(), 1);
}

#[test]
fn test_gated_activation_sends_nothing() {
    let mut client = client();
    client.world_mut().set_health(HERO, 0.0);

    let err = client
        .activate(HERO, LoadoutSlot::Combat, GameTime::ZERO)
        .unwrap_err();

    assert_eq!(err, ActivationError::GateRejected(GateReason::Dead));
    assert!(client.drain_requests().is_empty());
    assert_eq!(client.phase(HERO, CLEAVE), SkillPhase::Ready);
    assert_eq!(mirror_instance(&client, CLEAVE).last_activation(), None);

    let err = client
        .activate(HERO, LoadoutSlot::Ultimate, GameTime::ZERO)
        .unwrap_err();
    assert_eq!(err, ActivationError::GateRejected(GateReason::NotEquipped));
}

#[test]
fn test_cannot_act_for_foreign_entity() {
    let mut client = client();
    let err = client
        .activate(DUMMY, LoadoutSlot::Combat, GameTime::ZERO)
        .unwrap_err();
    assert!(matches!(err, ActivationError::AuthorityViolation { .. }));
    assert!(client.drain_requests().is_empty());
}

// ---------------------------------------------------------------------------
// Host notices
// ---------------------------------------------------------------------------

#[test]
fn test_rejection_notice_overwrites_optimistic_cooldown() {
    let mut client = client();
    let now = GameTime::from_secs(10);
    client.activate(HERO, LoadoutSlot::Combat, now).unwrap();

    // The host never started this cooldown.
    client.handle(Message::Notice(HostNotice::ActivationRejected {
        entity: HERO,
        skill: CLEAVE,
        sequence: 1,
        reason: RejectReason::Gate(GateReason::LevelTooLow {
            required: 4,
            actual: 3,
        }),
        mirror: Some(SkillInstance::new(CLEAVE)),
    }));

    assert_eq!(client.phase(HERO, CLEAVE), SkillPhase::Ready);
    assert_eq!(mirror_instance(&client, CLEAVE).last_activation(), None);
    assert_eq!(client.stats().rejected, 1);
    assert!(
        client
            .presentation()
            .messages()
            .any(|m| m.contains("requires level 4"))
    );
    // Ready again locally.
    assert!(client.activate(HERO, LoadoutSlot::Combat, now).is_ok());
}

#[test]
fn test_stale_rejection_keeps_newer_phase() {
    let mut client = client();
    client
        .activate(HERO, LoadoutSlot::Combat, GameTime::ZERO)
        .unwrap();
    client.handle(Message::Notice(HostNotice::ActivationRejected {
        entity: HERO,
        skill: CLEAVE,
        sequence: 99,
        reason: RejectReason::Cooldown { remaining_ms: 10 },
        mirror: None,
    }));
    assert_eq!(
        client.phase(HERO, CLEAVE),
        SkillPhase::AwaitingResolution { sequence: 1 }
    );
}

#[test]
fn test_loadout_sync_replaces_mirror() {
    let mut client = client();
    let catalog = catalog();
    let mut loadout = *client.world().skill_book(HERO).unwrap().loadout();
    loadout
        .equip(LoadoutSlot::Combat, catalog.get(PROVOKE).unwrap())
        .unwrap();

    client.request_equip(HERO, LoadoutSlot::Combat, PROVOKE);
    assert_eq!(
        client.world().skill_book(HERO).unwrap().active_skill(LoadoutSlot::Combat),
        Some(CLEAVE),
        "mirror waits for the host"
    );
    assert_eq!(client.drain_requests().len(), 1);

    client.handle(Message::Notice(HostNotice::LoadoutSync {
        entity: HERO,
        loadout,
    }));
    let book = client.world().skill_book(HERO).unwrap();
    assert_eq!(book.active_skill(LoadoutSlot::Combat), Some(PROVOKE));
    assert!(book.knows(PROVOKE));

    client.handle(Message::Notice(HostNotice::LoadoutRejected {
        entity: HERO,
        error: LoadoutError::IndexOutOfRange(4),
        loadout,
    }));
    assert!(
        client
            .presentation()
            .messages()
            .any(|m| m.contains("out of range"))
    );
}

// ---------------------------------------------------------------------------
// Broadcasts
// ---------------------------------------------------------------------------

#[test]
fn test_resolution_replays_without_mutation() {
    let mut client = client();
    client
        .activate(HERO, LoadoutSlot::Combat, GameTime::ZERO)
        .unwrap();
    client.presentation_mut().clear();

    client.handle(Message::Broadcast(Broadcast::SkillResolved {
        caster: HERO,
        skill: CLEAVE,
        level: 1,
        payload: ReplicationPayload {
            origin: Vec3::ZERO,
            facing: Vec3::Z,
            target_count: 1,
            impact_points: vec![Vec3::new(0.0, 0.0, 3.0)],
            magnitude: 6.0,
            ..Default::default()
        },
    }));

    assert_eq!(client.phase(HERO, CLEAVE), SkillPhase::Ready);
    assert_eq!(client.presentation().effect_count("cleave_hit"), 1);
    assert_eq!(client.world().health(DUMMY).unwrap().current, 100.0);
    assert_eq!(client.stats().replayed, 1);
}

#[test]
fn test_movement_replay_owns_position_until_done() {
    let mut client = client();
    client.handle(Message::Broadcast(Broadcast::SkillResolved {
        caster: HERO,
        skill: DASH,
        level: 1,
        payload: ReplicationPayload {
            facing: Vec3::Z,
            path: Some(PathPayload {
                start: Vec3::ZERO,
                end: Vec3::new(0.0, 0.0, 6.0),
                duration_ms: 250,
                piercing: false,
            }),
            ..Default::default()
        },
    }));
    assert!(client.sequencer().is_moving(HERO));
    assert_eq!(
        MovementBody::movement_state(client.world(), HERO),
        Some(MovementState::EXCLUSIVE)
    );

    client.tick(Duration::from_millis(100));
    client.handle(Message::Broadcast(Broadcast::EntityState {
        entity: HERO,
        position: Vec3::ZERO,
        health: 90.0,
        alive: true,
    }));
    let z = client.world().position(HERO).unwrap().z;
    assert!(z > 0.0, "host state must not yank a replaying body");
    assert_eq!(client.world().health(HERO).unwrap().current, 90.0);

    let report = client.tick(Duration::from_millis(150));
    assert_eq!(report.finished, vec![HERO]);
    assert_eq!(client.world().position(HERO), Some(Vec3::new(0.0, 0.0, 6.0)));
    assert_eq!(
        MovementBody::movement_state(client.world(), HERO),
        Some(MovementState::FREE)
    );
}

#[test]
fn test_entity_state_and_effect_mirror() {
    let mut client = client();
    client.handle(Message::Broadcast(Broadcast::EntityState {
        entity: DUMMY,
        position: Vec3::new(1.0, 0.0, 3.0),
        health: 12.0,
        alive: false,
    }));
    assert_eq!(client.world().position(DUMMY), Some(Vec3::new(1.0, 0.0, 3.0)));
    assert!(!client.world().is_alive(DUMMY));

    client.handle(Message::Broadcast(Broadcast::EffectSnapshot {
        entity: HERO,
        snapshot: EffectSnapshot {
            taken_at: GameTime::from_secs(1),
            effects: vec![MirroredEffect {
                category: EffectCategory::Invulnerability,
                magnitude: 1.0,
                expires_at: GameTime::from_secs(2),
            }],
        },
    }));
    let mirror = client.effect_mirror();
    assert!(mirror.shows(HERO, EffectCategory::Invulnerability, GameTime::from_secs(1)));
    assert!(!mirror.shows(HERO, EffectCategory::Invulnerability, GameTime::from_secs(3)));
    // The mirror is presentation only; the local table is untouched.
    assert!(client.world().effects(HERO).unwrap().is_empty());
}
