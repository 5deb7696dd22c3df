//! Envelope types and the versioned postcard codec.

use ember_core::{EntityId, SkillId};
use ember_effects::EffectSnapshot;
use ember_skills::{GateReason, Loadout, LoadoutError, LoadoutSlot, SkillInstance};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Current wire-protocol version. Prepended to every serialized message.
pub const PROTOCOL_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// Top-level enum
// ---------------------------------------------------------------------------

/// Everything that crosses the wire. The variant encodes the addressing mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Message {
    Request(ClientRequest),
    Notice(HostNotice),
    Broadcast(Broadcast),
}

// ---------------------------------------------------------------------------
// Owning session → host
// ---------------------------------------------------------------------------

/// Intent sent by the session that owns `entity`. The host trusts nothing in
/// here beyond the ids; the sending session comes from the transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ClientRequest {
    /// Cast the active skill of `slot`. `sequence` echoes back in the reply.
    ActivateSkill {
        entity: EntityId,
        skill: SkillId,
        slot: LoadoutSlot,
        sequence: u32,
    },
    /// Write `skill` into the active position of `slot`.
    EquipSkill {
        entity: EntityId,
        slot: LoadoutSlot,
        skill: SkillId,
    },
    /// Select the castable index of `slot`.
    RotateLoadout {
        entity: EntityId,
        slot: LoadoutSlot,
        index: u8,
    },
}

impl ClientRequest {
    /// The entity the request acts on.
    pub fn entity(&self) -> EntityId {
        match self {
            ClientRequest::ActivateSkill { entity, .. }
            | ClientRequest::EquipSkill { entity, .. }
            | ClientRequest::RotateLoadout { entity, .. } => *entity,
        }
    }
}

// ---------------------------------------------------------------------------
// Host → owning session
// ---------------------------------------------------------------------------

/// Why the host refused an activation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum RejectReason {
    /// Still cooling down on the host.
    Cooldown { remaining_ms: u64 },
    /// Class, level, death, passivity, or loadout check failed.
    Gate(GateReason),
    /// The skill id has no definition or executor.
    UnknownSkill,
}

/// Replies addressed to the owning session only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum HostNotice {
    /// The activation with `sequence` was refused; nothing changed on the host.
    ///
    /// `mirror` is the host's instance, so a client that optimistically
    /// started a cooldown can correct its display.
    ActivationRejected {
        entity: EntityId,
        skill: SkillId,
        sequence: u32,
        reason: RejectReason,
        mirror: Option<SkillInstance>,
    },
    /// Authoritative instance after a resolution (level, XP, cooldown start).
    InstanceSync {
        entity: EntityId,
        instance: SkillInstance,
    },
    /// Authoritative loadout after an accepted equip or rotate.
    LoadoutSync { entity: EntityId, loadout: Loadout },
    /// An equip or rotate was refused; `loadout` is the unchanged truth.
    LoadoutRejected {
        entity: EntityId,
        error: LoadoutError,
        loadout: Loadout,
    },
}

// ---------------------------------------------------------------------------
// Host → all sessions
// ---------------------------------------------------------------------------

/// Endpoints of a movement sequence every session replays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PathPayload {
    pub start: Vec3,
    pub end: Vec3,
    pub duration_ms: u32,
    /// The host planned the path without clipping against obstacles.
    pub piercing: bool,
}

/// Minimal resolved parameters for replay. Positions and flags only; target
/// entities are never named.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReplicationPayload {
    /// Caster position at resolution.
    pub origin: Vec3,
    /// Caster facing at resolution.
    pub facing: Vec3,
    pub target_count: u32,
    /// Target positions in target-set order.
    pub impact_points: Vec<Vec3>,
    pub path: Option<PathPayload>,
    /// Ability-specific "bonus condition met" flag.
    pub bonus: bool,
    /// Ability-specific scalar for VFX intensity (area radius, heal size).
    pub magnitude: f32,
}

/// Fan-out to every session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Broadcast {
    /// A resolution completed; replay it.
    SkillResolved {
        caster: EntityId,
        skill: SkillId,
        level: u32,
        payload: ReplicationPayload,
    },
    /// Authoritative position and health of an entity touched by a resolution.
    EntityState {
        entity: EntityId,
        position: Vec3,
        health: f32,
        alive: bool,
    },
    /// Presentation copy of an entity's active effects.
    EffectSnapshot {
        entity: EntityId,
        snapshot: EffectSnapshot,
    },
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding or decoding a message.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The payload was empty (no version byte).
    #[error("empty payload, no version byte")]
    EmptyPayload,

    /// The version byte does not match [`PROTOCOL_VERSION`].
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// Postcard encoding or decoding failed.
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
}

// ---------------------------------------------------------------------------
// Serialization helpers
// ---------------------------------------------------------------------------

/// Serialize a [`Message`] into a versioned binary payload.
pub fn encode_message(msg: &Message) -> Result<Vec<u8>, WireError> {
    let body = postcard::to_allocvec(msg)?;
    let mut out = Vec::with_capacity(1 + body.len());
    out.push(PROTOCOL_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Deserialize a versioned binary payload into a [`Message`].
pub fn decode_message(data: &[u8]) -> Result<Message, WireError> {
    let (&version, body) = data.split_first().ok_or(WireError::EmptyPayload)?;
    if version != PROTOCOL_VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }
    Ok(postcard::from_bytes(body)?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ember_core::GameTime;
    use ember_effects::{EffectCategory, EffectTable};

    use super::*;

    #[test]
    fn test_resolved_broadcast_roundtrip() {
        let msg = Message::Broadcast(Broadcast::SkillResolved {
            caster: EntityId(3),
            skill: SkillId(1),
            level: 2,
            payload: ReplicationPayload {
                origin: Vec3::new(1.0, 0.0, -2.0),
                facing: Vec3::Z,
                target_count: 2,
                impact_points: vec![Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 3.0)],
                path: Some(PathPayload {
                    start: Vec3::ZERO,
                    end: Vec3::X * 6.0,
                    duration_ms: 250,
                    piercing: true,
                }),
                bonus: true,
                magnitude: 7.0,
            },
        });
        let bytes = encode_message(&msg).unwrap();
        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(decode_message(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_rejection_carries_instance_mirror() {
        let mut instance = SkillInstance::new(SkillId(4));
        instance.mark_activated(GameTime::from_secs(9));
        let msg = Message::Notice(HostNotice::ActivationRejected {
            entity: EntityId(1),
            skill: SkillId(4),
            sequence: 12,
            reason: RejectReason::Cooldown { remaining_ms: 800 },
            mirror: Some(instance.clone()),
        });
        let decoded = decode_message(&encode_message(&msg).unwrap()).unwrap();
        match decoded {
            Message::Notice(HostNotice::ActivationRejected { mirror, .. }) => {
                assert_eq!(mirror, Some(instance));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_effect_snapshot_broadcast_roundtrip() {
        let mut table = EffectTable::new();
        table.apply(
            EffectCategory::Slow,
            0.4,
            Duration::from_secs(3),
            GameTime::from_secs(1),
            None,
        );
        let msg = Message::Broadcast(Broadcast::EffectSnapshot {
            entity: EntityId(8),
            snapshot: EffectSnapshot::capture(&table, GameTime::from_secs(1)),
        });
        assert_eq!(decode_message(&encode_message(&msg).unwrap()).unwrap(), msg);
    }

    #[test]
    fn test_empty_payload() {
        assert!(matches!(decode_message(&[]), Err(WireError::EmptyPayload)));
    }

    #[test]
    fn test_wrong_version() {
        let mut bytes = encode_message(&Message::Request(ClientRequest::RotateLoadout {
            entity: EntityId(1),
            slot: LoadoutSlot::Combat,
            index: 2,
        }))
        .unwrap();
        bytes[0] = PROTOCOL_VERSION + 1;
        assert!(matches!(
            decode_message(&bytes),
            Err(WireError::UnsupportedVersion(v)) if v == PROTOCOL_VERSION + 1
        ));
    }

    #[test]
    fn test_truncated_body() {
        let bytes = encode_message(&Message::Request(ClientRequest::ActivateSkill {
            entity: EntityId(1),
            skill: SkillId(1),
            slot: LoadoutSlot::Combat,
            sequence: 1,
        }))
        .unwrap();
        assert!(matches!(
            decode_message(&bytes[..2]),
            Err(WireError::Postcard(_))
        ));
    }

    #[test]
    fn test_request_entity() {
        let req = ClientRequest::EquipSkill {
            entity: EntityId(5),
            slot: LoadoutSlot::Utility,
            skill: SkillId(2),
        };
        assert_eq!(req.entity(), EntityId(5));
    }
}
