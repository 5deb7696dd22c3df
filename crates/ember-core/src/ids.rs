//! Identity types shared by every Ember crate.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Network-stable entity identifier. Allocated by the authoritative host
/// and identical on every session; ordering is used to make target sets
/// deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A connected session. Exactly one session is the authoritative host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u32);

impl SessionId {
    /// The authoritative host session.
    pub const HOST: SessionId = SessionId(0);

    /// Returns `true` if this is the host session.
    pub fn is_host(self) -> bool {
        self == Self::HOST
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "host")
        } else {
            write!(f, "s{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// SkillId
// ---------------------------------------------------------------------------

/// Catalog key of a skill definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkillId(pub u32);

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skill#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Controlling side of an entity. Entities on the same side are allies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Player-controlled characters and their companions.
    Party,
    /// Monsters and anything fighting the party.
    Hostile,
    /// Bystanders: neither ally nor enemy of the other sides.
    Neutral,
}

impl Side {
    /// Returns `true` if `other` is on the same side.
    pub fn is_ally_of(self, other: Side) -> bool {
        self == other
    }

    /// Returns `true` if `other` is on an opposing side.
    pub fn is_enemy_of(self, other: Side) -> bool {
        matches!(
            (self, other),
            (Side::Party, Side::Hostile) | (Side::Hostile, Side::Party)
        )
    }
}

// ---------------------------------------------------------------------------
// CharacterClass
// ---------------------------------------------------------------------------

/// Character class used by skill gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Warrior,
    Rogue,
    Cleric,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_relations() {
        assert!(Side::Party.is_ally_of(Side::Party));
        assert!(Side::Party.is_enemy_of(Side::Hostile));
        assert!(Side::Hostile.is_enemy_of(Side::Party));
        assert!(!Side::Neutral.is_enemy_of(Side::Party));
        assert!(!Side::Neutral.is_ally_of(Side::Hostile));
        assert!(!Side::Party.is_enemy_of(Side::Party));
    }

    #[test]
    fn test_entity_ids_sort_numerically() {
        let mut ids = vec![EntityId(10), EntityId(2), EntityId(7)];
        ids.sort();
        assert_eq!(ids, vec![EntityId(2), EntityId(7), EntityId(10)]);
    }

    #[test]
    fn test_host_session_display() {
        assert!(SessionId::HOST.is_host());
        assert_eq!(SessionId::HOST.to_string(), "host");
        assert_eq!(SessionId(3).to_string(), "s3");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&SkillId(4)).unwrap();
        assert_eq!(json, "4");
        let bytes = postcard::to_allocvec(&EntityId(300)).unwrap();
        let back: EntityId = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(back, EntityId(300));
    }
}
