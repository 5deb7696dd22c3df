//! ECS components of arena actors.

use bevy_ecs::prelude::*;
use ember_core::{CharacterClass, EntityId, SessionId, Side};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Network-stable identity, identical on every session.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetId(pub EntityId);

/// World-space position.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec3);

/// Unit facing direction (horizontal).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Facing(pub Vec3);

impl Default for Facing {
    fn default() -> Self {
        Self(Vec3::Z)
    }
}

impl Facing {
    /// Normalized facing, falling back to +Z for a zero vector.
    pub fn direction(self) -> Vec3 {
        let dir = self.0.normalize_or_zero();
        if dir == Vec3::ZERO { Vec3::Z } else { dir }
    }
}

/// Controlling side.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allegiance(pub Side);

/// Hit points. The entity is dead at zero.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn full(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }
}

/// Session allowed to issue requests for the entity. `None` means the host
/// controls it (NPCs).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ownership(pub Option<SessionId>);

impl Ownership {
    /// The session whose requests the host accepts for this entity.
    pub fn controller(self) -> SessionId {
        self.0.unwrap_or(SessionId::HOST)
    }
}

/// Class and character level used by skill gates.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Character {
    pub class: Option<CharacterClass>,
    pub level: u32,
}

impl Default for Character {
    fn default() -> Self {
        Self {
            class: None,
            level: 1,
        }
    }
}
