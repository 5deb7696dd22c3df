//! World-side interface driven by the sequencer.

use bevy_ecs::prelude::*;
use ember_core::EntityId;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Movement flags owned by the world collaborator.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementState {
    /// Player/AI movement input is applied.
    pub input_enabled: bool,
    /// The body takes part in collision response.
    pub collision_enabled: bool,
    /// Position is driven externally; physics does not move it.
    pub kinematic: bool,
}

impl Default for MovementState {
    fn default() -> Self {
        Self::FREE
    }
}

impl MovementState {
    /// Normal, player-controlled state.
    pub const FREE: MovementState = MovementState {
        input_enabled: true,
        collision_enabled: true,
        kinematic: false,
    };

    /// State held while a sequence owns the entity. Collision response is
    /// off for every sequence; non-piercing paths are clipped when planned.
    pub const EXCLUSIVE: MovementState = MovementState {
        input_enabled: false,
        collision_enabled: false,
        kinematic: true,
    };
}

/// Write access to bodies that movement sequences drive.
///
/// Every method tolerates a missing entity: getters return `None`, setters
/// return `false`.
pub trait MovementBody {
    /// Identifies the current incarnation of `entity`, `None` if it does not
    /// exist. Must change whenever the id is despawned and reused, so a
    /// sequence started on the old body never drives the new one.
    fn generation(&self, entity: EntityId) -> Option<u64>;

    fn position(&self, entity: EntityId) -> Option<Vec3>;

    /// Moves the entity without physics.
    fn teleport(&mut self, entity: EntityId, position: Vec3) -> bool;

    fn movement_state(&self, entity: EntityId) -> Option<MovementState>;

    fn set_movement_state(&mut self, entity: EntityId, state: MovementState) -> bool;
}
