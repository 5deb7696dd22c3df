//! Skill execution orchestrator for Ember.
//!
//! The protocol has four phases per activation:
//!
//! 1. **Predict** ([`SkillClient::activate`]): the owning session gates
//!    locally, plays the cosmetic prediction, and starts its cooldown display.
//! 2. **Request**: one [`ember_net::ClientRequest::ActivateSkill`] to the host.
//! 3. **Resolve** ([`SkillHost::activate`]): the host re-validates
//!    authority, gates, and cooldown, then runs the executor's resolution
//!    against the [`CombatWorld`].
//! 4. **Replicate**: the host broadcasts a [`ember_net::ReplicationPayload`];
//!    every session, the host included, replays it without mutating gameplay.
//!
//! Movement abilities additionally start a [`ember_movement::MovementSequence`]
//! on every session from the replicated path.

pub mod arena;
pub mod client;
pub mod components;
mod error;
pub mod executor;
pub mod executors;
pub mod host;
pub mod hostiles;
pub mod presentation;
mod world;

pub use arena::{ActorSpec, ArenaWorld};
pub use client::{ClientStats, SkillClient, SkillPhase};
pub use components::{Allegiance, Character, Facing, Health, NetId, Ownership, Position};
pub use error::ActivationError;
pub use executor::{
    ExecutorRegistry, PredictContext, ResolveContext, Resolution, SkillExecutor, movement_for,
};
pub use host::{HostStats, Outbound, SkillHost};
pub use hostiles::{HostileBrain, HostileReport};
pub use presentation::{NullPresentation, Presentation, PresentationEvent, PresentationLog};
pub use world::CombatWorld;

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;
