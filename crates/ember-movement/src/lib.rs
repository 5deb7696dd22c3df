//! Movement sequencer for dash-type abilities.
//!
//! A [`MovementSequence`] is a bounded, tick-driven interpolation between two
//! endpoints. While it runs, the entity is held under a [`ControlLease`]:
//! normal input is off, the body is kinematic, and collision response is
//! disabled. The [`MovementSequencer`] guarantees every lease is released on
//! every exit path (completion, interruption, replacement, shutdown).
//!
//! [`plan_path`] computes the endpoints on the host, clipped against
//! [`Aabb`] obstacles or deliberately unclipped for piercing abilities.

mod aabb;
mod body;
mod lease;
mod path;
mod sequence;
mod sequencer;

pub use aabb::Aabb;
pub use body::{MovementBody, MovementState};
pub use lease::ControlLease;
pub use path::{ObstacleQuery, PathMode, PlannedPath, plan_path};
pub use sequence::{Easing, MovementSequence, SequencePhase};
pub use sequencer::{MovementSequencer, TickReport};
