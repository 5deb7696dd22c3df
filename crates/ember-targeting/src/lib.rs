//! Geometry targeting: pure, stateless selection of entities by shape and
//! allegiance.
//!
//! Every ability resolves its targets through this crate. Queries read a
//! live [`EntityIndex`] and return a [`TargetSet`] sorted by
//! [`EntityId`](ember_core::EntityId), so the same world snapshot always
//! yields the same targets in the same order.

mod filter;
mod index;
mod query;
mod shape;

pub use filter::TargetFilter;
pub use index::{EntityIndex, EntityView};
pub use query::{Partitioned, TargetHit, TargetSet, nearest_enemy, partition, select};
pub use shape::{ANGLE_EPSILON_DEG, Circle, Cone, DISTANCE_EPSILON, Line, Shape};
