//! Shared vocabulary for the Ember skill core: entity/session identity,
//! sides and classes, skill ids, and the authoritative simulation clock.

mod clock;
mod ids;

pub use clock::{DEFAULT_TICK_RATE, GameTime, TickSchedule};
pub use ids::{CharacterClass, EntityId, SessionId, Side, SkillId};
