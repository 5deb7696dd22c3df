//! Skill catalog and per-entity skill state.
//!
//! - [`SkillCatalog`]: immutable [`SkillDefinition`]s loaded once from RON.
//! - [`SkillInstance`]: runtime progress (level, XP, last activation) of one
//!   entity for one skill. The host's copy is the truth; clients hold mirrors.
//! - [`Loadout`]: three category slots, each a rotating set of three skills.
//! - [`SkillBook`]: the ECS component bundling an entity's instances and loadout.
//! - [`SkillSnapshot`]: the persisted form (no cooldowns).

mod book;
mod catalog;
mod definition;
mod instance;
mod loadout;
mod snapshot;

pub use book::SkillBook;
pub use catalog::{CatalogError, SkillCatalog};
pub use definition::{
    GateReason, LevelScaling, SkillCategory, SkillDefinition, SkillGate, SkillTuning,
};
pub use instance::SkillInstance;
pub use loadout::{Loadout, LoadoutError, LoadoutSlot, SLOT_SET_SIZE, SlotSet};
pub use snapshot::{SkillProgress, SkillSnapshot};
