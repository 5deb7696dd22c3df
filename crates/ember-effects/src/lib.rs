//! Temporary effects: time-bounded, category-exclusive stat modifiers.
//!
//! Each entity owns one [`EffectTable`] (an ECS component). At most one
//! effect per [`EffectCategory`] is active; applying a category again
//! overwrites magnitude and expiry. Consumers read aggregated values through
//! [`StatModifiers`] every time instead of caching them.
//!
//! Only the authoritative host writes tables. Clients keep an
//! [`EffectMirror`] for presentation.

mod category;
mod mirror;
mod modifiers;
mod table;

pub use category::EffectCategory;
pub use mirror::{EffectMirror, EffectSnapshot, MirroredEffect};
pub use modifiers::StatModifiers;
pub use table::{EffectTable, TemporaryEffect};
