//! Allegiance filters relative to a caster.

use ember_core::{EntityId, Side};
use serde::{Deserialize, Serialize};

use crate::EntityView;

/// Which entities a query may return, relative to the caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetFilter {
    /// Same side as the caster. The caster itself only if requested.
    Allies { include_caster: bool },
    /// Opposing side.
    Enemies,
    /// Allies and enemies together (neutral bystanders are never included).
    All { include_caster: bool },
}

impl TargetFilter {
    /// Returns `true` if `view` passes this filter for a caster `caster` on `caster_side`.
    pub fn accepts(self, caster: EntityId, caster_side: Side, view: &EntityView) -> bool {
        if !view.alive {
            return false;
        }
        let is_caster = view.id == caster;
        let ally = caster_side.is_ally_of(view.side);
        let enemy = caster_side.is_enemy_of(view.side);
        match self {
            TargetFilter::Allies { include_caster } => ally && (!is_caster || include_caster),
            TargetFilter::Enemies => enemy && !is_caster,
            TargetFilter::All { include_caster } => {
                (enemy && !is_caster) || (ally && (!is_caster || include_caster))
            }
        }
    }
}
