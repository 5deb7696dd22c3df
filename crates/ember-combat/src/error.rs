//! Why an activation did not resolve.

use std::time::Duration;

use ember_core::{EntityId, SessionId, SkillId};
use ember_net::RejectReason;
use ember_skills::GateReason;

/// Failure taxonomy of the activation protocol. Every variant aborts before
/// the first mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationError {
    /// Class, level, death, passivity, or loadout check failed.
    #[error("gate rejected: {0}")]
    GateRejected(GateReason),

    /// The caster's instance is still cooling down.
    #[error("cooldown: {remaining:?} remaining")]
    CooldownRejected { remaining: Duration },

    /// No definition or no executor for the id.
    #[error("unknown skill {0}")]
    UnknownSkill(SkillId),

    /// The request did not come from the entity's owning session.
    #[error("session {from} may not act for {entity} (owned by {owner})")]
    AuthorityViolation {
        entity: EntityId,
        owner: SessionId,
        from: SessionId,
    },

    /// The entity does not exist on the host.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
}

impl ActivationError {
    /// What the requesting session is told. `None` means drop silently.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            ActivationError::GateRejected(reason) => Some(RejectReason::Gate(*reason)),
            ActivationError::CooldownRejected { remaining } => Some(RejectReason::Cooldown {
                remaining_ms: u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
            }),
            ActivationError::UnknownSkill(_) => Some(RejectReason::UnknownSkill),
            ActivationError::AuthorityViolation { .. } | ActivationError::UnknownEntity(_) => None,
        }
    }
}
