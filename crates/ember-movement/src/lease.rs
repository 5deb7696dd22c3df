//! Exclusive movement control over one entity.

use ember_core::EntityId;

use crate::{MovementBody, MovementState};

/// Proof that a sequence owns an entity's movement.
///
/// Acquiring captures the entity's state and writes the exclusive state.
/// [`release`](Self::release) writes the captured state back. A lease must
/// be consumed by `release` or [`hand_over`](Self::hand_over); dropping one
/// unconsumed is a bug and is logged.
#[derive(Debug)]
#[must_use = "a lease must be released or handed over"]
pub struct ControlLease {
    entity: EntityId,
    generation: u64,
    original: MovementState,
    consumed: bool,
}

impl ControlLease {
    /// Takes control of `entity`.
    ///
    /// `inherited` is the pre-sequence state handed over by a sequence this
    /// one replaces; when present it is restored on release instead of the
    /// current (already exclusive) state. Returns `None` if the entity does
    /// not exist.
    pub fn acquire(
        body: &mut dyn MovementBody,
        entity: EntityId,
        inherited: Option<MovementState>,
    ) -> Option<Self> {
        let generation = body.generation(entity)?;
        let current = body.movement_state(entity)?;
        let original = inherited.unwrap_or(current);
        if !body.set_movement_state(entity, MovementState::EXCLUSIVE) {
            return None;
        }
        tracing::debug!(%entity, ?original, "movement lease acquired");
        Some(Self {
            entity,
            generation,
            original,
            consumed: false,
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// State restored on release.
    pub fn original(&self) -> MovementState {
        self.original
    }

    /// Whether the body still holds the incarnation this lease was taken on.
    pub fn holds(&self, body: &dyn MovementBody) -> bool {
        body.generation(self.entity) == Some(self.generation)
    }

    /// Restores the original state. Returns `false` if the entity no longer
    /// exists or was replaced (nothing left to restore).
    pub fn release(mut self, body: &mut dyn MovementBody) -> bool {
        self.consumed = true;
        let restored =
            self.holds(body) && body.set_movement_state(self.entity, self.original);
        tracing::debug!(entity = %self.entity, restored, "movement lease released");
        restored
    }

    /// Gives up the lease without restoring, returning the original state
    /// for the lease that takes over.
    pub fn hand_over(mut self) -> MovementState {
        self.consumed = true;
        self.original
    }

    /// Gives up a lease whose entity is gone or was replaced.
    pub(crate) fn forfeit(mut self) {
        self.consumed = true;
    }
}

impl Drop for ControlLease {
    fn drop(&mut self) {
        if !self.consumed {
            tracing::error!(entity = %self.entity, "movement lease dropped without release");
        }
    }
}
