//! Drives every active movement sequence once per tick.

use std::collections::BTreeMap;
use std::time::Duration;

use ember_core::EntityId;

use crate::{ControlLease, MovementBody, MovementSequence};

struct ActiveSequence {
    sequence: MovementSequence,
    lease: ControlLease,
}

/// What happened during one [`MovementSequencer::tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Sequences that reached their endpoint and released control.
    pub finished: Vec<EntityId>,
    /// Sequences whose entity vanished or was replaced mid-flight.
    pub dropped: Vec<EntityId>,
}

/// Owns all running sequences, at most one per entity.
///
/// Every exit path releases the entity's [`ControlLease`]: completion,
/// [`interrupt`](Self::interrupt), [`interrupt_all`](Self::interrupt_all),
/// and replacement by a newer sequence (which inherits the original state).
#[derive(Default)]
pub struct MovementSequencer {
    active: BTreeMap<EntityId, ActiveSequence>,
}

impl MovementSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes control of the sequence's entity and schedules it.
    ///
    /// The entity is placed at `from` immediately. Returns `false` if the
    /// entity does not exist.
    pub fn start(&mut self, body: &mut dyn MovementBody, sequence: MovementSequence) -> bool {
        let entity = sequence.entity;
        let inherited = match self.active.remove(&entity) {
            Some(previous) if previous.lease.holds(&*body) => Some(previous.lease.hand_over()),
            Some(stale) => {
                stale.lease.forfeit();
                None
            }
            None => None,
        };
        let Some(lease) = ControlLease::acquire(body, entity, inherited) else {
            tracing::warn!(%entity, "cannot start movement sequence: entity missing");
            return false;
        };
        body.teleport(entity, sequence.from);
        self.active.insert(entity, ActiveSequence { sequence, lease });
        true
    }

    /// Advances every sequence by `dt`.
    pub fn tick(&mut self, body: &mut dyn MovementBody, dt: Duration) -> TickReport {
        let mut report = TickReport::default();
        let entities: Vec<EntityId> = self.active.keys().copied().collect();
        for entity in entities {
            let stale = self
                .active
                .get(&entity)
                .is_some_and(|active| !active.lease.holds(&*body));
            if stale {
                if let Some(gone) = self.active.remove(&entity) {
                    gone.lease.forfeit();
                }
                tracing::warn!(%entity, "movement sequence interrupted: entity removed or replaced");
                report.dropped.push(entity);
                continue;
            }
            let Some(active) = self.active.get_mut(&entity) else {
                continue;
            };
            let position = active.sequence.advance(dt);
            body.teleport(entity, position);
            if active.sequence.is_done()
                && let Some(done) = self.active.remove(&entity)
            {
                done.lease.release(body);
                report.finished.push(entity);
            }
        }
        report
    }

    /// Stops the entity's sequence where it is and restores its state.
    /// Returns `false` if it had none.
    pub fn interrupt(&mut self, body: &mut dyn MovementBody, entity: EntityId) -> bool {
        match self.active.remove(&entity) {
            Some(active) => {
                tracing::warn!(%entity, phase = ?active.sequence.phase(), "movement sequence interrupted");
                active.lease.release(body);
                true
            }
            None => false,
        }
    }

    /// Interrupts every sequence (shutdown, host loss).
    pub fn interrupt_all(&mut self, body: &mut dyn MovementBody) -> usize {
        let all = std::mem::take(&mut self.active);
        let count = all.len();
        for (_, active) in all {
            active.lease.release(body);
        }
        if count > 0 {
            tracing::debug!(count, "all movement sequences interrupted");
        }
        count
    }

    pub fn is_moving(&self, entity: EntityId) -> bool {
        self.active.contains_key(&entity)
    }

    pub fn get(&self, entity: EntityId) -> Option<&MovementSequence> {
        self.active.get(&entity).map(|active| &active.sequence)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl Drop for MovementSequencer {
    fn drop(&mut self) {
        // Without a world there is nothing to restore into; the leases log.
        if !self.active.is_empty() {
            tracing::warn!(
                count = self.active.len(),
                "movement sequencer dropped with active sequences"
            );
        }
    }
}
