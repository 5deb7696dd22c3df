//! Read-only view of the live world consumed by targeting queries.

use ember_core::{EntityId, Side};
use glam::Vec3;

/// What targeting needs to know about one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityView {
    /// Network-stable identity.
    pub id: EntityId,
    /// World-space position.
    pub position: Vec3,
    /// Controlling side.
    pub side: Side,
    /// Dead entities are never selected.
    pub alive: bool,
}

/// Read interface over the world's entities. Implemented by the world
/// collaborator; this crate never owns entity storage.
pub trait EntityIndex {
    /// Visits every entity. Order does not matter; queries sort their output.
    fn for_each_entity(&self, visit: &mut dyn FnMut(&EntityView));

    /// Looks up a single entity.
    fn entity(&self, id: EntityId) -> Option<EntityView> {
        let mut found = None;
        self.for_each_entity(&mut |view: &EntityView| {
            if view.id == id {
                found = Some(*view);
            }
        });
        found
    }
}

impl EntityIndex for [EntityView] {
    fn for_each_entity(&self, visit: &mut dyn FnMut(&EntityView)) {
        self.iter().for_each(|view| visit(view));
    }

    fn entity(&self, id: EntityId) -> Option<EntityView> {
        self.iter().find(|view| view.id == id).copied()
    }
}

impl EntityIndex for Vec<EntityView> {
    fn for_each_entity(&self, visit: &mut dyn FnMut(&EntityView)) {
        self.as_slice().for_each_entity(visit);
    }

    fn entity(&self, id: EntityId) -> Option<EntityView> {
        self.as_slice().entity(id)
    }
}
