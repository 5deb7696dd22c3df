//! Shape queries against an [`EntityIndex`].

use ember_core::{EntityId, Side};
use glam::Vec3;

use crate::{EntityIndex, EntityView, Shape, TargetFilter};

/// One selected entity and where it stood when selected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetHit {
    pub entity: EntityId,
    pub position: Vec3,
}

/// Ephemeral, ordered result of a query. Never cached across ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSet {
    hits: Vec<TargetHit>,
}

impl TargetSet {
    fn from_unsorted(mut hits: Vec<TargetHit>) -> Self {
        hits.sort_by_key(|hit| hit.entity);
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetHit> {
        self.hits.iter()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.hits
            .binary_search_by_key(&entity, |hit| hit.entity)
            .is_ok()
    }

    /// Positions in entity-id order, for replication payloads.
    pub fn positions(&self) -> Vec<Vec3> {
        self.hits.iter().map(|hit| hit.position).collect()
    }

    /// Entity ids in order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.hits.iter().map(|hit| hit.entity).collect()
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = &'a TargetHit;
    type IntoIter = std::slice::Iter<'a, TargetHit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Allies and enemies of one shape, selected in a single pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub allies: TargetSet,
    pub enemies: TargetSet,
}

/// Selects every entity inside `shape` that passes `filter` for `caster`.
pub fn select(
    index: &dyn EntityIndex,
    shape: &Shape,
    caster: EntityId,
    caster_side: Side,
    filter: TargetFilter,
) -> TargetSet {
    let mut hits = Vec::new();
    index.for_each_entity(&mut |view: &EntityView| {
        if filter.accepts(caster, caster_side, view) && shape.contains(view.position) {
            hits.push(TargetHit {
                entity: view.id,
                position: view.position,
            });
        }
    });
    TargetSet::from_unsorted(hits)
}

/// Splits the entities inside `shape` into allies and enemies of `caster`.
pub fn partition(
    index: &dyn EntityIndex,
    shape: &Shape,
    caster: EntityId,
    caster_side: Side,
    include_caster: bool,
) -> Partitioned {
    let ally_filter = TargetFilter::Allies { include_caster };
    let mut allies = Vec::new();
    let mut enemies = Vec::new();
    index.for_each_entity(&mut |view: &EntityView| {
        if !shape.contains(view.position) {
            return;
        }
        let hit = TargetHit {
            entity: view.id,
            position: view.position,
        };
        if ally_filter.accepts(caster, caster_side, view) {
            allies.push(hit);
        } else if TargetFilter::Enemies.accepts(caster, caster_side, view) {
            enemies.push(hit);
        }
    });
    Partitioned {
        allies: TargetSet::from_unsorted(allies),
        enemies: TargetSet::from_unsorted(enemies),
    }
}

/// Closest living enemy inside `shape`, ties broken by entity id.
pub fn nearest_enemy(
    index: &dyn EntityIndex,
    shape: &Shape,
    caster: EntityId,
    caster_side: Side,
) -> Option<TargetHit> {
    let anchor = shape.anchor();
    select(index, shape, caster, caster_side, TargetFilter::Enemies)
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = a.position.distance_squared(anchor);
            let db = b.position.distance_squared(anchor);
            da.total_cmp(&db).then(a.entity.cmp(&b.entity))
        })
}
