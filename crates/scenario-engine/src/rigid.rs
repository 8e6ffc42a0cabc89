//! Rigid-body grid operations: the algorithmic heart of the simulation.
//!
//! Every multi-cell mutation here commits via a two-phase "validate all,
//! then apply all" pattern -- `Area`/spatial-index state must never be
//! observed half-migrated, and the validation pass never mutates anything it
//! inspects.

use std::collections::BTreeSet;

use scenario_core::arena::ThingStore;
use scenario_core::attachment::AttachmentGraph;
use scenario_core::position::{rotate_ccw, rotate_cw, Direction, Position};
use scenario_core::terrain::{Terrain, TerrainGrid};
use scenario_core::thing::ThingId;

/// Why a rigid-body validation pass failed. Callers map this to an
/// [`crate::result::ActionResult`]; it is not itself surfaced to agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidFailure {
    GroupTooLarge,
    OutOfBounds,
    Obstacle,
    Occupied,
}

/// Validate and, if valid, apply a uniform translation `v` to every member
/// of `group`. `group` is assumed to already be a connected component
/// (see [`AttachmentGraph::collect_group`]).
pub fn move_with_attached(
    group: &BTreeSet<ThingId>,
    v: (i32, i32),
    attach_limit: u32,
    terrain: &TerrainGrid,
    things: &mut ThingStore,
) -> Result<(), RigidFailure> {
    if group.len() as u32 > attach_limit {
        return Err(RigidFailure::GroupTooLarge);
    }

    let mut moves = Vec::with_capacity(group.len());
    for id in group {
        let Some(thing) = things.by_id(id) else {
            continue;
        };
        let old = thing.position();
        let new = old.translate(v.0, v.1);
        validate_target_cell(new, group, terrain, things)?;
        moves.push((id.clone(), new));
    }

    things.relocate_many(&moves);
    Ok(())
}

/// Validate and, if valid, rotate every member of `group` about `pivot`.
pub fn rotate_with_attached(
    group: &BTreeSet<ThingId>,
    pivot: Position,
    clockwise: bool,
    attach_limit: u32,
    terrain: &TerrainGrid,
    things: &mut ThingStore,
) -> Result<(), RigidFailure> {
    if group.len() as u32 > attach_limit {
        return Err(RigidFailure::GroupTooLarge);
    }

    let rotate = if clockwise { rotate_cw } else { rotate_ccw };

    let mut moves = Vec::with_capacity(group.len());
    for id in group {
        let Some(thing) = things.by_id(id) else {
            continue;
        };
        let old = thing.position();
        let local = old.relative_to(pivot);
        let (rx, ry) = rotate(local.x, local.y);
        let new = Position::from_relative(pivot, Position::new(rx, ry));
        validate_target_cell(new, group, terrain, things)?;
        moves.push((id.clone(), new));
    }

    things.relocate_many(&moves);
    Ok(())
}

/// Teleport a single thing with no attachment constraint beyond the target
/// cell being unblocked by anything outside its own (trivial) group.
pub fn move_without_attachments(
    id: &ThingId,
    target: Position,
    terrain: &TerrainGrid,
    things: &mut ThingStore,
) -> Result<(), RigidFailure> {
    let solo = BTreeSet::from([id.clone()]);
    validate_target_cell(target, &solo, terrain, things)?;
    things.relocate(id, target);
    Ok(())
}

fn validate_target_cell(
    p: Position,
    group: &BTreeSet<ThingId>,
    terrain: &TerrainGrid,
    things: &ThingStore,
) -> Result<(), RigidFailure> {
    if !terrain.in_bounds(p) {
        return Err(RigidFailure::OutOfBounds);
    }
    if terrain.terrain_at(p) == Terrain::Obstacle {
        return Err(RigidFailure::Obstacle);
    }
    let foreign_occupant = things.things_at(p).into_iter().any(|t| !group.contains(t.id()));
    if foreign_occupant {
        return Err(RigidFailure::Occupied);
    }
    Ok(())
}

/// The translation vector for `direction * distance`.
pub fn translation_for(direction: Direction, distance: i32) -> (i32, i32) {
    let (dx, dy) = direction.offset();
    (dx * distance, dy * distance)
}

/// `attach(a, b)`: requires the two things be Chebyshev-adjacent and their
/// combined group not exceed `attach_limit`. Inserts the edge on success.
pub fn attach(
    a: &ThingId,
    b: &ThingId,
    attach_limit: u32,
    things: &ThingStore,
    graph: &mut AttachmentGraph,
) -> bool {
    let (Some(pa), Some(pb)) = (things.by_id(a).map(|t| t.position()), things.by_id(b).map(|t| t.position())) else {
        return false;
    };
    if pa.chebyshev_distance(pb) != 1 {
        return false;
    }
    let mut combined: BTreeSet<ThingId> = graph.collect_group(a);
    combined.extend(graph.collect_group(b));
    if combined.len() as u32 > attach_limit {
        return false;
    }
    graph.attach(a.clone(), b.clone());
    true
}

/// `detach(a, b)`: succeeds only if the edge exists.
pub fn detach(a: &ThingId, b: &ThingId, graph: &mut AttachmentGraph) -> bool {
    if !graph.has_edge(a, b) {
        return false;
    }
    graph.detach(a, b);
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use scenario_core::thing::{Block, Entity, Thing, ThingKind};

    fn grid(w: i32, h: i32) -> TerrainGrid {
        TerrainGrid::new(w, h, |_| Terrain::Empty)
    }

    fn entity_at(store: &mut ThingStore, p: Position) -> ThingId {
        let id = store.allocate_id(ThingKind::Entity);
        store.register(Thing::Entity(Entity::new(id, "a0", "teamA", p, 100, 3)))
    }

    fn block_at(store: &mut ThingStore, p: Position) -> ThingId {
        let id = store.allocate_id(ThingKind::Block);
        store.register(Thing::Block(Block { id, block_type: "b0".to_owned(), position: p }))
    }

    #[test]
    fn move_translates_whole_group() {
        let terrain = grid(10, 10);
        let mut store = ThingStore::new();
        let e = entity_at(&mut store, Position::new(2, 2));
        let b = block_at(&mut store, Position::new(3, 2));
        let group = BTreeSet::from([e.clone(), b.clone()]);

        move_with_attached(&group, (0, 1), 3, &terrain, &mut store).unwrap();

        assert_eq!(store.by_id(&e).unwrap().position(), Position::new(2, 3));
        assert_eq!(store.by_id(&b).unwrap().position(), Position::new(3, 3));
    }

    #[test]
    fn move_fails_on_obstacle() {
        let mut terrain = grid(10, 10);
        terrain.set_terrain(Position::new(2, 3), Terrain::Obstacle);
        let mut store = ThingStore::new();
        let e = entity_at(&mut store, Position::new(2, 2));
        let group = BTreeSet::from([e.clone()]);

        let result = move_with_attached(&group, (0, 1), 3, &terrain, &mut store);
        assert_eq!(result, Err(RigidFailure::Obstacle));
        assert_eq!(store.by_id(&e).unwrap().position(), Position::new(2, 2));
    }

    #[test]
    fn move_does_not_collide_with_own_group_members() {
        // A 1x2 vertical pair moving north by one: the trailing member ends
        // up where the leading member started. This must NOT be rejected as
        // a foreign occupant.
        let terrain = grid(10, 10);
        let mut store = ThingStore::new();
        let e = entity_at(&mut store, Position::new(5, 5));
        let b = block_at(&mut store, Position::new(5, 6));
        let group = BTreeSet::from([e.clone(), b.clone()]);

        move_with_attached(&group, (0, -1), 3, &terrain, &mut store).unwrap();

        assert_eq!(store.by_id(&e).unwrap().position(), Position::new(5, 4));
        assert_eq!(store.by_id(&b).unwrap().position(), Position::new(5, 5));
    }

    #[test]
    fn move_rejects_group_over_attach_limit() {
        let terrain = grid(10, 10);
        let mut store = ThingStore::new();
        let e = entity_at(&mut store, Position::new(2, 2));
        let b = block_at(&mut store, Position::new(3, 2));
        let group = BTreeSet::from([e, b]);

        let result = move_with_attached(&group, (0, 1), 1, &terrain, &mut store);
        assert_eq!(result, Err(RigidFailure::GroupTooLarge));
    }

    #[test]
    fn rotate_cw_four_times_is_identity() {
        let terrain = grid(20, 20);
        let mut store = ThingStore::new();
        let e = entity_at(&mut store, Position::new(10, 10));
        let b = block_at(&mut store, Position::new(10, 9));
        let group = BTreeSet::from([e.clone(), b.clone()]);

        for _ in 0..4 {
            rotate_with_attached(&group, Position::new(10, 10), true, 3, &terrain, &mut store).unwrap();
        }

        assert_eq!(store.by_id(&e).unwrap().position(), Position::new(10, 10));
        assert_eq!(store.by_id(&b).unwrap().position(), Position::new(10, 9));
    }

    #[test]
    fn rotate_cw_then_ccw_is_identity() {
        let terrain = grid(20, 20);
        let mut store = ThingStore::new();
        let e = entity_at(&mut store, Position::new(10, 10));
        let b = block_at(&mut store, Position::new(11, 10));
        let group = BTreeSet::from([e.clone(), b.clone()]);

        rotate_with_attached(&group, Position::new(10, 10), true, 3, &terrain, &mut store).unwrap();
        rotate_with_attached(&group, Position::new(10, 10), false, 3, &terrain, &mut store).unwrap();

        assert_eq!(store.by_id(&b).unwrap().position(), Position::new(11, 10));
    }

    #[test]
    fn attach_requires_adjacency() {
        let mut store = ThingStore::new();
        let a = entity_at(&mut store, Position::new(0, 0));
        let b = block_at(&mut store, Position::new(5, 5));
        let mut graph = AttachmentGraph::new();
        assert!(!attach(&a, &b, 3, &store, &mut graph));
    }

    #[test]
    fn attach_respects_combined_group_limit() {
        let mut store = ThingStore::new();
        let a = entity_at(&mut store, Position::new(0, 0));
        let b = block_at(&mut store, Position::new(1, 0));
        let mut graph = AttachmentGraph::new();
        assert!(!attach(&a, &b, 1, &store, &mut graph));
        assert!(attach(&a, &b, 2, &store, &mut graph));
    }

    #[test]
    fn detach_requires_existing_edge() {
        let mut graph = AttachmentGraph::new();
        let a = ThingId("entity0".to_owned());
        let b = ThingId("block0".to_owned());
        assert!(!detach(&a, &b, &mut graph));
        graph.attach(a.clone(), b.clone());
        assert!(detach(&a, &b, &mut graph));
    }
}
