//! Clear-event scheduling and detonation.
//!
//! A [`ClearEvent`] is enqueued with a warning period, painted onto the
//! terrain as `Clear` markers every step it is pending, and on its
//! `fire_step` devastates its area: entities disabled, blocks and obstacles
//! removed, and new obstacles scattered nearby.

use scenario_core::arena::ThingStore;
use scenario_core::attachment::AttachmentGraph;
use scenario_core::position::{Area, Position};
use scenario_core::terrain::{MarkerKind, Terrain, TerrainGrid};
use serde::{Deserialize, Serialize};

use crate::entity_ops;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearEvent {
    pub center: Position,
    pub fire_step: u64,
    pub radius: i32,
}

/// Paint `Clear` markers over a pending event's area. Called once per step
/// for every event that is not yet due to fire.
pub fn paint_warning(event: &ClearEvent, terrain: &mut TerrainGrid) {
    for cell in Area::new(event.center, event.radius).iter() {
        terrain.create_marker(cell, MarkerKind::Clear);
    }
}

/// Clear every cell of `Area(center, radius)`: disable entities, remove
/// blocks, and flatten obstacles to empty. Returns the number of blocks plus
/// obstacles removed, which feeds the post-detonation obstacle count.
pub fn clear_area(
    center: Position,
    radius: i32,
    disable_duration: u32,
    terrain: &mut TerrainGrid,
    things: &mut ThingStore,
    graph: &mut AttachmentGraph,
    rng: &mut impl rand::Rng,
) -> u32 {
    let mut removed = 0u32;

    for cell in Area::new(center, radius).iter() {
        if !terrain.in_bounds(cell) {
            continue;
        }

        let occupant_ids: Vec<_> = things.things_at(cell).into_iter().map(|t| t.id().clone()).collect();
        for id in occupant_ids {
            let Some(thing) = things.by_id(&id) else { continue };
            match thing {
                scenario_core::thing::Thing::Entity(_) => {
                    entity_ops::disable(&id, disable_duration, terrain, things, graph, rng);
                }
                scenario_core::thing::Thing::Block(_) => {
                    graph.remove_thing(&id);
                    things.remove(&id);
                    removed += 1;
                }
                scenario_core::thing::Thing::Dispenser(_) => {}
            }
        }

        if terrain.terrain_at(cell) == Terrain::Obstacle {
            terrain.set_terrain(cell, Terrain::Empty);
            removed += 1;
        }
    }

    removed
}

/// Fire a due event: detonate its area, then scatter
/// `U[create_min, create_max] + removed` new obstacles within
/// `Area(center, radius + 3)`. Per an explicitly preserved open
/// question, placement does not check `is_unblocked` -- a new obstacle may
/// overlap an existing thing.
pub fn fire(
    event: &ClearEvent,
    disable_duration: u32,
    create_min: i32,
    create_max: i32,
    terrain: &mut TerrainGrid,
    things: &mut ThingStore,
    graph: &mut AttachmentGraph,
    rng: &mut impl rand::Rng,
) {
    let removed = clear_area(event.center, event.radius, disable_duration, terrain, things, graph, rng);

    let extra = if create_max > create_min {
        rng.gen_range(create_min..=create_max)
    } else {
        create_min
    };
    let obstacle_count = (extra.max(0) as u32) + removed;

    for _ in 0..obstacle_count {
        let p = ThingStore::random_position_in_area(event.center, event.radius + 3, rng);
        if terrain.in_bounds(p) {
            terrain.set_terrain(p, Terrain::Obstacle);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use scenario_core::thing::{Block, Entity, Thing, ThingKind};

    fn grid(w: i32, h: i32) -> TerrainGrid {
        TerrainGrid::new(w, h, |_| Terrain::Empty)
    }

    #[test]
    fn clear_area_removes_blocks_and_flattens_obstacles() {
        let mut terrain = grid(20, 20);
        terrain.set_terrain(Position::new(10, 10), Terrain::Obstacle);
        let mut store = ThingStore::new();
        let mut graph = AttachmentGraph::new();
        let b_id = store.allocate_id(ThingKind::Block);
        store.register(Thing::Block(Block { id: b_id.clone(), block_type: "b0".to_owned(), position: Position::new(10, 10) }));
        let mut rng = Pcg32::seed_from_u64(1);

        let removed = clear_area(Position::new(10, 10), 1, 5, &mut terrain, &mut store, &mut graph, &mut rng);

        assert_eq!(removed, 2);
        assert!(!store.contains(&b_id));
        assert_eq!(terrain.terrain_at(Position::new(10, 10)), Terrain::Empty);
    }

    #[test]
    fn clear_area_disables_entities_in_range() {
        let terrain_fixed = grid(20, 20);
        let mut terrain = terrain_fixed;
        let mut store = ThingStore::new();
        let mut graph = AttachmentGraph::new();
        let e_id = store.allocate_id(ThingKind::Entity);
        store.register(Thing::Entity(Entity::new(e_id.clone(), "a0", "teamA", Position::new(5, 5), 100, 3)));
        let mut rng = Pcg32::seed_from_u64(3);

        clear_area(Position::new(5, 5), 0, 7, &mut terrain, &mut store, &mut graph, &mut rng);

        let entity = store.by_id(&e_id).unwrap().as_entity().unwrap();
        assert_eq!(entity.disabled_for_steps, 7);
    }

    #[test]
    fn clear_area_is_idempotent_on_already_empty_cells() {
        let mut terrain = grid(10, 10);
        let mut store = ThingStore::new();
        let mut graph = AttachmentGraph::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let removed_first = clear_area(Position::new(3, 3), 1, 5, &mut terrain, &mut store, &mut graph, &mut rng);
        let removed_second = clear_area(Position::new(3, 3), 1, 5, &mut terrain, &mut store, &mut graph, &mut rng);
        assert_eq!(removed_first, 0);
        assert_eq!(removed_second, 0);
    }

    #[test]
    fn fire_scatters_at_least_create_min_obstacles_when_nothing_removed() {
        let mut terrain = grid(40, 40);
        let mut store = ThingStore::new();
        let mut graph = AttachmentGraph::new();
        let mut rng = Pcg32::seed_from_u64(9);
        let event = ClearEvent { center: Position::new(20, 20), fire_step: 10, radius: 1 };

        let before = terrain.terrain_at(Position::new(20, 20));
        assert_eq!(before, Terrain::Empty);

        fire(&event, 5, 2, 2, &mut terrain, &mut store, &mut graph, &mut rng);

        let obstacle_count = (0..40)
            .flat_map(|x| (0..40).map(move |y| Position::new(x, y)))
            .filter(|&p| terrain.terrain_at(p) == Terrain::Obstacle)
            .count();
        assert!(obstacle_count >= 1);
    }

    #[test]
    fn paint_warning_marks_the_event_area() {
        let mut terrain = grid(10, 10);
        let event = ClearEvent { center: Position::new(5, 5), fire_step: 20, radius: 1 };
        paint_warning(&event, &mut terrain);
        assert_eq!(terrain.marker_at(Position::new(5, 5)), Some(MarkerKind::Clear));
        assert_eq!(terrain.marker_at(Position::new(5, 4)), Some(MarkerKind::Clear));
        assert_eq!(terrain.marker_at(Position::new(6, 6)), None);
    }
}
