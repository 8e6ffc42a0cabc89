//! Arena of positioned things, keyed by stable id, with a position spatial
//! index.
//!
//! Storage is `BTreeMap`/`BTreeSet` rather than `HashMap`/`HashSet`
//! throughout: iteration order over things and over a cell's occupants feeds
//! directly into percept/snapshot output and tie-break resolution, and
//! replay determinism requires that order be a
//! deterministic function of content, not of hash-table internals.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::terrain::TerrainGrid;
use crate::thing::{IdAllocator, Thing, ThingId, ThingKind};

// ---------------------------------------------------------------------------
// ThingStore
// ---------------------------------------------------------------------------

/// Arena of all [`Thing`]s, indexed by id and by position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThingStore {
    things: BTreeMap<ThingId, Thing>,
    position_index: BTreeMap<Position, BTreeSet<ThingId>>,
    allocator: IdAllocator,
}

impl ThingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id for `kind`. Does not register anything.
    pub fn allocate_id(&mut self, kind: ThingKind) -> ThingId {
        self.allocator.allocate(kind)
    }

    /// Register a thing that already has a (unique) id and position.
    ///
    /// # Panics (debug only)
    ///
    /// Panics in debug builds if a thing with the same id is already
    /// registered -- this would violate invariant 3 (every attachment
    /// references a present thing) by silently orphaning the old entry.
    pub fn register(&mut self, thing: Thing) -> ThingId {
        let id = thing.id().clone();
        let pos = thing.position();
        let previous = self.things.insert(id.clone(), thing);
        debug_assert!(previous.is_none(), "duplicate thing id registered: {id}");
        if previous.is_some() {
            tracing::error!(%id, "duplicate thing id registered, orphaning previous entry");
        }
        self.position_index.entry(pos).or_default().insert(id.clone());
        id
    }

    /// Remove a thing from the arena entirely. Returns the removed thing, if
    /// any. The caller is responsible for also detaching it from the
    /// attachment graph (invariant 3).
    pub fn remove(&mut self, id: &ThingId) -> Option<Thing> {
        let thing = self.things.remove(id)?;
        if let Some(set) = self.position_index.get_mut(&thing.position()) {
            set.remove(id);
            if set.is_empty() {
                self.position_index.remove(&thing.position());
            }
        }
        Some(thing)
    }

    pub fn by_id(&self, id: &ThingId) -> Option<&Thing> {
        self.things.get(id)
    }

    pub fn by_id_mut(&mut self, id: &ThingId) -> Option<&mut Thing> {
        self.things.get_mut(id)
    }

    pub fn contains(&self, id: &ThingId) -> bool {
        self.things.contains_key(id)
    }

    /// All things, in id order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = &Thing> {
        self.things.values()
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    /// Relocate a registered thing to `new_pos`, updating the spatial index.
    /// Used by rigid-body moves/rotations as the "apply" half of their
    /// validate-then-apply commit. Does not itself validate anything.
    pub fn relocate(&mut self, id: &ThingId, new_pos: Position) {
        let Some(thing) = self.things.get_mut(id) else {
            return;
        };
        let old_pos = thing.position();
        if old_pos == new_pos {
            return;
        }
        thing.set_position(new_pos);
        if let Some(set) = self.position_index.get_mut(&old_pos) {
            set.remove(id);
            if set.is_empty() {
                self.position_index.remove(&old_pos);
            }
        }
        self.position_index.entry(new_pos).or_default().insert(id.clone());
    }

    /// Relocate many things at once in a single remove-all-then-insert-all
    /// pass, so that a group of things swapping through each other's old
    /// cells never observes a transient false collision against itself.
    pub fn relocate_many(&mut self, moves: &[(ThingId, Position)]) {
        for (id, _) in moves {
            if let Some(thing) = self.things.get(id) {
                let old_pos = thing.position();
                if let Some(set) = self.position_index.get_mut(&old_pos) {
                    set.remove(id);
                    if set.is_empty() {
                        self.position_index.remove(&old_pos);
                    }
                }
            }
        }
        for (id, new_pos) in moves {
            if let Some(thing) = self.things.get_mut(id) {
                thing.set_position(*new_pos);
                self.position_index.entry(*new_pos).or_default().insert(id.clone());
            }
        }
    }

    /// All things at `p`, in id order.
    pub fn things_at(&self, p: Position) -> Vec<&Thing> {
        self.position_index
            .get(&p)
            .into_iter()
            .flat_map(|set| set.iter())
            .filter_map(|id| self.things.get(id))
            .collect()
    }

    /// The attachable (entity/block) things at `p`.
    pub fn attachables_at(&self, p: Position) -> Vec<&Thing> {
        self.things_at(p).into_iter().filter(|t| t.is_attachable()).collect()
    }

    /// The sole attachable thing at `p`, or `None` if there are zero or at
    /// least two.
    pub fn unique_attachable_at(&self, p: Position) -> Option<&Thing> {
        let mut attachables = self.attachables_at(p).into_iter();
        let first = attachables.next()?;
        if attachables.next().is_some() {
            None
        } else {
            Some(first)
        }
    }

    /// A uniformly random unblocked position, by rejection sampling. Returns
    /// `None` if the grid has no unblocked cell at all (avoids looping
    /// forever on a fully-occupied map).
    pub fn random_free_position(
        &self,
        terrain: &TerrainGrid,
        rng: &mut impl rand::Rng,
    ) -> Option<Position> {
        if terrain.width() <= 0 || terrain.height() <= 0 {
            return None;
        }
        let area = (terrain.width() as u64) * (terrain.height() as u64);
        let max_attempts = area.saturating_mul(4).max(64);
        for _ in 0..max_attempts {
            let x = rng.gen_range(0..terrain.width());
            let y = rng.gen_range(0..terrain.height());
            let p = Position::new(x, y);
            if is_unblocked(terrain, self, p) {
                return Some(p);
            }
        }
        None
    }

    /// A random position within `(center, radius)`, sampled via
    /// [`crate::position::Area`]. May be out of bounds -- callers check.
    pub fn random_position_in_area(
        center: Position,
        radius: i32,
        rng: &mut impl rand::Rng,
    ) -> Position {
        let dx = rng.gen_range(-radius..=radius);
        let half = radius - dx.abs();
        let dy = if half <= 0 { 0 } else { rng.gen_range(-half..=half) };
        center.translate(dx, dy)
    }
}

/// `is_unblocked(p)`: in bounds, non-obstacle terrain, and
/// no Entity or Block occupying the cell. Dispensers never block.
pub fn is_unblocked(terrain: &TerrainGrid, things: &ThingStore, p: Position) -> bool {
    use crate::terrain::Terrain;

    terrain.in_bounds(p)
        && terrain.terrain_at(p) != Terrain::Obstacle
        && !things
            .things_at(p)
            .iter()
            .any(|t| matches!(t, crate::thing::Thing::Entity(_) | crate::thing::Thing::Block(_)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::Terrain;
    use crate::thing::{Block, Dispenser, Entity};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn block_at(store: &mut ThingStore, p: Position) -> ThingId {
        let id = store.allocate_id(ThingKind::Block);
        store.register(Thing::Block(Block {
            id: id.clone(),
            block_type: "b0".to_owned(),
            position: p,
        }))
    }

    #[test]
    fn register_and_lookup_by_id_and_position() {
        let mut store = ThingStore::new();
        let id = block_at(&mut store, Position::new(1, 1));
        assert!(store.contains(&id));
        assert_eq!(store.things_at(Position::new(1, 1)).len(), 1);
    }

    #[test]
    fn remove_clears_both_indices() {
        let mut store = ThingStore::new();
        let id = block_at(&mut store, Position::new(1, 1));
        assert!(store.remove(&id).is_some());
        assert!(!store.contains(&id));
        assert!(store.things_at(Position::new(1, 1)).is_empty());
    }

    #[test]
    fn dispenser_shares_cell_with_one_other_thing() {
        let mut store = ThingStore::new();
        let d_id = store.allocate_id(ThingKind::Dispenser);
        store.register(Thing::Dispenser(Dispenser {
            id: d_id,
            block_type: "b0".to_owned(),
            position: Position::new(2, 2),
        }));
        let b_id = block_at(&mut store, Position::new(2, 2));
        assert_eq!(store.things_at(Position::new(2, 2)).len(), 2);
        assert_eq!(store.attachables_at(Position::new(2, 2)).len(), 1);
        assert_eq!(store.unique_attachable_at(Position::new(2, 2)).map(|t| t.id().clone()), Some(b_id));
    }

    #[test]
    fn unique_attachable_is_none_with_zero_or_two() {
        let mut store = ThingStore::new();
        assert!(store.unique_attachable_at(Position::new(0, 0)).is_none());
        block_at(&mut store, Position::new(0, 0));
        block_at(&mut store, Position::new(0, 0));
        assert!(store.unique_attachable_at(Position::new(0, 0)).is_none());
    }

    #[test]
    fn relocate_many_swaps_without_false_self_collision() {
        let mut store = ThingStore::new();
        let a = block_at(&mut store, Position::new(0, 0));
        let b = block_at(&mut store, Position::new(1, 0));
        // Swap a and b's positions atomically.
        store.relocate_many(&[(a.clone(), Position::new(1, 0)), (b.clone(), Position::new(0, 0))]);
        assert_eq!(store.by_id(&a).unwrap().position(), Position::new(1, 0));
        assert_eq!(store.by_id(&b).unwrap().position(), Position::new(0, 0));
        assert_eq!(store.things_at(Position::new(1, 0)).len(), 1);
        assert_eq!(store.things_at(Position::new(0, 0)).len(), 1);
    }

    #[test]
    fn is_unblocked_respects_terrain_and_occupancy() {
        let mut terrain = TerrainGrid::new(3, 3, |_| Terrain::Empty);
        let mut store = ThingStore::new();
        assert!(is_unblocked(&terrain, &store, Position::new(1, 1)));

        terrain.set_terrain(Position::new(1, 1), Terrain::Obstacle);
        assert!(!is_unblocked(&terrain, &store, Position::new(1, 1)));

        terrain.set_terrain(Position::new(1, 1), Terrain::Empty);
        block_at(&mut store, Position::new(1, 1));
        assert!(!is_unblocked(&terrain, &store, Position::new(1, 1)));
    }

    #[test]
    fn dispenser_does_not_block() {
        let terrain = TerrainGrid::new(3, 3, |_| Terrain::Empty);
        let mut store = ThingStore::new();
        let d_id = store.allocate_id(ThingKind::Dispenser);
        store.register(Thing::Dispenser(Dispenser {
            id: d_id,
            block_type: "b0".to_owned(),
            position: Position::new(1, 1),
        }));
        assert!(is_unblocked(&terrain, &store, Position::new(1, 1)));
    }

    #[test]
    fn random_free_position_avoids_obstacles() {
        let mut terrain = TerrainGrid::new(2, 2, |_| Terrain::Obstacle);
        terrain.set_terrain(Position::new(1, 1), Terrain::Empty);
        let store = ThingStore::new();
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..20 {
            let p = store.random_free_position(&terrain, &mut rng).unwrap();
            assert_eq!(p, Position::new(1, 1));
        }
    }

    #[test]
    fn random_free_position_none_when_fully_blocked() {
        let terrain = TerrainGrid::new(2, 2, |_| Terrain::Obstacle);
        let store = ThingStore::new();
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(store.random_free_position(&terrain, &mut rng).is_none());
    }
}
