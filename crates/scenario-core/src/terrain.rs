//! The 2-D terrain grid: per-cell terrain kind plus transient markers.
//!
//! Occupancy by things (entities/blocks/dispensers) is tracked separately in
//! [`crate::arena::ThingStore`] -- the grid only knows about terrain and
//! markers. [`crate::arena::is_unblocked`] combines both views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::position::Position;

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// The terrain kind of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Empty,
    Obstacle,
    Goal,
}

// ---------------------------------------------------------------------------
// MarkerKind
// ---------------------------------------------------------------------------

/// The kind of a transient cell marker. Currently only `Clear` (a
/// clear-event warning), but modeled as an enum since the upstream scenario
/// leaves room for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Clear,
}

// ---------------------------------------------------------------------------
// TerrainGrid
// ---------------------------------------------------------------------------

/// Fixed-size `width x height` terrain grid with a transient marker overlay.
///
/// Out-of-bounds reads return [`Terrain::Empty`]; out-of-bounds writes are
/// silently dropped, matching spec behavior for malformed setup commands and
/// stray `event_create` placements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    width: i32,
    height: i32,
    cells: Vec<Terrain>,
    markers: BTreeMap<Position, MarkerKind>,
}

impl TerrainGrid {
    /// Build a grid of the given size, calling `provider` for every cell's
    /// initial terrain. This is the only place the core consumes the
    /// caller-supplied `(x, y) -> Terrain` callback.
    pub fn new(width: i32, height: i32, mut provider: impl FnMut(Position) -> Terrain) -> Self {
        let mut cells = Vec::with_capacity((width.max(0) * height.max(0)) as usize);
        for y in 0..height {
            for x in 0..width {
                cells.push(provider(Position::new(x, y)));
            }
        }
        Self {
            width,
            height,
            cells,
            markers: BTreeMap::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, p: Position) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    fn index(&self, p: Position) -> Option<usize> {
        self.in_bounds(p)
            .then(|| (p.y * self.width + p.x) as usize)
    }

    /// Terrain at `p`. Out-of-bounds returns [`Terrain::Empty`].
    pub fn terrain_at(&self, p: Position) -> Terrain {
        self.index(p).map(|i| self.cells[i]).unwrap_or_default()
    }

    /// Set the terrain at `p`. Out-of-bounds writes are silently dropped.
    pub fn set_terrain(&mut self, p: Position, terrain: Terrain) {
        if let Some(i) = self.index(p) {
            self.cells[i] = terrain;
        }
    }

    /// Paint a marker over `p`. No-op out of bounds.
    pub fn create_marker(&mut self, p: Position, kind: MarkerKind) {
        if self.in_bounds(p) {
            self.markers.insert(p, kind);
        }
    }

    /// Clear every marker on the grid. Called at the top of every tick.
    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    pub fn marker_at(&self, p: Position) -> Option<MarkerKind> {
        self.markers.get(&p).copied()
    }

    /// All currently painted markers, in position order (deterministic).
    pub fn markers(&self) -> impl Iterator<Item = (Position, MarkerKind)> + '_ {
        self.markers.iter().map(|(&p, &k)| (p, k))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
