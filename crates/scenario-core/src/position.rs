//! Integer grid coordinates, compass directions, and diamond-area enumeration.
//!
//! Everything here is pure and allocation-free except [`Area::iter`], which
//! returns a restartable, deterministic iterator rather than a materialized
//! vector so callers can re-enumerate an area cheaply (e.g. once per tick for
//! marker painting, again later for percept assembly).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An integer `(x, y)` grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by a raw `(dx, dy)` vector.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Translate by `distance` cells in `direction`.
    pub fn step(self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.offset();
        self.translate(dx * distance, dy * distance)
    }

    /// Chebyshev (king-move) distance between two positions.
    pub fn chebyshev_distance(self, other: Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Express this position as an offset relative to `anchor` (global -> local).
    pub fn relative_to(self, anchor: Position) -> Position {
        Position::new(self.x - anchor.x, self.y - anchor.y)
    }

    /// Recover a global position from a local offset around `anchor` (local -> global).
    pub fn from_relative(anchor: Position, local: Position) -> Position {
        Position::new(anchor.x + local.x, anchor.y + local.y)
    }
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// One of the four cardinal directions (`n|s|e|w` in the setup DSL and
/// action parameters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Unit vector for this direction in `(dx, dy)` form. North decreases `y`.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// Parse the single-letter form used by the setup DSL and action params.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "n" => Some(Direction::North),
            "s" => Some(Direction::South),
            "e" => Some(Direction::East),
            "w" => Some(Direction::West),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Rotate a vector `(x, y)` ninety degrees clockwise: `(y, -x)`.
pub fn rotate_cw(x: i32, y: i32) -> (i32, i32) {
    (y, -x)
}

/// Rotate a vector `(x, y)` ninety degrees counter-clockwise: `(-y, x)`.
pub fn rotate_ccw(x: i32, y: i32) -> (i32, i32) {
    (-y, x)
}

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// A diamond (Manhattan-disk) region around a center cell.
///
/// NOTE: several call sites refer to this as "vision radius" / "Chebyshev
/// disk", but the enumeration is deliberately a Manhattan diamond: for each
/// `dx` in `[-r, r]`, `dy` ranges over `[-(r - |dx|), r - |dx|]`. This matches
/// the upstream scenario this core is modeled on; squaring it to a true
/// Chebyshev square would change which cells are visible/clearable and is
/// left alone pending product confirmation (see spec's open questions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub center: Position,
    pub radius: i32,
}

impl Area {
    pub fn new(center: Position, radius: i32) -> Self {
        Self { center, radius }
    }

    /// Deterministic, restartable iterator: outer `dx` ascending, inner `dy`
    /// ascending. Exhaustive over the finite diamond.
    pub fn iter(&self) -> AreaIter {
        let radius = self.radius.max(0);
        let dx = -radius;
        let half = radius - dx.abs();
        AreaIter {
            center: self.center,
            radius,
            dx,
            dy: -half,
        }
    }

    pub fn contains(&self, p: Position) -> bool {
        (p.x - self.center.x).abs() + (p.y - self.center.y).abs() <= self.radius
    }
}

/// Iterator over the cells of an [`Area`]. See [`Area::iter`].
pub struct AreaIter {
    center: Position,
    radius: i32,
    dx: i32,
    dy: i32,
}

impl Iterator for AreaIter {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.dx > self.radius {
            return None;
        }
        let half = self.radius - self.dx.abs();
        if self.dy > half {
            self.dx += 1;
            if self.dx > self.radius {
                return None;
            }
            let new_half = self.radius - self.dx.abs();
            self.dy = -new_half;
        }
        let item = Position::new(self.center.x + self.dx, self.center.y + self.dy);
        self.dy += 1;
        Some(item)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_and_step() {
        let p = Position::new(2, 3);
        assert_eq!(p.translate(1, -1), Position::new(3, 2));
        assert_eq!(p.step(Direction::East, 2), Position::new(4, 3));
        assert_eq!(p.step(Direction::North, 1), Position::new(2, 2));
    }

    #[test]
    fn chebyshev_distance_is_king_move() {
        assert_eq!(Position::new(0, 0).chebyshev_distance(Position::new(3, 1)), 3);
        assert_eq!(Position::new(0, 0).chebyshev_distance(Position::new(1, 1)), 1);
    }

    #[test]
    fn local_global_roundtrip() {
        let anchor = Position::new(10, 10);
        let global = Position::new(12, 8);
        let local = global.relative_to(anchor);
        assert_eq!(local, Position::new(2, -2));
        assert_eq!(Position::from_relative(anchor, local), global);
    }

    #[test]
    fn direction_parse() {
        assert_eq!(Direction::parse("n"), Some(Direction::North));
        assert_eq!(Direction::parse("s"), Some(Direction::South));
        assert_eq!(Direction::parse("e"), Some(Direction::East));
        assert_eq!(Direction::parse("w"), Some(Direction::West));
        assert_eq!(Direction::parse("nw"), None);
    }

    #[test]
    fn rotation_is_its_own_quadruple_inverse() {
        let (mut x, mut y) = (3, -2);
        for _ in 0..4 {
            let (nx, ny) = rotate_cw(x, y);
            x = nx;
            y = ny;
        }
        assert_eq!((x, y), (3, -2));
    }

    #[test]
    fn cw_then_ccw_is_identity() {
        let (x, y) = (5, 7);
        let (cx, cy) = rotate_cw(x, y);
        let (ox, oy) = rotate_ccw(cx, cy);
        assert_eq!((ox, oy), (x, y));
    }

    #[test]
    fn area_radius_zero_is_single_cell() {
        let area = Area::new(Position::new(0, 0), 0);
        let cells: Vec<_> = area.iter().collect();
        assert_eq!(cells, vec![Position::new(0, 0)]);
    }

    #[test]
    fn area_radius_one_is_diamond_not_square() {
        let area = Area::new(Position::new(0, 0), 1);
        let cells: Vec<_> = area.iter().collect();
        // 4-connected diamond: center + 4 orthogonal neighbors, 5 total.
        assert_eq!(cells.len(), 5);
        assert!(!cells.contains(&Position::new(1, 1)));
        assert!(cells.contains(&Position::new(1, 0)));
    }

    #[test]
    fn area_order_is_outer_dx_inner_dy_ascending() {
        let area = Area::new(Position::new(5, 5), 1);
        let cells: Vec<_> = area.iter().collect();
        assert_eq!(
            cells,
            vec![
                Position::new(4, 5),
                Position::new(5, 4),
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(6, 5),
            ]
        );
    }

    #[test]
    fn area_iter_is_restartable() {
        let area = Area::new(Position::new(0, 0), 2);
        let first: Vec<_> = area.iter().collect();
        let second: Vec<_> = area.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn area_contains_matches_iteration() {
        let area = Area::new(Position::new(0, 0), 2);
        let enumerated: std::collections::HashSet<Position> = area.iter().collect();
        for x in -3..=3 {
            for y in -3..=3 {
                let p = Position::new(x, y);
                assert_eq!(area.contains(p), enumerated.contains(&p), "{p:?}");
            }
        }
    }
}
