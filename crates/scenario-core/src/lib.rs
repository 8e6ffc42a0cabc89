//! Pure world-state data structures for the scenario engine: grid
//! coordinates, terrain, the thing arena, and the attachment graph.
//!
//! This crate holds no tick logic, no action handlers, and no configuration
//! parsing -- see `scenario-engine` and `scenario-config` respectively. It is
//! deliberately free of any simulation-level policy so it can be unit tested
//! and property tested in isolation.

pub mod arena;
pub mod attachment;
pub mod position;
pub mod terrain;
pub mod thing;

/// Re-exports of the types most callers need.
pub mod prelude {
    pub use crate::arena::{is_unblocked, ThingStore};
    pub use crate::attachment::AttachmentGraph;
    pub use crate::position::{rotate_ccw, rotate_cw, Area, Direction, Position};
    pub use crate::terrain::{MarkerKind, Terrain, TerrainGrid};
    pub use crate::thing::{Block, Dispenser, Entity, IdAllocator, Thing, ThingId, ThingKind};
}
