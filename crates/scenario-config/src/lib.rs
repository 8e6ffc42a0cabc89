//! Configuration value types and the setup DSL parser for the scenario
//! engine.
//!
//! This crate holds no simulation logic: it is plain data plus validation
//! plus a small parser, consumed by `scenario-engine` at initialization.

pub mod config;
pub mod error;
pub mod setup;

pub mod prelude {
    pub use crate::config::{Config, EventsConfig, GridConfig, IntRange, TasksConfig};
    pub use crate::error::ConfigError;
    pub use crate::setup::{parse_setup, PositionedType, SetupCommand, ThingKind};
}
