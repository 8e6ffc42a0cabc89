//! The configuration record the engine is handed at startup.
//!
//! Per the external-interfaces contract, configuration arrives as an
//! already-assembled structured record -- this crate validates and carries
//! it, it does not parse it from a file format. The one exception is the
//! setup DSL (`setup: Vec<String>`), a sequence of whitespace-separated
//! commands that still needs its own small parser; see [`crate::setup`].
//!
//! `grid.width`/`grid.height` are plain ints. The `(x, y) -> Terrain`
//! callback mentioned alongside them in the external contract is not part of
//! this record -- closures are not `Serialize`, and bitmap/file decoding into
//! terrain values is the caller's concern, not this crate's. Callers build a
//! `TerrainGrid` with their own provider closure and this `GridConfig` only
//! for the dimensions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// IntRange
// ---------------------------------------------------------------------------

/// An inclusive `[min, max]` integer range, used throughout the config for
/// "generate a random value in this band" fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i32,
    pub max: i32,
}

impl IntRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    fn validate(self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field,
                min: self.min as i64,
                max: self.max as i64,
            });
        }
        Ok(())
    }

    /// Sample a uniformly distributed value in `[min, max]`.
    pub fn sample(self, rng: &mut impl rand::Rng) -> i32 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

// ---------------------------------------------------------------------------
// TasksConfig / EventsConfig / GridConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasksConfig {
    pub duration: IntRange,
    pub size: IntRange,
    /// Per-step probability of generating a new random task, in `[0, 1]`.
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Per-step percent chance (0-100) of enqueuing a new clear event.
    pub chance: u32,
    pub radius: IntRange,
    /// Steps between a clear event being enqueued and firing.
    pub warning: u32,
    /// `[min, max]` extra obstacles placed on top of `removed` when a clear
    /// event fires.
    pub create: IntRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// The full configuration record, as received from the external harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Percent chance (0-100) that any action fails for reasons unrelated to
    /// its own preconditions.
    pub random_fail: u32,
    /// Maximum rigid-group size for any successful attach/move/rotate.
    pub attach_limit: u32,
    /// Consecutive successful `clear` attempts on the same target needed to
    /// detonate.
    pub clear_steps: u32,
    /// Energy spent per successful `clear` attempt.
    pub clear_energy_cost: u32,
    /// Steps an entity stays disabled after being caught in a clear event.
    pub disable_duration: u32,
    pub max_energy: u32,
    /// `[min, max]` distinct block types available at setup time.
    pub block_types: IntRange,
    /// `[min, max]` dispensers placed at setup time.
    pub dispensers: IntRange,
    pub tasks: TasksConfig,
    pub events: EventsConfig,
    pub grid: GridConfig,
    /// Raw setup DSL lines, parsed by [`crate::setup::parse_setup`].
    pub setup: Vec<String>,
    /// Team name -> ordered list of agent names.
    pub teams: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// Validate internal consistency. Does not touch the setup DSL -- that
    /// is parsed (and malformed lines skipped) independently, since a
    /// per-line DSL error should never invalidate the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.block_types.validate("block_types")?;
        self.dispensers.validate("dispensers")?;
        self.tasks.duration.validate("tasks.duration")?;
        self.tasks.size.validate("tasks.size")?;
        self.events.radius.validate("events.radius")?;
        self.events.create.validate("events.create")?;

        if !(0.0..=1.0).contains(&self.tasks.probability) {
            return Err(ConfigError::InvalidProbability {
                field: "tasks.probability",
                value: self.tasks.probability.to_string(),
            });
        }

        if self.grid.width <= 0 || self.grid.height <= 0 {
            return Err(ConfigError::InvalidGridSize {
                width: self.grid.width,
                height: self.grid.height,
            });
        }

        if self.teams.is_empty() || self.teams.values().any(|agents| agents.is_empty()) {
            return Err(ConfigError::EmptyTeams);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        Config {
            random_fail: 0,
            attach_limit: 3,
            clear_steps: 2,
            clear_energy_cost: 5,
            disable_duration: 10,
            max_energy: 100,
            block_types: IntRange::new(1, 3),
            dispensers: IntRange::new(1, 2),
            tasks: TasksConfig {
                duration: IntRange::new(10, 50),
                size: IntRange::new(1, 4),
                probability: 0.05,
            },
            events: EventsConfig {
                chance: 2,
                radius: IntRange::new(1, 3),
                warning: 5,
                create: IntRange::new(0, 2),
            },
            grid: GridConfig { width: 20, height: 20 },
            setup: Vec::new(),
            teams: BTreeMap::from([("A".to_owned(), vec!["agentA0".to_owned()])]),
        }
    }

    #[test]
    fn minimal_config_validates() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut config = minimal_config();
        config.block_types = IntRange::new(5, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { field: "block_types", .. })
        ));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let mut config = minimal_config();
        config.tasks.probability = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProbability { field: "tasks.probability", .. })
        ));
    }

    #[test]
    fn nonpositive_grid_is_rejected() {
        let mut config = minimal_config();
        config.grid = GridConfig { width: 0, height: 20 };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidGridSize { .. })));
    }

    #[test]
    fn empty_team_agent_list_is_rejected() {
        let mut config = minimal_config();
        config.teams.insert("B".to_owned(), Vec::new());
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTeams)));
    }

    #[test]
    fn degenerate_range_samples_its_single_value() {
        let range = IntRange::new(4, 4);
        let mut rng = rand::thread_rng();
        assert_eq!(range.sample(&mut rng), 4);
    }
}
