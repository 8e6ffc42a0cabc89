//! Task generation and the task registry.
//!
//! Generated tasks use a random walk seeded at `(0, 1)` with per-step
//! probabilities `{0.3 left, 0.3 right, 0.4 down}` to lay out requirements
//! for `create_task(duration, size)`. `create_task(name, duration,
//! requirements)` lays down a caller-supplied pattern instead, used by the
//! setup DSL's `create task` command.

use std::collections::BTreeMap;

use scenario_core::position::Position;
use serde::{Deserialize, Serialize};

/// A goal-cell block pattern a team can submit to earn `reward`.
///
/// `requirements` is stored as a sorted `(offset, block_type)` list rather
/// than a map: the offsets are [`Position`] structs, and `serde_json` maps
/// require string-like keys, but this value tree is serialized directly for
/// percepts/snapshots. Generation still deduplicates offsets via a scratch
/// `BTreeMap` (see [`random_walk_requirements`]) before converting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub deadline_step: u64,
    pub reward: u32,
    pub completed: bool,
    pub requirements: Vec<(Position, String)>,
}

impl Task {
    pub fn is_expired(&self, step: u64) -> bool {
        step > self.deadline_step
    }

    /// Open (not completed, not expired) -- the set `toPercept` emits.
    pub fn is_open(&self, step: u64) -> bool {
        !self.completed && !self.is_expired(step)
    }

    pub fn requirement_at(&self, offset: Position) -> Option<&str> {
        self.requirements.iter().find(|(p, _)| *p == offset).map(|(_, t)| t.as_str())
    }
}

/// All tasks ever generated, keyed by name. Expired-but-incomplete tasks are
/// retained by default (percept assembly filters them out); see
/// [`TaskRegistry::prune_expired`] for an opt-in bound on unbounded growth.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Task>,
    generated_count: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh random-walk task. Returns `None` (and creates
    /// nothing) if `size < 1`.
    pub fn create_task(&mut self, step: u64, duration: u32, size: u32, rng: &mut impl rand::Rng) -> Option<&Task> {
        if size < 1 {
            return None;
        }
        let name = format!("task{}", self.generated_count);
        self.generated_count += 1;

        let requirements = random_walk_requirements(size, rng);
        let task = Task {
            reward: requirements.len() as u32,
            name: name.clone(),
            deadline_step: step + duration as u64,
            completed: false,
            requirements,
        };
        self.tasks.insert(name.clone(), task);
        self.tasks.get(&name)
    }

    /// Lay down a caller-supplied pattern. Requires at least one
    /// requirement; otherwise a no-op.
    pub fn create_custom_task(
        &mut self,
        name: impl Into<String>,
        step: u64,
        duration: u32,
        requirements: Vec<(Position, String)>,
    ) -> Option<&Task> {
        if requirements.is_empty() {
            return None;
        }
        let name = name.into();
        let task = Task {
            reward: requirements.len() as u32,
            name: name.clone(),
            deadline_step: step + duration as u64,
            completed: false,
            requirements,
        };
        self.tasks.insert(name.clone(), task);
        self.tasks.get(&name)
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.get_mut(name)
    }

    /// Mark `name` completed. No-op if already completed or absent.
    pub fn complete(&mut self, name: &str) {
        if let Some(task) = self.tasks.get_mut(name) {
            task.completed = true;
        }
    }

    /// Tasks eligible for `toPercept`: open at `step`, in name order.
    pub fn open_tasks(&self, step: u64) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |t| t.is_open(step))
    }

    /// Drop expired, incomplete tasks to bound memory growth. Opt-in: never
    /// calling this leaves tasks accumulating unbounded, which is the
    /// default.
    pub fn prune_expired(&mut self, step: u64) {
        self.tasks.retain(|_, t| t.completed || !t.is_expired(step));
    }
}

fn random_walk_requirements(size: u32, rng: &mut impl rand::Rng) -> Vec<(Position, String)> {
    let mut seen = BTreeMap::new();
    let mut pos = Position::new(0, 1);
    for i in 0..size {
        let u: f64 = rng.gen_range(0.0..1.0);
        let step = if u <= 0.3 {
            (-1, 0)
        } else if u <= 0.6 {
            (1, 0)
        } else {
            (0, 1)
        };
        pos = pos.translate(step.0, step.1);
        seen.insert(pos, format!("b{i}"));
    }
    seen.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
