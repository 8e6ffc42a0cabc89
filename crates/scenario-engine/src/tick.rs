//! `Match`: the thin orchestration loop around [`GameState`] that ties
//! per-step world preparation to turn-serialized action dispatch.
//!
//! Prepares world state for the tick, collects external input, applies it in
//! a fixed order, and advances the counter -- with no systems registry and
//! no fixed-`dt` wall clock, since a tick here is a discrete turn, not a
//! physics frame. Match orchestration, networking, and serialization remain
//! the external harness's job; this type only sequences calls the harness
//! would otherwise have to sequence itself.

use std::collections::BTreeMap;

use scenario_config::config::Config;
use scenario_core::position::Position;
use scenario_core::terrain::Terrain;

use crate::actions::Action;
use crate::error::EngineError;
use crate::percept::{FinalPercept, InitialPercept, StepPercept, TeamResult};
use crate::result::ActionResult;
use crate::state::GameState;

/// Drives a [`GameState`] through its tick lifecycle: one `prepare_step` per
/// tick, followed by dispatch of whatever actions the harness submits for
/// that tick in deterministic (lexicographic by agent name) order.
pub struct Match {
    state: GameState,
    total_steps: u64,
}

impl Match {
    pub fn new(
        config: Config,
        seed: u64,
        total_steps: u64,
        terrain_provider: impl FnMut(Position) -> Terrain,
    ) -> Result<Self, EngineError> {
        let mut state = GameState::new(config, seed, terrain_provider)?;
        let setup = std::mem::take(&mut state.config.setup);
        let commands = scenario_config::setup::parse_setup(&setup);
        state.apply_setup(commands);
        Ok(Self { state, total_steps })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn is_finished(&self) -> bool {
        self.state.step >= self.total_steps
    }

    pub fn initial_percepts(&self) -> BTreeMap<String, InitialPercept> {
        self.state.initial_percepts(self.total_steps)
    }

    /// Advance the step counter, roll for a new task, run `pre_step` on
    /// every entity, roll for a new clear event, fire or paint every pending
    /// event, and return the freshly assembled percepts.
    pub fn prepare_step(&mut self) -> BTreeMap<String, StepPercept> {
        self.state.prepare_step()
    }

    /// Dispatch one submitted action per agent, in lexicographic order of
    /// agent name (a `BTreeMap` already iterates that way), so that two
    /// actions targeting the same cell resolve with the first dispatched
    /// seeing none of the second's effects and the second seeing all of the
    /// first's.
    ///
    /// Agents with no submitted action for this tick are dispatched
    /// [`Action::NoAction`], matching a harness that submits a no-op on
    /// timeout.
    pub fn dispatch_actions(
        &mut self,
        mut submitted: BTreeMap<String, Action>,
    ) -> Result<BTreeMap<String, ActionResult>, EngineError> {
        let agent_names: Vec<String> = self.state.agents.keys().cloned().collect();
        let mut results = BTreeMap::new();
        for agent_name in agent_names {
            let action = submitted.remove(&agent_name).unwrap_or(Action::NoAction);
            let result = self.state.dispatch_action(&agent_name, action)?;
            results.insert(agent_name, result);
        }
        Ok(results)
    }

    pub fn final_percepts(&self) -> BTreeMap<String, FinalPercept> {
        self.state.final_percepts()
    }

    pub fn result(&self) -> BTreeMap<String, TeamResult> {
        self.state.result()
    }
}
