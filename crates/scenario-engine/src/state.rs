//! `GameState`: the single owned aggregate that every handler mutates.
//!
//! There is no process-wide singleton anywhere in this crate -- energy caps,
//! clear durations, and the PRNG are all fields of this struct, passed by
//! mutable reference into the free functions in [`crate::rigid`],
//! [`crate::entity_ops`], [`crate::task`], and [`crate::clear_event`].

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use scenario_config::config::Config;
use scenario_config::setup::{SetupCommand, ThingKind as SetupThingKind};
use scenario_core::attachment::AttachmentGraph;
use scenario_core::position::Position;
use scenario_core::terrain::{Terrain, TerrainGrid};
use scenario_core::thing::{Block, Dispenser, Entity, Thing, ThingId, ThingKind};

use crate::clear_event::{self, ClearEvent};
use crate::entity_ops;
use crate::error::EngineError;
use crate::percept::{self, FinalPercept, InitialPercept, StepPercept, TeamResult, WorldSnapshotView};
use crate::task::TaskRegistry;

/// Vision radius assigned to every entity at creation. The config record
/// carries no per-agent vision field; every agent gets the same fixed
/// value rather than a per-team or per-agent override.
pub const DEFAULT_VISION: u32 = 5;

/// The root simulation aggregate: thing arena, terrain, attachment graph,
/// task registry, team scores, pending clear events, and the single seeded
/// PRNG every stochastic draw comes from.
#[derive(Debug, Clone)]
pub struct GameState {
    pub step: u64,
    pub config: Config,
    pub terrain: TerrainGrid,
    pub things: scenario_core::arena::ThingStore,
    pub graph: AttachmentGraph,
    pub tasks: TaskRegistry,
    /// Team names in the order `Config.teams` (a `BTreeMap`) iterates, i.e.
    /// alphabetical by team name -- used to break score ties. An
    /// alphabetical approximation of true registration order, since the
    /// config representation is a sorted map (see DESIGN.md's open-question
    /// resolutions).
    pub team_order: Vec<String>,
    pub team_scores: BTreeMap<String, i64>,
    /// `agent_name -> entity id`, one entry per entity created in [`GameState::new`].
    pub agents: BTreeMap<String, ThingId>,
    pub pending_events: Vec<ClearEvent>,
    /// `pub(crate)` rather than private: handlers in [`crate::actions`] need
    /// to borrow this disjointly from `terrain`/`things`/`graph` in the same
    /// expression, which a `&mut self` accessor method cannot express.
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Build a fresh game from a validated config, a seed, and a terrain
    /// provider. One entity is created per configured agent, placed at a
    /// uniformly random free cell; the setup DSL (applied separately via
    /// [`GameState::apply_setup`]) is expected to reposition agents and add
    /// blocks/dispensers/tasks/attachments as needed.
    pub fn new(
        config: Config,
        seed: u64,
        terrain_provider: impl FnMut(Position) -> Terrain,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let terrain = TerrainGrid::new(config.grid.width, config.grid.height, terrain_provider);
        let mut things = scenario_core::arena::ThingStore::new();
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut team_order = Vec::new();
        let mut team_scores = BTreeMap::new();
        let mut agents = BTreeMap::new();

        for (team_name, agent_names) in &config.teams {
            team_order.push(team_name.clone());
            team_scores.insert(team_name.clone(), 0i64);

            for agent_name in agent_names {
                let id = things.allocate_id(ThingKind::Entity);
                let position = things.random_free_position(&terrain, &mut rng).unwrap_or(Position::new(0, 0));
                let entity = Entity::new(
                    id.clone(),
                    agent_name.clone(),
                    team_name.clone(),
                    position,
                    config.max_energy,
                    DEFAULT_VISION,
                );
                things.register(Thing::Entity(entity));
                agents.insert(agent_name.clone(), id);
            }
        }

        Ok(Self {
            step: 0,
            config,
            terrain,
            things,
            graph: AttachmentGraph::new(),
            tasks: TaskRegistry::new(),
            team_order,
            team_scores,
            agents,
            pending_events: Vec::new(),
            rng,
        })
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn entity_id(&self, agent_name: &str) -> Option<&ThingId> {
        self.agents.get(agent_name)
    }

    pub fn entity(&self, agent_name: &str) -> Option<&Entity> {
        self.agents.get(agent_name).and_then(|id| self.things.by_id(id)).and_then(Thing::as_entity)
    }

    /// Apply parsed setup-DSL commands against this (presumably fresh)
    /// state. Malformed references (unknown agent, ambiguous attach
    /// target, out-of-bounds placement) are logged and skipped -- setup
    /// application never aborts partway, matching the DSL's own
    /// per-line error policy.
    pub fn apply_setup(&mut self, commands: Vec<SetupCommand>) {
        for command in commands {
            match command {
                SetupCommand::Move { x, y, agent } => self.apply_setup_move(x, y, &agent),
                SetupCommand::Add { x, y, kind, block_type } => self.apply_setup_add(x, y, kind, block_type),
                SetupCommand::CreateTask { name, duration, requirements } => {
                    let requirements: Vec<(Position, String)> =
                        requirements.into_iter().map(|r| (Position::new(r.x, r.y), r.block_type)).collect();
                    if self.tasks.create_custom_task(name.clone(), self.step, duration, requirements).is_none() {
                        tracing::warn!(name, "setup create task has no requirements, skipped");
                    }
                }
                SetupCommand::Attach { a, b } => self.apply_setup_attach(a, b),
            }
        }
    }

    fn apply_setup_move(&mut self, x: i32, y: i32, agent: &str) {
        let target = Position::new(x, y);
        let Some(id) = self.agents.get(agent).cloned() else {
            tracing::warn!(agent, "setup move references unknown agent, skipped");
            return;
        };
        if !self.terrain.in_bounds(target) {
            tracing::warn!(agent, x, y, "setup move target out of bounds, skipped");
            return;
        }
        self.things.relocate(&id, target);
    }

    fn apply_setup_add(&mut self, x: i32, y: i32, kind: SetupThingKind, block_type: String) {
        let position = Position::new(x, y);
        if !self.terrain.in_bounds(position) {
            tracing::warn!(x, y, "setup add target out of bounds, skipped");
            return;
        }
        match kind {
            SetupThingKind::Block => {
                let id = self.things.allocate_id(ThingKind::Block);
                self.things.register(Thing::Block(Block { id, block_type, position }));
            }
            SetupThingKind::Dispenser => {
                let id = self.things.allocate_id(ThingKind::Dispenser);
                self.things.register(Thing::Dispenser(Dispenser { id, block_type, position }));
            }
        }
    }

    fn apply_setup_attach(&mut self, a: (i32, i32), b: (i32, i32)) {
        let pa = Position::new(a.0, a.1);
        let pb = Position::new(b.0, b.1);
        let (Some(ta), Some(tb)) = (self.things.unique_attachable_at(pa), self.things.unique_attachable_at(pb)) else {
            tracing::warn!(?a, ?b, "setup attach targets are not uniquely resolvable, skipped");
            return;
        };
        let (ida, idb) = (ta.id().clone(), tb.id().clone());
        if !crate::rigid::attach(&ida, &idb, self.config.attach_limit, &self.things, &mut self.graph) {
            tracing::warn!(?a, ?b, "setup attach rejected: not adjacent or over attach limit");
        }
    }

    /// `{agent, team, total_steps, vision}` for every configured agent.
    /// Sent once, before the first `prepare_step`.
    pub fn initial_percepts(&self, total_steps: u64) -> BTreeMap<String, InitialPercept> {
        self.agents
            .iter()
            .filter_map(|(agent_name, id)| {
                let entity = self.things.by_id(id).and_then(Thing::as_entity)?;
                Some((
                    agent_name.clone(),
                    InitialPercept {
                        agent: agent_name.clone(),
                        team: entity.team_name.clone(),
                        total_steps,
                        vision: entity.vision,
                    },
                ))
            })
            .collect()
    }

    /// The authoritative per-step ordering. Draws from the
    /// single seeded PRNG in a fixed sequence: task-creation roll (and, on
    /// success, duration/size/walk draws), then the event-chance roll (and,
    /// on success, center/radius draws), then per-event firing draws.
    pub fn prepare_step(&mut self) -> BTreeMap<String, StepPercept> {
        self.step += 1;
        self.terrain.clear_markers();

        let task_roll: f64 = self.rng.gen_range(0.0..1.0);
        if task_roll <= self.config.tasks.probability {
            let duration = self.config.tasks.duration.sample(&mut self.rng) as u32;
            let size = self.config.tasks.size.sample(&mut self.rng) as u32;
            self.tasks.create_task(self.step, duration, size, &mut self.rng);
        }

        let agent_ids: Vec<ThingId> = self.agents.values().cloned().collect();
        for id in &agent_ids {
            if let Some(entity) = self.things.by_id_mut(id).and_then(|t| t.as_entity_mut()) {
                entity_ops::pre_step(entity);
            }
        }

        let event_roll: u32 = self.rng.gen_range(0..100);
        if event_roll < self.config.events.chance {
            let width = self.terrain.width().max(1);
            let height = self.terrain.height().max(1);
            let center = Position::new(self.rng.gen_range(0..width), self.rng.gen_range(0..height));
            let radius = self.config.events.radius.sample(&mut self.rng);
            self.pending_events.push(ClearEvent {
                center,
                fire_step: self.step + self.config.events.warning as u64,
                radius,
            });
        }

        let due: Vec<ClearEvent> = std::mem::take(&mut self.pending_events);
        for event in due {
            if event.fire_step == self.step {
                clear_event::fire(
                    &event,
                    self.config.disable_duration,
                    self.config.events.create.min,
                    self.config.events.create.max,
                    &mut self.terrain,
                    &mut self.things,
                    &mut self.graph,
                    &mut self.rng,
                );
            } else {
                clear_event::paint_warning(&event, &mut self.terrain);
                self.pending_events.push(event);
            }
        }

        self.build_percepts()
    }

    fn build_percepts(&self) -> BTreeMap<String, StepPercept> {
        let mut result = BTreeMap::new();
        for (agent_name, id) in &self.agents {
            let Some(entity) = self.things.by_id(id).and_then(Thing::as_entity) else {
                continue;
            };
            let team_score = *self.team_scores.get(&entity.team_name).unwrap_or(&0);
            let opponent_attachments = percept::opponent_attached_positions(id, entity, &self.things, &self.graph);
            let step_percept = percept::assemble_step_percept(
                entity,
                self.step,
                team_score,
                &self.things,
                &self.terrain,
                self.tasks.open_tasks(self.step).cloned(),
                &opponent_attachments,
            );
            result.insert(agent_name.clone(), step_percept);
        }
        result
    }

    /// 1-based rank per team, higher score first, ties by registration order.
    pub fn final_percepts(&self) -> BTreeMap<String, FinalPercept> {
        let ordered: Vec<(String, i64)> =
            self.team_order.iter().map(|t| (t.clone(), *self.team_scores.get(t).unwrap_or(&0))).collect();
        percept::rank_teams(&ordered)
    }

    pub fn result(&self) -> BTreeMap<String, TeamResult> {
        percept::build_result(&self.team_scores)
    }

    pub fn snapshot_view(&self) -> WorldSnapshotView {
        percept::build_snapshot_view(&self.things, &self.tasks, self.step)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
