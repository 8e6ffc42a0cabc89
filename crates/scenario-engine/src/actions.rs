//! The action dispatcher: one handler per [`Action`] variant.
//!
//! Every handler is a pure function of `&mut GameState` that runs to
//! completion and returns exactly one [`ActionResult`] -- no handler leaves
//! partial mutation on a failing path.

use rand::Rng;
use scenario_core::position::{Area, Direction, Position};
use scenario_core::terrain::Terrain;
use scenario_core::thing::{Block, Thing, ThingId, ThingKind};

use crate::clear_event;
use crate::entity_ops;
use crate::result::ActionResult;
use crate::rigid;
use crate::state::GameState;

/// An agent-submitted action. Local positions (in `Clear`/`Connect`) are
/// offsets relative to the acting entity, matching percept coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move { direction: Direction },
    Rotate { clockwise: bool },
    Attach { direction: Direction },
    Detach { direction: Direction },
    Connect { block_local: Position, partner_agent: String, partner_block_local: Position },
    Request { direction: Direction },
    Submit { task_name: String },
    Clear { target_local: Position },
    NoAction,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Move { .. } => "move",
            Action::Rotate { .. } => "rotate",
            Action::Attach { .. } => "attach",
            Action::Detach { .. } => "detach",
            Action::Connect { .. } => "connect",
            Action::Request { .. } => "request",
            Action::Submit { .. } => "submit",
            Action::Clear { .. } => "clear",
            Action::NoAction => "no_action",
        }
    }

    fn params(&self) -> Vec<String> {
        match self {
            Action::Move { direction } => vec![direction_name(*direction).to_owned()],
            Action::Rotate { clockwise } => vec![if *clockwise { "cw".to_owned() } else { "ccw".to_owned() }],
            Action::Attach { direction } | Action::Detach { direction } | Action::Request { direction } => {
                vec![direction_name(*direction).to_owned()]
            }
            Action::Connect { block_local, partner_agent, partner_block_local } => vec![
                format!("{},{}", block_local.x, block_local.y),
                partner_agent.clone(),
                format!("{},{}", partner_block_local.x, partner_block_local.y),
            ],
            Action::Submit { task_name } => vec![task_name.clone()],
            Action::Clear { target_local } => vec![format!("{},{}", target_local.x, target_local.y)],
            Action::NoAction => Vec::new(),
        }
    }
}

fn direction_name(direction: Direction) -> &'static str {
    match direction {
        Direction::North => "n",
        Direction::South => "s",
        Direction::East => "e",
        Direction::West => "w",
    }
}

impl GameState {
    /// Dispatch one action for `agent_name`. The random-fail roll is drawn
    /// from the shared PRNG unconditionally (it is the very next stochastic
    /// draw after `prepare_step`'s sequence, and must happen before any
    /// other per-action logic so replays stay bit-identical regardless of
    /// whether the entity turns out to be disabled).
    pub fn dispatch_action(
        &mut self,
        agent_name: &str,
        action: Action,
    ) -> Result<ActionResult, crate::error::EngineError> {
        let entity_id = self
            .entity_id(agent_name)
            .cloned()
            .ok_or_else(|| crate::error::EngineError::UnknownAgent(agent_name.to_owned()))?;

        let roll: u32 = self.rng_mut().gen_range(0..100);
        if roll < self.config.random_fail {
            self.record_last_action(&entity_id, &action, ActionResult::FailedRandom);
            return Ok(ActionResult::FailedRandom);
        }

        let disabled = self.things.by_id(&entity_id).and_then(Thing::as_entity).is_some_and(|e| e.is_disabled());
        if disabled {
            self.record_last_action(&entity_id, &action, ActionResult::FailedStatus);
            return Ok(ActionResult::FailedStatus);
        }

        let result = match &action {
            Action::Move { direction } => self.handle_move(&entity_id, *direction),
            Action::Rotate { clockwise } => self.handle_rotate(&entity_id, *clockwise),
            Action::Attach { direction } => self.handle_attach(&entity_id, *direction),
            Action::Detach { direction } => self.handle_detach(&entity_id, *direction),
            Action::Connect { block_local, partner_agent, partner_block_local } => {
                self.handle_connect(&entity_id, *block_local, partner_agent, *partner_block_local)
            }
            Action::Request { direction } => self.handle_request(&entity_id, *direction),
            Action::Submit { task_name } => self.handle_submit(&entity_id, task_name),
            Action::Clear { target_local } => self.handle_clear(&entity_id, *target_local),
            Action::NoAction => ActionResult::Success,
        };

        self.record_last_action(&entity_id, &action, result);
        Ok(result)
    }

    fn record_last_action(&mut self, entity_id: &ThingId, action: &Action, result: ActionResult) {
        if let Some(entity) = self.things.by_id_mut(entity_id).and_then(|t| t.as_entity_mut()) {
            entity.last_action = action.name().to_owned();
            entity.last_action_params = action.params();
            entity.last_action_result = result.as_str().to_owned();
        }
    }

    fn handle_move(&mut self, entity_id: &ThingId, direction: Direction) -> ActionResult {
        let group = self.graph.collect_group(entity_id);
        let v = rigid::translation_for(direction, 1);
        match rigid::move_with_attached(&group, v, self.config.attach_limit, &self.terrain, &mut self.things) {
            Ok(()) => ActionResult::Success,
            Err(_) => ActionResult::FailedPath,
        }
    }

    fn handle_rotate(&mut self, entity_id: &ThingId, clockwise: bool) -> ActionResult {
        let group = self.graph.collect_group(entity_id);
        let Some(pivot) = self.things.by_id(entity_id).map(|t| t.position()) else {
            return ActionResult::Failed;
        };
        match rigid::rotate_with_attached(&group, pivot, clockwise, self.config.attach_limit, &self.terrain, &mut self.things) {
            Ok(()) => ActionResult::Success,
            Err(_) => ActionResult::Failed,
        }
    }

    fn handle_attach(&mut self, entity_id: &ThingId, direction: Direction) -> ActionResult {
        let Some(entity_pos) = self.things.by_id(entity_id).map(|t| t.position()) else {
            return ActionResult::Failed;
        };
        let Some(self_team) = self.things.by_id(entity_id).and_then(Thing::as_entity).map(|e| e.team_name.clone())
        else {
            return ActionResult::Failed;
        };

        let target_pos = entity_pos.step(direction, 1);
        let Some(target) = self.things.unique_attachable_at(target_pos) else {
            return ActionResult::FailedTarget;
        };
        if let Some(opponent) = target.as_entity() {
            if opponent.team_name != self_team {
                return ActionResult::FailedTarget;
            }
        }
        let target_id = target.id().clone();

        if self.is_attached_to_opponent(&target_id, &self_team) {
            return ActionResult::Failed;
        }

        if rigid::attach(entity_id, &target_id, self.config.attach_limit, &self.things, &mut self.graph) {
            ActionResult::Success
        } else {
            ActionResult::Failed
        }
    }

    fn handle_detach(&mut self, entity_id: &ThingId, direction: Direction) -> ActionResult {
        let Some(entity_pos) = self.things.by_id(entity_id).map(|t| t.position()) else {
            return ActionResult::Failed;
        };
        let Some(self_team) = self.things.by_id(entity_id).and_then(Thing::as_entity).map(|e| e.team_name.clone())
        else {
            return ActionResult::Failed;
        };

        let target_pos = entity_pos.step(direction, 1);
        let Some(target) = self.things.unique_attachable_at(target_pos) else {
            return ActionResult::FailedTarget;
        };
        if let Some(opponent) = target.as_entity() {
            if opponent.team_name != self_team {
                return ActionResult::FailedTarget;
            }
        }
        let target_id = target.id().clone();

        if rigid::detach(entity_id, &target_id, &mut self.graph) {
            ActionResult::Success
        } else {
            ActionResult::Failed
        }
    }

    fn handle_connect(
        &mut self,
        entity_id: &ThingId,
        block_local: Position,
        partner_agent: &str,
        partner_block_local: Position,
    ) -> ActionResult {
        let Some(entity_pos) = self.things.by_id(entity_id).map(|t| t.position()) else {
            return ActionResult::Failed;
        };
        let Some(partner_id) = self.entity_id(partner_agent).cloned() else {
            return ActionResult::FailedTarget;
        };
        let Some(partner_pos) = self.things.by_id(&partner_id).map(|t| t.position()) else {
            return ActionResult::FailedTarget;
        };

        let block_pos = Position::from_relative(entity_pos, block_local);
        let partner_block_pos = Position::from_relative(partner_pos, partner_block_local);

        let Some(block_id) =
            self.things.unique_attachable_at(block_pos).filter(|t| t.as_block().is_some()).map(|t| t.id().clone())
        else {
            return ActionResult::FailedTarget;
        };
        let Some(partner_block_id) = self
            .things
            .unique_attachable_at(partner_block_pos)
            .filter(|t| t.as_block().is_some())
            .map(|t| t.id().clone())
        else {
            return ActionResult::FailedTarget;
        };

        let my_group = self.graph.collect_group(entity_id);
        let partner_group = self.graph.collect_group(&partner_id);

        if !my_group.contains(&block_id) || partner_group.contains(&block_id) {
            return ActionResult::Failed;
        }
        if !partner_group.contains(&partner_block_id) || my_group.contains(&partner_block_id) {
            return ActionResult::Failed;
        }
        if my_group.contains(&partner_id) {
            return ActionResult::Failed;
        }

        if rigid::attach(&block_id, &partner_block_id, self.config.attach_limit, &self.things, &mut self.graph) {
            ActionResult::Success
        } else {
            ActionResult::Failed
        }
    }

    fn handle_request(&mut self, entity_id: &ThingId, direction: Direction) -> ActionResult {
        let Some(entity_pos) = self.things.by_id(entity_id).map(|t| t.position()) else {
            return ActionResult::Failed;
        };
        let target_pos = entity_pos.step(direction, 1);

        let block_type = self.things.things_at(target_pos).into_iter().find_map(|t| match t {
            Thing::Dispenser(d) => Some(d.block_type.clone()),
            _ => None,
        });
        let Some(block_type) = block_type else {
            return ActionResult::FailedTarget;
        };

        if !scenario_core::arena::is_unblocked(&self.terrain, &self.things, target_pos) {
            return ActionResult::FailedBlocked;
        }

        let id = self.things.allocate_id(ThingKind::Block);
        self.things.register(Thing::Block(Block { id, block_type, position: target_pos }));
        ActionResult::Success
    }

    fn handle_submit(&mut self, entity_id: &ThingId, task_name: &str) -> ActionResult {
        let Some((requirements, reward, completed)) =
            self.tasks.get(task_name).map(|t| (t.requirements.clone(), t.reward, t.completed))
        else {
            return ActionResult::FailedTarget;
        };
        if completed {
            return ActionResult::FailedTarget;
        }

        let Some((entity_pos, team_name)) =
            self.things.by_id(entity_id).and_then(Thing::as_entity).map(|e| (e.position, e.team_name.clone()))
        else {
            return ActionResult::Failed;
        };
        if self.terrain.terrain_at(entity_pos) != Terrain::Goal {
            return ActionResult::Failed;
        }

        let group = self.graph.collect_group(entity_id);
        let mut matched = Vec::with_capacity(requirements.len());
        for (offset, block_type) in &requirements {
            let cell = Position::from_relative(entity_pos, *offset);
            let found = self.things.attachables_at(cell).into_iter().find(|t| {
                group.contains(t.id()) && matches!(t, Thing::Block(_)) && t.block_type() == Some(block_type.as_str())
            });
            match found {
                Some(t) => matched.push(t.id().clone()),
                None => return ActionResult::Failed,
            }
        }

        for id in &matched {
            self.graph.remove_thing(id);
            self.things.remove(id);
        }
        self.tasks.complete(task_name);
        *self.team_scores.entry(team_name).or_insert(0) += reward as i64;
        ActionResult::Success
    }

    fn handle_clear(&mut self, entity_id: &ThingId, target_local: Position) -> ActionResult {
        let Some((entity_pos, vision, energy)) = self
            .things
            .by_id(entity_id)
            .and_then(Thing::as_entity)
            .map(|e| (e.position, e.vision, e.energy))
        else {
            return ActionResult::Failed;
        };

        let target = Position::from_relative(entity_pos, target_local);
        if !Area::new(entity_pos, vision as i32).contains(target) || !self.terrain.in_bounds(target) {
            return ActionResult::FailedTarget;
        }
        if energy < self.config.clear_energy_cost {
            return ActionResult::FailedStatus;
        }

        let clear_steps = self.config.clear_steps;
        let step = self.step;
        let cost = self.config.clear_energy_cost;
        let should_detonate = {
            let Some(entity) = self.things.by_id_mut(entity_id).and_then(|t| t.as_entity_mut()) else {
                return ActionResult::Failed;
            };
            entity.energy -= cost;
            entity_ops::advance_clear_counter(entity, step, target, clear_steps).should_detonate
        };

        if should_detonate {
            let disable_duration = self.config.disable_duration;
            clear_event::clear_area(
                target,
                1,
                disable_duration,
                &mut self.terrain,
                &mut self.things,
                &mut self.graph,
                &mut self.rng,
            );
        }

        ActionResult::Success
    }

    fn is_attached_to_opponent(&self, id: &ThingId, self_team: &str) -> bool {
        let group = self.graph.collect_group(id);
        for member in &group {
            for neighbor in self.graph.neighbors(member) {
                if group.contains(neighbor) {
                    continue;
                }
                if let Some(opponent) = self.things.by_id(neighbor).and_then(Thing::as_entity) {
                    if opponent.team_name != self_team {
                        return true;
                    }
                }
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
