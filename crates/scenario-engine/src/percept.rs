//! Percept and snapshot assembly: the plain record trees handed to the
//! external serializer. Nothing in this module does wire encoding -- that is
//! explicitly out of scope; these are value trees only.

use std::collections::BTreeMap;

use scenario_core::arena::ThingStore;
use scenario_core::attachment::AttachmentGraph;
use scenario_core::position::{Area, Position};
use scenario_core::terrain::{Terrain, TerrainGrid};
use scenario_core::thing::{Entity, Thing, ThingId};
use serde::{Deserialize, Serialize};

use crate::task::Task;

// ---------------------------------------------------------------------------
// Initial percept
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialPercept {
    pub agent: String,
    pub team: String,
    pub total_steps: u64,
    pub vision: u32,
}

// ---------------------------------------------------------------------------
// Step percept
// ---------------------------------------------------------------------------

/// A thing observed in an entity's vision, in local (observer-relative)
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedThing {
    pub id: String,
    pub kind: &'static str,
    pub local_position: Position,
    pub block_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenTaskRecord {
    pub name: String,
    pub deadline_step: u64,
    pub reward: u32,
    pub requirements: Vec<(Position, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPercept {
    pub step: u64,
    pub team_score: i64,
    pub energy: u32,
    pub disabled: bool,
    pub last_action: String,
    pub last_action_params: Vec<String>,
    pub last_action_result: String,
    pub things: Vec<ObservedThing>,
    /// Terrain kinds other than `Empty`, grouped by name, at local positions.
    pub terrain: BTreeMap<&'static str, Vec<Position>>,
    /// Local positions of things (in this entity's own group) attached,
    /// directly or transitively, to an opposing entity.
    pub attached_to_opponent: Vec<Position>,
    pub open_tasks: Vec<OpenTaskRecord>,
}

fn terrain_name(t: Terrain) -> &'static str {
    match t {
        Terrain::Empty => "empty",
        Terrain::Obstacle => "obstacle",
        Terrain::Goal => "goal",
    }
}

fn thing_kind_name(thing: &Thing) -> &'static str {
    match thing {
        Thing::Entity(_) => "entity",
        Thing::Block(_) => "block",
        Thing::Dispenser(_) => "dispenser",
    }
}

/// Assemble the percept for `observer`, scanning `Area(observer.position,
/// observer.vision)`.
#[allow(clippy::too_many_arguments)]
pub fn assemble_step_percept(
    observer: &Entity,
    step: u64,
    team_score: i64,
    things: &ThingStore,
    terrain: &TerrainGrid,
    tasks: impl Iterator<Item = Task>,
    opponent_attachments: &[Position],
) -> StepPercept {
    let mut observed = Vec::new();
    let mut terrain_groups: BTreeMap<&'static str, Vec<Position>> = BTreeMap::new();

    for cell in Area::new(observer.position, observer.vision as i32).iter() {
        if !terrain.in_bounds(cell) {
            continue;
        }
        let kind = terrain.terrain_at(cell);
        if kind != Terrain::Empty {
            terrain_groups.entry(terrain_name(kind)).or_default().push(cell.relative_to(observer.position));
        }
        for thing in things.things_at(cell) {
            observed.push(ObservedThing {
                id: thing.id().to_string(),
                kind: thing_kind_name(thing),
                local_position: cell.relative_to(observer.position),
                block_type: thing.block_type().map(|s| s.to_owned()),
            });
        }
    }

    StepPercept {
        step,
        team_score,
        energy: observer.energy,
        disabled: observer.is_disabled(),
        last_action: observer.last_action.clone(),
        last_action_params: observer.last_action_params.clone(),
        last_action_result: observer.last_action_result.clone(),
        things: observed,
        terrain: terrain_groups,
        attached_to_opponent: opponent_attachments.to_vec(),
        open_tasks: tasks
            .map(|t| OpenTaskRecord {
                name: t.name,
                deadline_step: t.deadline_step,
                reward: t.reward,
                requirements: t.requirements,
            })
            .collect(),
    }
}

/// The local positions, relative to `observer`, of every member of
/// `observer`'s rigid group that is (directly or transitively, through the
/// group) attached to an entity on an opposing team.
pub fn opponent_attached_positions(
    observer_id: &ThingId,
    observer: &Entity,
    things: &ThingStore,
    graph: &AttachmentGraph,
) -> Vec<Position> {
    let group = graph.collect_group(observer_id);
    let mut positions = Vec::new();
    for member in &group {
        for neighbor in graph.neighbors(member) {
            if group.contains(neighbor) {
                continue;
            }
            if let Some(opponent) = things.by_id(neighbor).and_then(Thing::as_entity) {
                if opponent.team_name != observer.team_name {
                    if let Some(member_thing) = things.by_id(member) {
                        positions.push(member_thing.position().relative_to(observer.position));
                    }
                }
            }
        }
    }
    positions
}

// ---------------------------------------------------------------------------
// Final percept / result / snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPercept {
    pub score: i64,
    pub rank: u32,
}

/// Rank every `(team, score)` pair, 1-based, higher score first, ties
/// broken by the order teams appear in `ordered_teams` (insertion order).
pub fn rank_teams(ordered_teams: &[(String, i64)]) -> BTreeMap<String, FinalPercept> {
    let mut indexed: Vec<(usize, &(String, i64))> = ordered_teams.iter().enumerate().collect();
    indexed.sort_by(|a, b| b.1 .1.cmp(&a.1 .1).then(a.0.cmp(&b.0)));

    let mut ranks = BTreeMap::new();
    for (rank, (_, (team, score))) in indexed.into_iter().enumerate() {
        ranks.insert(team.clone(), FinalPercept { score: *score, rank: rank as u32 + 1 });
    }
    ranks
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResult {
    pub score: i64,
}

pub fn build_result(scores: &BTreeMap<String, i64>) -> BTreeMap<String, TeamResult> {
    scores.iter().map(|(team, &score)| (team.clone(), TeamResult { score })).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: String,
    pub agent_name: String,
    pub team_name: String,
    pub position: Position,
    pub energy: u32,
    pub disabled_for_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    pub id: String,
    pub block_type: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispenserSnapshot {
    pub id: String,
    pub block_type: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub name: String,
    pub deadline_step: u64,
    pub reward: u32,
    pub requirements: Vec<(Position, String)>,
}

/// The world snapshot rendered for external inspection. Completed tasks are
/// omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshotView {
    pub entities: Vec<EntitySnapshot>,
    pub blocks: Vec<BlockSnapshot>,
    pub dispensers: Vec<DispenserSnapshot>,
    pub tasks: Vec<TaskSnapshot>,
}

pub fn build_snapshot_view(things: &ThingStore, tasks: &crate::task::TaskRegistry, step: u64) -> WorldSnapshotView {
    let mut entities = Vec::new();
    let mut blocks = Vec::new();
    let mut dispensers = Vec::new();

    for thing in things.iter() {
        match thing {
            Thing::Entity(e) => entities.push(EntitySnapshot {
                id: e.id.to_string(),
                agent_name: e.agent_name.clone(),
                team_name: e.team_name.clone(),
                position: e.position,
                energy: e.energy,
                disabled_for_steps: e.disabled_for_steps,
            }),
            Thing::Block(b) => blocks.push(BlockSnapshot {
                id: b.id.to_string(),
                block_type: b.block_type.clone(),
                position: b.position,
            }),
            Thing::Dispenser(d) => dispensers.push(DispenserSnapshot {
                id: d.id.to_string(),
                block_type: d.block_type.clone(),
                position: d.position,
            }),
        }
    }

    let task_views = tasks
        .open_tasks(step)
        .map(|t| TaskSnapshot {
            name: t.name.clone(),
            deadline_step: t.deadline_step,
            reward: t.reward,
            requirements: t.requirements.clone(),
        })
        .collect();

    WorldSnapshotView { entities, blocks, dispensers, tasks: task_views }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_teams_orders_by_score_descending() {
        let scores = vec![("A".to_owned(), 10), ("B".to_owned(), 20)];
        let ranks = rank_teams(&scores);
        assert_eq!(ranks["B"].rank, 1);
        assert_eq!(ranks["A"].rank, 2);
    }

    #[test]
    fn rank_teams_breaks_ties_by_insertion_order() {
        let scores = vec![("first".to_owned(), 5), ("second".to_owned(), 5)];
        let ranks = rank_teams(&scores);
        assert_eq!(ranks["first"].rank, 1);
        assert_eq!(ranks["second"].rank, 2);
    }

    #[test]
    fn terrain_groups_exclude_empty() {
        let mut terrain = TerrainGrid::new(5, 5, |_| Terrain::Empty);
        terrain.set_terrain(Position::new(2, 2), Terrain::Goal);
        let things = ThingStore::new();
        let observer = Entity::new(ThingId("entity0".to_owned()), "a0", "teamA", Position::new(2, 2), 100, 2);

        let percept = assemble_step_percept(
            &observer,
            0,
            0,
            &things,
            &terrain,
            std::iter::empty(),
            &[],
        );

        assert_eq!(percept.terrain.get("goal"), Some(&vec![Position::new(0, 0)]));
        assert!(percept.terrain.get("empty").is_none());
    }
}
