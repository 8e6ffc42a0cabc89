//! Per-entity state transitions that are not themselves action handlers:
//! the per-tick `pre_step`, disabling (on clear-event detonation), and the
//! clear-action counter that decides when a detonation happens.

use scenario_core::arena::ThingStore;
use scenario_core::attachment::AttachmentGraph;
use scenario_core::position::Position;
use scenario_core::terrain::TerrainGrid;
use scenario_core::thing::{Entity, ThingId};

/// Run once per entity at the top of every step: decrement the disable
/// timer and reset the per-step result string.
///
/// Energy does not regenerate here -- see the open question in the design
/// notes; a configured regeneration policy would be layered on top of this,
/// not inside it.
pub fn pre_step(entity: &mut Entity) {
    if entity.disabled_for_steps > 0 {
        entity.disabled_for_steps -= 1;
    }
    entity.last_action_result = "uninitialized".to_owned();
}

/// Disable an entity: it stops acting for `disable_duration` steps, drops
/// every attachment, and is teleported to a random free cell.
pub fn disable(
    entity_id: &ThingId,
    disable_duration: u32,
    terrain: &TerrainGrid,
    things: &mut ThingStore,
    graph: &mut AttachmentGraph,
    rng: &mut impl rand::Rng,
) {
    graph.remove_thing(entity_id);

    let destination = things.random_free_position(terrain, rng);

    if let Some(entity) = things.by_id_mut(entity_id).and_then(|t| t.as_entity_mut()) {
        entity.disabled_for_steps = disable_duration;
        if let Some(p) = destination {
            entity.position = p;
        }
    }
}

/// Outcome of a `clear` attempt's counter bookkeeping: whether this attempt
/// should detonate `clear_area` right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearCounterOutcome {
    pub should_detonate: bool,
}

/// Advance the three-tuple `(clear_counter, previous_clear_step,
/// previous_clear_position)`: the counter resets to zero
/// whenever this attempt doesn't continue the same target from the
/// immediately preceding step, then always increments by one. Detonation
/// happens, and the counter resets, once it reaches `clear_steps`.
pub fn advance_clear_counter(
    entity: &mut Entity,
    step: u64,
    target: Position,
    clear_steps: u32,
) -> ClearCounterOutcome {
    let continues_previous =
        entity.previous_clear_step == Some(step.wrapping_sub(1)) && entity.previous_clear_position == Some(target);

    if !continues_previous {
        entity.clear_counter = 0;
    }
    entity.clear_counter += 1;

    entity.previous_clear_step = Some(step);
    entity.previous_clear_position = Some(target);

    let should_detonate = entity.clear_counter == clear_steps;
    if should_detonate {
        entity.clear_counter = 0;
    }

    ClearCounterOutcome { should_detonate }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
