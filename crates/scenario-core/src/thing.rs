//! Positioned things: entities, blocks, and dispensers.
//!
//! Represented as a single tagged enum rather than an open trait hierarchy --
//! capability checks (`is_attachable`) are variant matches, not virtual
//! dispatch. Every variant carries a stable [`ThingId`] and a [`Position`].

use serde::{Deserialize, Serialize};

use crate::position::Position;

// ---------------------------------------------------------------------------
// ThingId
// ---------------------------------------------------------------------------

/// A stable string identifier, e.g. `"entity3"`, `"block12"`, `"dispenser0"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThingId(pub String);

impl std::fmt::Display for ThingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ThingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Which kind of thing an id/variant refers to. Drives id-prefix allocation
/// and attachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingKind {
    Entity,
    Block,
    Dispenser,
}

impl ThingKind {
    fn prefix(self) -> &'static str {
        match self {
            ThingKind::Entity => "entity",
            ThingKind::Block => "block",
            ThingKind::Dispenser => "dispenser",
        }
    }

    /// Entities and blocks are attachable; dispensers are not.
    pub fn is_attachable(self) -> bool {
        matches!(self, ThingKind::Entity | ThingKind::Block)
    }
}

/// Monotonic per-kind id allocator. Ids are never reused within a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next_entity: u64,
    next_block: u64,
    next_dispenser: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, kind: ThingKind) -> ThingId {
        let counter = match kind {
            ThingKind::Entity => &mut self.next_entity,
            ThingKind::Block => &mut self.next_block,
            ThingKind::Dispenser => &mut self.next_dispenser,
        };
        let id = ThingId(format!("{}{}", kind.prefix(), *counter));
        *counter += 1;
        id
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An agent-controlled entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: ThingId,
    pub agent_name: String,
    pub team_name: String,
    pub position: Position,
    pub energy: u32,
    pub max_energy: u32,
    pub disabled_for_steps: u32,
    pub vision: u32,
    pub last_action: String,
    pub last_action_params: Vec<String>,
    pub last_action_result: String,
    pub clear_counter: u32,
    pub previous_clear_step: Option<u64>,
    pub previous_clear_position: Option<Position>,
}

impl Entity {
    pub fn new(
        id: ThingId,
        agent_name: impl Into<String>,
        team_name: impl Into<String>,
        position: Position,
        max_energy: u32,
        vision: u32,
    ) -> Self {
        Self {
            id,
            agent_name: agent_name.into(),
            team_name: team_name.into(),
            position,
            energy: max_energy,
            max_energy,
            disabled_for_steps: 0,
            vision,
            last_action: "no_action".to_owned(),
            last_action_params: Vec::new(),
            last_action_result: "uninitialized".to_owned(),
            clear_counter: 0,
            previous_clear_step: None,
            previous_clear_position: None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_for_steps > 0
    }
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A movable, attachable block of a given type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: ThingId,
    pub block_type: String,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Dispenser
// ---------------------------------------------------------------------------

/// An immortal source of blocks of a single type. Not attachable; may share
/// a cell with at most one other thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispenser {
    pub id: ThingId,
    pub block_type: String,
    pub position: Position,
}

// ---------------------------------------------------------------------------
// Thing
// ---------------------------------------------------------------------------

/// Any positioned object in the world: the union of [`Entity`], [`Block`],
/// and [`Dispenser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Thing {
    Entity(Entity),
    Block(Block),
    Dispenser(Dispenser),
}

impl Thing {
    pub fn id(&self) -> &ThingId {
        match self {
            Thing::Entity(e) => &e.id,
            Thing::Block(b) => &b.id,
            Thing::Dispenser(d) => &d.id,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Thing::Entity(e) => e.position,
            Thing::Block(b) => b.position,
            Thing::Dispenser(d) => d.position,
        }
    }

    pub fn set_position(&mut self, p: Position) {
        match self {
            Thing::Entity(e) => e.position = p,
            Thing::Block(b) => b.position = p,
            Thing::Dispenser(d) => d.position = p,
        }
    }

    pub fn kind(&self) -> ThingKind {
        match self {
            Thing::Entity(_) => ThingKind::Entity,
            Thing::Block(_) => ThingKind::Block,
            Thing::Dispenser(_) => ThingKind::Dispenser,
        }
    }

    /// Attachable = Entity or Block. Dispensers never attach.
    pub fn is_attachable(&self) -> bool {
        self.kind().is_attachable()
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Thing::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_entity_mut(&mut self) -> Option<&mut Entity> {
        match self {
            Thing::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Thing::Block(b) => Some(b),
            _ => None,
        }
    }

    pub fn block_type(&self) -> Option<&str> {
        match self {
            Thing::Block(b) => Some(&b.block_type),
            Thing::Dispenser(d) => Some(&d.block_type),
            Thing::Entity(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
