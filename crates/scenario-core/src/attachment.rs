//! The attachment graph: an undirected adjacency relation over attachable
//! things, keyed by stable id rather than back-pointers.
//!
//! Modeled as a plain `BTreeMap<ThingId, BTreeSet<ThingId>>` adjacency list
//! instead of parent/child pointers on `Thing` itself, so that a rigid group
//! can be an arbitrary cyclic/undirected shape (a 2x2 block of attached
//! blocks, say) without fighting Rust's ownership rules -- no `Thing` ever
//! owns another `Thing`.

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::thing::ThingId;

/// Undirected adjacency over attachable thing ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttachmentGraph {
    edges: std::collections::BTreeMap<ThingId, BTreeSet<ThingId>>,
}

impl AttachmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the undirected edge `a -- b`. No-op if already present or if
    /// `a == b`.
    pub fn attach(&mut self, a: ThingId, b: ThingId) {
        if a == b {
            return;
        }
        self.edges.entry(a.clone()).or_default().insert(b.clone());
        self.edges.entry(b).or_default().insert(a);
    }

    /// Remove the undirected edge `a -- b`, if present.
    pub fn detach(&mut self, a: &ThingId, b: &ThingId) {
        if let Some(set) = self.edges.get_mut(a) {
            set.remove(b);
        }
        if let Some(set) = self.edges.get_mut(b) {
            set.remove(a);
        }
    }

    pub fn has_edge(&self, a: &ThingId, b: &ThingId) -> bool {
        self.edges.get(a).is_some_and(|set| set.contains(b))
    }

    /// Direct neighbors of `id`, in id order.
    pub fn neighbors(&self, id: &ThingId) -> impl Iterator<Item = &ThingId> {
        self.edges.get(id).into_iter().flat_map(|set| set.iter())
    }

    pub fn degree(&self, id: &ThingId) -> usize {
        self.edges.get(id).map_or(0, |set| set.len())
    }

    /// Remove every edge touching `id` (used when a thing is destroyed, to
    /// keep invariant 3: every attachment references a present thing).
    pub fn remove_thing(&mut self, id: &ThingId) {
        if let Some(neighbors) = self.edges.remove(id) {
            for neighbor in neighbors {
                if let Some(set) = self.edges.get_mut(&neighbor) {
                    set.remove(id);
                }
            }
        }
    }

    /// The connected component containing `start`, via breadth-first search.
    /// Always includes `start` itself, even if it has no edges.
    pub fn collect_group(&self, start: &ThingId) -> BTreeSet<ThingId> {
        let mut visited = BTreeSet::new();
        visited.insert(start.clone());
        let mut queue = VecDeque::new();
        queue.push_back(start.clone());
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(&current) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor.clone());
                }
            }
        }
        visited
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
