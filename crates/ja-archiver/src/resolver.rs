//! Second pass: decide which identities survive once every root is walked.

use crate::identity::{IdentityTracker, Mode, SlotState};
use ja_core::Identity;
use std::collections::{HashMap, HashSet, VecDeque};

/// One referrer-to-referent link seen during traversal. `from` is `None`
/// for a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: Option<Identity>,
    pub to: Identity,
    pub mode: Mode,
}

/// Outcome of [`ConditionalResolver::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Resolved {
    pub kept: usize,
    pub dropped: usize,
}

#[derive(Debug, Default)]
pub struct ConditionalResolver {
    edges: Vec<Edge>,
}

impl ConditionalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, from: Option<Identity>, to: Identity, mode: Mode) {
        self.edges.push(Edge { from, to, mode });
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Keep every identity reachable from a root through unconditional
    /// edges only; drop the rest. Must run after traversal is complete.
    pub fn resolve(&self, tracker: &mut IdentityTracker) -> Resolved {
        let mut adjacency: HashMap<Identity, Vec<Identity>> = HashMap::new();
        let mut queue = VecDeque::new();
        for edge in self.edges.iter().filter(|e| e.mode == Mode::Unconditional) {
            match edge.from {
                None => queue.push_back(edge.to),
                Some(from) => adjacency.entry(from).or_default().push(edge.to),
            }
        }

        let mut reached = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !reached.insert(id) {
                continue;
            }
            if let Some(next) = adjacency.get(&id) {
                queue.extend(next.iter().copied().filter(|n| !reached.contains(n)));
            }
        }

        let ids: Vec<Identity> = tracker.identities().collect();
        let mut resolved = Resolved::default();
        for id in ids {
            let direct = tracker.slot(id).is_some_and(|s| s.reached_unconditionally);
            match tracker.finalize(id, direct && reached.contains(&id)) {
                SlotState::Kept => resolved.kept += 1,
                _ => {
                    tracing::trace!(%id, "identity dropped");
                    resolved.dropped += 1;
                }
            }
        }
        tracing::debug!(kept = resolved.kept, dropped = resolved.dropped, "conditional references resolved");
        resolved
    }
}
