//! Tree builder: collects roots during traversal and links the final tree.

use crate::identity::{IdentityTracker, SlotState};
use ja_core::{Archive, ArchiverConfig, EncodedNode, Identity, NumberNode, RootKey};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Default)]
pub struct TreeBuilder {
    roots: Vec<(RootKey, EncodedNode)>,
    keys: HashSet<RootKey>,
    next_index: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, key: RootKey, node: EncodedNode) {
        if let RootKey::Index(index) = key {
            self.next_index = self.next_index.max(index + 1);
        }
        self.keys.insert(key.clone());
        self.roots.push((key, node));
    }

    pub fn has_root_key(&self, key: &RootKey) -> bool {
        self.keys.contains(key)
    }

    /// Index the next `encode_root` call receives.
    pub fn next_root_index(&self) -> usize {
        self.next_index
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Move kept nodes out of the tracker and rewrite references to dropped
    /// identities as `null`. The tracker must already be resolved.
    ///
    /// With `omit_nulls`, keyed roots that end up `null` are left out like
    /// null fields; indexed roots are positional and stay.
    pub fn build(self, tracker: &mut IdentityTracker, config: &ArchiverConfig) -> Archive {
        let ids: Vec<Identity> = tracker.identities().collect();
        let mut objects = BTreeMap::new();
        for id in ids {
            if let Some(node) = tracker.take_node(id) {
                objects.insert(id, node);
            }
        }

        let mut roots = self.roots;
        for node in objects.values_mut() {
            link(node, tracker, config.omit_nulls);
        }
        for (_, node) in roots.iter_mut() {
            link(node, tracker, config.omit_nulls);
        }
        if config.omit_nulls {
            roots.retain(|(key, node)| matches!(key, RootKey::Index(_)) || !node.is_null());
        }

        Archive::new(roots, objects, config.pretty_print)
    }
}

fn link(node: &mut EncodedNode, tracker: &IdentityTracker, omit_nulls: bool) {
    if let Some(id) = node.as_reference() {
        if tracker.state(id) != Some(SlotState::Kept) {
            *node = EncodedNode::Null;
        }
        return;
    }
    match node {
        EncodedNode::Array(items) => {
            for item in items.iter_mut() {
                link(item, tracker, omit_nulls);
            }
        }
        EncodedNode::Object { fields, .. } => {
            for value in fields.values_mut() {
                link(value, tracker, omit_nulls);
            }
            if omit_nulls {
                fields.retain(|_, value| !value.is_null());
            }
        }
        _ => {}
    }
}

/// Add `$id` and `$referrers` to every node of the objects table.
///
/// Runs on the final archive, so referrers only name identities that are
/// still in the table.
pub fn annotate(archive: &mut Archive) {
    let mut referrers: BTreeMap<Identity, Vec<Identity>> = BTreeMap::new();
    for (from, node) in archive.objects() {
        node.for_each_reference(&mut |to| referrers.entry(to).or_default().push(*from));
    }

    for (id, node) in archive.objects_mut() {
        let EncodedNode::Object { fields, .. } = node else {
            continue;
        };
        let mut from = referrers.remove(id).unwrap_or_default();
        from.dedup();
        let from = from
            .into_iter()
            .map(|r| EncodedNode::Number(NumberNode::UInt(r.get())))
            .collect();
        fields.insert_front("$referrers", EncodedNode::Array(from));
        fields.insert_front("$id", EncodedNode::Number(NumberNode::UInt(id.get())));
    }
}
