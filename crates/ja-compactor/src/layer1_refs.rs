//! Layer 1: Refs — incoming reference counts.

use ja_core::{Archive, Identity};
use std::collections::HashMap;

/// Count references to each identity from roots and from stored objects.
///
/// Identities nobody refers to are absent from the map.
pub fn incoming_counts(archive: &Archive) -> HashMap<Identity, usize> {
    let mut counts = HashMap::new();
    let mut bump = |id: Identity| *counts.entry(id).or_insert(0) += 1;
    for (_, node) in archive.roots() {
        node.for_each_reference(&mut bump);
    }
    for (_, node) in archive {
        node.for_each_reference(&mut bump);
    }
    counts
}

/// References to `id` from anywhere in the archive.
pub fn count_for(counts: &HashMap<Identity, usize>, id: Identity) -> usize {
    counts.get(&id).copied().unwrap_or(0)
}
