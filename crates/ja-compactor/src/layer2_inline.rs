//! Layer 2: Inline — unshared root objects move into their root entry.

use crate::layer1_refs::count_for;
use ja_core::{Archive, EncodedNode, Identity};
use std::collections::HashMap;

/// Replace each root holding the only reference to its identity with the
/// referenced node. Returns the inlined identities in root order.
pub fn inline_unshared_roots(
    archive: &mut Archive,
    counts: &HashMap<Identity, usize>,
) -> Vec<Identity> {
    let candidates: Vec<(usize, Identity)> = archive
        .roots()
        .iter()
        .enumerate()
        .filter(|(_, (_, node))| is_unshared(node, counts))
        .filter_map(|(i, (_, node))| node.as_reference().map(|id| (i, id)))
        .collect();

    let mut inlined = Vec::with_capacity(candidates.len());
    for (index, id) in candidates {
        if let Some(node) = archive.take_object(id) {
            archive.roots_mut()[index].1 = node;
            inlined.push(id);
        }
    }
    inlined
}

/// Whether a root node could be inlined given the reference counts.
pub fn is_unshared(node: &EncodedNode, counts: &HashMap<Identity, usize>) -> bool {
    node.as_reference()
        .is_some_and(|id| count_for(counts, id) == 1)
}
