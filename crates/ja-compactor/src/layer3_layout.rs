//! Layer 3: Layout — the simplest top-level shape for what is left.

use ja_core::{Archive, Layout, RootKey};

/// `Bare` for a lone indexed root, `Flat` when no objects remain,
/// `Standard` otherwise.
pub fn choose_layout(archive: &Archive) -> Layout {
    if !archive.is_empty() {
        return Layout::Standard;
    }
    match archive.roots() {
        [(RootKey::Index(0), _)] => Layout::Bare,
        _ => Layout::Flat,
    }
}
