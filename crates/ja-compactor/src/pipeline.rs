//! Compaction pipeline — orchestrates the root layers.

use crate::{layer1_refs, layer2_inline, layer3_layout};
use ja_core::{Archive, Identity, Layout};

/// How far compaction may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionLevel {
    /// Inline unshared roots, keep the standard document shape.
    Inline,
    /// Inline, then unwrap the document to a flat or bare shape when possible.
    Full,
}

/// Compaction result with statistics.
#[derive(Debug, Clone)]
pub struct CompactionResult {
    pub archive: Archive,
    pub inlined: Vec<Identity>,
    pub objects_before: usize,
    pub objects_after: usize,
    pub layout: Layout,
    pub level: CompactionLevel,
    pub layers_applied: Vec<String>,
}

impl CompactionResult {
    /// Whether the archive renders differently than before compaction.
    pub fn changed(&self) -> bool {
        !self.inlined.is_empty() || self.layout != Layout::Standard
    }
}

/// The root compactor.
pub struct RootCompactor {
    pub level: CompactionLevel,
}

impl RootCompactor {
    pub fn new(level: CompactionLevel) -> Self {
        Self { level }
    }

    pub fn inline_only() -> Self { Self::new(CompactionLevel::Inline) }
    pub fn full() -> Self { Self::new(CompactionLevel::Full) }

    /// Compact the root level of `archive`.
    pub fn compact(&self, mut archive: Archive) -> CompactionResult {
        let objects_before = archive.len();
        let mut layers = Vec::new();

        // Layer 1: reference counts (always)
        let counts = layer1_refs::incoming_counts(&archive);
        layers.push("refs".into());

        // Layer 2: inline unshared roots (always)
        let inlined = layer2_inline::inline_unshared_roots(&mut archive, &counts);
        layers.push("inline".into());

        // Layer 3: layout (Full only)
        if matches!(self.level, CompactionLevel::Full) {
            archive.set_layout(layer3_layout::choose_layout(&archive));
            layers.push("layout".into());
        } else {
            archive.set_layout(Layout::Standard);
        }

        let layout = archive.layout();
        let objects_after = archive.len();
        tracing::debug!(
            inlined = inlined.len(),
            objects_before,
            objects_after,
            ?layout,
            "root compaction finished"
        );

        CompactionResult {
            archive,
            inlined,
            objects_before,
            objects_after,
            layout,
            level: self.level,
            layers_applied: layers,
        }
    }
}

impl Default for RootCompactor {
    fn default() -> Self {
        Self::new(CompactionLevel::Full)
    }
}
