//! Root compactor — cosmetic simplification of a finished archive.
//!
//! Layers:
//! 1. Refs — count incoming references per identity
//! 2. Inline — move unshared root objects out of the objects table
//! 3. Layout — pick the simplest top-level shape that still holds everything
//!
//! Layers only relocate root-level nodes. Which identities survive is
//! decided before compaction and never changes here.

pub mod layer1_refs;
pub mod layer2_inline;
pub mod layer3_layout;
pub mod pipeline;

pub use pipeline::{CompactionLevel, CompactionResult, RootCompactor};

#[cfg(test)]
mod tests;
