//! Shared data model for the JSON object-graph archiver.
//!
//! Producers describe their graph with [`Value`]s, the archiver turns them
//! into [`EncodedNode`]s stored per [`Identity`], and the finished result is
//! an [`Archive`] that any formatter can render.

pub mod archive;
pub mod config;
pub mod error;
pub mod node;
pub mod path;
pub mod value;

pub use archive::{Archive, Layout, RootKey};
pub use config::ArchiverConfig;
pub use error::{ArchiveError, ErrorKind, Result};
pub use node::{EncodedNode, Fields, Identity, NumberNode};
pub use path::{KeyPath, PathSegment};
pub use value::{Handle, Number, Value};

/// Prefix reserved for keys emitted by the archive format itself.
pub const RESERVED_KEY_PREFIX: char = '$';

/// Whether `key` collides with the archive format's own keys.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_KEY_PREFIX)
}
