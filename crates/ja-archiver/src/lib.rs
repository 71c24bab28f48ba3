//! Object-graph archiver: flattens a possibly cyclic graph of typed objects
//! into a self-describing JSON tree that keeps type tags, sharing and cycles.

pub mod archiver;
pub mod builder;
pub mod classify;
pub mod coder;
pub mod graph;
pub mod identity;
pub mod resolver;

pub use archiver::Archiver;
pub use coder::{Coder, DecodingFailurePolicy, ObjectCoder};
pub use graph::{Encodable, Entry, ObjectGraph};
pub use identity::{IdentityKey, Mode, SlotState};

pub use ja_core::{
    Archive, ArchiveError, ArchiverConfig, EncodedNode, ErrorKind, Handle, Identity, Number,
    Result, Value,
};
