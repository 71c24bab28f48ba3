//! Rendering and sinks for finished archives.

pub mod convenience;
pub mod format;
pub mod sink;

pub use convenience::{archive_root_to_path, archived_data_with_root};
pub use format::JsonFormatter;
pub use sink::ArchiveOutput;
