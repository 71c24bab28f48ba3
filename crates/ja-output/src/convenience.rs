//! One-call wrappers: archive a single root and render it.

use crate::sink::ArchiveOutput;
use ja_archiver::{Archiver, ArchiverConfig, ObjectGraph};
use ja_core::{Archive, Result, Value};
use std::path::Path;

fn archive_root(graph: &ObjectGraph, root: Value, pretty: bool) -> Result<Archive> {
    let config = ArchiverConfig::default().with_pretty_print(pretty);
    let mut archiver = Archiver::with_config(graph, config);
    archiver.encode_root(root)?;
    archiver.finish()
}

/// Archive `root` with default settings and return the JSON bytes.
pub fn archived_data_with_root(graph: &ObjectGraph, root: impl Into<Value>, pretty: bool) -> Result<Vec<u8>> {
    archive_root(graph, root.into(), pretty)?.json_data()
}

/// Archive `root` with default settings and write the JSON to `path`.
pub fn archive_root_to_path(
    graph: &ObjectGraph,
    root: impl Into<Value>,
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<()> {
    archive_root(graph, root.into(), pretty)?.write_json_to_path(path)
}
