//! Stateless JSON rendering of an [`Archive`].

use ja_core::{Archive, Result};
use std::io::Write;

/// Renders an archive as UTF-8 JSON, compact or indented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Use the pretty-print hint the archive carries from its session.
    pub fn for_archive(archive: &Archive) -> Self {
        Self::new(archive.pretty_print())
    }

    pub fn to_string(&self, archive: &Archive) -> Result<String> {
        let text = if self.pretty {
            serde_json::to_string_pretty(archive)?
        } else {
            serde_json::to_string(archive)?
        };
        Ok(text)
    }

    pub fn to_vec(&self, archive: &Archive) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(archive)?
        } else {
            serde_json::to_vec(archive)?
        };
        Ok(bytes)
    }

    /// Write straight into `writer` without an intermediate buffer.
    pub fn write<W: Write>(&self, archive: &Archive, writer: W) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(writer, archive)?;
        } else {
            serde_json::to_writer(writer, archive)?;
        }
        Ok(())
    }
}
