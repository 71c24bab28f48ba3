//! Output surface of a finished archive.
//!
//! Every operation only reads the archive: a failed write never changes
//! what was built, it is reported as a Resource error of that call alone.

use crate::format::JsonFormatter;
use ja_core::{Archive, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

pub trait ArchiveOutput {
    /// The tree as a `serde_json::Value`.
    fn json(&self) -> Result<serde_json::Value>;

    fn json_string(&self) -> Result<String>;

    /// UTF-8 bytes of [`json_string`](ArchiveOutput::json_string).
    fn json_data(&self) -> Result<Vec<u8>>;

    /// Write to `path`, creating parent directories as needed.
    fn write_json_to_path(&self, path: impl AsRef<Path>) -> Result<()>;

    fn write_json_to_stream<W: Write>(&self, writer: W) -> Result<()>;
}

impl ArchiveOutput for Archive {
    fn json(&self) -> Result<serde_json::Value> {
        self.to_json()
    }

    fn json_string(&self) -> Result<String> {
        JsonFormatter::for_archive(self).to_string(self)
    }

    fn json_data(&self) -> Result<Vec<u8>> {
        JsonFormatter::for_archive(self).to_vec(self)
    }

    fn write_json_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.json_data()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &data)?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "archive written");
        Ok(())
    }

    fn write_json_to_stream<W: Write>(&self, mut writer: W) -> Result<()> {
        JsonFormatter::for_archive(self).write(self, &mut writer)?;
        writer.flush()?;
        tracing::debug!("archive written to stream");
        Ok(())
    }
}
