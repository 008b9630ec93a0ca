//! Output document writing
//!
//! The output is built in a temporary file next to the destination and renamed
//! over it only when [`OutputWriter::finish`] succeeds. A writer that is
//! dropped early, for example because an input turned out to be malformed,
//! leaves the destination untouched.

use crate::error::{DictError, Result};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Default buffer size for file writing (1MB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// Output filename used when none is given
pub const DEFAULT_OUTPUT_NAME: &str = "DictFilterOut.xml";

const DEFAULT_HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n",
    "<!-- terms.xml 2018-07-07 18:37 -->\n",
    "<grimoire version=\"1.0\" timestamp=\"0\"><terms>",
);

const DEFAULT_FOOTER: &str = "</terms></grimoire>\n";

/// Fixed text written around the selected terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub header: String,
    pub footer: String,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

/// Totals for a finished output document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSummary {
    pub path: PathBuf,
    pub fragments: u64,
    pub bytes: u64,
}

/// Buffered, all-or-nothing writer for one output document
pub struct OutputWriter {
    writer: BufWriter<NamedTempFile>,
    path: PathBuf,
    footer: String,
    fragments_written: u64,
    bytes_written: u64,
}

impl OutputWriter {
    /// Start a document at `path` and write the envelope header
    pub fn new(path: PathBuf, envelope: &Envelope, buffer_size: usize) -> Result<Self> {
        let dir = staging_dir(&path);
        let file = NamedTempFile::new_in(dir).map_err(|e| DictError::io(dir, e))?;

        let mut writer = Self {
            writer: BufWriter::with_capacity(buffer_size, file),
            path,
            footer: envelope.footer.clone(),
            fragments_written: 0,
            bytes_written: 0,
        };
        writer.write_raw(envelope.header.as_bytes())?;

        Ok(writer)
    }

    /// Append one term fragment exactly as given
    pub fn write_fragment(&mut self, fragment: &[u8]) -> Result<()> {
        self.write_raw(fragment)?;
        self.fragments_written += 1;
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.writer
            .write_all(data)
            .map_err(|e| DictError::io(&self.path, e))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Write the footer and move the document into place
    pub fn finish(mut self) -> Result<OutputSummary> {
        let footer = std::mem::take(&mut self.footer);
        self.write_raw(footer.as_bytes())?;

        let file = self
            .writer
            .into_inner()
            .map_err(|e| DictError::io(&self.path, e.into_error()))?;
        file.persist(&self.path)
            .map_err(|e| DictError::io(&self.path, e.error))?;

        Ok(OutputSummary {
            path: self.path,
            fragments: self.fragments_written,
            bytes: self.bytes_written,
        })
    }

    /// Get number of fragments written
    pub fn fragments_written(&self) -> u64 {
        self.fragments_written
    }
}

/// Directory the temporary file is created in, so the final rename stays on
/// one filesystem
fn staging_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
