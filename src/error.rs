//! Error types
//!
//! Every failure is fatal for the run: nothing is retried or recovered.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading, filtering or writing dictionaries
#[derive(Debug, Error)]
pub enum DictError {
    /// Input dictionary does not exist
    #[error("Dictionary file not found: {path:?}")]
    NotFound { path: PathBuf },

    /// Open, read, write or rename failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not well-formed: bad markup, text or attribute, broken
    /// nesting, or content after the root element
    #[error("Malformed XML in {path:?} at byte {position}: {source}")]
    Xml {
        path: PathBuf,
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// A term fragment holds an unreadable attribute or entity
    #[error("Malformed term fragment: {0}")]
    Fragment(#[from] quick_xml::Error),

    /// A typed field holds text of the wrong shape
    #[error("Invalid value {value:?} for `{field}`: expected {expected}")]
    InvalidField {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Element-match pattern does not compile
    #[error("Invalid regex pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl DictError {
    /// Wrap an I/O error, promoting `NotFound` to its own variant
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, DictError>;
