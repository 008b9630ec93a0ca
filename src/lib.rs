//! # Dict Filter
//!
//! Streaming filter and merge tool for grimoire-style XML term dictionaries.
//!
//! ## Features
//!
//! - **Global terms**: Keep every term not marked special
//! - **Game-specific terms**: Keep the special terms of chosen game ids, or remove them
//! - **Element match**: Keep terms whose element text matches a regex
//! - **Merge**: Concatenate the terms of two dictionaries
//! - **Verbatim output**: Selected terms are copied byte for byte, never re-serialized
//! - **Streaming**: Documents are read one term at a time
//!
//! Disabled terms (`disabled="true"`) are dropped in every mode.
//!
//! ## Usage
//!
//! ```bash
//! # Global terms
//! dict-filter terms.xml
//!
//! # Terms of games 1234 and 5678
//! dict-filter gamespecific terms.xml 1234,5678
//!
//! # Terms whose <text> starts with "Foo"
//! dict-filter element terms.xml text "^Foo"
//!
//! # Merge two dictionaries
//! dict-filter merge a.xml b.xml
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use dict_filter::filter::Selection;
//! use dict_filter::processor::{Processor, ProcessorConfig};
//! use std::path::PathBuf;
//!
//! let config = ProcessorConfig {
//!     output: PathBuf::from("global.xml"),
//!     ..ProcessorConfig::default()
//! };
//!
//! let processor = Processor::new(config);
//! // processor.filter(std::path::Path::new("terms.xml"), &Selection::Global).unwrap();
//! ```

pub mod cli;
pub mod error;
pub mod filter;
pub mod output;
pub mod processor;
pub mod progress;
pub mod reader;
pub mod term;

pub use cli::Args;
pub use error::{DictError, Result};
pub use processor::{Processor, ProcessorConfig};
pub use term::Term;
