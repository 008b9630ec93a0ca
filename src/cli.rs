//! Command-line interface definition for dict-filter
//!
//! Options are parsed by clap. The mode itself is positional (`gamespecific`,
//! `element`, `merge`, `remove`, or just a file name) and is matched by hand so
//! that a malformed invocation prints the usage guide instead of failing.

use crate::filter::{ElementMatch, GameIds, Selection};
use crate::output::DEFAULT_OUTPUT_NAME;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Filter and merge term dictionaries
///
/// Selects terms from a grimoire-style XML dictionary and writes them,
/// unchanged, into a fresh dictionary document.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dict-filter",
    author = "m0h1nd4",
    version,
    about = "Filter and merge grimoire-style term dictionaries",
    long_about = r#"
Select terms from a grimoire-style XML dictionary and write them, byte for
byte, into a new dictionary document. Disabled terms are always dropped.

MODES:
    dict-filter <dictionary_file>
    dict-filter gamespecific <dictionary_file> <id,id,...>
    dict-filter element <dictionary_file> <element_name> <regex>
    dict-filter merge <dictionary_fileA> <dictionary_fileB>
    dict-filter remove <dictionary_file> [<id,id,...>]

Options go before the mode. Run without arguments for the full guide.
"#
)]
pub struct Args {
    /// Mode keyword followed by its arguments
    #[arg(value_name = "ARGS", trailing_var_arg = true)]
    pub command: Vec<String>,

    /// Output file (overwritten on success)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT_NAME)]
    pub output: PathBuf,

    /// Directory that relative dictionary names are resolved against
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Args {
    /// Resolve a dictionary name given on the command line
    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        match self.base_dir {
            Some(ref base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Invocation that does not describe any mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("No dictionary file given")]
    NoArguments,

    #[error("Unrecognized arguments: {0}")]
    Unrecognized(String),

    #[error("{0}")]
    InvalidGameIds(String),

    #[error("{0}")]
    InvalidOption(String),
}

impl UsageError {
    /// Classify a clap rejection; `None` for help and version requests,
    /// which clap prints itself
    pub fn from_clap(err: &clap::Error) -> Option<Self> {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
            _ => {
                let rendered = err.to_string();
                let first = rendered.lines().next().unwrap_or_default();
                let reason = first.strip_prefix("error: ").unwrap_or(first);
                Some(Self::InvalidOption(reason.to_string()))
            }
        }
    }
}

/// One operating mode with its positional arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Global {
        dictionary: String,
    },
    GameSpecific {
        dictionary: String,
        ids: GameIds,
    },
    Element {
        dictionary: String,
        element: String,
        pattern: String,
    },
    Merge {
        first: String,
        second: String,
    },
    Remove {
        dictionary: String,
        ids: Option<GameIds>,
    },
}

impl Command {
    /// Match positional arguments against the known mode shapes
    ///
    /// A single argument is always a dictionary name, even if it spells a mode
    /// keyword.
    pub fn parse(args: &[String]) -> Result<Self, UsageError> {
        let words: Vec<&str> = args.iter().map(String::as_str).collect();

        let command = match words.as_slice() {
            [] => return Err(UsageError::NoArguments),
            [dictionary] => Self::Global {
                dictionary: dictionary.to_string(),
            },
            ["gamespecific", dictionary, ids] => Self::GameSpecific {
                dictionary: dictionary.to_string(),
                ids: parse_ids(ids)?,
            },
            ["element", dictionary, element, pattern] => Self::Element {
                dictionary: dictionary.to_string(),
                element: element.to_string(),
                pattern: pattern.to_string(),
            },
            ["merge", first, second] => Self::Merge {
                first: first.to_string(),
                second: second.to_string(),
            },
            ["remove", dictionary] => Self::Remove {
                dictionary: dictionary.to_string(),
                ids: None,
            },
            ["remove", dictionary, ids] => Self::Remove {
                dictionary: dictionary.to_string(),
                ids: Some(parse_ids(ids)?),
            },
            _ => return Err(UsageError::Unrecognized(args.join(" "))),
        };

        Ok(command)
    }

    /// Selection for single-dictionary modes; `None` for merge
    ///
    /// Compiles the element pattern, so an invalid regex fails here, before
    /// any file is touched.
    pub fn selection(&self) -> crate::error::Result<Option<Selection>> {
        let selection = match self {
            Self::Global { .. } => Selection::Global,
            Self::GameSpecific { ids, .. } => Selection::GameSpecific(ids.clone()),
            Self::Element { element, pattern, .. } => {
                Selection::Element(ElementMatch::new(element, pattern)?)
            }
            Self::Remove { ids: Some(ids), .. } => Selection::RemoveGames(ids.clone()),
            Self::Remove { ids: None, .. } => Selection::RemoveDisabled,
            Self::Merge { .. } => return Ok(None),
        };

        Ok(Some(selection))
    }
}

fn parse_ids(list: &str) -> Result<GameIds, UsageError> {
    GameIds::parse(list).map_err(UsageError::InvalidGameIds)
}

/// Full usage guide
pub fn usage() -> &'static str {
    r#"Usage:
   dict-filter [OPTIONS]                <dictionary_file>
   dict-filter [OPTIONS] gamespecific   <dictionary_file> <game_file_id>
   dict-filter [OPTIONS] element        <dictionary_file> <element_name> <value>
   dict-filter [OPTIONS] merge          <dictionary_fileA> <dictionary_fileB>
   dict-filter [OPTIONS] remove         <dictionary_file> [file_id]

Modes:
   (none)          Writes the global terms: every term not marked special.
   gamespecific    Writes the special terms of the given games. Game file ids
                   are shown on the Game info page of the Edit dialog; separate
                   several ids with commas.
   element         Writes the terms whose <element_name> text matches <value>,
                   a regular expression searched anywhere in the text. Terms
                   without that element are skipped.
   merge           Writes the terms of both files into one document, those of
                   <dictionary_fileA> first.
   remove          Writes every term except the special terms of the given
                   games (comma separated ids). Without ids only disabled terms
                   are removed.

Options:
   -o, --output <FILE>   Output file [default: DictFilterOut.xml]
       --base-dir <DIR>  Resolve dictionary names against DIR
   -q, --quiet           Minimal output
   -v, --verbose         Detailed logging
   -h, --help            Print help

Disabled terms are always left out.
Run without arguments to print this guide."#
}
