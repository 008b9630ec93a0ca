//! Term selection
//!
//! A [`Selection`] decides which non-disabled terms go to the output. The
//! disabled check itself happens in the processor, before any selection runs,
//! so every mode drops disabled terms the same way.

use crate::error::{DictError, Result};
use crate::term::Term;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Set of game (file) ids given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameIds(HashSet<i32>);

impl GameIds {
    /// Parse a comma separated list such as `12,345`
    pub fn parse(list: &str) -> std::result::Result<Self, String> {
        let mut ids = HashSet::new();

        for part in list.split(',') {
            let part = part.trim();
            let id: i32 = part
                .parse()
                .map_err(|_| format!("Invalid game id: '{}'", part))?;
            ids.insert(id);
        }

        Ok(Self(ids))
    }

    #[inline]
    pub fn contains(&self, id: i32) -> bool {
        self.0.contains(&id)
    }

    /// Ids in ascending order
    pub fn sorted(&self) -> Vec<i32> {
        let mut v: Vec<_> = self.0.iter().copied().collect();
        v.sort_unstable();
        v
    }
}

impl FromIterator<i32> for GameIds {
    fn from_iter<I: IntoIterator<Item = i32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for GameIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.sorted().iter().map(i32::to_string).collect();
        write!(f, "{}", ids.join(","))
    }
}

/// Regex match against the text of a named element
#[derive(Debug, Clone)]
pub struct ElementMatch {
    element: String,
    pattern: Regex,
}

impl ElementMatch {
    pub fn new(element: &str, pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|source| DictError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            element: element.to_string(),
            pattern,
        })
    }

    /// Terms without the element never match
    pub fn matches(&self, term: &Term) -> Result<bool> {
        Ok(term
            .element_text(&self.element)?
            .is_some_and(|value| self.pattern.is_match(&value)))
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// What to keep from a dictionary
#[derive(Debug, Clone)]
pub enum Selection {
    /// Terms not flagged special
    Global,
    /// Special terms tied to one of the ids
    GameSpecific(GameIds),
    /// Everything except special terms tied to one of the ids
    RemoveGames(GameIds),
    /// Every non-disabled term
    RemoveDisabled,
    /// Terms whose element matches a regex
    Element(ElementMatch),
}

impl Selection {
    /// Decide whether a non-disabled term is kept
    ///
    /// Only the fields the mode needs are looked up.
    pub fn matches(&self, term: &Term) -> Result<bool> {
        match self {
            Self::Global => Ok(!term.is_special()?),
            Self::GameSpecific(ids) => tied_to(term, ids),
            Self::RemoveGames(ids) => Ok(!tied_to(term, ids)?),
            Self::RemoveDisabled => Ok(true),
            Self::Element(m) => m.matches(term),
        }
    }

    /// Short human-readable description
    pub fn describe(&self) -> String {
        match self {
            Self::Global => "global terms".to_string(),
            Self::GameSpecific(ids) => format!("terms specific to games {}", ids),
            Self::RemoveGames(ids) => format!("terms not specific to games {}", ids),
            Self::RemoveDisabled => "all enabled terms".to_string(),
            Self::Element(m) => {
                format!("terms where <{}> matches /{}/", m.element(), m.pattern_str())
            }
        }
    }
}

fn tied_to(term: &Term, ids: &GameIds) -> Result<bool> {
    Ok(term.is_special()? && ids.contains(term.game_id()?))
}
