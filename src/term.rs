//! Term records
//!
//! A [`Term`] is the exact byte span of one `<term>` element as it appeared in
//! the source document. Nothing about it is parsed up front: attribute and
//! element values are looked up on demand with a short pull-parse over the
//! span, and the span itself is what gets written to the output.

use crate::error::{DictError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt;

/// One raw `<term>...</term>` fragment
#[derive(Clone, PartialEq, Eq)]
pub struct Term {
    raw: Vec<u8>,
}

impl Term {
    /// Wrap a fragment; callers guarantee it is a single well-formed element
    pub fn from_raw(raw: Vec<u8>) -> Self {
        Self { raw }
    }

    /// Original bytes, untouched
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }

    /// Value of an attribute on the root element, if present
    pub fn attribute(&self, name: &str) -> Result<Option<String>> {
        let mut reader = Reader::from_reader(self.raw.as_slice());
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => return find_attribute(&e, name),
                Event::Eof => return Ok(None),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Text of the first element named `name`, searched in document order
    /// starting with the root itself
    ///
    /// The value is every text and CDATA node under that element, unescaped and
    /// concatenated. An empty element yields `Some("")`.
    pub fn element_text(&self, name: &str) -> Result<Option<String>> {
        let target = name.as_bytes();
        let mut reader = Reader::from_reader(self.raw.as_slice());
        let mut buf = Vec::new();
        let mut depth = 0usize;
        // Depth at which the matched element was opened
        let mut capture: Option<usize> = None;
        let mut text = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    if capture.is_none() && e.name().as_ref() == target {
                        capture = Some(depth);
                    }
                    depth += 1;
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if capture == Some(depth) {
                        return Ok(Some(text));
                    }
                }
                Event::Empty(e) => {
                    if capture.is_none() && e.name().as_ref() == target {
                        return Ok(Some(String::new()));
                    }
                }
                Event::Text(e) if capture.is_some() => {
                    text.push_str(&e.unescape()?);
                }
                Event::CData(e) if capture.is_some() => {
                    text.push_str(&String::from_utf8_lossy(&e));
                }
                Event::Eof => return Ok(capture.map(|_| text)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// `disabled` attribute, false when absent
    pub fn is_disabled(&self) -> Result<bool> {
        DISABLED.read(self)
    }

    /// `special` element, false when absent
    pub fn is_special(&self) -> Result<bool> {
        SPECIAL.read(self)
    }

    /// `gameId` element, -1 when absent
    pub fn game_id(&self) -> Result<i32> {
        GAME_ID.read(self)
    }

    /// `id` attribute, for diagnostics
    pub fn id(&self) -> Result<Option<String>> {
        self.attribute("id")
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Term")
            .field(&String::from_utf8_lossy(&self.raw))
            .finish()
    }
}

fn find_attribute(start: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Where a field lives inside a term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Attribute,
    Element,
}

/// A typed term field with a fallback for when it is absent
///
/// Blank values count as absent. Anything else that does not parse is an
/// [`DictError::InvalidField`].
#[derive(Debug, Clone, Copy)]
pub struct Field<T> {
    pub name: &'static str,
    pub source: FieldSource,
    pub default: T,
}

impl<T: FieldValue> Field<T> {
    pub const fn attribute(name: &'static str, default: T) -> Self {
        Self {
            name,
            source: FieldSource::Attribute,
            default,
        }
    }

    pub const fn element(name: &'static str, default: T) -> Self {
        Self {
            name,
            source: FieldSource::Element,
            default,
        }
    }

    /// Look the field up in `term`, falling back to the default
    pub fn read(&self, term: &Term) -> Result<T> {
        let raw = match self.source {
            FieldSource::Attribute => term.attribute(self.name)?,
            FieldSource::Element => term.element_text(self.name)?,
        };
        self.parse(raw.as_deref())
    }

    /// Interpret an already extracted value
    pub fn parse(&self, raw: Option<&str>) -> Result<T> {
        let value = match raw.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(self.default),
        };

        T::parse_field(value).ok_or_else(|| DictError::InvalidField {
            field: self.name,
            value: value.to_string(),
            expected: T::EXPECTED,
        })
    }
}

/// Types a [`Field`] can hold
pub trait FieldValue: Copy {
    /// Shown in error messages
    const EXPECTED: &'static str;

    fn parse_field(text: &str) -> Option<Self>;
}

impl FieldValue for bool {
    const EXPECTED: &'static str = "true or false";

    fn parse_field(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("true") {
            Some(true)
        } else if text.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }
}

impl FieldValue for i32 {
    const EXPECTED: &'static str = "an integer";

    fn parse_field(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

/// `disabled="true"` marks a term as inactive
pub const DISABLED: Field<bool> = Field::attribute("disabled", false);

/// `<special>true</special>` ties a term to its `gameId`
pub const SPECIAL: Field<bool> = Field::element("special", false);

/// Game (file) id; -1 means the term belongs to no game
pub const GAME_ID: Field<i32> = Field::element("gameId", -1);
