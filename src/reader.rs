//! Streaming term reader
//!
//! Pulls `<term>` elements out of a dictionary document one at a time, without
//! loading the document into memory. Each item is the exact byte span of the
//! element in the source, so a selected term can be written back unchanged.
//!
//! The XML parser consumes its input through a [`Recorder`], which keeps the
//! bytes consumed since the start of the current term. Outside a term the
//! recorded window is discarded after every event.
//!
//! The pull parser only checks tag nesting, so every event is also checked
//! here: text and attribute values must unescape, attribute values must not
//! hold a raw `<`, and nothing but whitespace may follow the root element.

use crate::error::{DictError, Result};
use crate::term::Term;
use log::{debug, trace};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Element name of a dictionary record
const TERM_TAG: &[u8] = b"term";

/// Read buffer size for dictionary files (64KB)
const READ_BUFFER_SIZE: usize = 64 * 1024;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Forward-only iterator over the terms of one document
pub struct TermReader<R: BufRead> {
    reader: Reader<Recorder<R>>,
    source: PathBuf,
    buf: Vec<u8>,
    depth: usize,
    root_closed: bool,
    finished: bool,
}

impl TermReader<BufReader<File>> {
    /// Open a dictionary file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DictError::io(path, e))?;
        debug!("Opened dictionary {:?}", path);
        Self::from_reader(BufReader::with_capacity(READ_BUFFER_SIZE, file), path)
    }
}

impl<R: BufRead> TermReader<R> {
    /// Read terms from any buffered source; `source` only labels errors
    pub fn from_reader(mut inner: R, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        skip_utf8_bom(&mut inner).map_err(|e| DictError::io(&source, e))?;

        let mut reader = Reader::from_reader(Recorder::new(inner));
        reader.trim_text(false);
        reader.check_end_names(true);

        Ok(Self {
            reader,
            source,
            buf: Vec::with_capacity(4096),
            depth: 0,
            root_closed: false,
            finished: false,
        })
    }

    /// Path (or label) of the document being read
    pub fn source(&self) -> &Path {
        &self.source
    }

    fn next_term(&mut self) -> Result<Option<Term>> {
        if self.finished {
            return Ok(None);
        }

        // (start offset, depth outside the term) of the term being read
        let mut open: Option<(usize, usize)> = None;

        loop {
            let before = self.reader.buffer_position();
            if open.is_none() {
                self.reader.get_mut().discard_before(before);
            }

            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .and_then(|event| {
                    check_event(&event, self.depth, self.root_closed)?;
                    Ok(event)
                });
            let event = match event {
                Ok(event) => event,
                Err(source) => {
                    self.finished = true;
                    return Err(malformed(&self.source, before, source));
                }
            };
            let after = self.reader.buffer_position();

            match event {
                Event::Start(e) => {
                    if open.is_none() && e.name().as_ref() == TERM_TAG {
                        open = Some((before, self.depth));
                    }
                    self.depth += 1;
                }
                Event::End(_) => {
                    self.depth -= 1;
                    self.root_closed = self.depth == 0;

                    if let Some((start, depth)) = open {
                        if depth == self.depth {
                            let recorder = self.reader.get_ref();
                            return capture(recorder, &self.source, start, after).map(Some);
                        }
                    }
                }
                Event::Empty(e) => {
                    self.root_closed = self.depth == 0;

                    if open.is_none() && e.name().as_ref() == TERM_TAG {
                        let recorder = self.reader.get_ref();
                        return capture(recorder, &self.source, before, after).map(Some);
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    if self.depth > 0 {
                        let what = format!("{} open element(s)", self.depth);
                        let source = quick_xml::Error::UnexpectedEof(what);
                        return Err(malformed(&self.source, after, source));
                    }
                    trace!("Reached end of {:?}", self.source);
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

/// Well-formedness checks the pull parser leaves to its caller
///
/// `depth` and `root_closed` describe the document before `event`.
fn check_event(event: &Event, depth: usize, root_closed: bool) -> quick_xml::Result<()> {
    match event {
        Event::Start(e) | Event::Empty(e) => {
            if depth == 0 && root_closed {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                return Err(unexpected(format!("<{}>", name)));
            }
            check_attributes(e)
        }
        Event::End(e) if depth == 0 => {
            let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
            Err(unexpected(format!("</{}>", name)))
        }
        Event::Text(e) => {
            if depth == 0 && !e.iter().all(u8::is_ascii_whitespace) {
                let text = String::from_utf8_lossy(e);
                return Err(unexpected(text.trim().chars().take(32).collect()));
            }
            e.unescape().map(drop)
        }
        Event::CData(_) if depth == 0 => Err(unexpected("<![CDATA[".to_string())),
        _ => Ok(()),
    }
}

fn check_attributes(e: &BytesStart) -> quick_xml::Result<()> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.value.contains(&b'<') {
            return Err(unexpected("<".to_string()));
        }
        attr.unescape_value()?;
    }
    Ok(())
}

fn unexpected(token: String) -> quick_xml::Error {
    quick_xml::Error::UnexpectedToken(token)
}

fn malformed(path: &Path, position: usize, source: quick_xml::Error) -> DictError {
    DictError::Xml {
        path: path.to_path_buf(),
        position,
        source,
    }
}

fn capture<R: BufRead>(
    recorder: &Recorder<R>,
    source: &Path,
    start: usize,
    end: usize,
) -> Result<Term> {
    recorder.take(start, end).map(Term::from_raw).ok_or_else(|| {
        let err = io::Error::new(io::ErrorKind::InvalidData, "term fragment was not retained");
        DictError::io(source, err)
    })
}


impl<R: BufRead> Iterator for TermReader<R> {
    type Item = Result<Term>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_term().transpose()
    }
}

fn skip_utf8_bom<R: BufRead>(reader: &mut R) -> io::Result<()> {
    if reader.fill_buf()?.starts_with(&UTF8_BOM) {
        reader.consume(UTF8_BOM.len());
    }
    Ok(())
}

/// Buffered reader that remembers what has been consumed from it
///
/// Offsets are counted from the first byte handed to the parser, which is the
/// same origin the parser uses for `buffer_position`.
struct Recorder<R> {
    inner: R,
    window: Vec<u8>,
    window_start: usize,
}

impl<R: BufRead> Recorder<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            window: Vec::with_capacity(4096),
            window_start: 0,
        }
    }

    /// Forget everything consumed before `position`
    fn discard_before(&mut self, position: usize) {
        let n = position
            .saturating_sub(self.window_start)
            .min(self.window.len());
        if n > 0 {
            self.window.drain(..n);
            self.window_start += n;
        }
    }

    /// Copy out the consumed bytes in `start..end`
    fn take(&self, start: usize, end: usize) -> Option<Vec<u8>> {
        let from = start.checked_sub(self.window_start)?;
        let to = end.checked_sub(self.window_start)?;
        self.window.get(from..to).map(<[u8]>::to_vec)
    }
}

impl<R: BufRead> Read for Recorder<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.consume(n);
        Ok(n)
    }
}

impl<R: BufRead> BufRead for Recorder<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        if amt > 0 {
            // Buffer is unchanged since the caller's fill_buf, so this is no I/O
            if let Ok(available) = self.inner.fill_buf() {
                let n = amt.min(available.len());
                self.window.extend_from_slice(&available[..n]);
            }
        }
        self.inner.consume(amt);
    }
}
