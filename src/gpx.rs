//! GPX track parsing module
//!
//! This module provides `TrackReader`, a streaming parser over the
//! `gpx → trk → trkseg → trkpt` hierarchy that yields raw geodetic samples in
//! document order. Only the first `<trk>` of the first top-level `<gpx>`
//! contributes samples; all of that track's `<trkseg>` children are flattened
//! into one sequence. Points without a usable `lat`/`lon` attribute pair are
//! skipped without aborting the rest of the parse.

use crate::{GeoSample, Result, TraceError};
use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::{BytesStart, Event};
use std::io::Cursor;
use std::path::Path;

/// Nesting scope of an open element relative to the recognized GPX shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Gpx,
    Trk,
    Trkseg,
    Trkpt,
    /// Anything unrecognized, including a second `<gpx>` or `<trk>`.
    /// Structurally validated but never emitting samples.
    Other,
}

/// Walk state over the element hierarchy.
#[derive(Debug, Default)]
struct Walk {
    /// Scopes of currently open elements, outermost first
    stack: Vec<Scope>,
    /// Names of currently open elements, parallel to `stack`
    names: Vec<String>,
    /// The first top-level `<gpx>` has been entered
    gpx_taken: bool,
    /// The first `<trk>` of that `<gpx>` has been entered
    trk_taken: bool,
    /// Count of `<trkpt>` elements skipped for unusable attributes
    skipped: usize,
}

impl Walk {
    /// Classify an element being opened at the current position.
    fn enter(&mut self, name: &[u8]) -> Scope {
        match (self.stack.as_slice(), name) {
            ([], b"gpx") if !self.gpx_taken => {
                self.gpx_taken = true;
                Scope::Gpx
            }
            ([Scope::Gpx], b"trk") if !self.trk_taken => {
                self.trk_taken = true;
                Scope::Trk
            }
            ([Scope::Gpx, Scope::Trk], b"trkseg") => Scope::Trkseg,
            ([Scope::Gpx, Scope::Trk, Scope::Trkseg], b"trkpt") => Scope::Trkpt,
            _ => Scope::Other,
        }
    }

    fn push(&mut self, scope: Scope, name: &[u8]) {
        self.stack.push(scope);
        self.names.push(String::from_utf8_lossy(name).into_owned());
    }

    fn pop(&mut self) {
        self.stack.pop();
        self.names.pop();
    }
}

/// Streaming reader over the track points of one GPX document.
///
/// Implements `Iterator<Item = Result<GeoSample>>`: a lazily-produced, finite,
/// fused, non-restartable sequence in document order. After the consumed track
/// closes, the remaining events are still drained so that malformed markup
/// anywhere in the document surfaces as [`TraceError::Xml`].
pub struct TrackReader {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    walk: Walk,
    done: bool,
}

impl TrackReader {
    /// Open a GPX file and prepare to iterate its track points.
    ///
    /// The whole file is read into memory up front, so the file handle is
    /// released before parsing begins on every path. Fails only with
    /// [`TraceError::Io`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_xml(bytes))
    }

    /// Construct a reader over an in-memory GPX document.
    pub fn from_xml(xml: impl Into<Vec<u8>>) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(xml.into()));
        // Mismatched end tags are load failures, not per-point skips
        reader.config_mut().check_end_names = true;
        Self {
            reader,
            buf: Vec::new(),
            walk: Walk::default(),
            done: false,
        }
    }

    /// Number of `<trkpt>` elements skipped because their `lat`/`lon`
    /// attributes were missing or unusable.
    #[inline]
    pub fn skipped(&self) -> usize {
        self.walk.skipped
    }
}

impl Iterator for TrackReader {
    type Item = Result<GeoSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };

            match event {
                Event::Start(ref e) => {
                    let scope = self.walk.enter(e.name().as_ref());
                    self.walk.push(scope, e.name().as_ref());
                    if scope == Scope::Trkpt {
                        match sample_from_attributes(e) {
                            Some(sample) => return Some(Ok(sample)),
                            None => {
                                self.walk.skipped += 1;
                                tracing::warn!(
                                    "Skipping <trkpt> with missing or invalid lat/lon attributes"
                                );
                            }
                        }
                    }
                }
                Event::Empty(ref e) => {
                    if self.walk.enter(e.name().as_ref()) == Scope::Trkpt {
                        match sample_from_attributes(e) {
                            Some(sample) => return Some(Ok(sample)),
                            None => {
                                self.walk.skipped += 1;
                                tracing::warn!(
                                    "Skipping <trkpt> with missing or invalid lat/lon attributes"
                                );
                            }
                        }
                    }
                }
                Event::End(_) => self.walk.pop(),
                Event::Eof => {
                    self.done = true;
                    // An element left open at end of input is malformed markup
                    // even when quick-xml itself reached EOF cleanly.
                    if let Some(open) = self.walk.names.last() {
                        let missing = IllFormedError::MissingEndTag(open.clone());
                        return Some(Err(quick_xml::Error::IllFormed(missing).into()));
                    }
                    if !self.walk.trk_taken {
                        return Some(Err(TraceError::MissingTrack));
                    }
                    return None;
                }
                _ => {}
            }
        }
    }
}

impl std::iter::FusedIterator for TrackReader {}

/// Extract a finite-degree sample from a `<trkpt>` tag, if possible.
///
/// Returns `None` on any attribute-level problem (missing attribute,
/// undecodable or non-decimal text, non-finite value); the caller skips the
/// point and keeps parsing.
fn sample_from_attributes(e: &BytesStart) -> Option<GeoSample> {
    let lat = attribute_degrees(e, b"lat")?;
    let lon = attribute_degrees(e, b"lon")?;
    Some(GeoSample::new(lat, lon))
}

fn attribute_degrees(e: &BytesStart, name: &[u8]) -> Option<f64> {
    let attribute = e.try_get_attribute(name).ok()??;
    let text = attribute.unescape_value().ok()?;
    let degrees: f64 = text.trim().parse().ok()?;
    degrees.is_finite().then_some(degrees)
}
