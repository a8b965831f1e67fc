//! Trace storage and load orchestration
//!
//! This module provides the `Trace` struct: the projected points of one
//! loaded GPX track together with the reference point in effect and metadata
//! cached during the load pass.

use crate::gpx::TrackReader;
use crate::projection::LocalProjection;
use crate::{GeoSample, Result, TraceError};
use geo::{Coord, Point, Rect};
use std::path::Path;

/// A single recorded track projected into local planar coordinates.
///
/// Created empty, populated destructively by [`Trace::load`], and read-only
/// to consumers afterwards. The reference point is either the caller-supplied
/// origin (fixed at construction) or the first accepted sample of the load,
/// which then projects to exactly (0, 0). After a failed load the trace is
/// empty: never a reference without points nor points without a reference.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trace {
    /// Caller-supplied fixed reference, if any
    origin: Option<GeoSample>,
    /// Reference in effect for the loaded content (None while empty)
    reference: Option<GeoSample>,
    /// Projected points in meters, insertion order = file order
    points: Vec<Point<f64>>,
    /// Cached planar bounding box (computed once during load)
    bounding_box: Option<Rect<f64>>,
    /// Cached cumulative planar path length in meters (computed once during load)
    total_distance: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Trace {
    /// Create an empty trace whose reference will be taken from the first
    /// accepted sample of the next load.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty trace with a fixed reference point.
    ///
    /// Every loaded point, including the first, is projected relative to
    /// `origin`; traces sharing an origin share one planar frame.
    pub fn with_origin(origin: GeoSample) -> Self {
        Self {
            origin: Some(origin),
            ..Self::default()
        }
    }

    /// Load a GPX file into a fresh trace.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut trace = Self::new();
        trace.load(path)?;
        Ok(trace)
    }

    /// Load a GPX file, replacing any previously loaded content.
    ///
    /// Returns the number of accepted points. Zero accepted points, including
    /// a well-formed document without the expected track container, fail with
    /// [`TraceError::EmptyTrace`]; IO and syntax errors propagate unchanged.
    /// On any failure the trace is left empty (the configured origin is
    /// preserved).
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        // Profile the full load pass (IO, parsing, projection, metadata)
        #[cfg(feature = "profiling")]
        profiling::scope!("trace::load");

        // Destructive replace: clear before parsing so every failure path
        // leaves the trace empty and internally consistent
        self.reference = None;
        self.points = Vec::new();
        self.bounding_box = None;
        self.total_distance = 0.0;

        let mut reader = TrackReader::open(path)?;

        let mut projection = self.origin.map(LocalProjection::new);
        let mut points: Vec<Point<f64>> = Vec::new();

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut total_distance: f64 = 0.0;
        let mut prev: Option<Point<f64>> = None;

        for item in reader.by_ref() {
            let sample = match item {
                Ok(sample) => sample,
                // A document lacking the expected track container is a
                // valid-but-empty trace from the caller's perspective
                Err(TraceError::MissingTrack) => break,
                Err(e) => return Err(e),
            };

            let projection = projection.get_or_insert_with(|| LocalProjection::new(sample));
            let point = projection.to_planar(sample);

            min_x = min_x.min(point.x());
            min_y = min_y.min(point.y());
            max_x = max_x.max(point.x());
            max_y = max_y.max(point.y());

            if let Some(prev) = prev {
                total_distance += (point.x() - prev.x()).hypot(point.y() - prev.y());
            }
            prev = Some(point);

            points.push(point);
        }

        if points.is_empty() {
            return Err(TraceError::EmptyTrace);
        }

        // Commit
        self.reference = projection.map(|p| p.reference());
        self.bounding_box = Some(Rect::new(
            Coord { x: min_x, y: min_y },
            Coord { x: max_x, y: max_y },
        ));
        self.total_distance = total_distance;
        self.points = points;

        tracing::debug!(
            points = self.points.len(),
            skipped = reader.skipped(),
            meters = self.total_distance,
            "Loaded trace"
        );

        Ok(self.points.len())
    }

    /// Projected points in meters, one per accepted sample, in file order.
    #[inline]
    pub fn points(&self) -> &[Point<f64>] {
        &self.points
    }

    /// Reference in effect for the loaded content.
    ///
    /// `None` iff the trace holds no points.
    #[inline]
    pub fn reference(&self) -> Option<GeoSample> {
        self.reference
    }

    /// Caller-supplied fixed reference, if one was configured.
    #[inline]
    pub fn origin(&self) -> Option<GeoSample> {
        self.origin
    }

    /// Number of loaded points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Cumulative planar path length in meters.
    ///
    /// This is O(1) as the value is cached during the load pass.
    #[inline]
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Planar bounding box of the loaded points.
    ///
    /// This is O(1) as the value is cached during the load pass.
    /// `None` while the trace is empty.
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.bounding_box
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LONDON_TRACK: &str = r#"<gpx>
  <trk>
    <trkseg>
      <trkpt lat="51.5074" lon="-0.1278"/>
      <trkpt lat="51.5076" lon="-0.1276"/>
      <trkpt lat="51.5078" lon="-0.1274"/>
    </trkseg>
  </trk>
</gpx>"#;

    fn create_test_file(xml: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_counts_points_and_zeroes_first() {
        let file = create_test_file(LONDON_TRACK);
        let mut trace = Trace::new();

        let count = trace.load(file.path()).unwrap();
        assert_eq!(count, 3);
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.points()[0], Point::new(0.0, 0.0));
        assert_eq!(
            trace.reference(),
            Some(GeoSample::new(51.5074, -0.1278))
        );
    }

    #[test]
    fn test_from_file() {
        let file = create_test_file(LONDON_TRACK);
        let trace = Trace::from_file(file.path()).unwrap();
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn test_empty_segment_is_empty_trace_error() {
        let file = create_test_file(r#"<gpx><trk><trkseg></trkseg></trk></gpx>"#);
        let mut trace = Trace::new();

        let result = trace.load(file.path());
        assert!(matches!(result, Err(TraceError::EmptyTrace)));
        assert!(trace.is_empty());
        assert!(trace.reference().is_none());
        assert!(trace.bounding_box().is_none());
    }

    #[test]
    fn test_missing_track_is_empty_trace_error() {
        // A missing track container is the same "no data" outcome as an
        // empty segment at the load level
        let file = create_test_file(r#"<gpx><wpt lat="1.0" lon="2.0"/></gpx>"#);
        let result = Trace::new().load(file.path());
        assert!(matches!(result, Err(TraceError::EmptyTrace)));
    }

    #[test]
    fn test_malformed_document_is_xml_error() {
        let file = create_test_file(r#"<gpx><trk><trkseg><trkpt lat="1.0" lon="2.0"/>"#);
        let mut trace = Trace::new();

        let result = trace.load(file.path());
        assert!(matches!(result, Err(TraceError::Xml(_))));
        // Atomicity: the valid point before the defect is not kept
        assert!(trace.is_empty());
        assert!(trace.reference().is_none());
    }

    #[test]
    fn test_nonexistent_path_is_io_error() {
        let result = Trace::new().load("/nonexistent/definitely-missing.gpx");
        assert!(matches!(result, Err(TraceError::Io(_))));
    }

    #[test]
    fn test_skipped_middle_point_keeps_the_rest() {
        let file = create_test_file(
            r#"<gpx><trk><trkseg>
                <trkpt lat="51.5074" lon="-0.1278"/>
                <trkpt lat="51.5076"/>
                <trkpt lat="51.5078" lon="-0.1274"/>
            </trkseg></trk></gpx>"#,
        );
        let mut trace = Trace::new();

        assert_eq!(trace.load(file.path()).unwrap(), 2);
        // The first parsed point is still the reference
        assert_eq!(trace.points()[0], Point::new(0.0, 0.0));
        assert_ne!(trace.points()[1], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_skipped_first_point_shifts_the_reference() {
        let file = create_test_file(
            r#"<gpx><trk><trkseg>
                <trkpt lon="-0.1278"/>
                <trkpt lat="51.5076" lon="-0.1276"/>
                <trkpt lat="51.5078" lon="-0.1274"/>
            </trkseg></trk></gpx>"#,
        );
        let trace = Trace::from_file(file.path()).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.reference(), Some(GeoSample::new(51.5076, -0.1276)));
        assert_eq!(trace.points()[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_reload_is_deterministic() {
        let file = create_test_file(LONDON_TRACK);

        let first = Trace::from_file(file.path()).unwrap();
        let second = Trace::from_file(file.path()).unwrap();
        assert_eq!(first.points(), second.points());
        assert_eq!(first.reference(), second.reference());
    }

    #[test]
    fn test_load_replaces_previous_content() {
        let london = create_test_file(LONDON_TRACK);
        let other = create_test_file(
            r#"<gpx><trk><trkseg><trkpt lat="48.8566" lon="2.3522"/></trkseg></trk></gpx>"#,
        );

        let mut trace = Trace::new();
        trace.load(london.path()).unwrap();
        assert_eq!(trace.len(), 3);

        trace.load(other.path()).unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.reference(), Some(GeoSample::new(48.8566, 2.3522)));
    }

    #[test]
    fn test_failed_load_empties_a_loaded_trace() {
        let london = create_test_file(LONDON_TRACK);
        let broken = create_test_file(r#"<gpx><trk>"#);

        let mut trace = Trace::new();
        trace.load(london.path()).unwrap();
        assert!(!trace.is_empty());

        assert!(trace.load(broken.path()).is_err());
        assert!(trace.is_empty());
        assert!(trace.reference().is_none());
        assert!(trace.bounding_box().is_none());
        assert_eq!(trace.total_distance(), 0.0);
    }

    #[test]
    fn test_explicit_origin_is_honored() {
        let origin = GeoSample::new(51.5, -0.13);
        let file = create_test_file(LONDON_TRACK);

        let mut trace = Trace::with_origin(origin);
        trace.load(file.path()).unwrap();

        assert_eq!(trace.origin(), Some(origin));
        assert_eq!(trace.reference(), Some(origin));
        // The first point is a real offset from the origin, not forced to zero
        assert_ne!(trace.points()[0], Point::new(0.0, 0.0));

        let expected = LocalProjection::new(origin).to_planar(GeoSample::new(51.5074, -0.1278));
        assert_eq!(trace.points()[0], expected);
    }

    #[test]
    fn test_shared_origin_gives_a_common_frame() {
        let origin = GeoSample::new(51.5, -0.13);
        let file = create_test_file(LONDON_TRACK);

        let mut a = Trace::with_origin(origin);
        let mut b = Trace::with_origin(origin);
        a.load(file.path()).unwrap();
        b.load(file.path()).unwrap();

        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn test_metadata_is_cached_during_load() {
        let file = create_test_file(LONDON_TRACK);
        let trace = Trace::from_file(file.path()).unwrap();

        // Points ~30m apart around London
        assert!(trace.total_distance() > 0.0);
        assert!(trace.total_distance() < 1000.0);

        let bbox = trace.bounding_box().unwrap();
        assert!(bbox.width() > 0.0);
        assert!(bbox.height() > 0.0);
    }
}
