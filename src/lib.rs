//! GPS Trace - GPX Track Ingestion and Local Planar Projection
//!
//! This library ingests recorded GPX tracks (timestamped latitude/longitude samples from
//! GPS logging devices) and converts them into planar, metric offsets relative to a single
//! reference point, so a device/network simulation can replay real-world movement as local
//! Cartesian coordinates compatible with its physics subsystem.
//!
//! # Architecture
//!
//! - **[`TrackReader`]**: Streaming GPX parser yielding raw geodetic samples
//! - **[`LocalProjection`]**: Equirectangular geodetic-to-planar projection
//! - **[`Trace`]**: Ordered, append-only store of projected points with cached metadata
//! - **[`TraceCollection`]**: High-level manager for many independently-owned traces
//!
//! # Guarantees
//!
//! - **Load atomicity**: A failed load always leaves the trace empty, never half-updated
//! - **Per-point recovery**: Track points with unusable coordinates are skipped, not fatal
//! - **Local accuracy**: The projection is a flat-Earth approximation, valid only near
//!   the reference point

mod collection;
mod gpx;
mod projection;
mod trace;

// Public API exports
pub use collection::{CollectionInfo, Config, TraceCollection};
pub use gpx::TrackReader;
pub use projection::{EARTH_RADIUS_METERS, LocalProjection};
pub use trace::Trace;

/// A raw geodetic sample in decimal degrees, as read from a track file.
///
/// Plain data with no identity beyond its position in the parsed sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoSample {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
}

impl GeoSample {
    /// Create a sample from latitude and longitude in decimal degrees.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Error types for trace loading
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML syntax error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("no <trk> element inside a top-level <gpx>")]
    MissingTrack,

    #[error("no usable track points")]
    EmptyTrace,
}

pub type Result<T> = std::result::Result<T, TraceError>;
