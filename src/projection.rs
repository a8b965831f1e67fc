//! Equirectangular geodetic-to-planar projection
//!
//! This module converts geodetic samples into metric offsets from a fixed
//! reference point. The flat-Earth approximation is only locally accurate:
//! it is not valid many kilometers from the reference, and the longitude
//! scale degenerates near the poles where `cos(lat)` approaches zero.

use crate::GeoSample;
use geo::Point;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Equirectangular projection anchored at a reference sample.
///
/// The reference point maps to the planar origin (0, 0); x grows to the East
/// and y to the North, both in meters. The cosine of the reference latitude
/// is computed once from the radian value and cached for longitude scaling.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    reference: GeoSample,
    /// Cached cos of the reference latitude in radians
    cos_ref_lat: f64,
}

impl LocalProjection {
    /// Create a projection centered at the given reference sample.
    pub fn new(reference: GeoSample) -> Self {
        Self {
            reference,
            cos_ref_lat: reference.lat.to_radians().cos(),
        }
    }

    /// The reference sample this projection is anchored at.
    #[inline]
    pub fn reference(&self) -> GeoSample {
        self.reference
    }

    /// Project a geodetic sample to planar meters relative to the reference.
    ///
    /// Total over finite-degree input: no division and no domain-restricted
    /// calls, so the result is always finite. Projecting the reference itself
    /// returns exactly (0, 0).
    #[inline]
    pub fn to_planar(&self, sample: GeoSample) -> Point<f64> {
        let d_lat = sample.lat.to_radians() - self.reference.lat.to_radians();
        let d_lon = sample.lon.to_radians() - self.reference.lon.to_radians();
        Point::new(
            EARTH_RADIUS_METERS * self.cos_ref_lat * d_lon,
            EARTH_RADIUS_METERS * d_lat,
        )
    }

    /// Invert the projection: planar meters back to geodetic degrees.
    ///
    /// Divides by the cached cosine, so this is degenerate for references at
    /// the poles.
    #[inline]
    pub fn to_geodetic(&self, point: Point<f64>) -> GeoSample {
        let lat = self.reference.lat + (point.y() / EARTH_RADIUS_METERS).to_degrees();
        let lon = self.reference.lon
            + (point.x() / (EARTH_RADIUS_METERS * self.cos_ref_lat)).to_degrees();
        GeoSample::new(lat, lon)
    }

    /// Meters of planar x per radian of longitude at the reference latitude.
    #[inline]
    pub fn lon_scale(&self) -> f64 {
        EARTH_RADIUS_METERS * self.cos_ref_lat
    }
}
