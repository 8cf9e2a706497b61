//! Spherical Mercator scaling between geographic coordinates and the planar
//! space the clustering grid lives in.
//!
//! Equal-sized grid cells in scaled space correspond to roughly visually
//! equal-sized regions on a Mercator map regardless of latitude, which is what
//! makes a uniform grid usable for clustering.

use std::f64::consts::FRAC_PI_4;

/// Scales a latitude into Mercator y space, in degrees.
///
/// Monotonic over the full input range. Latitudes at or beyond the poles
/// produce infinite or very large values rather than failing; downstream cell
/// index computation saturates.
pub fn scale_latitude(latitude: f64) -> f64 {
    latitude.to_radians().sin().atanh().to_degrees()
}

/// Longitude is already linear in Mercator x space.
pub fn scale_longitude(longitude: f64) -> f64 {
    longitude
}

/// Inverse of [`scale_latitude`], used to place an aggregate's visual marker
/// at the geographic center of its grid cell.
pub fn unscale_latitude(y: f64) -> f64 {
    (2.0 * y.to_radians().exp().atan() - 2.0 * FRAC_PI_4).to_degrees()
}

/// Inverse of [`scale_longitude`].
pub fn unscale_longitude(x: f64) -> f64 {
    x
}
