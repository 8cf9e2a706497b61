//! Boundary to the rendering collaborator.
//!
//! The engine never draws. It asks the surface to create and remove synthetic
//! cluster markers, to put real markers on or off the map, and it reads the
//! camera state from it. Everything else about rendering is the surface's
//! business.

use crate::marker::MarkerRef;
use geo_types::Point;

/// Handle to a synthetic marker created on the rendering surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// Opaque icon identity resolved by the rendering side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IconToken(pub u64);

/// Icon and anchor for a synthetic cluster marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub icon: IconToken,
    pub anchor_u: f32,
    pub anchor_v: f32,
}

/// Camera state delivered with a camera-change notification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraPosition {
    pub target: Point<f64>,
    pub zoom: f32,
}

/// Geographic bounds of the visible region, south-west to north-east.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibleBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// The rendering collaborator the engine delegates to.
pub trait MapSurface {
    /// Creates a synthetic cluster marker and returns its handle.
    fn create_visual_marker(&mut self, position: Point<f64>, appearance: &Appearance)
    -> VisualHandle;

    /// Removes a previously created synthetic marker.
    fn remove_visual_marker(&mut self, handle: VisualHandle);

    /// Puts a real marker on the map (a singleton aggregate displays the
    /// marker itself rather than a synthetic one).
    fn show_marker(&mut self, marker: &MarkerRef);

    /// Takes a real marker off the map while it is folded into a cluster.
    fn hide_marker(&mut self, marker: &MarkerRef);

    fn camera_zoom(&self) -> f32;

    fn visible_region_bounds(&self) -> VisibleBounds;
}
