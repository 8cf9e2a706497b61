#![deny(
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

#[macro_use]
extern crate serde;

pub mod aggregate;
pub mod cell;
pub mod debug_grid;
pub mod error;
pub mod grid;
pub mod marker;
pub mod projection;
pub mod refresh;
pub mod settings;
pub mod surface;

pub use crate::aggregate::{AggregateDisplay, AggregateId, ClusterAggregate};
pub use crate::cell::{CellKey, CellWindow, DEFAULT_BASE_CLUSTER_SIZE};
pub use crate::error::ClusterError;
pub use crate::grid::GridClustering;
pub use crate::marker::{MarkerRef, PointMarker};
pub use crate::refresh::ClusterRefresher;
pub use crate::settings::{ClusterChangeListener, ClusterEvent, ClusteringSettings};
pub use crate::surface::{
    Appearance, CameraPosition, IconToken, MapSurface, VisibleBounds, VisualHandle,
};

/// Common contract of clustering algorithms.
///
/// All operations are synchronous and single-threaded; callers deliver marker
/// mutations and camera changes, and query the displayed state back. The grid
/// algorithm is one implementing variant; others can slot in behind the same
/// seam without touching callers.
pub trait ClusteringStrategy {
    /// A marker appeared. Ignored while the marker is invisible.
    fn on_add(&mut self, marker: &MarkerRef);

    /// A marker was deleted. Ignored while the marker is invisible.
    fn on_remove(&mut self, marker: &MarkerRef);

    /// A tracked marker moved; re-keys it if it left its cell.
    fn on_position_change(&mut self, marker: &MarkerRef);

    /// A tracked marker changed cluster group; same path as a move.
    fn on_cluster_group_change(&mut self, marker: &MarkerRef);

    /// Becoming visible runs the add path; becoming invisible runs the remove
    /// path and then marks the marker invisible.
    fn on_visibility_change_request(&mut self, marker: &MarkerRef, visible: bool);

    /// The camera zoomed or panned. Re-keys everything when the rounded zoom
    /// changes the cell size; otherwise only refreshes the viewport window
    /// when dynamic loading is on.
    fn on_camera_change(&mut self, camera: CameraPosition);

    /// Forces a singleton aggregate's display into existence so an info
    /// window can attach to the marker.
    fn on_show_info_window(&mut self, marker: &MarkerRef);

    /// First zoom level in 0..=25 at which no other tracked marker shares the
    /// marker's cell, or infinity when there is none. Fails when the marker
    /// is not tracked as a visible standalone marker.
    fn min_zoom_level_not_clustered(&self, marker: &MarkerRef) -> Result<f32, ClusterError>;

    /// Reverse lookup from a rendered synthetic marker to its aggregate.
    fn aggregate_for_visual(&self, handle: VisualHandle) -> Option<&ClusterAggregate>;

    /// The currently materialized displays, one per aggregate that has one.
    fn displayed_markers(&self) -> Vec<AggregateDisplay>;

    /// Releases every synthetic marker, clears the indices and discards
    /// pending refresh work.
    fn cleanup(&mut self);
}
