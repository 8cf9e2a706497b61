//! Optional diagnostic collaborator that can draw the clustering grid.
//!
//! Injected at construction and off by default; the engine only tells it when
//! the cell size is current and when to tear down. It has no effect on
//! clustering state.

use crate::surface::MapSurface;

pub trait DebugOverlay {
    /// Called after every camera change with the current cell size.
    fn draw_grid(&mut self, surface: &mut dyn MapSurface, cell_size: f64);

    /// Called when the engine is torn down.
    fn cleanup(&mut self, surface: &mut dyn MapSurface);
}
