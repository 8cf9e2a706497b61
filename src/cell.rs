//! Grid cell identity, cell sizing per zoom, and the visible-cell window used
//! for dynamic marker loading.

use crate::marker::MarkerRef;
use crate::projection;
use crate::surface::VisibleBounds;
use geo_types::Point;

/// Default width of a grid cell in scaled degrees at zoom 0.
///
/// A larger value clusters more aggressively at a given zoom.
pub const DEFAULT_BASE_CLUSTER_SIZE: f64 = 180.0;

/// Identity of one grid cell at the current cell size.
///
/// Two markers share a cell key iff they carry the same cluster group and fall
/// into the same grid cell. Keys are always recomputed from the marker's
/// current position, group and cell size, never cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub group: i32,
    pub row: i32,
    pub col: i32,
}

impl CellKey {
    pub fn for_position(group: i32, position: Point<f64>, cell_size: f64) -> CellKey {
        CellKey {
            group,
            row: row_at(position.y(), cell_size),
            col: col_at(position.x(), cell_size),
        }
    }

    pub fn for_marker(marker: &MarkerRef, cell_size: f64) -> CellKey {
        CellKey::for_position(marker.cluster_group(), marker.position(), cell_size)
    }
}

/// Row index of a latitude at the given cell size. Saturates on degenerate
/// latitudes instead of failing.
pub fn row_at(latitude: f64, cell_size: f64) -> i32 {
    (projection::scale_latitude(latitude) / cell_size).floor() as i32
}

/// Column index of a longitude at the given cell size.
pub fn col_at(longitude: f64, cell_size: f64) -> i32 {
    (projection::scale_longitude(longitude) / cell_size).floor() as i32
}

/// Cell size for a rounded camera zoom level.
pub fn cell_size_for_zoom(base_cluster_size: f64, zoom: i32) -> f64 {
    base_cluster_size / f64::powi(2.0, zoom)
}

/// Geographic center of a cell, used to anchor an aggregate's visual marker
/// when leader-position mode is off.
pub fn cell_center(key: CellKey, cell_size: f64) -> Point<f64> {
    let x = (key.col as f64 + 0.5) * cell_size;
    let y = (key.row as f64 + 0.5) * cell_size;
    Point::new(
        projection::unscale_longitude(x),
        projection::unscale_latitude(y),
    )
}

/// Cell-index bounding box of the current viewport.
///
/// `min_col > max_col` means the window spans the anti-meridian wrap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellWindow {
    pub min_row: i32,
    pub min_col: i32,
    pub max_row: i32,
    pub max_col: i32,
}

impl CellWindow {
    pub fn from_bounds(bounds: &VisibleBounds, cell_size: f64) -> CellWindow {
        CellWindow {
            min_row: row_at(bounds.south, cell_size),
            min_col: col_at(bounds.west, cell_size),
            max_row: row_at(bounds.north, cell_size),
            max_col: col_at(bounds.east, cell_size),
        }
    }

    pub fn contains(&self, row: i32, col: i32) -> bool {
        self.min_row <= row
            && row <= self.max_row
            && (self.min_col <= col && col <= self.max_col
                || self.min_col > self.max_col && (col >= self.min_col || col <= self.max_col))
    }

    pub fn contains_key(&self, key: &CellKey) -> bool {
        self.contains(key.row, key.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_size_halves_per_zoom_level() {
        assert_eq!(cell_size_for_zoom(180.0, 0), 180.0);
        assert_eq!(cell_size_for_zoom(180.0, 1), 90.0);
        assert_eq!(cell_size_for_zoom(180.0, 4), 11.25);
    }

    #[test]
    fn same_position_same_group_same_key() {
        let p = Point::new(13.4, 52.5);
        let a = CellKey::for_position(0, p, 1.0);
        let b = CellKey::for_position(0, p, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn group_changes_key_iff_groups_differ() {
        let p = Point::new(13.4, 52.5);
        let a = CellKey::for_position(0, p, 1.0);
        let b = CellKey::for_position(7, p, 1.0);
        assert_ne!(a, b);
        assert_eq!(a.row, b.row);
        assert_eq!(a.col, b.col);
    }

    #[test]
    fn negative_coordinates_floor_toward_negative_infinity() {
        // A marker just west/south of the origin must land in cell (-1, -1),
        // not share cell (0, 0) with a marker just east/north of it.
        let west = CellKey::for_position(0, Point::new(-0.1, -0.1), 1.0);
        let east = CellKey::for_position(0, Point::new(0.1, 0.1), 1.0);
        assert_eq!(west.col, -1);
        assert_eq!(west.row, -1);
        assert_eq!(east.col, 0);
        assert_eq!(east.row, 0);
    }

    #[test]
    fn window_plain_interval() {
        let w = CellWindow {
            min_row: -2,
            min_col: -2,
            max_row: 2,
            max_col: 2,
        };
        assert!(w.contains(0, 0));
        assert!(w.contains(-2, 2));
        assert!(!w.contains(3, 0));
        assert!(!w.contains(0, 3));
    }

    #[test]
    fn window_wraps_anti_meridian() {
        // min_col > max_col: the window spans the wrap boundary.
        let w = CellWindow {
            min_row: 0,
            min_col: 170,
            max_row: 1,
            max_col: -170,
        };
        assert!(w.contains(0, 175));
        assert!(w.contains(0, -175));
        assert!(!w.contains(0, 0));
    }

    #[test]
    fn pole_latitude_yields_a_large_but_valid_row() {
        let key = CellKey::for_position(0, Point::new(0.0, 90.0), 1.0);
        assert!(key.row > 1_000);
    }
}
