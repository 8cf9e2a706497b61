//! Point markers and their shared-reference handles.
//!
//! Marker identity is reference identity: two handles are equal iff they point
//! at the same marker, regardless of position. The engine holds non-owning
//! clones of the handle in its indices for the tracked lifetime.

use geo_types::Point;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A user-visible point marker.
///
/// Position, cluster group and visibility are what the engine reads; title is
/// opaque display state carried for the caller's benefit.
#[derive(Debug)]
pub struct PointMarker {
    position: Point<f64>,
    cluster_group: i32,
    visible: bool,
    pub title: Option<String>,
}

impl PointMarker {
    pub fn new(position: Point<f64>) -> PointMarker {
        PointMarker {
            position,
            cluster_group: 0,
            visible: true,
            title: None,
        }
    }

    pub fn with_cluster_group(mut self, group: i32) -> PointMarker {
        self.cluster_group = group;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> PointMarker {
        self.visible = visible;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> PointMarker {
        self.title = Some(title.into());
        self
    }
}

/// Shared handle to a [`PointMarker`].
///
/// Cheap to clone; equality and hashing go by pointer identity so a marker can
/// move without disturbing any index it is a key of.
#[derive(Clone)]
pub struct MarkerRef(Rc<RefCell<PointMarker>>);

impl MarkerRef {
    pub fn new(marker: PointMarker) -> MarkerRef {
        MarkerRef(Rc::new(RefCell::new(marker)))
    }

    pub fn position(&self) -> Point<f64> {
        self.0.borrow().position
    }

    /// Moves the marker. The engine must be told via its position-change
    /// notification afterwards; the handle itself carries no back-reference.
    pub fn set_position(&self, position: Point<f64>) {
        self.0.borrow_mut().position = position;
    }

    pub fn cluster_group(&self) -> i32 {
        self.0.borrow().cluster_group
    }

    pub fn set_cluster_group(&self, group: i32) {
        self.0.borrow_mut().cluster_group = group;
    }

    pub fn is_visible(&self) -> bool {
        self.0.borrow().visible
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }

    pub fn title(&self) -> Option<String> {
        self.0.borrow().title.clone()
    }
}

impl PartialEq for MarkerRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for MarkerRef {}

impl Hash for MarkerRef {
    // Hashed by pointer identity; mutating the marker never changes the hash.
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for MarkerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("MarkerRef")
            .field("position", &inner.position)
            .field("cluster_group", &inner.cluster_group)
            .field("visible", &inner.visible)
            .finish()
    }
}
