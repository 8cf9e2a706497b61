//! The grid clustering engine.
//!
//! Markers are bucketed into grid cells sized relative to the rounded camera
//! zoom. Every non-empty cell is one aggregate; mutations and camera changes
//! update the marker and cell indices incrementally, and zoom transitions
//! split or join aggregates without ever dropping or duplicating a member.

use crate::ClusteringStrategy;
use crate::aggregate::{AggregateDisplay, AggregateId, ClusterAggregate};
use crate::cell::{self, CellKey, CellWindow, cell_size_for_zoom};
use crate::debug_grid::DebugOverlay;
use crate::error::ClusterError;
use crate::marker::MarkerRef;
use crate::refresh::ClusterRefresher;
use crate::settings::{self, ClusterChangeListener, ClusterEvent, ClusteringSettings};
use crate::surface::{CameraPosition, MapSurface, VisualHandle};
use ahash::AHashMap;
use itertools::Itertools;
use log::debug;
use std::collections::HashMap;


/// Highest zoom level swept by the un-clustering query; beyond it a marker is
/// treated as never un-clustering.
const MAX_UNCLUSTER_ZOOM: i32 = 25;

pub struct GridClustering {
    surface: Box<dyn MapSurface>,
    settings: ClusteringSettings,
    listener: Option<Box<dyn ClusterChangeListener>>,
    debug_overlay: Option<Box<dyn DebugOverlay>>,
    refresher: ClusterRefresher,

    /// Every tracked visible marker, mapped to its owning aggregate.
    markers: AHashMap<MarkerRef, AggregateId>,
    aggregates: AHashMap<AggregateId, ClusterAggregate>,
    /// Valid only at the current cell size; rebuilt on every re-keying pass.
    cells: AHashMap<CellKey, AggregateId>,
    next_aggregate_id: AggregateId,

    zoom: i32,
    cell_size: f64,
    window: CellWindow,
}

impl GridClustering {
    /// Builds the engine, indexes every currently-visible marker and realizes
    /// the initial displays.
    ///
    /// Fails with [`ClusterError::NoAppearanceProvider`] when neither
    /// appearance provider form is configured; nothing is indexed in that
    /// case.
    pub fn new(
        mut settings: ClusteringSettings,
        surface: Box<dyn MapSurface>,
        initial_markers: &[MarkerRef],
        refresher: ClusterRefresher,
    ) -> Result<GridClustering, ClusterError> {
        if !settings.has_appearance_provider() {
            return Err(ClusterError::NoAppearanceProvider);
        }
        let listener = settings.change_listener.take();
        let zoom = surface.camera_zoom().round() as i32;
        let cell_size = cell_size_for_zoom(settings.base_cluster_size, zoom);
        let mut engine = GridClustering {
            surface,
            settings,
            listener,
            debug_overlay: None,
            refresher,
            markers: AHashMap::new(),
            aggregates: AHashMap::new(),
            cells: AHashMap::new(),
            next_aggregate_id: 0,
            zoom,
            cell_size,
            window: CellWindow::default(),
        };
        if engine.settings.add_markers_dynamically {
            engine.window =
                CellWindow::from_bounds(&engine.surface.visible_region_bounds(), cell_size);
        }
        for marker in initial_markers {
            if marker.is_visible() {
                engine.add_marker(marker.clone());
            }
        }
        engine.flush();
        Ok(engine)
    }

    /// Injects the optional diagnostic grid overlay.
    pub fn set_debug_overlay(&mut self, overlay: Box<dyn DebugOverlay>) {
        self.debug_overlay = Some(overlay);
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn tracked_marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn aggregates(&self) -> impl Iterator<Item = &ClusterAggregate> {
        self.aggregates.values()
    }

    pub fn aggregate_of(&self, marker: &MarkerRef) -> Option<&ClusterAggregate> {
        let id = self.markers.get(marker)?;
        self.aggregates.get(id)
    }

    fn add_marker(&mut self, marker: MarkerRef) {
        let key = CellKey::for_marker(&marker, self.cell_size);
        let id = match self.cells.get(&key) {
            Some(&existing) => existing,
            None => self.create_aggregate(key),
        };
        self.aggregate_mut(id).push(marker.clone());
        self.markers.insert(marker, id);
        self.mark_dirty(id, key);
    }

    /// Marks an aggregate for refresh unless dynamic loading keeps its cell
    /// out of the viewport window.
    fn mark_dirty(&mut self, id: AggregateId, key: CellKey) {
        if !self.settings.add_markers_dynamically || self.window.contains_key(&key) {
            self.refresher.refresh(id);
        }
    }

    fn remove_marker(&mut self, marker: &MarkerRef) {
        if let Some(id) = self.markers.remove(marker) {
            if let Some(aggregate) = self.aggregates.get_mut(&id) {
                aggregate.remove(marker);
            }
            self.refresher.refresh(id);
        }
    }

    /// Re-keys one marker after a position or group change. An unchanged key
    /// only refreshes the existing aggregate; a changed key runs the
    /// remove-then-add path.
    fn reindex_marker(&mut self, marker: &MarkerRef) {
        let key = CellKey::for_marker(marker, self.cell_size);
        if let Some(&id) = self.markers.get(marker) {
            let same_cell = self
                .aggregates
                .get(&id)
                .is_some_and(|aggregate| aggregate.key() == key);
            if same_cell {
                self.refresher.refresh(id);
                return;
            }
            if let Some(aggregate) = self.aggregates.get_mut(&id) {
                aggregate.remove(marker);
            }
            self.refresher.refresh(id);
            self.markers.remove(marker);
        }
        self.add_marker(marker.clone());
    }

    fn create_aggregate(&mut self, key: CellKey) -> AggregateId {
        let id = self.next_aggregate_id;
        self.next_aggregate_id += 1;
        self.aggregates.insert(id, ClusterAggregate::new(key));
        self.cells.insert(key, id);
        id
    }

    fn aggregate_mut(&mut self, id: AggregateId) -> &mut ClusterAggregate {
        self.aggregates
            .get_mut(&id)
            .expect("aggregate indices out of sync")
    }

    /// Splits aggregates after a zoom-in. An aggregate whose members all land
    /// in one new cell is re-keyed in place with its membership untouched;
    /// otherwise it is discarded and its members redistributed into per-cell
    /// aggregates.
    fn split_aggregates(&mut self) {
        let old_aggregates = std::mem::take(&mut self.aggregates);
        self.cells.clear();
        debug!(
            "splitting {} aggregates at cell size {}",
            old_aggregates.len(),
            self.cell_size
        );
        for (id, mut aggregate) in old_aggregates {
            if aggregate.is_empty() {
                self.release_display(&mut aggregate);
                continue;
            }
            let keys: Vec<CellKey> = aggregate
                .members()
                .iter()
                .map(|m| CellKey::for_marker(m, self.cell_size))
                .collect();
            if keys.iter().all(|k| *k == keys[0]) {
                // A leader anchor is unaffected by the re-key; a centroid
                // anchor must follow the smaller cell.
                let keep_anchor =
                    self.settings.leader_position_mode && aggregate.display().is_some();
                aggregate.set_key(keys[0]);
                self.cells.insert(keys[0], id);
                self.aggregates.insert(id, aggregate);
                if !keep_anchor {
                    self.mark_dirty(id, keys[0]);
                }
                continue;
            }
            self.release_display(&mut aggregate);
            for (marker, key) in aggregate.take_members().into_iter().zip(keys) {
                let target = match self.cells.get(&key) {
                    Some(&existing) => existing,
                    None => {
                        let created = self.create_aggregate(key);
                        self.mark_dirty(created, key);
                        created
                    }
                };
                self.aggregate_mut(target).push(marker.clone());
                self.markers.insert(marker, target);
            }
        }
    }

    /// Joins aggregates after a zoom-out, grouping them by their leader's cell
    /// at the new cell size. A group of one is kept as-is; a larger group is
    /// merged into a fresh aggregate in original relative member order.
    fn join_aggregates(&mut self) {
        let old_aggregates = std::mem::take(&mut self.aggregates);
        self.cells.clear();
        debug!(
            "joining {} aggregates at cell size {}",
            old_aggregates.len(),
            self.cell_size
        );
        let grouped: HashMap<CellKey, Vec<(AggregateId, ClusterAggregate)>> = old_aggregates
            .into_iter()
            .filter_map(|(id, mut aggregate)| {
                if aggregate.is_empty() {
                    self.release_display(&mut aggregate);
                    return None;
                }
                let anchor = aggregate
                    .leader()
                    .expect("non-empty aggregate always has a leader")
                    .clone();
                Some((CellKey::for_marker(&anchor, self.cell_size), (id, aggregate)))
            })
            .into_group_map();

        for (key, mut group) in grouped {
            if group.len() == 1 {
                let (id, mut aggregate) = group.pop().expect("group has exactly one entry");
                let keep_anchor =
                    self.settings.leader_position_mode && aggregate.display().is_some();
                aggregate.set_key(key);
                self.cells.insert(key, id);
                self.aggregates.insert(id, aggregate);
                if !keep_anchor {
                    self.mark_dirty(id, key);
                }
                continue;
            }
            let merged = self.create_aggregate(key);
            self.mark_dirty(merged, key);
            // Largest contributor's leader carries over in leader-position
            // mode; first encountered wins ties.
            let mut merged_leader: Option<MarkerRef> = None;
            let mut largest = 0usize;
            for (_, aggregate) in &group {
                if aggregate.len() > largest {
                    largest = aggregate.len();
                    merged_leader = aggregate.leader().cloned();
                }
            }
            for (_, mut aggregate) in group {
                self.release_display(&mut aggregate);
                for marker in aggregate.take_members() {
                    self.aggregate_mut(merged).push(marker.clone());
                    self.markers.insert(marker, merged);
                }
            }
            if self.settings.leader_position_mode {
                if let Some(leader) = merged_leader {
                    self.aggregate_mut(merged).set_leader(leader);
                }
            }
        }
    }

    /// Re-scans the viewport window after a pan and marks every aggregate with
    /// a member inside it for refresh.
    fn refresh_visible_window(&mut self) {
        self.window = CellWindow::from_bounds(&self.surface.visible_region_bounds(), self.cell_size);
        let mut in_window: Vec<AggregateId> = Vec::new();
        for (marker, &id) in &self.markers {
            let key = CellKey::for_marker(marker, self.cell_size);
            if self.window.contains_key(&key) {
                in_window.push(id);
            }
        }
        for id in in_window {
            self.refresher.refresh(id);
        }
    }

    /// Drains the refresh batch and rebuilds each dirty aggregate's display.
    fn flush(&mut self) {
        for id in self.refresher.refresh_all() {
            self.realize(id);
        }
    }

    /// Rebuilds one aggregate's display to match current membership: nothing
    /// for an empty cell (the aggregate is dropped from the index), the real
    /// marker for a singleton, a synthetic marker otherwise.
    fn realize(&mut self, id: AggregateId) {
        let Some(mut aggregate) = self.aggregates.remove(&id) else {
            // Merged or split away since it was marked dirty.
            return;
        };
        self.release_display(&mut aggregate);
        if aggregate.is_empty() {
            if self.cells.get(&aggregate.key()) == Some(&id) {
                self.cells.remove(&aggregate.key());
            }
            return;
        }
        if aggregate.len() == 1 {
            let only = aggregate.members()[0].clone();
            self.surface.show_marker(&only);
            aggregate.set_display(AggregateDisplay::Single(only));
        } else {
            let appearance = self
                .settings
                .appearance_for(aggregate.members())
                .expect("appearance provider presence is checked at construction");
            let leader_position = aggregate
                .leader()
                .expect("non-empty aggregate always has a leader")
                .position();
            let position = settings::anchor_position(
                self.settings.leader_position_mode,
                leader_position,
                cell::cell_center(aggregate.key(), self.cell_size),
            );
            for marker in aggregate.members() {
                self.surface.hide_marker(marker);
            }
            let handle = self.surface.create_visual_marker(position, &appearance);
            if let Some(listener) = self.listener.as_mut() {
                listener.on_cluster_event(ClusterEvent::Materialized {
                    handle,
                    member_count: aggregate.len(),
                });
            }
            aggregate.set_display(AggregateDisplay::Cluster(handle));
        }
        self.aggregates.insert(id, aggregate);
    }

    fn release_display(&mut self, aggregate: &mut ClusterAggregate) {
        match aggregate.take_display() {
            Some(AggregateDisplay::Cluster(handle)) => {
                self.surface.remove_visual_marker(handle);
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_cluster_event(ClusterEvent::Released { handle });
                }
            }
            Some(AggregateDisplay::Single(marker)) => {
                self.surface.hide_marker(&marker);
            }
            None => {}
        }
    }

    fn has_collision(&self, marker: &MarkerRef, zoom: i32) -> bool {
        let cell_size = cell_size_for_zoom(self.settings.base_cluster_size, zoom);
        let key = CellKey::for_marker(marker, cell_size);
        self.markers
            .keys()
            .any(|other| other != marker && CellKey::for_marker(other, cell_size) == key)
    }
}

impl ClusteringStrategy for GridClustering {
    fn on_add(&mut self, marker: &MarkerRef) {
        if !marker.is_visible() || self.markers.contains_key(marker) {
            return;
        }
        self.add_marker(marker.clone());
        self.flush();
    }

    fn on_remove(&mut self, marker: &MarkerRef) {
        if !marker.is_visible() {
            return;
        }
        self.remove_marker(marker);
        self.flush();
    }

    fn on_position_change(&mut self, marker: &MarkerRef) {
        if !marker.is_visible() {
            return;
        }
        self.reindex_marker(marker);
        self.flush();
    }

    fn on_cluster_group_change(&mut self, marker: &MarkerRef) {
        // A group change moves the marker between cells exactly like a
        // position change does.
        self.on_position_change(marker);
    }

    fn on_visibility_change_request(&mut self, marker: &MarkerRef, visible: bool) {
        if visible {
            marker.set_visible(true);
            if !self.markers.contains_key(marker) {
                self.add_marker(marker.clone());
            }
        } else {
            self.remove_marker(marker);
            marker.set_visible(false);
        }
        self.flush();
    }

    fn on_camera_change(&mut self, camera: CameraPosition) {
        let old_zoom = self.zoom;
        self.zoom = camera.zoom.round() as i32;
        let cell_size = cell_size_for_zoom(self.settings.base_cluster_size, self.zoom);
        if cell_size != self.cell_size {
            self.cell_size = cell_size;
            if self.settings.add_markers_dynamically {
                self.window =
                    CellWindow::from_bounds(&self.surface.visible_region_bounds(), cell_size);
            }
            if self.zoom > old_zoom {
                self.split_aggregates();
            } else {
                self.join_aggregates();
            }
        } else if self.settings.add_markers_dynamically {
            self.refresh_visible_window();
        }
        self.flush();
        if let Some(overlay) = self.debug_overlay.as_mut() {
            overlay.draw_grid(self.surface.as_mut(), self.cell_size);
        }
    }

    fn on_show_info_window(&mut self, marker: &MarkerRef) {
        if !marker.is_visible() {
            return;
        }
        // Only a singleton aggregate can host the marker's own info window;
        // force its display into existence.
        if let Some(&id) = self.markers.get(marker) {
            if self.aggregates.get(&id).map(ClusterAggregate::len) == Some(1) {
                self.refresher.refresh(id);
                self.flush();
            }
        }
    }

    fn min_zoom_level_not_clustered(&self, marker: &MarkerRef) -> Result<f32, ClusterError> {
        if !self.markers.contains_key(marker) {
            return Err(ClusterError::MarkerNotTracked);
        }
        for zoom in 0..=MAX_UNCLUSTER_ZOOM {
            if !self.has_collision(marker, zoom) {
                return Ok(zoom as f32);
            }
        }
        Ok(f32::INFINITY)
    }

    fn aggregate_for_visual(&self, handle: VisualHandle) -> Option<&ClusterAggregate> {
        // Linear scan; the index is bounded by the visible marker count.
        self.aggregates.values().find(|aggregate| {
            matches!(aggregate.display(), Some(AggregateDisplay::Cluster(h)) if *h == handle)
        })
    }

    fn displayed_markers(&self) -> Vec<AggregateDisplay> {
        self.aggregates
            .values()
            .filter_map(|aggregate| aggregate.display().cloned())
            .collect()
    }

    fn cleanup(&mut self) {
        for mut aggregate in std::mem::take(&mut self.aggregates).into_values() {
            // Synthetic markers are removed; real markers are left to their
            // owner.
            if let Some(AggregateDisplay::Cluster(handle)) = aggregate.take_display() {
                self.surface.remove_visual_marker(handle);
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_cluster_event(ClusterEvent::Released { handle });
                }
            }
        }
        self.cells.clear();
        self.markers.clear();
        self.refresher.cleanup();
        if let Some(overlay) = self.debug_overlay.as_mut() {
            overlay.cleanup(self.surface.as_mut());
        }
    }
}
