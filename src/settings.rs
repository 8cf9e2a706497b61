//! Engine configuration and the appearance-provider collaborators.

use crate::cell::DEFAULT_BASE_CLUSTER_SIZE;
use crate::marker::MarkerRef;
use crate::surface::{Appearance, VisualHandle};
use geo_types::Point;

/// Appearance from the full member list of an aggregate.
pub type ClusterOptionsProvider = Box<dyn Fn(&[MarkerRef]) -> Appearance>;

/// Appearance from the member count alone.
pub type IconDataProvider = Box<dyn Fn(usize) -> Appearance>;

/// Event delivered to an optional change-notification listener whenever an
/// aggregate materializes or releases its synthetic marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterEvent {
    Materialized {
        handle: VisualHandle,
        member_count: usize,
    },
    Released {
        handle: VisualHandle,
    },
}

pub trait ClusterChangeListener {
    fn on_cluster_event(&mut self, event: ClusterEvent);
}

/// Configuration captured at engine construction.
///
/// At least one of the two appearance providers must be set or construction
/// fails; everything else has a working default.
pub struct ClusteringSettings {
    pub base_cluster_size: f64,
    pub add_markers_dynamically: bool,
    pub leader_position_mode: bool,
    pub cluster_options_provider: Option<ClusterOptionsProvider>,
    pub icon_data_provider: Option<IconDataProvider>,
    pub change_listener: Option<Box<dyn ClusterChangeListener>>,
}

impl Default for ClusteringSettings {
    fn default() -> ClusteringSettings {
        ClusteringSettings {
            base_cluster_size: DEFAULT_BASE_CLUSTER_SIZE,
            add_markers_dynamically: false,
            leader_position_mode: false,
            cluster_options_provider: None,
            icon_data_provider: None,
            change_listener: None,
        }
    }
}

impl ClusteringSettings {
    pub fn base_cluster_size(mut self, size: f64) -> ClusteringSettings {
        self.base_cluster_size = size;
        self
    }

    pub fn add_markers_dynamically(mut self, enabled: bool) -> ClusteringSettings {
        self.add_markers_dynamically = enabled;
        self
    }

    pub fn leader_position_mode(mut self, enabled: bool) -> ClusteringSettings {
        self.leader_position_mode = enabled;
        self
    }

    pub fn cluster_options_provider(
        mut self,
        provider: impl Fn(&[MarkerRef]) -> Appearance + 'static,
    ) -> ClusteringSettings {
        self.cluster_options_provider = Some(Box::new(provider));
        self
    }

    pub fn icon_data_provider(
        mut self,
        provider: impl Fn(usize) -> Appearance + 'static,
    ) -> ClusteringSettings {
        self.icon_data_provider = Some(Box::new(provider));
        self
    }

    pub fn change_listener(
        mut self,
        listener: impl ClusterChangeListener + 'static,
    ) -> ClusteringSettings {
        self.change_listener = Some(Box::new(listener));
        self
    }

    pub fn has_appearance_provider(&self) -> bool {
        self.cluster_options_provider.is_some() || self.icon_data_provider.is_some()
    }

    /// Resolves the appearance for an aggregate, preferring the full-list
    /// provider over the count-only one.
    pub(crate) fn appearance_for(&self, members: &[MarkerRef]) -> Option<Appearance> {
        if let Some(provider) = &self.cluster_options_provider {
            Some(provider(members))
        } else {
            self.icon_data_provider
                .as_ref()
                .map(|provider| provider(members.len()))
        }
    }
}

/// Where an aggregate's synthetic marker is anchored, given the leader
/// position and the cell center.
pub(crate) fn anchor_position(
    leader_position_mode: bool,
    leader: Point<f64>,
    cell_center: Point<f64>,
) -> Point<f64> {
    if leader_position_mode {
        leader
    } else {
        cell_center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::IconToken;

    fn appearance(token: u64) -> Appearance {
        Appearance {
            icon: IconToken(token),
            anchor_u: 0.5,
            anchor_v: 0.5,
        }
    }

    #[test]
    fn full_list_provider_wins_over_count_provider() {
        let settings = ClusteringSettings::default()
            .cluster_options_provider(|_members| appearance(1))
            .icon_data_provider(|_count| appearance(2));
        let got = settings.appearance_for(&[]).unwrap();
        assert_eq!(got.icon, IconToken(1));
    }

    #[test]
    fn no_provider_resolves_to_none() {
        let settings = ClusteringSettings::default();
        assert!(!settings.has_appearance_provider());
        assert!(settings.appearance_for(&[]).is_none());
    }
}
