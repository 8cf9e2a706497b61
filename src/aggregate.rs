//! Per-cell aggregate state: the member list, the leader, and the realized
//! display.

use crate::cell::CellKey;
use crate::marker::MarkerRef;
use crate::surface::VisualHandle;

/// Identifier of an aggregate inside the engine's indices.
pub type AggregateId = u64;

/// What an aggregate currently shows on the map: the real marker itself for a
/// singleton cell, or a synthetic marker for a multi-member cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregateDisplay {
    Single(MarkerRef),
    Cluster(VisualHandle),
}

/// One non-empty grid cell's worth of markers.
///
/// Members keep insertion order; the leader is the member whose position
/// anchors the visual marker and defaults to the first member. The leader is
/// always a current member, and an empty aggregate never holds a display.
#[derive(Debug)]
pub struct ClusterAggregate {
    key: CellKey,
    members: Vec<MarkerRef>,
    leader: Option<MarkerRef>,
    display: Option<AggregateDisplay>,
}

impl ClusterAggregate {
    pub fn new(key: CellKey) -> ClusterAggregate {
        ClusterAggregate {
            key,
            members: Vec::new(),
            leader: None,
            display: None,
        }
    }

    pub fn key(&self) -> CellKey {
        self.key
    }

    /// Re-keys the aggregate in place during a zoom transition. Membership is
    /// untouched.
    pub(crate) fn set_key(&mut self, key: CellKey) {
        self.key = key;
    }

    pub fn members(&self) -> &[MarkerRef] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, marker: &MarkerRef) -> bool {
        self.members.contains(marker)
    }

    pub fn leader(&self) -> Option<&MarkerRef> {
        self.leader.as_ref()
    }

    /// Appends a member; the first member becomes the leader.
    pub(crate) fn push(&mut self, marker: MarkerRef) {
        if self.leader.is_none() {
            self.leader = Some(marker.clone());
        }
        self.members.push(marker);
    }

    /// Detaches a member. Removing the leader hands leadership to the first
    /// remaining member.
    pub(crate) fn remove(&mut self, marker: &MarkerRef) -> bool {
        let Some(index) = self.members.iter().position(|m| m == marker) else {
            return false;
        };
        self.members.remove(index);
        if self.leader.as_ref() == Some(marker) {
            self.leader = self.members.first().cloned();
        }
        true
    }

    /// Overrides the leader after a join in leader-position mode. The new
    /// leader must already be a member.
    pub(crate) fn set_leader(&mut self, marker: MarkerRef) {
        debug_assert!(self.contains(&marker));
        self.leader = Some(marker);
    }

    /// Empties the aggregate, handing the members back in their original
    /// relative order.
    pub(crate) fn take_members(&mut self) -> Vec<MarkerRef> {
        self.leader = None;
        std::mem::take(&mut self.members)
    }

    pub fn display(&self) -> Option<&AggregateDisplay> {
        self.display.as_ref()
    }

    pub(crate) fn set_display(&mut self, display: AggregateDisplay) {
        self.display = Some(display);
    }

    pub(crate) fn take_display(&mut self) -> Option<AggregateDisplay> {
        self.display.take()
    }
}
