//! Latest contact per vehicle part, for telemetry.
//!
//! The ledger keeps at most one entry per [`PartId`]. A new contact on the
//! same part overwrites the entry; entries are never removed, only marked
//! inactive once they have been quiet for the quiescence window.

use std::collections::BTreeMap;

use bevy::math::Vec3;

use crate::parts::PartId;

/// Where a contact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSource {
    /// Synthetic ground-plane penetration
    Ground,
    /// Contact reported by the solver's contact graph
    Solver,
}

/// The most recent contact of one part.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactEvent {
    pub part: PartId,
    /// Simulation time of the contact (seconds)
    pub timestamp: f64,
    /// Unit world-space normal pointing away from the obstacle
    pub normal: Vec3,
    /// Force applied to the chassis for this contact
    pub force: Vec3,
    pub source: ContactSource,
    pub active: bool,
}

impl ContactEvent {
    pub fn part_name(&self) -> &'static str {
        self.part.name()
    }
}

/// Per-vehicle collision record.
#[derive(Debug, Clone, Default)]
pub struct CollisionLedger {
    entries: BTreeMap<PartId, ContactEvent>,
    total_collisions: u64,
    frame_collisions: u32,
    overlapping_contacts: u64,
}

impl CollisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the per-frame counter. Call at the start of every frame.
    pub fn begin_frame(&mut self) {
        self.frame_collisions = 0;
    }

    /// Store `event` as the part's latest contact and bump both counters.
    pub fn record(&mut self, event: ContactEvent) {
        self.total_collisions += 1;
        self.frame_collisions += 1;
        self.entries.insert(event.part, event);
    }

    /// Mark entries inactive once `window` seconds have passed since their last update.
    pub fn expire(&mut self, now: f64, window: f64) {
        for entry in self.entries.values_mut() {
            if entry.active && now - entry.timestamp >= window {
                entry.active = false;
            }
        }
    }

    /// Note a step in which one part took both a ground and a solver force.
    pub fn flag_overlap(&mut self) {
        self.overlapping_contacts += 1;
    }

    pub fn get(&self, part: PartId) -> Option<&ContactEvent> {
        self.entries.get(&part)
    }

    /// Entries in part order.
    pub fn entries(&self) -> impl Iterator<Item = &ContactEvent> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entries.values().filter(|e| e.active).count()
    }

    pub fn total_collisions(&self) -> u64 {
        self.total_collisions
    }

    pub fn frame_collisions(&self) -> u32 {
        self.frame_collisions
    }

    pub fn overlapping_contacts(&self) -> u64 {
        self.overlapping_contacts
    }

    /// Forget every entry and the frame count. Running totals keep counting.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.frame_collisions = 0;
    }
}
