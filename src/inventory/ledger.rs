//! TrackLedger - Track Lifecycle Ledger
//!
//! Converts the per-frame tracked observation sets into confirmed
//! `SNACK_ADDED` / `SNACK_TAKEN` events and keeps running per-class counts.
//!
//! ## Debounce
//!
//! Arrivals are confirmed on first sight. Departures are confirmed only
//! after a track has been absent for `debounce_frames` consecutive frames;
//! a reappearance inside that window deletes the pending counter without
//! emitting anything.
//!
//! ## Duplicate track IDs within one frame
//!
//! The first observation of an ID decides the class binding. Later
//! observations of the same ID in the same frame only confirm presence.

use super::types::{InventoryCounts, InventoryEvent};
use crate::models::{TrackId, TrackedObservation};
use std::collections::{HashMap, HashSet};

/// Default number of absent frames before a departure is confirmed
pub const DEFAULT_DEBOUNCE_FRAMES: u32 = 10;

/// Active track entry
#[derive(Debug, Clone)]
struct ActiveTrack {
    /// Class bound at admission, immutable for the entry's life
    class_name: String,
    /// Admission order, used to order Taken events within one update
    admitted: u64,
}

/// Track lifecycle ledger
#[derive(Debug)]
pub struct TrackLedger {
    debounce_frames: u32,
    counts: InventoryCounts,
    /// track_id -> active entry
    active_tracks: HashMap<TrackId, ActiveTrack>,
    /// track_id -> consecutive frames missing
    disappeared: HashMap<TrackId, u32>,
    /// Events not yet handed to the batcher
    pending: Vec<InventoryEvent>,
    next_admission: u64,
}

impl TrackLedger {
    /// Create a ledger. A zero debounce is treated as 1.
    pub fn new(debounce_frames: u32) -> Self {
        Self {
            debounce_frames: debounce_frames.max(1),
            counts: InventoryCounts::new(),
            active_tracks: HashMap::new(),
            disappeared: HashMap::new(),
            pending: Vec::new(),
            next_admission: 0,
        }
    }

    pub fn debounce_frames(&self) -> u32 {
        self.debounce_frames
    }

    /// Apply one frame's observations
    ///
    /// Returns the events generated by this call, in emission order. The
    /// same events are appended to the pending buffer.
    pub fn update(&mut self, observations: &[TrackedObservation]) -> Vec<InventoryEvent> {
        let mut events = Vec::new();
        let mut current_ids: HashSet<TrackId> = HashSet::with_capacity(observations.len());

        for obs in observations {
            if !current_ids.insert(obs.track_id) {
                tracing::debug!(
                    track_id = obs.track_id,
                    class_name = %obs.class_name,
                    "Duplicate track_id in frame, keeping first observation"
                );
                continue;
            }

            if !self.active_tracks.contains_key(&obs.track_id) {
                events.push(self.admit(obs));
            } else if let Some(missing) = self.disappeared.remove(&obs.track_id) {
                tracing::debug!(
                    track_id = obs.track_id,
                    missing_frames = missing,
                    "Track reappeared, pending departure cancelled"
                );
            }
        }

        let mut missing: Vec<(u64, TrackId)> = self
            .active_tracks
            .iter()
            .filter(|(track_id, _)| !current_ids.contains(track_id))
            .map(|(track_id, track)| (track.admitted, *track_id))
            .collect();
        missing.sort_unstable();

        for (_, track_id) in missing {
            let frames_missing = {
                let counter = self.disappeared.entry(track_id).or_insert(0);
                *counter += 1;
                *counter
            };

            if frames_missing >= self.debounce_frames {
                if let Some(event) = self.confirm_taken(track_id) {
                    events.push(event);
                }
            }
        }

        self.check_invariants();
        self.pending.extend(events.iter().cloned());
        events
    }

    /// Insert a new active track and emit its Added event
    fn admit(&mut self, obs: &TrackedObservation) -> InventoryEvent {
        self.active_tracks.insert(
            obs.track_id,
            ActiveTrack {
                class_name: obs.class_name.clone(),
                admitted: self.next_admission,
            },
        );
        self.next_admission += 1;

        let count = self.counts.entry(obs.class_name.clone()).or_insert(0);
        let event = InventoryEvent::added(&obs.class_name, obs.track_id, *count);
        *count = event.count_after;

        tracing::info!(
            item = %event.item,
            track_id = event.track_id,
            count_before = event.count_before,
            count_after = event.count_after,
            "SNACK_ADDED"
        );
        event
    }

    /// Remove a departed track and emit its Taken event
    fn confirm_taken(&mut self, track_id: TrackId) -> Option<InventoryEvent> {
        self.disappeared.remove(&track_id);
        let track = self.active_tracks.remove(&track_id)?;

        let count = self.counts.entry(track.class_name.clone()).or_insert(0);
        let event = InventoryEvent::taken(&track.class_name, track_id, *count);
        *count = event.count_after;

        tracing::info!(
            item = %event.item,
            track_id = event.track_id,
            count_before = event.count_before,
            count_after = event.count_after,
            "SNACK_TAKEN"
        );
        Some(event)
    }

    fn check_invariants(&self) {
        debug_assert!(
            self.disappeared
                .keys()
                .all(|track_id| self.active_tracks.contains_key(track_id)),
            "disappearance counter without active track"
        );
        debug_assert!(
            self.disappeared
                .values()
                .all(|frames| *frames > 0 && *frames < self.debounce_frames),
            "disappearance counter outside debounce window"
        );
    }

    /// Current per-class counts (copy)
    pub fn current_inventory(&self) -> InventoryCounts {
        self.counts.clone()
    }

    /// Drain the pending event buffer, preserving emission order
    pub fn take_pending(&mut self) -> Vec<InventoryEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn active_track_count(&self) -> usize {
        self.active_tracks.len()
    }

    /// Class bound to an active track
    pub fn active_class(&self, track_id: TrackId) -> Option<&str> {
        self.active_tracks
            .get(&track_id)
            .map(|t| t.class_name.as_str())
    }

    /// Consecutive frames an active track has been missing, if pending departure
    pub fn missing_frames(&self, track_id: TrackId) -> Option<u32> {
        self.disappeared.get(&track_id).copied()
    }

    /// Clear counts, active tracks, disappearance counters and pending events
    pub fn reset(&mut self) {
        self.counts.clear();
        self.active_tracks.clear();
        self.disappeared.clear();
        self.pending.clear();
        tracing::info!("Inventory ledger reset");
    }
}

impl Default for TrackLedger {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::types::EventType;
    use crate::models::BBox;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn obs(track_id: TrackId, class_name: &str) -> TrackedObservation {
        TrackedObservation::new(
            track_id,
            class_name,
            0.9,
            BBox::new(100.0, 100.0, 200.0, 200.0),
        )
    }

    #[test]
    fn test_new_ledger_is_empty() {
        let ledger = TrackLedger::default();
        assert_eq!(ledger.debounce_frames(), 10);
        assert!(ledger.current_inventory().is_empty());
        assert_eq!(ledger.active_track_count(), 0);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn test_zero_debounce_is_clamped() {
        assert_eq!(TrackLedger::new(0).debounce_frames(), 1);
    }

    #[test]
    fn test_new_track_generates_added_event() {
        let mut ledger = TrackLedger::default();
        let events = ledger.update(&[obs(1, "chips")]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Added);
        assert_eq!(events[0].item, "chips");
        assert_eq!(events[0].track_id, 1);
        assert_eq!(events[0].count_before, 0);
        assert_eq!(events[0].count_after, 1);
        assert_eq!(ledger.current_inventory()["chips"], 1);
        assert_eq!(ledger.active_class(1), Some("chips"));
    }

    #[test]
    fn test_simultaneous_new_tracks_in_input_order() {
        let mut ledger = TrackLedger::default();
        let events = ledger.update(&[obs(1, "chips"), obs(2, "candy"), obs(3, "chips")]);

        let order: Vec<(TrackId, &str)> = events
            .iter()
            .map(|e| (e.track_id, e.item.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "chips"), (2, "candy"), (3, "chips")]);
        assert_eq!((events[2].count_before, events[2].count_after), (1, 2));

        let inventory = ledger.current_inventory();
        assert_eq!(inventory["chips"], 2);
        assert_eq!(inventory["candy"], 1);
    }

    #[test]
    fn test_steady_presence_emits_nothing() {
        let mut ledger = TrackLedger::default();
        ledger.update(&[obs(1, "chips")]);
        for _ in 0..20 {
            assert!(ledger.update(&[obs(1, "chips")]).is_empty());
        }
        assert_eq!(ledger.current_inventory()["chips"], 1);
    }

    #[test]
    fn test_taken_after_exactly_debounce_frames() {
        let mut ledger = TrackLedger::new(5);
        ledger.update(&[obs(1, "chips")]);

        for expected in 1..=4 {
            let events = ledger.update(&[]);
            assert!(events.is_empty());
            assert_eq!(ledger.missing_frames(1), Some(expected));
            assert_eq!(ledger.current_inventory()["chips"], 1);
        }

        let events = ledger.update(&[]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Taken);
        assert_eq!(events[0].item, "chips");
        assert_eq!(events[0].track_id, 1);
        assert_eq!((events[0].count_before, events[0].count_after), (1, 0));
        assert_eq!(ledger.current_inventory()["chips"], 0);
        assert_eq!(ledger.active_class(1), None);
        assert_eq!(ledger.missing_frames(1), None);

        // Nothing more for this track
        for _ in 0..10 {
            assert!(ledger.update(&[]).is_empty());
        }
    }

    #[test]
    fn test_reappearance_cancels_departure() {
        let mut ledger = TrackLedger::new(5);
        ledger.update(&[obs(1, "chips")]);

        for _ in 0..4 {
            assert!(ledger.update(&[]).is_empty());
        }
        assert_eq!(ledger.missing_frames(1), Some(4));

        let events = ledger.update(&[obs(1, "chips")]);
        assert!(events.is_empty());
        assert_eq!(ledger.missing_frames(1), None);

        // Counter restarts from zero
        for _ in 0..4 {
            assert!(ledger.update(&[]).is_empty());
        }
        assert_eq!(ledger.current_inventory()["chips"], 1);
        assert_eq!(ledger.update(&[]).len(), 1);
    }

    #[test]
    fn test_debounce_of_one_takes_immediately() {
        let mut ledger = TrackLedger::new(1);
        ledger.update(&[obs(4, "apple")]);
        let events = ledger.update(&[]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Taken);
    }

    #[test]
    fn test_class_is_bound_at_admission() {
        let mut ledger = TrackLedger::new(2);
        ledger.update(&[obs(1, "chips")]);
        // Tracker relabels the same track; the entry keeps its class
        assert!(ledger.update(&[obs(1, "candy")]).is_empty());
        assert_eq!(ledger.active_class(1), Some("chips"));

        ledger.update(&[]);
        let events = ledger.update(&[]);
        assert_eq!(events[0].item, "chips");
        assert!(!ledger.current_inventory().contains_key("candy"));
    }

    #[test]
    fn test_duplicate_track_id_first_observation_wins() {
        let mut ledger = TrackLedger::default();
        let events = ledger.update(&[obs(9, "banana"), obs(9, "apple")]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].item, "banana");
        assert_eq!(ledger.active_class(9), Some("banana"));
        assert_eq!(ledger.current_inventory().get("apple"), None);
    }

    #[test]
    fn test_taken_events_follow_admission_order() {
        let mut ledger = TrackLedger::new(1);
        ledger.update(&[obs(30, "cake"), obs(10, "donut"), obs(20, "pizza")]);

        let events = ledger.update(&[]);
        let ids: Vec<TrackId> = events.iter().map(|e| e.track_id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_same_frame_add_and_take() {
        let mut ledger = TrackLedger::new(1);
        ledger.update(&[obs(1, "chips")]);

        let events = ledger.update(&[obs(2, "chips")]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Added);
        assert_eq!((events[0].count_before, events[0].count_after), (1, 2));
        assert_eq!(events[1].event_type, EventType::Taken);
        assert_eq!((events[1].count_before, events[1].count_after), (2, 1));
        assert_eq!(ledger.current_inventory()["chips"], 1);
    }

    #[test]
    fn test_pending_buffer_accumulates_across_updates() {
        let mut ledger = TrackLedger::new(1);
        let first = ledger.update(&[obs(1, "chips")]);
        let second = ledger.update(&[]);

        let pending = ledger.take_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0], first[0]);
        assert_eq!(pending[1], second[0]);
        assert_eq!(ledger.pending_len(), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut ledger = TrackLedger::new(5);
        ledger.update(&[obs(1, "chips"), obs(2, "candy")]);
        ledger.update(&[obs(1, "chips")]);
        assert_eq!(ledger.missing_frames(2), Some(1));

        ledger.reset();

        assert!(ledger.current_inventory().is_empty());
        assert_eq!(ledger.active_track_count(), 0);
        assert_eq!(ledger.missing_frames(2), None);
        assert_eq!(ledger.pending_len(), 0);

        // A previously known id is new again
        let events = ledger.update(&[obs(1, "chips")]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].count_before, 0);
    }

    #[test]
    fn test_random_sequences_keep_counts_consistent() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let classes = ["chips", "candy", "apple"];

        for debounce in 1..=4u32 {
            let mut ledger = TrackLedger::new(debounce);
            let mut added = 0usize;
            let mut taken = 0usize;

            for _ in 0..500 {
                let n = rng.gen_range(0..5);
                let frame: Vec<TrackedObservation> = (0..n)
                    .map(|_| {
                        let id = rng.gen_range(0..12u64);
                        obs(id, classes[(id % 3) as usize])
                    })
                    .collect();

                for event in ledger.update(&frame) {
                    match event.event_type {
                        EventType::Added => {
                            added += 1;
                            assert_eq!(event.count_after, event.count_before + 1);
                        }
                        EventType::Taken => {
                            taken += 1;
                            assert_eq!(event.count_after, event.count_before.saturating_sub(1));
                        }
                    }
                }

                // Per-class count equals the number of active tracks of that class
                let inventory = ledger.current_inventory();
                for class in classes {
                    let active = (0..12u64)
                        .filter(|id| ledger.active_class(*id) == Some(class))
                        .count() as u32;
                    assert_eq!(inventory.get(class).copied().unwrap_or(0), active);
                }
                for id in 0..12u64 {
                    if let Some(frames) = ledger.missing_frames(id) {
                        assert!(ledger.active_class(id).is_some());
                        assert!(frames < debounce);
                    }
                }
            }

            assert_eq!(added - taken, ledger.active_track_count());
        }
    }
}
