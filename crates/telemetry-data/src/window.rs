//! Windowing engine: pure retention math over event snapshots
//!
//! `apply_window` answers "what does a chart currently show"; the eviction
//! threshold answers "what may the buffer discard". Both share the same
//! retention math but neither mutates anything here; eviction is a
//! separate, explicit buffer operation.

use std::sync::Arc;

use telemetry_shared::{Event, WindowSpec};

/// Retention cutoff phrased as "events to discard"
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvictionThreshold {
    /// Discard events with a frame index below the cutoff
    FramesBefore(u64),
    /// Discard events with a sim time below the cutoff
    SimTimeBefore(f64),
}

impl EvictionThreshold {
    /// Whether the given event falls outside the retained window.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EvictionThreshold::FramesBefore(min) => event.frame_index < *min,
            EvictionThreshold::SimTimeBefore(cutoff) => event.sim_time < *cutoff,
        }
    }
}

/// Apply a retention window to a snapshot of events.
///
/// Pure and non-mutating; returns a new vector sorted ascending by frame
/// index (except for the unbounded window, which is an identity copy).
/// Empty input yields empty output in every branch.
pub fn apply_window(events: &[Arc<Event>], window: &WindowSpec) -> Vec<Arc<Event>> {
    if events.is_empty() {
        return Vec::new();
    }

    match window {
        WindowSpec::All => events.to_vec(),
        WindowSpec::Frames { size } => {
            let mut sorted = events.to_vec();
            sorted.sort_by_key(|e| e.frame_index);
            if sorted.len() > *size {
                sorted.split_off(sorted.len() - size)
            } else {
                sorted
            }
        }
        WindowSpec::Time { duration } => {
            let mut sorted = events.to_vec();
            sorted.sort_by_key(|e| e.frame_index);
            let max_time = sorted
                .iter()
                .map(|e| e.sim_time)
                .fold(f64::NEG_INFINITY, f64::max);
            let cutoff = max_time - duration;
            sorted.retain(|e| e.sim_time >= cutoff);
            sorted
        }
    }
}

/// Compute the eviction cutoff for the given window over the full buffer
/// contents, or `None` when nothing should be evicted (unbounded window,
/// empty input, or a buffer already within its frame budget).
pub fn eviction_threshold(
    window: &WindowSpec,
    all_events: &[Arc<Event>],
) -> Option<EvictionThreshold> {
    if all_events.is_empty() {
        return None;
    }

    match window {
        WindowSpec::All => None,
        WindowSpec::Frames { size } => {
            if all_events.len() <= *size {
                return None;
            }
            let mut frames: Vec<u64> = all_events.iter().map(|e| e.frame_index).collect();
            frames.sort_unstable();
            let min_kept = frames[frames.len() - size];
            Some(EvictionThreshold::FramesBefore(min_kept))
        }
        WindowSpec::Time { duration } => {
            let max_time = all_events
                .iter()
                .map(|e| e.sim_time)
                .fold(f64::NEG_INFINITY, f64::max);
            Some(EvictionThreshold::SimTimeBefore(max_time - duration))
        }
    }
}
