//! Time cursor drag controller
//!
//! Scrubbing maps the pointer's horizontal fraction of the plot onto the
//! cursor axis extent of the visible data. Starting a scrub while live
//! playback is on pauses playback once for the whole gesture; releasing
//! does not resume it, matching how operators scrub into history.

use telemetry_shared::Series;

use crate::scale::{axis_bounds, PlotArea};
use crate::store::SharedStateStore;

/// Per-chart scrub gesture controller
#[derive(Debug, Default)]
pub struct TimeCursorController {
    dragging: bool,
}

impl TimeCursorController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Begin a scrub. Pauses live playback and places the cursor at the
    /// pressed position.
    pub fn press(&mut self, store: &SharedStateStore, area: &PlotArea, series: &[Series], px: f64) {
        self.dragging = true;
        if store.snapshot().live_mode.is_playing {
            store.update_live_mode(|lm| lm.is_playing = false);
        }
        self.scrub(store, area, series, px);
    }

    /// Continue a scrub. Ignored when no press is active.
    pub fn drag(&mut self, store: &SharedStateStore, area: &PlotArea, series: &[Series], px: f64) {
        if !self.dragging {
            return;
        }
        self.scrub(store, area, series, px);
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Pointer left the chart mid-gesture; the cursor keeps its last value.
    pub fn leave(&mut self) {
        self.dragging = false;
    }

    fn scrub(&self, store: &SharedStateStore, area: &PlotArea, series: &[Series], px: f64) {
        let axis = store.snapshot().time_cursor.axis;
        let Some([lo, hi]) = axis_bounds(series, axis) else {
            return;
        };
        // Clamped so dragging past the plot edge pins to the data extent.
        let fraction = area.x_fraction_clamped(px);
        let value = if hi == lo {
            lo
        } else {
            lo + fraction * (hi - lo)
        };
        store.update_time_cursor(Some(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use telemetry_shared::{DataPoint, Event, TimeAxis};

    fn series(frames: &[u64]) -> Series {
        Series {
            id: "s".to_string(),
            points: frames
                .iter()
                .map(|&f| DataPoint {
                    x: f as f64,
                    y: 0.0,
                    frame_index: f,
                    sim_time: f as f64 * 0.1,
                    event: Arc::new(Event {
                        v: 1,
                        run_id: "run-1".to_string(),
                        source_id: "sim".to_string(),
                        channel: "physics".to_string(),
                        event_type: "tick".to_string(),
                        frame_index: f,
                        sim_time: f as f64 * 0.1,
                        wall_time_ms: None,
                        tags: None,
                        payload: serde_json::Value::Null,
                    }),
                })
                .collect(),
        }
    }

    #[test]
    fn test_scrub_maps_fraction_to_axis_extent() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[100, 200, 300])];
        let mut controller = TimeCursorController::new();

        // Halfway across the inner plot.
        controller.press(&store, &area, &data, 60.0 + 290.0);
        assert_eq!(store.snapshot().time_cursor.value, Some(200.0));

        // Past the right edge pins to the maximum.
        controller.drag(&store, &area, &data, 10_000.0);
        assert_eq!(store.snapshot().time_cursor.value, Some(300.0));
        controller.release();
        assert!(!controller.is_dragging());
    }

    #[test]
    fn test_scrub_uses_current_axis() {
        let store = SharedStateStore::new();
        store.update_time_cursor_axis(TimeAxis::SimTime);
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[0, 100])];
        let mut controller = TimeCursorController::new();

        controller.press(&store, &area, &data, 60.0 + 580.0);
        assert_eq!(store.snapshot().time_cursor.value, Some(10.0));
    }

    #[test]
    fn test_press_pauses_playback() {
        let store = SharedStateStore::new();
        store.update_live_mode(|lm| lm.is_playing = true);
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[0, 10])];
        let mut controller = TimeCursorController::new();

        controller.press(&store, &area, &data, 100.0);
        assert!(!store.snapshot().live_mode.is_playing);

        // Release does not resume.
        controller.release();
        assert!(!store.snapshot().live_mode.is_playing);
    }

    #[test]
    fn test_drag_without_press_is_ignored() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[0, 10])];
        let mut controller = TimeCursorController::new();

        controller.drag(&store, &area, &data, 100.0);
        assert_eq!(store.snapshot().time_cursor.value, None);
    }

    #[test]
    fn test_single_point_extent_collapses() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[42])];
        let mut controller = TimeCursorController::new();

        controller.press(&store, &area, &data, 300.0);
        assert_eq!(store.snapshot().time_cursor.value, Some(42.0));
    }
}
