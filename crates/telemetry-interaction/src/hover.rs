//! Hover controller: pointer position to nearest-point tooltip state
//!
//! On every pointer move the controller inverts the pixel position into
//! domain coordinates and finds the nearest projected point in screen
//! space. Within the pickup threshold the hover record carries the point's
//! series and originating event; outside it the record still carries the
//! inverted coordinates so a crosshair can track the pointer.

use telemetry_shared::{HoverData, HoverState, Series};

use crate::scale::{data_bounds, PlotArea};
use crate::store::SharedStateStore;

const HOVER_THRESHOLD_PX: f64 = 50.0;

/// Per-chart hover gesture controller
pub struct HoverController {
    chart_id: String,
    threshold_px: f64,
}

impl HoverController {
    pub fn new(chart_id: impl Into<String>) -> Self {
        Self {
            chart_id: chart_id.into(),
            threshold_px: HOVER_THRESHOLD_PX,
        }
    }

    /// Handle a pointer move at pixel position (`px`, `py`). Publishes the
    /// new hover state, or nothing when the chart has no data.
    pub fn pointer_move(
        &self,
        store: &SharedStateStore,
        area: &PlotArea,
        series: &[Series],
        px: f64,
        py: f64,
    ) {
        let Some(bounds) = data_bounds(series) else {
            return;
        };
        let x_range = [bounds.x_min, bounds.x_max];
        let y_range = [bounds.y_min, bounds.y_max];

        let mut nearest: Option<(f64, &str, usize, &Series)> = None;
        for s in series {
            for (i, p) in s.points.iter().enumerate() {
                let (ppx, ppy) = area.domain_to_pixel(p.x, p.y, x_range, y_range);
                let dist = ((ppx - px).powi(2) + (ppy - py).powi(2)).sqrt();
                if nearest.map_or(true, |(best, ..)| dist < best) {
                    nearest = Some((dist, s.id.as_str(), i, s));
                }
            }
        }

        let state = match nearest {
            Some((dist, series_id, index, s)) if dist < self.threshold_px => {
                let point = &s.points[index];
                HoverState {
                    chart_id: self.chart_id.clone(),
                    x: point.x,
                    y: point.y,
                    data: HoverData {
                        series_id: Some(series_id.to_string()),
                        event: Some(point.event.clone()),
                        pointer_x: px,
                        pointer_y: py,
                    },
                }
            }
            _ => {
                // No pickup; publish the crosshair position only.
                let (dx, dy) = area.pixel_to_domain(px, py, x_range, y_range);
                HoverState {
                    chart_id: self.chart_id.clone(),
                    x: dx,
                    y: dy,
                    data: HoverData {
                        series_id: None,
                        event: None,
                        pointer_x: px,
                        pointer_y: py,
                    },
                }
            }
        };

        store.update_hover_state(Some(state));
    }

    /// Pointer left the chart: clear the shared hover record.
    pub fn pointer_leave(&self, store: &SharedStateStore) {
        store.update_hover_state(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use telemetry_shared::{DataPoint, Event};

    fn series(id: &str, points: &[(f64, f64)]) -> Series {
        Series {
            id: id.to_string(),
            points: points
                .iter()
                .enumerate()
                .map(|(i, &(x, y))| DataPoint {
                    x,
                    y,
                    frame_index: i as u64,
                    sim_time: x,
                    event: Arc::new(Event {
                        v: 1,
                        run_id: "run-1".to_string(),
                        source_id: "sim".to_string(),
                        channel: "physics".to_string(),
                        event_type: "tick".to_string(),
                        frame_index: i as u64,
                        sim_time: x,
                        wall_time_ms: None,
                        tags: None,
                        payload: serde_json::json!({"y": y}),
                    }),
                })
                .collect(),
        }
    }

    #[test]
    fn test_hover_picks_nearest_point() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series("a", &[(0.0, 0.0), (10.0, 10.0)])];
        let controller = HoverController::new("chart-1");

        // Pointer right on top of the second point.
        let (px, py) = area.domain_to_pixel(10.0, 10.0, [0.0, 10.0], [0.0, 10.0]);
        controller.pointer_move(&store, &area, &data, px, py);

        let hover = store.snapshot().hover_state.unwrap();
        assert_eq!(hover.chart_id, "chart-1");
        assert_eq!(hover.x, 10.0);
        assert_eq!(hover.data.series_id.as_deref(), Some("a"));
        assert_eq!(hover.data.event.unwrap().frame_index, 1);
    }

    #[test]
    fn test_hover_beyond_threshold_keeps_crosshair() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        // One point in the far corner of the domain.
        let data = [series("a", &[(0.0, 0.0), (100.0, 100.0)])];
        let controller = HoverController::new("chart-1");

        // Pointer near the domain center, far from both points in pixels.
        let (px, py) = area.domain_to_pixel(50.0, 50.0, [0.0, 100.0], [0.0, 100.0]);
        controller.pointer_move(&store, &area, &data, px, py);

        let hover = store.snapshot().hover_state.unwrap();
        assert!(hover.data.series_id.is_none());
        assert!(hover.data.event.is_none());
        assert!((hover.x - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_hover_without_data_publishes_nothing() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let controller = HoverController::new("chart-1");

        controller.pointer_move(&store, &area, &[], 300.0, 200.0);
        assert!(store.snapshot().hover_state.is_none());
    }

    #[test]
    fn test_pointer_leave_clears_hover() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series("a", &[(0.0, 0.0)])];
        let controller = HoverController::new("chart-1");

        let (px, py) = area.domain_to_pixel(0.0, 0.0, [0.0, 1.0], [0.0, 1.0]);
        controller.pointer_move(&store, &area, &data, px, py);
        assert!(store.snapshot().hover_state.is_some());

        controller.pointer_leave(&store);
        assert!(store.snapshot().hover_state.is_none());
    }
}
