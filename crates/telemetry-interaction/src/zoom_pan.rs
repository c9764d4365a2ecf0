//! Zoom and pan gesture controller
//!
//! Wheel zoom scales the visible domain around the pointer; drag pan
//! shifts it. Both are clamped to the data extent so the view can never
//! wander into empty space, and a zoomed-out span snaps back to the full
//! extent (`zoom: None` per axis means "show everything").

use telemetry_shared::{InteractionState, Series, ZoomState};

use crate::scale::{data_bounds, PlotArea};
use crate::store::SharedStateStore;

const ZOOM_IN_FACTOR: f64 = 1.1;
const ZOOM_OUT_FACTOR: f64 = 0.9;
const ZOOM_SPEED: f64 = 0.1;

/// Pointer button in a pan gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy)]
struct PanStart {
    px: f64,
    py: f64,
    x: [f64; 2],
    y: [f64; 2],
}

/// Per-chart zoom/pan gesture controller
#[derive(Debug, Default)]
pub struct ZoomPanController {
    pan: Option<PanStart>,
}

impl ZoomPanController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Handle a wheel event at pixel position (`px`, `py`). `delta_y < 0`
    /// zooms in. Ignored outside the plotting rectangle or without data.
    pub fn wheel(
        &self,
        store: &SharedStateStore,
        area: &PlotArea,
        series: &[Series],
        px: f64,
        py: f64,
        delta_y: f64,
    ) {
        if !area.contains(px, py) {
            return;
        }
        let Some(bounds) = data_bounds(series) else {
            return;
        };

        let factor = if delta_y < 0.0 {
            ZOOM_IN_FACTOR
        } else {
            ZOOM_OUT_FACTOR
        };
        // Soften each wheel notch so zooming stays controllable.
        let effective = 1.0 + (factor - 1.0) * ZOOM_SPEED;

        let (x_range, y_range) = visible_ranges(store);

        let fx = area.x_fraction(px).clamp(0.0, 1.0);
        let fy = area.y_fraction(py).clamp(0.0, 1.0);

        let new_x = zoom_axis(x_range, fx, effective, [bounds.x_min, bounds.x_max]);
        let new_y = zoom_axis(y_range, fy, effective, [bounds.y_min, bounds.y_max]);

        store.update_interaction_state(|interaction| {
            // Zooming supersedes any pending pan offset.
            *interaction = InteractionState {
                zoom: Some(ZoomState { x: new_x, y: new_y }),
                pan: None,
            };
        });
    }

    /// Begin a pan. The primary button without a modifier is reserved for
    /// cursor scrubbing, so it never starts a pan. Returns whether the
    /// gesture was accepted.
    pub fn pan_press(
        &mut self,
        store: &SharedStateStore,
        area: &PlotArea,
        series: &[Series],
        button: PointerButton,
        modifier: bool,
        px: f64,
        py: f64,
    ) -> bool {
        if button == PointerButton::Primary && !modifier {
            return false;
        }
        if !area.contains(px, py) {
            return false;
        }
        let Some(bounds) = data_bounds(series) else {
            return false;
        };
        let (x, y) = visible_ranges(store);
        self.pan = Some(PanStart {
            px,
            py,
            x: x.unwrap_or([bounds.x_min, bounds.x_max]),
            y: y.unwrap_or([bounds.y_min, bounds.y_max]),
        });
        true
    }

    /// Continue a pan: translate the ranges captured at press by the
    /// pointer delta in domain units, clamped to the data extent.
    pub fn pan_move(
        &self,
        store: &SharedStateStore,
        area: &PlotArea,
        series: &[Series],
        px: f64,
        py: f64,
    ) {
        let Some(start) = self.pan else {
            return;
        };
        let Some(bounds) = data_bounds(series) else {
            return;
        };
        let inner_w = area.inner_width();
        let inner_h = area.inner_height();
        if inner_w <= 0.0 || inner_h <= 0.0 {
            return;
        }

        // Dragging right moves the view left; pixel y is inverted.
        let dx = -(px - start.px) / inner_w * (start.x[1] - start.x[0]);
        let dy = (py - start.py) / inner_h * (start.y[1] - start.y[0]);

        let new_x = shift_axis(start.x, dx, [bounds.x_min, bounds.x_max]);
        let new_y = shift_axis(start.y, dy, [bounds.y_min, bounds.y_max]);

        store.update_interaction_state(|interaction| {
            let pan = interaction.pan;
            *interaction = InteractionState {
                zoom: Some(ZoomState {
                    x: Some(new_x),
                    y: Some(new_y),
                }),
                pan,
            };
        });
    }

    pub fn pan_release(&mut self) {
        self.pan = None;
    }

    /// Reset to the full data extent.
    pub fn reset(&mut self, store: &SharedStateStore) {
        self.pan = None;
        store.set_interaction_state(InteractionState::default());
    }
}

/// Current visible ranges: the zoomed ranges when set, else `None` meaning
/// the full extent.
fn visible_ranges(store: &SharedStateStore) -> (Option<[f64; 2]>, Option<[f64; 2]>) {
    let zoom = store.snapshot().interaction_state.zoom.unwrap_or_default();
    (zoom.x, zoom.y)
}

/// Scale one axis range around an anchor fraction, then clamp to the data
/// extent. Returns `None` when the scaled span covers the whole extent.
fn zoom_axis(
    current: Option<[f64; 2]>,
    anchor_fraction: f64,
    effective: f64,
    extent: [f64; 2],
) -> Option<[f64; 2]> {
    let [lo, hi] = current.unwrap_or(extent);
    let span = hi - lo;
    let new_span = span / effective;

    let data_span = extent[1] - extent[0];
    if new_span >= data_span {
        return None;
    }

    let anchor = lo + anchor_fraction * span;
    let new_lo = anchor - anchor_fraction * new_span;
    Some(clamp_span(new_lo, new_span, extent))
}

/// Translate one axis range, clamped to the data extent.
fn shift_axis(range: [f64; 2], delta: f64, extent: [f64; 2]) -> [f64; 2] {
    let span = range[1] - range[0];
    clamp_span(range[0] + delta, span, extent)
}

/// Place a span of the given width inside the extent. A span at least as
/// wide as the extent collapses to the extent itself.
fn clamp_span(start: f64, span: f64, extent: [f64; 2]) -> [f64; 2] {
    let data_span = extent[1] - extent[0];
    if span >= data_span {
        return extent;
    }
    let lo = start.clamp(extent[0], extent[1] - span);
    [lo, lo + span]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use telemetry_shared::{DataPoint, Event};

    fn series(points: &[(f64, f64)]) -> Series {
        Series {
            id: "s".to_string(),
            points: points
                .iter()
                .map(|&(x, y)| DataPoint {
                    x,
                    y,
                    frame_index: x as u64,
                    sim_time: x,
                    event: Arc::new(Event {
                        v: 1,
                        run_id: "run-1".to_string(),
                        source_id: "sim".to_string(),
                        channel: "physics".to_string(),
                        event_type: "tick".to_string(),
                        frame_index: x as u64,
                        sim_time: x,
                        wall_time_ms: None,
                        tags: None,
                        payload: serde_json::Value::Null,
                    }),
                })
                .collect(),
        }
    }

    #[test]
    fn test_wheel_zoom_in_narrows_around_pointer() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[(0.0, 0.0), (100.0, 100.0)])];
        let controller = ZoomPanController::new();

        // Zoom in at the plot center.
        controller.wheel(&store, &area, &data, 60.0 + 290.0, 20.0 + 200.0, -1.0);

        let zoom = store.snapshot().interaction_state.zoom.unwrap();
        let [lo, hi] = zoom.x.unwrap();
        let span = hi - lo;
        let expected = 100.0 / (1.0 + (ZOOM_IN_FACTOR - 1.0) * ZOOM_SPEED);
        assert!((span - expected).abs() < 1e-9);
        // Anchored at the center, the midpoint stays put.
        assert!(((lo + hi) / 2.0 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_wheel_zoom_out_past_extent_resets_axis() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[(0.0, 0.0), (100.0, 100.0)])];
        let controller = ZoomPanController::new();

        // From the full extent, zooming out snaps back to None.
        controller.wheel(&store, &area, &data, 300.0, 200.0, 1.0);
        let zoom = store.snapshot().interaction_state.zoom.unwrap();
        assert_eq!(zoom.x, None);
        assert_eq!(zoom.y, None);
    }

    #[test]
    fn test_wheel_outside_plot_is_ignored() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[(0.0, 0.0), (100.0, 100.0)])];
        let controller = ZoomPanController::new();

        controller.wheel(&store, &area, &data, 10.0, 200.0, -1.0);
        assert_eq!(store.snapshot().interaction_state.zoom, None);
    }

    #[test]
    fn test_primary_drag_without_modifier_never_pans() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[(0.0, 0.0), (100.0, 100.0)])];
        let mut controller = ZoomPanController::new();

        let accepted = controller.pan_press(
            &store,
            &area,
            &data,
            PointerButton::Primary,
            false,
            300.0,
            200.0,
        );
        assert!(!accepted);
        assert!(!controller.is_panning());
    }

    #[test]
    fn test_pan_shifts_and_clamps_to_extent() {
        let store = SharedStateStore::new();
        let area = PlotArea::new(660.0, 460.0);
        let data = [series(&[(0.0, 0.0), (100.0, 100.0)])];
        let mut controller = ZoomPanController::new();

        // Zoom into the left half first.
        store.set_interaction_state(InteractionState {
            zoom: Some(ZoomState {
                x: Some([0.0, 50.0]),
                y: Some([0.0, 50.0]),
            }),
            pan: None,
        });

        assert!(controller.pan_press(
            &store,
            &area,
            &data,
            PointerButton::Middle,
            false,
            300.0,
            200.0,
        ));

        // Drag left by half the inner width: the view moves right by half
        // its 50-unit span.
        controller.pan_move(&store, &area, &data, 300.0 - 290.0, 200.0);
        let zoom = store.snapshot().interaction_state.zoom.unwrap();
        assert_eq!(zoom.x, Some([25.0, 75.0]));

        // A huge drag clamps at the data edge instead of overshooting.
        controller.pan_move(&store, &area, &data, 300.0 - 29_000.0, 200.0);
        let zoom = store.snapshot().interaction_state.zoom.unwrap();
        assert_eq!(zoom.x, Some([50.0, 100.0]));

        controller.pan_release();
        assert!(!controller.is_panning());
    }

    #[test]
    fn test_reset_restores_full_extent() {
        let store = SharedStateStore::new();
        let mut controller = ZoomPanController::new();
        store.set_interaction_state(InteractionState {
            zoom: Some(ZoomState {
                x: Some([10.0, 20.0]),
                y: None,
            }),
            pan: Some(Default::default()),
        });

        controller.reset(&store);
        assert_eq!(
            store.snapshot().interaction_state,
            InteractionState::default()
        );
    }
}
