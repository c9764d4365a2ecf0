//! Plot geometry: margins, pixel/domain transforms, data extents
//!
//! Pure math shared by the hover, time cursor, and zoom/pan controllers.
//! Degenerate extents (a single value, or no data) collapse to safe
//! defaults instead of dividing by zero.

use std::sync::Arc;

use telemetry_shared::{Event, Series, TimeAxis};

/// Plot margins in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 60.0,
            right: 20.0,
            top: 20.0,
            bottom: 40.0,
        }
    }
}

/// A chart's pixel footprint: outer size plus margins around the inner
/// plotting rectangle. Pixel y grows downward; domain y grows upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl PlotArea {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margins: Margins::default(),
        }
    }

    pub fn inner_width(&self) -> f64 {
        (self.width - self.margins.left - self.margins.right).max(0.0)
    }

    pub fn inner_height(&self) -> f64 {
        (self.height - self.margins.top - self.margins.bottom).max(0.0)
    }

    /// Whether a pixel position falls inside the inner plotting rectangle.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.margins.left
            && px <= self.width - self.margins.right
            && py >= self.margins.top
            && py <= self.height - self.margins.bottom
    }

    /// Domain x/y for a pixel position, given the visible domain ranges.
    pub fn pixel_to_domain(&self, px: f64, py: f64, x: [f64; 2], y: [f64; 2]) -> (f64, f64) {
        let fx = self.x_fraction(px);
        let fy = self.y_fraction(py);
        (x[0] + fx * (x[1] - x[0]), y[0] + fy * (y[1] - y[0]))
    }

    /// Pixel position for a domain point, given the visible domain ranges.
    /// A degenerate range maps everything to the range start.
    pub fn domain_to_pixel(&self, dx: f64, dy: f64, x: [f64; 2], y: [f64; 2]) -> (f64, f64) {
        let fx = fraction(dx, x);
        let fy = fraction(dy, y);
        (
            self.margins.left + fx * self.inner_width(),
            self.margins.top + (1.0 - fy) * self.inner_height(),
        )
    }

    /// Horizontal fraction of the inner rectangle at a pixel x, unclamped.
    pub fn x_fraction(&self, px: f64) -> f64 {
        let inner = self.inner_width();
        if inner <= 0.0 {
            return 0.0;
        }
        (px - self.margins.left) / inner
    }

    /// Vertical fraction measured upward from the bottom edge, unclamped.
    pub fn y_fraction(&self, py: f64) -> f64 {
        let inner = self.inner_height();
        if inner <= 0.0 {
            return 0.0;
        }
        (self.height - self.margins.bottom - py) / inner
    }

    /// `x_fraction` clamped to `[0, 1]`, for gestures that may leave the
    /// plot mid-drag.
    pub fn x_fraction_clamped(&self, px: f64) -> f64 {
        self.x_fraction(px).clamp(0.0, 1.0)
    }
}

fn fraction(value: f64, range: [f64; 2]) -> f64 {
    let span = range[1] - range[0];
    if span == 0.0 {
        return 0.0;
    }
    (value - range[0]) / span
}

/// Min/max extents of projected data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Joint x/y extents across every point of every series, or `None` when no
/// series has points.
pub fn data_bounds(series: &[Series]) -> Option<DataBounds> {
    let mut bounds: Option<DataBounds> = None;
    for s in series {
        for p in &s.points {
            bounds = Some(match bounds {
                None => DataBounds {
                    x_min: p.x,
                    x_max: p.x,
                    y_min: p.y,
                    y_max: p.y,
                },
                Some(b) => DataBounds {
                    x_min: b.x_min.min(p.x),
                    x_max: b.x_max.max(p.x),
                    y_min: b.y_min.min(p.y),
                    y_max: b.y_max.max(p.y),
                },
            });
        }
    }
    bounds
}

/// Value of an event along a cursor axis.
pub fn axis_value(event: &Event, axis: TimeAxis) -> f64 {
    match axis {
        TimeAxis::FrameIndex => event.frame_index as f64,
        TimeAxis::SimTime => event.sim_time,
    }
}

/// Min/max of the cursor axis across every point of every series.
pub fn axis_bounds(series: &[Series], axis: TimeAxis) -> Option<[f64; 2]> {
    let mut bounds: Option<[f64; 2]> = None;
    for s in series {
        for p in &s.points {
            let v = match axis {
                TimeAxis::FrameIndex => p.frame_index as f64,
                TimeAxis::SimTime => p.sim_time,
            };
            bounds = Some(match bounds {
                None => [v, v],
                Some([lo, hi]) => [lo.min(v), hi.max(v)],
            });
        }
    }
    bounds
}

/// The event with the largest cursor-axis value, optionally restricted to
/// one run.
pub fn latest_event(
    events: &[Arc<Event>],
    axis: TimeAxis,
    run_id: Option<&str>,
) -> Option<Arc<Event>> {
    events
        .iter()
        .filter(|e| run_id.map_or(true, |id| e.run_id == id))
        .max_by(|a, b| axis_value(a, axis).total_cmp(&axis_value(b, axis)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use telemetry_shared::DataPoint;

    fn series(points: &[(f64, f64)]) -> Series {
        let event = Arc::new(Event {
            v: 1,
            run_id: "run-1".to_string(),
            source_id: "sim".to_string(),
            channel: "physics".to_string(),
            event_type: "tick".to_string(),
            frame_index: 0,
            sim_time: 0.0,
            wall_time_ms: None,
            tags: None,
            payload: serde_json::Value::Null,
        });
        Series {
            id: "s".to_string(),
            points: points
                .iter()
                .map(|&(x, y)| DataPoint {
                    x,
                    y,
                    frame_index: x as u64,
                    sim_time: x,
                    event: Arc::clone(&event),
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_margins() {
        let m = Margins::default();
        assert_eq!((m.left, m.right, m.top, m.bottom), (60.0, 20.0, 20.0, 40.0));
    }

    #[test]
    fn test_pixel_domain_round_trip() {
        let area = PlotArea::new(660.0, 460.0);
        assert_eq!(area.inner_width(), 580.0);
        assert_eq!(area.inner_height(), 400.0);

        let (px, py) = area.domain_to_pixel(5.0, 50.0, [0.0, 10.0], [0.0, 100.0]);
        assert_eq!(px, 60.0 + 290.0);
        assert_eq!(py, 20.0 + 200.0);

        let (dx, dy) = area.pixel_to_domain(px, py, [0.0, 10.0], [0.0, 100.0]);
        assert!((dx - 5.0).abs() < 1e-9);
        assert!((dy - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_domain_does_not_divide_by_zero() {
        let area = PlotArea::new(660.0, 460.0);
        let (px, _) = area.domain_to_pixel(3.0, 0.0, [3.0, 3.0], [0.0, 1.0]);
        assert_eq!(px, area.margins.left);

        let tiny = PlotArea::new(50.0, 30.0);
        assert_eq!(tiny.inner_width(), 0.0);
        assert_eq!(tiny.x_fraction(10.0), 0.0);
    }

    #[test]
    fn test_contains_respects_margins() {
        let area = PlotArea::new(660.0, 460.0);
        assert!(area.contains(300.0, 200.0));
        assert!(!area.contains(30.0, 200.0));
        assert!(!area.contains(300.0, 450.0));
    }

    #[test]
    fn test_data_bounds_across_series() {
        let all = [series(&[(0.0, 5.0), (10.0, -1.0)]), series(&[(-2.0, 8.0)])];
        let b = data_bounds(&all).unwrap();
        assert_eq!((b.x_min, b.x_max), (-2.0, 10.0));
        assert_eq!((b.y_min, b.y_max), (-1.0, 8.0));

        assert!(data_bounds(&[series(&[])]).is_none());
    }

    #[test]
    fn test_axis_bounds() {
        let all = [series(&[(2.0, 0.0), (7.0, 0.0)])];
        assert_eq!(axis_bounds(&all, TimeAxis::FrameIndex), Some([2.0, 7.0]));
        assert_eq!(axis_bounds(&all, TimeAxis::SimTime), Some([2.0, 7.0]));
        assert_eq!(axis_bounds(&[], TimeAxis::SimTime), None);
    }
}
