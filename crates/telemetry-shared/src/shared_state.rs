//! Shared interaction state record
//!
//! A single versioned record visible to every chart: time cursor, run
//! selection, zoom/pan, live playback, and hover. Mutation goes through the
//! state engine in `telemetry-interaction`; these are the plain data shapes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Axis the time cursor travels along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeAxis {
    #[serde(rename = "frameIndex")]
    FrameIndex,
    #[serde(rename = "simTime")]
    SimTime,
}

/// Cross-chart time cursor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeCursorState {
    pub axis: TimeAxis,
    pub value: Option<f64>,
    #[serde(default)]
    pub sync_across: Vec<String>,
}

impl Default for TimeCursorState {
    fn default() -> Self {
        Self {
            axis: TimeAxis::FrameIndex,
            value: None,
            sync_across: Vec::new(),
        }
    }
}

/// Currently selected run (single-run fast path)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedRunState {
    pub run_id: Option<String>,
    pub source: Option<String>,
}

/// Reference to a run in multi-run selections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRef {
    pub run_id: String,
    #[serde(default)]
    pub source: Option<String>,
}

/// Zoomed domain per axis; `None` means the full data extent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    pub x: Option<[f64; 2]>,
    pub y: Option<[f64; 2]>,
}

/// Pending pan offset in domain units
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanState {
    pub x: f64,
    pub y: f64,
}

/// Zoom/pan interaction state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionState {
    pub zoom: Option<ZoomState>,
    pub pan: Option<PanState>,
}

/// Live playback state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveModeState {
    pub is_playing: bool,
    pub playback_speed: f64,
}

impl Default for LiveModeState {
    fn default() -> Self {
        Self {
            is_playing: false,
            playback_speed: 1.0,
        }
    }
}

/// Auxiliary hover context for tooltip rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverData {
    pub series_id: Option<String>,
    pub event: Option<Arc<Event>>,
    /// Raw pointer position in pixels, for tooltip placement
    pub pointer_x: f64,
    pub pointer_y: f64,
}

/// Hover state; either absent or fully populated, never partial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverState {
    pub chart_id: String,
    pub x: f64,
    pub y: f64,
    pub data: HoverData,
}

/// The full shared record. Exactly one `time_cursor` and `selected_run`
/// exist at all times.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    pub time_cursor: TimeCursorState,
    pub selected_run: SelectedRunState,
    #[serde(default)]
    pub selected_runs: Vec<RunRef>,
    #[serde(default)]
    pub interaction_state: InteractionState,
    #[serde(default)]
    pub live_mode: LiveModeState,
    #[serde(default)]
    pub hover_state: Option<HoverState>,
}

/// Shared-state defaults declared by a layout document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedStateDefaults {
    #[serde(default)]
    pub time_cursor: Option<TimeCursorState>,
    #[serde(default)]
    pub selected_run: Option<SelectedRunState>,
}

impl SharedState {
    /// Initial state seeded from a layout's declared defaults.
    pub fn seeded(defaults: Option<&SharedStateDefaults>) -> Self {
        let mut state = SharedState::default();
        if let Some(defaults) = defaults {
            if let Some(cursor) = &defaults.time_cursor {
                state.time_cursor = cursor.clone();
            }
            if let Some(run) = &defaults.selected_run {
                state.selected_run = run.clone();
            }
        }
        state
    }
}

/// Identifier of a top-level shared-state field, used to key subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateField {
    TimeCursor,
    SelectedRun,
    SelectedRuns,
    InteractionState,
    LiveMode,
    HoverState,
}

/// A committed mutation, carrying the new value of the changed field
#[derive(Debug, Clone, PartialEq)]
pub enum StateChange {
    TimeCursor(TimeCursorState),
    SelectedRun(SelectedRunState),
    SelectedRuns(Vec<RunRef>),
    InteractionState(InteractionState),
    LiveMode(LiveModeState),
    HoverState(Option<HoverState>),
}

impl StateChange {
    /// The field this change belongs to.
    pub fn field(&self) -> StateField {
        match self {
            StateChange::TimeCursor(_) => StateField::TimeCursor,
            StateChange::SelectedRun(_) => StateField::SelectedRun,
            StateChange::SelectedRuns(_) => StateField::SelectedRuns,
            StateChange::InteractionState(_) => StateField::InteractionState,
            StateChange::LiveMode(_) => StateField::LiveMode,
            StateChange::HoverState(_) => StateField::HoverState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_axis_wire_names() {
        assert_eq!(
            serde_json::to_value(TimeAxis::FrameIndex).unwrap(),
            json!("frameIndex")
        );
        assert_eq!(
            serde_json::to_value(TimeAxis::SimTime).unwrap(),
            json!("simTime")
        );
    }

    #[test]
    fn test_seeded_from_layout_defaults() {
        let defaults: SharedStateDefaults = serde_json::from_value(json!({
            "time_cursor": {"axis": "simTime", "value": null, "sync_across": ["main_panel.charts"]},
            "selected_run": {"run_id": "run-7", "source": "sim"}
        }))
        .unwrap();

        let state = SharedState::seeded(Some(&defaults));
        assert_eq!(state.time_cursor.axis, TimeAxis::SimTime);
        assert_eq!(state.time_cursor.sync_across, vec!["main_panel.charts"]);
        assert_eq!(state.selected_run.run_id.as_deref(), Some("run-7"));
        assert!(!state.live_mode.is_playing);
        assert!(state.hover_state.is_none());
    }

    #[test]
    fn test_seeded_without_defaults() {
        let state = SharedState::seeded(None);
        assert_eq!(state.time_cursor.axis, TimeAxis::FrameIndex);
        assert_eq!(state.time_cursor.value, None);
        assert_eq!(state.selected_run, SelectedRunState::default());
    }

    #[test]
    fn test_state_change_field_mapping() {
        let change = StateChange::TimeCursor(TimeCursorState::default());
        assert_eq!(change.field(), StateField::TimeCursor);
        let change = StateChange::HoverState(None);
        assert_eq!(change.field(), StateField::HoverState);
    }
}
