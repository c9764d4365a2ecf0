//! Shared interaction state engine for the live telemetry dashboard
//!
//! A single store holds the cross-chart interaction record (time cursor,
//! run selection, zoom/pan, live playback, hover) with per-field
//! subscriptions. Controller types translate pointer and wheel gestures
//! into store mutations; the live mode driver advances the time cursor on
//! a fixed tick while playback is on.

pub mod hover;
pub mod live_mode;
pub mod scale;
pub mod store;
pub mod sync;
pub mod time_cursor;
pub mod zoom_pan;

pub use hover::HoverController;
pub use live_mode::{latest_axis_value, LiveModeConfig, LiveModeDriver};
pub use scale::{axis_bounds, data_bounds, DataBounds, Margins, PlotArea};
pub use store::{SharedStateStore, SubscriptionId};
pub use sync::{resolve_chart_sync, ChartSyncInfo, SYNC_ALL_CHARTS};
pub use time_cursor::TimeCursorController;
pub use zoom_pan::{PointerButton, ZoomPanController};
