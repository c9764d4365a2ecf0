//! Shared types for the live telemetry dashboard core
//!
//! This crate contains the types shared between the data layer and the
//! interaction layer: the wire event model, declarative chart and layout
//! documents, projected series, the shared interaction state record, and
//! the common error taxonomy.

pub mod chart_spec;
pub mod errors;
pub mod event;
pub mod series;
pub mod shared_state;

pub use chart_spec::{
    AxisConfig, AxisMapping, ChartKind, ChartRef, ChartSpec, ColorMapping, DataSourceKind,
    DataSourceSpec, EventFilters, Layout, LegendConfig, Mappings, MarkKind, ScaleKind, SeriesSpec,
    ShapeMapping, SizeMapping, VisualSpec, WindowSpec,
};
pub use errors::{Result, TelemetryError};
pub use event::{validate_event, Event};
pub use series::{DataPoint, Series};
pub use shared_state::{
    HoverData, HoverState, InteractionState, LiveModeState, PanState, RunRef, SelectedRunState,
    SharedState, SharedStateDefaults, StateChange, StateField, TimeAxis, TimeCursorState,
    ZoomState,
};
