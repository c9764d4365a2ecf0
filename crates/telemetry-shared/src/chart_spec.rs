//! Declarative chart and layout documents
//!
//! These types mirror the externally validated JSON contracts. Schema
//! validation happens upstream; the core consumes post-validation typed
//! documents and never re-validates them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::shared_state::SharedStateDefaults;

fn default_frame_window() -> usize {
    1000
}

fn default_time_window() -> f64 {
    10.0
}

/// Retention policy bounding how much history is kept or considered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WindowSpec {
    /// No limit
    All,
    /// Retain the N highest-frameIndex events
    Frames {
        #[serde(default = "default_frame_window")]
        size: usize,
    },
    /// Retain events within the trailing duration of simulation time
    Time {
        #[serde(default = "default_time_window")]
        duration: f64,
    },
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec::All
    }
}

/// Chart kinds visible at the boundary. The rendering layer implements a
/// subset; the core produces correct series for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    TimeSeries,
    MultiAxisTimeSeries,
    EventTimeline,
    Scatter,
    Histogram,
    RunOverview,
    RunComparison,
}

/// Where a chart's events come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    EventStream,
    Aggregated,
    Derived,
    Historical,
    Hybrid,
}

/// Conjunctive event filters declared on a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilters {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub types: Option<Vec<String>>,
    #[serde(default)]
    pub type_prefix: Option<String>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    /// Source id for historical extraction
    #[serde(default, rename = "sourceId")]
    pub source_id: Option<String>,
    /// Dotted payload path for historical extraction
    #[serde(default, rename = "jsonPath")]
    pub json_path: Option<String>,
}

/// Data source descriptor of a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceSpec {
    #[serde(rename = "type")]
    pub kind: DataSourceKind,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub run_ids: Option<Vec<String>>,
    #[serde(default)]
    pub filters: Option<EventFilters>,
    #[serde(default)]
    pub window: Option<WindowSpec>,
}

impl DataSourceSpec {
    /// All run ids this source names: `run_ids` when non-empty, else the
    /// single `run_id`, else nothing.
    pub fn resolved_run_ids(&self) -> Vec<String> {
        match &self.run_ids {
            Some(ids) if !ids.is_empty() => ids.clone(),
            _ => self.run_id.iter().cloned().collect(),
        }
    }

    /// Effective window, defaulting to unbounded.
    pub fn window(&self) -> WindowSpec {
        self.window.clone().unwrap_or_default()
    }
}

/// Scale kind attached to an axis mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Linear,
    Log,
    Ordinal,
}

/// Mapping from an event field to a plotting axis.
///
/// `field` names a reserved identifier (`frameIndex`, `simTime`) or a
/// `payload.`-prefixed dotted path into the payload tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMapping {
    pub field: String,
    #[serde(default)]
    pub scale: Option<ScaleKind>,
    #[serde(default)]
    pub domain: Option<[Option<f64>; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMapping {
    pub field: String,
    #[serde(default)]
    pub scale: Option<ScaleKind>,
    #[serde(default)]
    pub palette: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeMapping {
    pub field: String,
    #[serde(default)]
    pub range: Option<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMapping {
    pub field: String,
    #[serde(default)]
    pub mapping: Option<HashMap<String, String>>,
}

/// Field mappings for the plotting axes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mappings {
    #[serde(default)]
    pub x: Option<AxisMapping>,
    #[serde(default)]
    pub y: Option<AxisMapping>,
    #[serde(default)]
    pub y2: Option<AxisMapping>,
    #[serde(default)]
    pub color: Option<ColorMapping>,
    #[serde(default)]
    pub size: Option<SizeMapping>,
    #[serde(default)]
    pub shape: Option<ShapeMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Line,
    Area,
    Point,
    Bar,
}

/// Visual style parameters, consumed by the external rendering layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualSpec {
    #[serde(default)]
    pub mark: Option<MarkKind>,
    #[serde(default)]
    pub stroke: Option<String>,
    #[serde(default)]
    pub fill: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default, rename = "strokeWidth")]
    pub stroke_width: Option<f64>,
    #[serde(default)]
    pub interpolation: Option<String>,
}

/// Explicit per-series override block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub id: String,
    #[serde(default)]
    pub data_source: Option<DataSourceSpec>,
    #[serde(default)]
    pub mappings: Option<Mappings>,
    #[serde(default)]
    pub visual: Option<VisualSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub grid: Option<bool>,
    /// `"auto"` or a tick count
    #[serde(default)]
    pub ticks: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxesConfig {
    #[serde(default)]
    pub x: Option<AxisConfig>,
    #[serde(default)]
    pub y: Option<AxisConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendConfig {
    #[serde(default)]
    pub show: Option<bool>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Versioned declarative chart descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart_id: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub data_source: DataSourceSpec,
    #[serde(default)]
    pub mappings: Option<Mappings>,
    #[serde(default)]
    pub visual: Option<VisualSpec>,
    #[serde(default)]
    pub series: Option<Vec<SeriesSpec>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub axes: Option<AxesConfig>,
    #[serde(default)]
    pub legend: Option<LegendConfig>,
}

/// Reference from a layout grid cell to a chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRef {
    pub chart_id: String,
    pub span: [u32; 2],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub columns: u32,
    #[serde(default)]
    pub rows: Option<serde_json::Value>,
    #[serde(default)]
    pub gap: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainPanelRegion {
    pub layout: String,
    pub grid_config: GridConfig,
    pub charts: Vec<ChartRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Regions {
    #[serde(default)]
    pub main_panel: Option<MainPanelRegion>,
}

/// Top-level layout document. Region contents other than the chart roster
/// are presentation concerns handled outside the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub version: String,
    pub layout_id: String,
    #[serde(default)]
    pub regions: Regions,
    #[serde(default)]
    pub shared_state: Option<SharedStateDefaults>,
}

impl Layout {
    /// Chart-id roster of the main panel, used for sync-group resolution.
    pub fn chart_ids(&self) -> Vec<String> {
        self.regions
            .main_panel
            .as_ref()
            .map(|p| p.charts.iter().map(|c| c.chart_id.clone()).collect())
            .unwrap_or_default()
    }
}
