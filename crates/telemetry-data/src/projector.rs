//! Projection from buffered events to chart-ready series
//!
//! Resolves the chart's axis mappings against each event and emits one or
//! more `Series`. Events whose mapped fields are missing or non-numeric are
//! dropped silently; a field miss is routine, not an error.

use std::sync::Arc;

use serde_json::Value;
use telemetry_shared::{ChartSpec, DataPoint, Event, Mappings, Series};

use crate::buffer::FilterCriteria;
use crate::window::apply_window;

/// Project a snapshot of events into the series a chart displays.
///
/// The retention window is applied first, then one of three fan-out modes:
/// explicit per-series blocks, multi-run fan-out, or the default single
/// series.
pub fn project_series(events: &[Arc<Event>], spec: &ChartSpec) -> Vec<Series> {
    let windowed = apply_window(events, &spec.data_source.window());

    if let Some(series_specs) = &spec.series {
        if !series_specs.is_empty() {
            return series_specs
                .iter()
                .map(|s| {
                    let mappings = s
                        .mappings
                        .as_ref()
                        .or(spec.mappings.as_ref())
                        .cloned()
                        .unwrap_or_default();
                    let criteria = match &s.data_source {
                        Some(source) => FilterCriteria::from_data_source(source),
                        None => FilterCriteria::from_filters(
                            None,
                            spec.data_source.filters.as_ref(),
                        ),
                    };
                    let selected: Vec<Arc<Event>> = windowed
                        .iter()
                        .filter(|e| criteria.matches(e))
                        .cloned()
                        .collect();
                    Series {
                        id: s.id.clone(),
                        points: collect_points(&selected, &mappings),
                    }
                })
                .collect();
        }
    }

    let mappings = spec.mappings.clone().unwrap_or_default();
    let run_ids = spec.data_source.resolved_run_ids();

    if run_ids.len() > 1 {
        // One series per run, id suffixed with the run id.
        return run_ids
            .iter()
            .map(|run_id| {
                let selected: Vec<Arc<Event>> = windowed
                    .iter()
                    .filter(|e| e.run_id == *run_id)
                    .cloned()
                    .collect();
                Series {
                    id: format!("{}-{}", spec.chart_id, run_id),
                    points: collect_points(&selected, &mappings),
                }
            })
            .collect();
    }

    let id = match run_ids.first() {
        Some(run_id) => format!("{}-{}", spec.chart_id, run_id),
        None => spec.chart_id.clone(),
    };
    vec![Series {
        id,
        points: collect_points(&windowed, &mappings),
    }]
}

fn collect_points(events: &[Arc<Event>], mappings: &Mappings) -> Vec<DataPoint> {
    let x_field = mappings.x.as_ref().map(|m| m.field.as_str());
    let y_field = mappings.y.as_ref().map(|m| m.field.as_str());

    events
        .iter()
        .filter_map(|event| {
            let x = resolve_field(event, x_field?)?;
            let y = resolve_field(event, y_field?)?;
            Some(DataPoint {
                x,
                y,
                frame_index: event.frame_index,
                sim_time: event.sim_time,
                event: Arc::clone(event),
            })
        })
        .collect()
}

/// Resolve a mapping field against one event: the reserved identifiers
/// `frameIndex` and `simTime`, or a `payload.`-prefixed dotted path.
pub fn resolve_field(event: &Event, field: &str) -> Option<f64> {
    match field {
        "frameIndex" => Some(event.frame_index as f64),
        "simTime" => Some(event.sim_time),
        _ => {
            let path = field.strip_prefix("payload.")?;
            payload_value(&event.payload, path)
        }
    }
}

fn payload_value(payload: &Value, path: &str) -> Option<f64> {
    let mut current = payload;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    current.as_f64()
}
