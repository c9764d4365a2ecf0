//! Unified data layer: live stream plus historical queries behind one API
//!
//! Owns the live buffer, wires stream messages through validation into it,
//! fetches and caches historical extractions, and answers chart queries by
//! merging whichever sides the chart's data source kind calls for.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use telemetry_shared::{
    validate_event, ChartSpec, DataSourceKind, Event, Series, TelemetryError,
};

use crate::analysis::{series_to_events, AnalysisClient, AnalysisClientConfig, SeriesQuery};
use crate::buffer::{BufferStats, FilterCriteria, LiveBuffer};
use crate::projector::project_series;
use crate::stream::{
    ConnectionState, StreamCallbacks, StreamClient, StreamClientConfig, SubscriptionRequest,
};
use crate::window::eviction_threshold;

/// Data layer configuration
#[derive(Debug, Clone, Default)]
pub struct DataLayerConfig {
    pub stream: StreamClientConfig,
    pub analysis: AnalysisClientConfig,
}

type StateCallback = dyn Fn(ConnectionState) + Send + Sync;
type ErrorCallback = dyn Fn(TelemetryError) + Send + Sync;

/// Callbacks surfaced to the embedding application
#[derive(Default)]
pub struct DataLayerCallbacks {
    pub on_state_change: Option<Box<StateCallback>>,
    pub on_error: Option<Box<ErrorCallback>>,
}

/// Cache key for one historical extraction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct HistoricalKey {
    run_id: String,
    event_type: String,
    source_id: String,
    json_path: String,
}

/// The unified data layer
pub struct DataLayer {
    buffer: Arc<RwLock<LiveBuffer>>,
    stream: StreamClient,
    analysis: AnalysisClient,
    historical_cache: Mutex<HashMap<HistoricalKey, Vec<Arc<Event>>>>,
    on_error: Arc<dyn Fn(TelemetryError) + Send + Sync>,
}

impl DataLayer {
    pub fn new(config: DataLayerConfig, callbacks: DataLayerCallbacks) -> Self {
        let buffer = Arc::new(RwLock::new(LiveBuffer::new()));

        let on_error: Arc<dyn Fn(TelemetryError) + Send + Sync> = match callbacks.on_error {
            Some(cb) => Arc::from(cb),
            None => Arc::new(|err| log::error!("data layer error: {err}")),
        };

        let ingest_buffer = Arc::clone(&buffer);
        let ingest_errors = Arc::clone(&on_error);
        let stream_callbacks = StreamCallbacks {
            on_event: Some(Box::new(move |raw: Value| {
                ingest_raw(&ingest_buffer, &ingest_errors, raw);
            })),
            on_state_change: callbacks.on_state_change,
            on_error: {
                let errors = Arc::clone(&on_error);
                Some(Box::new(move |err| errors(err)))
            },
        };

        Self {
            buffer,
            stream: StreamClient::new(config.stream, stream_callbacks),
            analysis: AnalysisClient::new(config.analysis),
            historical_cache: Mutex::new(HashMap::new()),
            on_error,
        }
    }

    /// Inject one raw event as if it had arrived on the stream. Used for
    /// replay and by tests.
    pub fn ingest(&self, raw: Value) {
        ingest_raw(&self.buffer, &self.on_error, raw);
    }

    /// Open (or re-subscribe) the live stream.
    pub fn connect(&self, request: SubscriptionRequest) {
        self.stream.connect(request);
    }

    pub fn update_subscription(&self, request: SubscriptionRequest) {
        self.stream.update_subscription(request);
    }

    pub fn disconnect(&self) {
        self.stream.disconnect();
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.stream.state()
    }

    /// Series for a chart from the live buffer only. Synchronous; touches
    /// no network.
    pub fn live_series(&self, spec: &ChartSpec) -> Vec<Series> {
        let criteria = FilterCriteria::from_data_source(&spec.data_source);
        let events = self.buffer.read().filter(&criteria);
        project_series(&events, spec)
    }

    /// Series for a chart, merging live and historical sides per the data
    /// source kind. Failures surface through the error callback; the
    /// returned series reflect whatever data was obtainable.
    pub async fn get_series(&self, spec: &ChartSpec) -> Vec<Series> {
        match spec.data_source.kind {
            DataSourceKind::EventStream | DataSourceKind::Aggregated | DataSourceKind::Derived => {
                self.live_series(spec)
            }
            DataSourceKind::Historical => {
                let events = self.historical_events(spec).await;
                project_series(&events, spec)
            }
            DataSourceKind::Hybrid => {
                let criteria = FilterCriteria::from_data_source(&spec.data_source);
                let mut events = self.buffer.read().filter(&criteria);
                events.extend(self.historical_events(spec).await);
                project_series(&events, spec)
            }
        }
    }

    /// Fetch (or serve from cache) the historical extractions a chart
    /// names. One failing run is reported and skipped; its siblings still
    /// load.
    async fn historical_events(&self, spec: &ChartSpec) -> Vec<Arc<Event>> {
        let filters = spec.data_source.filters.as_ref();
        let (Some(event_type), Some(source_id), Some(json_path)) = (
            filters.and_then(|f| f.event_type.clone()),
            filters.and_then(|f| f.source_id.clone()),
            filters.and_then(|f| f.json_path.clone()),
        ) else {
            log::warn!(
                "chart {} requests historical data without type/sourceId/jsonPath filters",
                spec.chart_id
            );
            return Vec::new();
        };
        let channel = filters
            .and_then(|f| f.channel.clone())
            .unwrap_or_else(|| "analysis".to_string());

        let mut events = Vec::new();
        for run_id in spec.data_source.resolved_run_ids() {
            let key = HistoricalKey {
                run_id: run_id.clone(),
                event_type: event_type.clone(),
                source_id: source_id.clone(),
                json_path: json_path.clone(),
            };

            if let Some(cached) = self.historical_cache.lock().get(&key) {
                events.extend(cached.iter().cloned());
                continue;
            }

            let query = SeriesQuery {
                run_id: run_id.clone(),
                event_type: event_type.clone(),
                source_id: source_id.clone(),
                json_path: json_path.clone(),
            };
            match self.analysis.get_series(&query).await {
                Ok(points) => {
                    let fetched: Vec<Arc<Event>> =
                        series_to_events(&points, &run_id, &source_id, &channel, &event_type)
                            .into_iter()
                            .map(Arc::new)
                            .collect();
                    events.extend(fetched.iter().cloned());
                    self.historical_cache.lock().insert(key, fetched);
                }
                Err(err) => (self.on_error)(err),
            }
        }
        events
    }

    /// Evict buffered events that have aged out of the chart's retention
    /// window.
    pub fn cleanup_window(&self, spec: &ChartSpec) {
        let window = spec.data_source.window();
        let mut buffer = self.buffer.write();
        let all = buffer.get_all();
        if let Some(threshold) = eviction_threshold(&window, &all) {
            buffer.remove_events(|e| threshold.matches(e));
        }
    }

    pub fn clear_historical_cache(&self) {
        self.historical_cache.lock().clear();
    }

    pub fn all_events(&self) -> Vec<Arc<Event>> {
        self.buffer.read().get_all()
    }

    pub fn stats(&self) -> BufferStats {
        self.buffer.read().stats()
    }

    pub fn clear(&self) {
        self.buffer.write().clear();
    }
}

fn ingest_raw(
    buffer: &RwLock<LiveBuffer>,
    on_error: &Arc<dyn Fn(TelemetryError) + Send + Sync>,
    raw: Value,
) {
    if !validate_event(&raw) {
        on_error(TelemetryError::Validation {
            message: format!("dropping invalid event: {raw}"),
        });
        return;
    }
    match Event::from_value(raw) {
        Ok(event) => buffer.write().add(event),
        Err(err) => on_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn layer() -> DataLayer {
        DataLayer::new(DataLayerConfig::default(), DataLayerCallbacks::default())
    }

    fn raw_event(run_id: &str, frame_index: u64, value: f64) -> Value {
        json!({
            "v": 1,
            "runId": run_id,
            "sourceId": "sim",
            "channel": "physics",
            "type": "body.velocity",
            "frameIndex": frame_index,
            "simTime": frame_index as f64 * 0.1,
            "payload": {"value": value}
        })
    }

    #[test]
    fn test_ingest_valid_event() {
        let layer = layer();
        layer.ingest(raw_event("run-1", 0, 1.5));
        assert_eq!(layer.stats().total_events, 1);
        assert_eq!(layer.all_events()[0].run_id, "run-1");
    }

    #[test]
    fn test_ingest_invalid_event_reports_and_drops() {
        let reported = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let layer = DataLayer::new(
            DataLayerConfig::default(),
            DataLayerCallbacks {
                on_state_change: None,
                on_error: Some(Box::new(move |err| sink.lock().push(err))),
            },
        );

        layer.ingest(json!({"runId": "run-1"}));
        layer.ingest(raw_event("run-1", 0, 1.0));

        assert_eq!(layer.stats().total_events, 1);
        let errors = reported.lock();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], TelemetryError::Validation { .. }));
    }

    #[test]
    fn test_live_series_projection() {
        let layer = layer();
        for i in 0..5 {
            layer.ingest(raw_event("run-1", i, i as f64));
        }
        let spec: ChartSpec = serde_json::from_value(json!({
            "chart_id": "v",
            "version": "1.0",
            "type": "time_series",
            "data_source": {
                "type": "event_stream",
                "run_id": "run-1",
                "filters": {"channel": "physics"}
            },
            "mappings": {
                "x": {"field": "frameIndex"},
                "y": {"field": "payload.value"}
            }
        }))
        .unwrap();

        let series = layer.live_series(&spec);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points.len(), 5);
        assert_eq!(series[0].points[4].y, 4.0);
    }

    #[test]
    fn test_cleanup_window_evicts_old_frames() {
        let layer = layer();
        for i in 0..20 {
            layer.ingest(raw_event("run-1", i, i as f64));
        }
        let spec: ChartSpec = serde_json::from_value(json!({
            "chart_id": "w",
            "version": "1.0",
            "type": "time_series",
            "data_source": {
                "type": "event_stream",
                "run_id": "run-1",
                "window": {"type": "frames", "size": 5}
            }
        }))
        .unwrap();

        layer.cleanup_window(&spec);
        let remaining = layer.all_events();
        assert_eq!(remaining.len(), 5);
        assert!(remaining.iter().all(|e| e.frame_index >= 15));
    }
}
