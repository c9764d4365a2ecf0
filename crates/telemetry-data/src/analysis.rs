//! Historical query client against the collector's analysis API
//!
//! Responses are newline-delimited JSON (one object per line). Malformed
//! lines are skipped with a warning so one corrupt row never sinks a whole
//! query.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use telemetry_shared::{Event, Result, TelemetryError};
use url::Url;

/// Analysis client configuration
#[derive(Debug, Clone)]
pub struct AnalysisClientConfig {
    /// Base URL of the collector's HTTP API
    pub base_url: String,
}

impl Default for AnalysisClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Optional filters for run listing
#[derive(Debug, Clone, Default)]
pub struct RunFilters {
    pub source_id: Option<String>,
    pub status: Option<String>,
    pub days_back: Option<u32>,
}

/// Run metadata row as the collector reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub run_id: String,
    #[serde(default)]
    pub source_id: String,
    pub started_at: String,
    #[serde(default)]
    pub ended_at: Option<String>,
    pub status: String,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default)]
    pub frame_count: u64,
    #[serde(default)]
    pub duration_sim: f64,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

/// Parameters for a time-series extraction query
#[derive(Debug, Clone)]
pub struct SeriesQuery {
    pub run_id: String,
    pub event_type: String,
    pub source_id: String,
    /// Dot path into the event payload, e.g. `velocity.x`
    pub json_path: String,
}

/// Parameters for a two-run aligned comparison
#[derive(Debug, Clone)]
pub struct CompareQuery {
    pub run_id_1: String,
    pub run_id_2: String,
    pub event_type: String,
    pub source_id: String,
    pub json_path: String,
}

/// One extracted sample
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub frame_index: u64,
    pub sim_time: f64,
    pub value: f64,
}

/// One frame-aligned comparison row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparePoint {
    pub frame_index: u64,
    pub sim_time_1: f64,
    pub sim_time_2: f64,
    pub value_1: f64,
    pub value_2: f64,
    pub diff: f64,
}

/// Parse a newline-delimited JSON body, skipping malformed lines.
pub fn parse_ndjson<T: DeserializeOwned>(body: &str) -> Vec<T> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<T>(line) {
            Ok(row) => Some(row),
            Err(err) => {
                log::warn!("skipping malformed response line: {err}");
                None
            }
        })
        .collect()
}

/// Client for historical run and series queries
pub struct AnalysisClient {
    config: AnalysisClientConfig,
    http: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: AnalysisClientConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url).map_err(|err| TelemetryError::Query {
            message: format!("invalid base URL: {err}"),
            status: None,
        })?;
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| TelemetryError::Query {
                    message: "base URL cannot carry a path".to_string(),
                    status: None,
                })?;
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn fetch_lines<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| TelemetryError::Transport {
                message: format!("request to {url} failed: {err}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Query {
                message: format!("{url} returned {status}"),
                status: Some(status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|err| TelemetryError::Transport {
            message: format!("reading response body failed: {err}"),
        })?;
        Ok(parse_ndjson(&body))
    }

    /// List completed and active runs, newest first as the collector orders
    /// them.
    pub async fn list_runs(&self, filters: &RunFilters) -> Result<Vec<RunMetadata>> {
        let mut url = self.endpoint(&["api", "analysis", "runs"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(source_id) = &filters.source_id {
                query.append_pair("sourceId", source_id);
            }
            if let Some(status) = &filters.status {
                query.append_pair("status", status);
            }
            if let Some(days_back) = filters.days_back {
                query.append_pair("daysBack", &days_back.to_string());
            }
        }
        self.fetch_lines(url).await
    }

    /// Fetch one run's metadata; a missing run is `Ok(None)`, not an error.
    pub async fn get_run(&self, run_id: &str) -> Result<Option<RunMetadata>> {
        let url = self.endpoint(&["api", "analysis", "run", run_id])?;
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|err| TelemetryError::Transport {
                message: format!("request to {url} failed: {err}"),
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(TelemetryError::Query {
                message: format!("{url} returned {status}"),
                status: Some(status.as_u16()),
            });
        }

        let body = response.text().await.map_err(|err| TelemetryError::Transport {
            message: format!("reading response body failed: {err}"),
        })?;
        let rows: Vec<RunMetadata> = parse_ndjson(&body);
        Ok(rows.into_iter().next())
    }

    /// Extract a numeric time series from one run's stored events.
    pub async fn get_series(&self, query: &SeriesQuery) -> Result<Vec<SeriesPoint>> {
        let mut url = self.endpoint(&["api", "analysis", "series"])?;
        url.query_pairs_mut()
            .append_pair("runId", &query.run_id)
            .append_pair("type", &query.event_type)
            .append_pair("sourceId", &query.source_id)
            .append_pair("jsonPath", &query.json_path);
        self.fetch_lines(url).await
    }

    /// Frame-aligned comparison of the same extraction across two runs.
    pub async fn compare_runs(&self, query: &CompareQuery) -> Result<Vec<ComparePoint>> {
        let mut url = self.endpoint(&["api", "analysis", "compare"])?;
        url.query_pairs_mut()
            .append_pair("runId1", &query.run_id_1)
            .append_pair("runId2", &query.run_id_2)
            .append_pair("type", &query.event_type)
            .append_pair("sourceId", &query.source_id)
            .append_pair("jsonPath", &query.json_path);
        self.fetch_lines(url).await
    }
}

/// Lift extracted series points back into the event shape so historical and
/// live data flow through the same projection path. The extracted value
/// lands at `payload.value`.
pub fn series_to_events(
    points: &[SeriesPoint],
    run_id: &str,
    source_id: &str,
    channel: &str,
    event_type: &str,
) -> Vec<Event> {
    points
        .iter()
        .map(|p| Event {
            v: 1,
            run_id: run_id.to_string(),
            source_id: source_id.to_string(),
            channel: channel.to_string(),
            event_type: event_type.to_string(),
            frame_index: p.frame_index,
            sim_time: p.sim_time,
            wall_time_ms: None,
            tags: None,
            payload: json!({ "value": p.value }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson_skips_malformed_lines() {
        let body = "\
{\"frameIndex\":0,\"simTime\":0.0,\"value\":1.0}\n\
{\"frameIndex\":1,\"simTime\":0.1,\"value\":2.0}\n\
not json at all\n\
{\"frameIndex\":2,\"simTime\":0.2,\"value\":3.0}\n";
        let points: Vec<SeriesPoint> = parse_ndjson(body);
        assert_eq!(points.len(), 3);
        assert_eq!(points[2].frame_index, 2);
    }

    #[test]
    fn test_parse_ndjson_ignores_blank_lines() {
        let body = "\n\n{\"frameIndex\":5,\"simTime\":1.5,\"value\":9.0}\n\n";
        let points: Vec<SeriesPoint> = parse_ndjson(body);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].value, 9.0);
    }

    #[test]
    fn test_run_metadata_tolerates_sparse_rows() {
        let body = "{\"runId\":\"run-7\",\"startedAt\":\"2026-01-01T00:00:00Z\",\"status\":\"completed\"}";
        let rows: Vec<RunMetadata> = parse_ndjson(body);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].run_id, "run-7");
        assert_eq!(rows[0].event_count, 0);
        assert!(rows[0].ended_at.is_none());
    }

    #[test]
    fn test_series_to_events_shape() {
        let points = vec![SeriesPoint {
            frame_index: 10,
            sim_time: 1.25,
            value: 42.5,
        }];
        let events = series_to_events(&points, "run-1", "sim", "analysis", "body.velocity");
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.run_id, "run-1");
        assert_eq!(event.event_type, "body.velocity");
        assert_eq!(event.frame_index, 10);
        assert_eq!(event.payload["value"], 42.5);
    }

    #[test]
    fn test_endpoint_encodes_run_id() {
        let client = AnalysisClient::new(AnalysisClientConfig::default());
        let url = client
            .endpoint(&["api", "analysis", "run", "run with space"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/analysis/run/run%20with%20space"
        );
    }
}
