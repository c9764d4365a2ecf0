//! Data layer for the live telemetry dashboard
//!
//! Merges a live event stream (persistent duplex connection with bounded
//! reconnection) with on-demand historical queries, maintains a multi-index
//! in-memory buffer under bounded retention windows, and projects raw events
//! into chart-ready series per a declarative chart specification.

pub mod analysis;
pub mod buffer;
pub mod layer;
pub mod projector;
pub mod stream;
pub mod window;

pub use analysis::{
    parse_ndjson, series_to_events, AnalysisClient, AnalysisClientConfig, ComparePoint,
    CompareQuery, RunFilters, RunMetadata, SeriesPoint, SeriesQuery,
};
pub use buffer::{BufferStats, FilterCriteria, LiveBuffer};
pub use layer::{DataLayer, DataLayerCallbacks, DataLayerConfig};
pub use projector::{project_series, resolve_field};
pub use stream::{
    ConnectionState, ReconnectPolicy, StreamCallbacks, StreamClient, StreamClientConfig,
    SubscriptionRequest,
};
pub use window::{apply_window, eviction_threshold, EvictionThreshold};
