//! Chart-ready series produced by the projection pipeline

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A single resolved plotting coordinate.
///
/// Carries a shared back-reference to the originating event so tooltips and
/// selection can reach the full record without the projector owning it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    pub frame_index: u64,
    pub sim_time: f64,
    pub event: Arc<Event>,
}

/// One visual trace: an identifier plus ordered points.
///
/// Series are recomputed on every data refresh and never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub id: String,
    pub points: Vec<DataPoint>,
}
