//! In-memory multi-index store of validated live events
//!
//! Append-only primary sequence plus derived indexes by run id, channel and
//! event type. Bulk eviction rebuilds the indexes from the surviving set so
//! that indexes and primary sequence always agree exactly.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use telemetry_shared::{DataSourceSpec, Event, EventFilters};

/// Conjunctive filter over buffered events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub run_id: Option<String>,
    pub channel: Option<String>,
    pub event_type: Option<String>,
    pub types: Option<Vec<String>>,
    pub type_prefix: Option<String>,
    pub tags: Option<HashMap<String, String>>,
}

impl FilterCriteria {
    /// Criteria for a chart's data source: its run id plus declared filters.
    pub fn from_data_source(source: &DataSourceSpec) -> Self {
        Self::from_filters(source.run_id.clone(), source.filters.as_ref())
    }

    /// Criteria from declared filters, optionally scoped to one run.
    pub fn from_filters(run_id: Option<String>, filters: Option<&EventFilters>) -> Self {
        let mut criteria = FilterCriteria {
            run_id,
            ..FilterCriteria::default()
        };
        if let Some(filters) = filters {
            criteria.channel = filters.channel.clone();
            criteria.event_type = filters.event_type.clone();
            criteria.types = filters.types.clone();
            criteria.type_prefix = filters.type_prefix.clone();
            criteria.tags = filters.tags.clone();
        }
        criteria
    }

    /// Whether an event passes every provided criterion.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(run_id) = &self.run_id {
            if event.run_id != *run_id {
                return false;
            }
        }
        if let Some(channel) = &self.channel {
            if event.channel != *channel {
                return false;
            }
        }
        if let Some(event_type) = &self.event_type {
            if event.event_type != *event_type {
                return false;
            }
        }
        if let Some(types) = &self.types {
            if !types.is_empty() && !types.contains(&event.event_type) {
                return false;
            }
        }
        if let Some(prefix) = &self.type_prefix {
            if !event.event_type.starts_with(prefix.as_str()) {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            let Some(event_tags) = &event.tags else {
                return false;
            };
            for (key, value) in tags {
                if event_tags.get(key) != Some(value) {
                    return false;
                }
            }
        }
        true
    }
}

/// Buffer statistics: event count and the indexed vocabularies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    pub total_events: usize,
    pub runs: Vec<String>,
    pub channels: Vec<String>,
    pub types: Vec<String>,
}

/// Live event buffer with per-run, per-channel and per-type indexes
#[derive(Debug, Default)]
pub struct LiveBuffer {
    events: Vec<Arc<Event>>,
    by_run: HashMap<String, Vec<Arc<Event>>>,
    by_channel: HashMap<String, Vec<Arc<Event>>>,
    by_type: HashMap<String, Vec<Arc<Event>>>,
}

impl LiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validated event; O(1) amortized across all indexes.
    pub fn add(&mut self, event: Event) {
        let event = Arc::new(event);
        self.index(&event);
        self.events.push(event);
    }

    fn index(&mut self, event: &Arc<Event>) {
        self.by_run
            .entry(event.run_id.clone())
            .or_default()
            .push(Arc::clone(event));
        self.by_channel
            .entry(event.channel.clone())
            .or_default()
            .push(Arc::clone(event));
        self.by_type
            .entry(event.event_type.clone())
            .or_default()
            .push(Arc::clone(event));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Snapshot of the full primary sequence. Returned vectors are the
    /// caller's own; mutating them never touches buffer internals.
    pub fn get_all(&self) -> Vec<Arc<Event>> {
        self.events.clone()
    }

    pub fn get_by_run_id(&self, run_id: &str) -> Vec<Arc<Event>> {
        self.by_run.get(run_id).cloned().unwrap_or_default()
    }

    pub fn get_by_channel(&self, channel: &str) -> Vec<Arc<Event>> {
        self.by_channel.get(channel).cloned().unwrap_or_default()
    }

    pub fn get_by_type(&self, event_type: &str) -> Vec<Arc<Event>> {
        self.by_type.get(event_type).cloned().unwrap_or_default()
    }

    /// Conjunctive filter over the primary sequence, preserving order.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<Arc<Event>> {
        self.events
            .iter()
            .filter(|e| criteria.matches(e))
            .cloned()
            .collect()
    }

    /// Remove every matching event and rebuild all indexes from the
    /// surviving set.
    pub fn remove_events<F>(&mut self, predicate: F)
    where
        F: Fn(&Event) -> bool,
    {
        self.events.retain(|e| !predicate(e));
        self.rebuild_indexes();
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.by_run.clear();
        self.by_channel.clear();
        self.by_type.clear();
    }

    fn rebuild_indexes(&mut self) {
        self.by_run.clear();
        self.by_channel.clear();
        self.by_type.clear();

        let events = self.events.clone();
        for event in &events {
            self.index(event);
        }
    }

    /// Event count and the distinct run/channel/type vocabularies currently
    /// indexed, sorted for stable output.
    pub fn stats(&self) -> BufferStats {
        let mut runs: Vec<String> = self.by_run.keys().cloned().collect();
        let mut channels: Vec<String> = self.by_channel.keys().cloned().collect();
        let mut types: Vec<String> = self.by_type.keys().cloned().collect();
        runs.sort_unstable();
        channels.sort_unstable();
        types.sort_unstable();

        BufferStats {
            total_events: self.events.len(),
            runs,
            channels,
            types,
        }
    }
}
