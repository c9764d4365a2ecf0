//! Live mode driver
//!
//! While playback is on, a fixed-interval tick pins the time cursor to the
//! newest buffered event along the current axis. The driver reads events
//! through a caller-supplied source closure so it stays decoupled from the
//! data layer's ownership.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use telemetry_shared::{Event, TimeAxis};

use crate::scale::{axis_value, latest_event};
use crate::store::SharedStateStore;

/// Live mode driver configuration
#[derive(Debug, Clone)]
pub struct LiveModeConfig {
    /// Cursor refresh interval while playing
    pub tick_interval: Duration,
}

impl Default for LiveModeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
        }
    }
}

/// Cursor-axis value of the newest event, optionally restricted to one run.
pub fn latest_axis_value(
    events: &[Arc<Event>],
    axis: TimeAxis,
    run_id: Option<&str>,
) -> Option<f64> {
    latest_event(events, axis, run_id).map(|e| axis_value(&e, axis))
}

/// Drives the time cursor while live playback is on
pub struct LiveModeDriver {
    config: LiveModeConfig,
    handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl LiveModeDriver {
    pub fn new(config: LiveModeConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    /// Turn playback on and start the tick task. An already running task is
    /// stopped first so at most one driver task exists.
    pub fn play<S>(&self, store: Arc<SharedStateStore>, source: S)
    where
        S: Fn() -> Vec<Arc<Event>> + Send + Sync + 'static,
    {
        store.update_live_mode(|lm| lm.is_playing = true);
        self.start(store, source);
    }

    /// Turn playback off. The tick task notices on its next tick and exits;
    /// `stop` cancels it immediately.
    pub fn pause(&self, store: &SharedStateStore) {
        store.update_live_mode(|lm| lm.is_playing = false);
        self.stop();
    }

    /// Start the tick task without touching the playback flag.
    pub fn start<S>(&self, store: Arc<SharedStateStore>, source: S)
    where
        S: Fn() -> Vec<Arc<Event>> + Send + Sync + 'static,
    {
        self.stop();

        let tick_interval = self.config.tick_interval;
        log::debug!("live mode driver started, tick interval {tick_interval:?}");
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            loop {
                interval.tick().await;

                let snapshot = store.snapshot();
                if !snapshot.live_mode.is_playing {
                    log::debug!("live mode driver exiting, playback is off");
                    break;
                }

                let events = source();
                let run_id = snapshot.selected_run.run_id.as_deref();
                if let Some(value) =
                    latest_axis_value(&events, snapshot.time_cursor.axis, run_id)
                {
                    store.update_time_cursor(Some(value));
                }
            }
        });
        *self.handle.lock() = Some(handle);
    }

    pub fn stop(&self) {
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            log::debug!("live mode driver stopped");
        }
    }
}

impl Drop for LiveModeDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
