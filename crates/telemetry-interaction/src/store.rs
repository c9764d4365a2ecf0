//! The shared state store
//!
//! One authoritative copy of the interaction record plus per-field
//! subscriptions. Mutations take the write lock, commit, then notify with
//! the lock released so a subscriber may call back into the store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use telemetry_shared::{
    HoverState, InteractionState, LiveModeState, RunRef, SelectedRunState, SharedState,
    SharedStateDefaults, StateChange, StateField, TimeAxis,
};

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = std::sync::Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Thread-safe store of the shared interaction state
pub struct SharedStateStore {
    state: RwLock<SharedState>,
    subscribers: Mutex<HashMap<StateField, Vec<(u64, Subscriber)>>>,
    next_id: AtomicU64,
}

impl Default for SharedStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedStateStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SharedState::default()),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store seeded from a layout's declared defaults.
    pub fn with_defaults(defaults: Option<&SharedStateDefaults>) -> Self {
        Self {
            state: RwLock::new(SharedState::seeded(defaults)),
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Full copy of the current record.
    pub fn snapshot(&self) -> SharedState {
        self.state.read().clone()
    }

    /// Register for changes to one field. The callback runs on the
    /// mutating thread, after the mutation is committed.
    pub fn subscribe<F>(&self, field: StateField, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .entry(field)
            .or_default()
            .push((id, std::sync::Arc::new(callback)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subscribers = self.subscribers.lock();
        for list in subscribers.values_mut() {
            list.retain(|(entry_id, _)| *entry_id != id.0);
        }
    }

    fn notify(&self, change: StateChange) {
        // Snapshot the callback list first so subscribers may re-enter the
        // store, including subscribing or mutating from inside a callback.
        let callbacks: Vec<Subscriber> = {
            let subscribers = self.subscribers.lock();
            subscribers
                .get(&change.field())
                .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(&change);
        }
    }

    /// Move the time cursor along its current axis.
    pub fn update_time_cursor(&self, value: Option<f64>) {
        let change = {
            let mut state = self.state.write();
            state.time_cursor.value = value;
            StateChange::TimeCursor(state.time_cursor.clone())
        };
        self.notify(change);
    }

    /// Switch the cursor axis. A frame index and a sim time are not
    /// commensurable, so the held value is dropped rather than carried
    /// across.
    pub fn update_time_cursor_axis(&self, axis: TimeAxis) {
        let change = {
            let mut state = self.state.write();
            state.time_cursor.axis = axis;
            state.time_cursor.value = None;
            StateChange::TimeCursor(state.time_cursor.clone())
        };
        self.notify(change);
    }

    pub fn update_selected_run(&self, run: SelectedRunState) {
        let change = {
            let mut state = self.state.write();
            state.selected_run = run;
            StateChange::SelectedRun(state.selected_run.clone())
        };
        self.notify(change);
    }

    pub fn update_selected_runs(&self, runs: Vec<RunRef>) {
        let change = {
            let mut state = self.state.write();
            state.selected_runs = runs;
            StateChange::SelectedRuns(state.selected_runs.clone())
        };
        self.notify(change);
    }

    pub fn set_interaction_state(&self, interaction: InteractionState) {
        let change = {
            let mut state = self.state.write();
            state.interaction_state = interaction;
            StateChange::InteractionState(state.interaction_state)
        };
        self.notify(change);
    }

    /// Read-modify-write of the zoom/pan state under one lock hold.
    pub fn update_interaction_state<F>(&self, mutate: F)
    where
        F: FnOnce(&mut InteractionState),
    {
        let change = {
            let mut state = self.state.write();
            mutate(&mut state.interaction_state);
            StateChange::InteractionState(state.interaction_state)
        };
        self.notify(change);
    }

    pub fn set_live_mode(&self, live_mode: LiveModeState) {
        let change = {
            let mut state = self.state.write();
            state.live_mode = live_mode;
            StateChange::LiveMode(state.live_mode)
        };
        self.notify(change);
    }

    pub fn update_live_mode<F>(&self, mutate: F)
    where
        F: FnOnce(&mut LiveModeState),
    {
        let change = {
            let mut state = self.state.write();
            mutate(&mut state.live_mode);
            StateChange::LiveMode(state.live_mode)
        };
        self.notify(change);
    }

    pub fn update_hover_state(&self, hover: Option<HoverState>) {
        let change = {
            let mut state = self.state.write();
            state.hover_state = hover;
            StateChange::HoverState(state.hover_state.clone())
        };
        self.notify(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_axis_switch_resets_value() {
        let store = SharedStateStore::new();
        store.update_time_cursor(Some(120.0));
        assert_eq!(store.snapshot().time_cursor.value, Some(120.0));

        store.update_time_cursor_axis(TimeAxis::SimTime);
        let cursor = store.snapshot().time_cursor;
        assert_eq!(cursor.axis, TimeAxis::SimTime);
        assert_eq!(cursor.value, None);
    }

    #[test]
    fn test_subscribers_see_committed_value() {
        let store = Arc::new(SharedStateStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(StateField::TimeCursor, move |change| {
            if let StateChange::TimeCursor(cursor) = change {
                sink.lock().push(cursor.value);
            }
        });

        store.update_time_cursor(Some(1.0));
        store.update_time_cursor(Some(2.0));
        store.update_selected_run(SelectedRunState::default());

        assert_eq!(*seen.lock(), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_subscriber_may_reenter_store() {
        let store = Arc::new(SharedStateStore::new());
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        let reader = Arc::clone(&store);
        store.subscribe(StateField::LiveMode, move |_| {
            *sink.lock() = Some(reader.snapshot().live_mode.is_playing);
        });

        store.update_live_mode(|lm| lm.is_playing = true);
        assert_eq!(*observed.lock(), Some(true));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = SharedStateStore::new();
        let count = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&count);
        let id = store.subscribe(StateField::SelectedRun, move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        store.update_selected_run(SelectedRunState::default());
        store.unsubscribe(id);
        store.update_selected_run(SelectedRunState::default());

        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_seeded_store() {
        let defaults: SharedStateDefaults = serde_json::from_value(serde_json::json!({
            "selected_run": {"run_id": "run-3", "source": "sim"}
        }))
        .unwrap();
        let store = SharedStateStore::with_defaults(Some(&defaults));
        assert_eq!(
            store.snapshot().selected_run.run_id.as_deref(),
            Some("run-3")
        );
    }
}
