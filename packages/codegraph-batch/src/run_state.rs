//! Run lifecycle state machine and state-change notification.
//!
//! ```text
//! NeverStarted --start--> Running --(token signaled)--> Cancelled
//!                            └----(sweep finished)----> Completed
//! Completed / Cancelled --start--> Running
//! ```

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Run state of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NeverStarted,
    Running,
    Completed,
    Cancelled,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::NeverStarted => "never_started",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Cancelled)
    }

    /// Whether a new run may be started from this state
    pub fn accepts_start(&self) -> bool {
        !matches!(self, RunState::Running)
    }

    /// Allowed edges of the state machine
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (RunState::NeverStarted, RunState::Running) => true,
            (RunState::Completed, RunState::Running) => true,
            (RunState::Cancelled, RunState::Running) => true,
            (RunState::Running, RunState::Completed) => true,
            (RunState::Running, RunState::Cancelled) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One published transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub old: RunState,
    pub new: RunState,
}

impl StateChange {
    pub fn new(old: RunState, new: RunState) -> Self {
        Self { old, new }
    }
}

/// Handle returned by [`StateObservers::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type StateCallback = Arc<dyn Fn(StateChange) + Send + Sync>;

/// Pending changes plus whether some thread is currently delivering them
#[derive(Default)]
struct Delivery {
    queue: VecDeque<StateChange>,
    active: bool,
}

/// Observer list plus broadcast channel for state changes.
///
/// Callbacks run synchronously on the thread that performs the transition,
/// after the controller lock has been released. Changes reach callbacks and
/// the channel in publish order: a change published while another is being
/// delivered (including from inside a callback) is queued and delivered by
/// the thread already delivering.
pub struct StateObservers {
    callbacks: Mutex<Vec<(SubscriptionId, StateCallback)>>,
    next_id: AtomicU64,
    channel: broadcast::Sender<StateChange>,
    delivery: Mutex<Delivery>,
}

impl StateObservers {
    pub fn new(capacity: usize) -> Self {
        let (channel, _) = broadcast::channel(capacity.max(1));
        Self {
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            channel,
            delivery: Mutex::new(Delivery::default()),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(StateChange) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.lock().push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the id was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Receiver that sees every transition published after this call
    pub fn watch(&self) -> broadcast::Receiver<StateChange> {
        self.channel.subscribe()
    }

    pub fn publish(&self, change: StateChange) {
        {
            let mut delivery = self.delivery.lock();
            delivery.queue.push_back(change);
            if delivery.active {
                return;
            }
            delivery.active = true;
        }

        let _guard = DeliveryGuard(&self.delivery);
        loop {
            let next = {
                let mut delivery = self.delivery.lock();
                match delivery.queue.pop_front() {
                    Some(next) => next,
                    None => {
                        // Cleared under the lock so a concurrent publish is never stranded
                        delivery.active = false;
                        return;
                    }
                }
            };
            self.deliver(next);
        }
    }

    fn deliver(&self, change: StateChange) {
        // No receivers is fine
        let _ = self.channel.send(change);

        // Snapshot so callbacks may (un)subscribe without deadlocking
        let callbacks: Vec<StateCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for cb in callbacks {
            cb(change);
        }
    }
}

/// Hands the delivery role back if a callback panics
struct DeliveryGuard<'a>(&'a Mutex<Delivery>);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().active = false;
        }
    }
}

impl Default for StateObservers {
    fn default() -> Self {
        Self::new(16)
    }
}
