//! Listener registry and FIFO event queue
//!
//! The bus is a cheap, cloneable handle to shared single-threaded state.
//! The entity store, the scheduler, systems and listeners themselves all
//! hold clones, which is what lets a listener emit while it is being
//! dispatched.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use super::{Event, EventArg, EventError};
use crate::config::engine::DEFAULT_MAX_DISPATCH_PASSES;

/// Result a listener returns; `Err` is logged and dispatch moves on
pub type ListenerResult = Result<(), Box<dyn std::error::Error>>;

type Callback = Box<dyn FnMut(&Event) -> ListenerResult>;

/// Identifier of one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Token returned by [`EventBus::on`] and [`EventBus::once`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    event: String,
    id: ListenerId,
}

impl Subscription {
    /// Event this subscription listens to
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Listener identifier, usable with [`EventBus::off`]
    pub const fn id(&self) -> ListenerId {
        self.id
    }
}

struct Listener {
    id: ListenerId,
    once: bool,
    active: Cell<bool>,
    callback: RefCell<Callback>,
}

#[derive(Default)]
struct BusState {
    listeners: HashMap<String, Vec<Rc<Listener>>>,
    queue: VecDeque<Event>,
    next_listener: u64,
}

/// Publish/subscribe event bus with deferred and immediate dispatch
#[derive(Clone)]
pub struct EventBus {
    state: Rc<RefCell<BusState>>,
    max_passes: Rc<Cell<usize>>,
}

impl EventBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::with_max_passes(DEFAULT_MAX_DISPATCH_PASSES)
    }

    /// Create an empty bus with a custom [`process_events`](Self::process_events) pass limit
    pub fn with_max_passes(max_passes: usize) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState::default())),
            max_passes: Rc::new(Cell::new(max_passes.max(1))),
        }
    }

    /// Change the drain-pass limit for every clone of this bus
    pub fn set_max_passes(&self, max_passes: usize) {
        self.max_passes.set(max_passes.max(1));
    }

    /// Subscribe to an event
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> ListenerResult + 'static,
    {
        self.subscribe(event.into(), Box::new(callback), false)
    }

    /// Subscribe for a single delivery
    ///
    /// The listener is detached before it runs, so an emit from inside the
    /// callback cannot reach it a second time.
    pub fn once<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> ListenerResult + 'static,
    {
        self.subscribe(event.into(), Box::new(callback), true)
    }

    fn subscribe(&self, event: String, callback: Callback, once: bool) -> Subscription {
        let mut state = self.state.borrow_mut();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state
            .listeners
            .entry(event.clone())
            .or_default()
            .push(Rc::new(Listener {
                id,
                once,
                active: Cell::new(true),
                callback: RefCell::new(callback),
            }));
        log::trace!("Listener {:?} subscribed to '{}'", id, event);
        Subscription { event, id }
    }

    /// Remove one listener; unknown ids are ignored
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(listeners) = state.listeners.get_mut(event) else {
            return false;
        };
        let Some(index) = listeners.iter().position(|listener| listener.id == id) else {
            return false;
        };
        let listener = listeners.remove(index);
        listener.active.set(false);
        if listeners.is_empty() {
            state.listeners.remove(event);
        }
        true
    }

    /// Remove the listener behind a subscription token
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.off(&subscription.event, subscription.id)
    }

    /// Remove every listener of one event
    pub fn remove_all_listeners(&self, event: &str) {
        let removed = self.state.borrow_mut().listeners.remove(event);
        for listener in removed.into_iter().flatten() {
            listener.active.set(false);
        }
    }

    /// Remove all listeners and drop every queued event
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        for listener in state.listeners.values().flatten() {
            listener.active.set(false);
        }
        state.listeners.clear();
        state.queue.clear();
    }

    /// Queue an event for the next [`process_events`](Self::process_events)
    pub fn emit(&self, event: impl Into<String>, args: Vec<EventArg>) {
        self.post(Event {
            name: event.into(),
            args,
        });
    }

    /// Queue a prebuilt event
    pub fn post(&self, event: Event) {
        self.state.borrow_mut().queue.push_back(event);
    }

    /// Dispatch an event synchronously; returns how many listeners ran
    pub fn emit_immediate(&self, event: impl Into<String>, args: Vec<EventArg>) -> usize {
        self.dispatch(&Event {
            name: event.into(),
            args,
        })
    }

    /// Dispatch a prebuilt event synchronously
    pub fn dispatch(&self, event: &Event) -> usize {
        // Snapshot first: subscriptions made during this pass wait for the next one.
        let snapshot: Vec<Rc<Listener>> = match self.state.borrow().listeners.get(&event.name) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for listener in snapshot {
            if !listener.active.get() {
                continue;
            }
            if listener.once {
                self.off(&event.name, listener.id);
            }
            let Ok(mut callback) = listener.callback.try_borrow_mut() else {
                log::warn!(
                    "Listener {:?} re-entered while handling '{}', skipping nested delivery",
                    listener.id,
                    event.name
                );
                continue;
            };
            delivered += 1;
            if let Err(e) = callback(event) {
                log::error!("Listener {:?} for '{}' failed: {}", listener.id, event.name, e);
            }
        }
        delivered
    }

    /// Drain the queue until it stays empty
    ///
    /// Events emitted by listeners during processing are handled in the same
    /// call. If the queue is still refilling after the pass limit, the
    /// undelivered events stay queued and an error is returned.
    pub fn process_events(&self) -> Result<usize, EventError> {
        let max_passes = self.max_passes.get();
        let mut processed = 0;
        let mut passes = 0;

        loop {
            let batch: Vec<Event> = self.state.borrow_mut().queue.drain(..).collect();
            if batch.is_empty() {
                return Ok(processed);
            }

            if passes == max_passes {
                let mut state = self.state.borrow_mut();
                for event in batch.into_iter().rev() {
                    state.queue.push_front(event);
                }
                let pending = state.queue.len();
                log::warn!(
                    "Event processing did not settle after {} passes, {} events deferred",
                    passes,
                    pending
                );
                return Err(EventError::UnstableEventGraph { passes, pending });
            }

            passes += 1;
            for event in &batch {
                self.dispatch(event);
                processed += 1;
            }
        }
    }

    /// Number of listeners registered for an event
    pub fn listener_count(&self, event: &str) -> usize {
        self.state
            .borrow()
            .listeners
            .get(event)
            .map_or(0, Vec::len)
    }

    /// Names of every event with at least one listener, sorted
    pub fn registered_events(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.borrow().listeners.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether anything listens to an event
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Number of events waiting in the queue
    pub fn pending_events(&self) -> usize {
        self.state.borrow().queue.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventBus")
            .field("events", &state.listeners.len())
            .field("queued", &state.queue.len())
            .field("max_passes", &self.max_passes.get())
            .finish()
    }
}
