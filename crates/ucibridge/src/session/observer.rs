//! One-shot line observers
//!
//! An observer pairs a predicate over classified lines with a callback. The
//! first observer (in registration order) whose predicate matches a line
//! claims it: the observer is removed from the set and handed back to the
//! caller, which fires it after releasing any lock. An observer therefore
//! fires at most once and a line has at most one consumer.

use ucibridge_protocol::LineKind;

/// Identifier of a registered observer
pub type ObserverId = u64;

type Matcher = Box<dyn Fn(&LineKind) -> bool + Send>;
type Callback = Box<dyn FnOnce(LineKind) + Send>;

/// A claimed observer, ready to fire
pub struct Observer {
    id: ObserverId,
    matcher: Matcher,
    on_match: Callback,
}

impl Observer {
    /// Identifier assigned at registration
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Run the callback, consuming the observer
    pub fn fire(self, line: LineKind) {
        (self.on_match)(line)
    }
}

/// Ordered set of active observers
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Observer>,
    next_id: ObserverId,
}

impl ObserverSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer
    pub fn register<M, C>(&mut self, matcher: M, on_match: C) -> ObserverId
    where
        M: Fn(&LineKind) -> bool + Send + 'static,
        C: FnOnce(LineKind) + Send + 'static,
    {
        self.next_id += 1;
        let id = self.next_id;
        self.observers.push(Observer {
            id,
            matcher: Box::new(matcher),
            on_match: Box::new(on_match),
        });
        id
    }

    /// Remove and return the first observer matching `line`
    pub fn claim(&mut self, line: &LineKind) -> Option<Observer> {
        let index = self
            .observers
            .iter()
            .position(|observer| (observer.matcher)(line))?;
        Some(self.observers.remove(index))
    }

    /// Remove an observer without firing it
    pub fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|observer| observer.id != id);
        self.observers.len() != before
    }

    /// Drop every observer without firing
    pub fn clear(&mut self) {
        self.observers.clear();
    }

    /// Number of active observers
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Whether no observer is active
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}
