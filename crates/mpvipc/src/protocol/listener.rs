// Event listeners
//
// Listeners are notified from the connection's reader task, one event at a
// time. `notify` must return quickly: a slow listener delays every later
// event and every pending command result on the same connection.

use crate::protocol::event::Event;
use tokio::sync::mpsc;

/// Receives events broadcast by a `Connection`
pub trait EventListener: Send + Sync {
    fn notify(&self, event: &Event);

    /// True once the listener can no longer receive anything.
    ///
    /// The connection unregisters closed listeners on the next event.
    fn is_closed(&self) -> bool {
        false
    }
}

impl<F> EventListener for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn notify(&self, event: &Event) {
        self(event)
    }
}

/// Forwards events into an unbounded channel without blocking the reader
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventListener for ChannelListener {
    fn notify(&self, event: &Event) {
        // A dropped receiver is reported through is_closed
        let _ = self.tx.send(event.clone());
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Which events a `FilteredListener` lets through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Events with this name
    Name(String),
    /// `property-change` events for the given `observe_property` id
    PropertyId(u64),
    /// Events matching any of the inner filters
    Any(Vec<EventFilter>),
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventFilter::Name(name) => event.name == *name,
            EventFilter::PropertyId(id) => event.name == "property-change" && event.id == *id,
            EventFilter::Any(filters) => filters.iter().any(|f| f.matches(event)),
        }
    }
}

/// Wraps another listener and drops events that do not match the filter
pub struct FilteredListener<L> {
    filter: EventFilter,
    inner: L,
}

impl<L: EventListener> FilteredListener<L> {
    pub fn new(filter: EventFilter, inner: L) -> Self {
        Self { filter, inner }
    }
}

impl<L: EventListener> EventListener for FilteredListener<L> {
    fn notify(&self, event: &Event) {
        if self.filter.matches(event) {
            self.inner.notify(event);
        }
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
