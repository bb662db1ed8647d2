//! Process-wide notification bus for session changes.
//!
//! The `HttpClient` publishes [`SessionEvent::AuthChanged`] when the server
//! rejects the held credential. Routing and UI layers subscribe to redirect.
//! Publishing never fails: with no subscribers the event is simply dropped.

use tokio::sync::broadcast;
use tracing::debug;

/// Buffered events per subscriber before the oldest are dropped.
const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The stored session was invalidated by an authentication failure.
    AuthChanged,
    /// A login exchange succeeded and a new session was stored.
    LoggedIn,
    /// The session was cleared by an explicit logout.
    LoggedOut,
}

impl SessionEvent {
    /// Wire name of the event, as consumed by front-end listeners.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::AuthChanged => "auth-changed",
            SessionEvent::LoggedIn => "logged-in",
            SessionEvent::LoggedOut => "logged-out",
        }
    }
}

/// Cheap to clone; all clones publish to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: SessionEvent) {
        // Err only means nobody is listening right now
        if self.sender.send(event).is_err() {
            debug!(event = event.name(), "No subscribers for session event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Publish to an optional bus; absent bus is a no-op.
pub(crate) fn publish(bus: Option<&EventBus>, event: SessionEvent) {
    if let Some(bus) = bus {
        bus.publish(event);
    }
}
