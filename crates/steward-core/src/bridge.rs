//! Event bridge between the agent core and the task controller
//!
//! A two-channel publish/subscribe link: agent events travel outbound
//! (toward whatever stands in for the UI) and control messages travel
//! inbound (back to the agent core). This is the sole mechanism by which
//! the two sides exchange messages; no shared mutable state crosses the
//! boundary.
//!
//! Delivery is in publish order with no persistence. Each subscriber
//! receives a copy of every message published after it subscribed;
//! dropping the receiver unsubscribes.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::protocol::{AgentEvent, ControlMessage};

/// Two independent broadcast channels decoupling the agent's
/// UI-oriented protocol from any concrete renderer.
#[derive(Debug)]
pub struct EventBridge {
    events: broadcast::Sender<AgentEvent>,
    controls: broadcast::Sender<ControlMessage>,
    capacity: usize,
}

impl EventBridge {
    /// Create a bridge whose channels buffer up to `capacity` messages
    /// for slow subscribers.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let (controls, _) = broadcast::channel(capacity);
        Self {
            events,
            controls,
            capacity,
        }
    }

    /// Publish an agent event to all outbound subscribers.
    ///
    /// Returns the number of active receivers, 0 when nobody listens.
    pub fn publish_event(&self, event: AgentEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// Publish a control message to all inbound subscribers.
    ///
    /// Returns the number of active receivers, 0 when nobody listens.
    pub fn publish_control(&self, message: ControlMessage) -> usize {
        self.controls.send(message).unwrap_or(0)
    }

    /// Subscribe to agent events (agent -> UI direction).
    pub fn subscribe_events(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    /// Subscribe to control messages (UI -> agent direction).
    pub fn subscribe_controls(&self) -> broadcast::Receiver<ControlMessage> {
        self.controls.subscribe()
    }

    /// Number of active event subscribers.
    pub fn event_subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Number of active control subscribers.
    pub fn control_subscriber_count(&self) -> usize {
        self.controls.receiver_count()
    }

    /// Channel capacity configured at construction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBridge {
    /// A bridge buffering 256 messages per direction.
    fn default() -> Self {
        Self::new(256)
    }
}

impl Clone for EventBridge {
    fn clone(&self) -> Self {
        Self {
            events: self.events.clone(),
            controls: self.controls.clone(),
            capacity: self.capacity,
        }
    }
}

/// Thread-safe shared handle to a bridge
pub type SharedBridge = Arc<EventBridge>;

/// Create a new shared bridge
pub fn shared_bridge(capacity: usize) -> SharedBridge {
    Arc::new(EventBridge::new(capacity))
}
