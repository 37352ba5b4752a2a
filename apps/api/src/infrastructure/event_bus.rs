// Event bus - typed pub/sub for domain events
//
// In-memory fan-out over a tokio broadcast channel. Every subscriber present
// at publish time receives the event; nothing is ordered across topics.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Capacity bounds how far a slow subscriber may lag before it starts
    /// missing events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn publish(&self, event: DomainEvent) {
        debug!(topic = event.topic(), project_id = event.project_id(), "Publishing event");

        if self.sender.send(event).is_err() {
            debug!("No subscribers listening to event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Raw receiver, for adapters that wrap it in a stream
    pub fn receiver(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}

pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => EventBusError::Closed,
            broadcast::error::RecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }

    /// Drains everything currently buffered, skipping over lag gaps
    pub fn drain(&mut self) -> Vec<DomainEvent> {
        let mut events = Vec::new();
        loop {
            match self.try_recv() {
                Ok(event) => events.push(event),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentName, AgentStatus};

    fn status_event(project: &str) -> DomainEvent {
        DomainEvent::AgentStatusChange {
            project_id: project.to_string(),
            agent: AgentName::Abeni,
            from: AgentStatus::Idle,
            to: AgentStatus::Thinking,
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_published_events() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(status_event("p1"));

        assert_eq!(first.recv().await.unwrap().project_id(), "p1");
        assert_eq!(second.recv().await.unwrap().project_id(), "p1");
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new(8);
        bus.publish(status_event("p1"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn lagging_receiver_reports_lag_then_recovers() {
        let bus = EventBus::new(2);
        let mut receiver = bus.subscribe();

        for i in 0..5 {
            bus.publish(status_event(&format!("p{i}")));
        }

        assert!(matches!(receiver.try_recv(), Err(EventBusError::Lagged(_))));
        assert_eq!(receiver.drain().len(), 2);
    }
}
