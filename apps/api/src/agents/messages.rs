// Agent message passing
//
// Coordination log between agents. Messages are never authoritative project
// state; the Context Store is.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    StatusUpdate,
    TaskComplete,
    RequestHelp,
    FileChange,
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: Uuid,
    pub project_id: String,
    pub from: String,
    /// Absent for broadcasts
    pub to: Option<String>,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub content: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Result of a direct message
#[derive(Debug, Clone, Serialize)]
pub struct DirectDelivery {
    pub message: AgentMessage,
    /// Whether the recipient had a registered inbox
    pub delivered: bool,
}

/// Per-project message bus
///
/// Every message lands in a bounded replay log and is fanned out to live
/// subscribers. Direct messages are additionally queued in the recipient's
/// inbox. Appending and sending happen under one lock, so each channel sees
/// messages in log order.
pub struct MessageBus {
    project_id: String,
    capacity: usize,
    log: Mutex<VecDeque<AgentMessage>>,
    fanout: broadcast::Sender<AgentMessage>,
    inboxes: DashMap<String, mpsc::UnboundedSender<AgentMessage>>,
}

impl MessageBus {
    pub fn new(project_id: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (fanout, _) = broadcast::channel(capacity);
        Self {
            project_id: project_id.into(),
            capacity,
            log: Mutex::new(VecDeque::with_capacity(capacity)),
            fanout,
            inboxes: DashMap::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentMessage> {
        self.fanout.subscribe()
    }

    /// Registers a recipient inbox, replacing any previous one
    pub fn register_inbox(&self, recipient: &str) -> mpsc::UnboundedReceiver<AgentMessage> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inboxes.insert(recipient.to_string(), sender);
        receiver
    }

    pub fn unregister_inbox(&self, recipient: &str) {
        self.inboxes.remove(recipient);
    }

    pub fn has_inbox(&self, recipient: &str) -> bool {
        self.inboxes.contains_key(recipient)
    }

    pub async fn broadcast(
        &self,
        from: &str,
        message_type: MessageType,
        content: serde_json::Value,
    ) -> AgentMessage {
        let message = self.message(from, None, message_type, content);
        let mut log = self.log.lock().await;
        self.append(&mut log, message.clone());
        message
    }

    /// Logs and fans out the message, then attempts inbox delivery
    pub async fn send_direct(
        &self,
        from: &str,
        to: &str,
        message_type: MessageType,
        content: serde_json::Value,
    ) -> DirectDelivery {
        let message = self.message(from, Some(to.to_string()), message_type, content);
        let mut log = self.log.lock().await;
        self.append(&mut log, message.clone());

        let delivered = match self.inboxes.get(to) {
            Some(inbox) => inbox.send(message.clone()).is_ok(),
            None => false,
        };
        drop(log);

        if !delivered {
            debug!(project_id = %self.project_id, recipient = to, "Recipient has no live inbox");
        }
        DirectDelivery { message, delivered }
    }

    /// Replay log, oldest first
    pub async fn recent(&self) -> Vec<AgentMessage> {
        self.log.lock().await.iter().cloned().collect()
    }

    fn append(&self, log: &mut VecDeque<AgentMessage>, message: AgentMessage) {
        if log.len() == self.capacity {
            log.pop_front();
        }
        log.push_back(message.clone());
        let _ = self.fanout.send(message);
    }

    fn message(
        &self,
        from: &str,
        to: Option<String>,
        message_type: MessageType,
        content: serde_json::Value,
    ) -> AgentMessage {
        AgentMessage {
            id: Uuid::new_v4(),
            project_id: self.project_id.clone(),
            from: from.to_string(),
            to,
            message_type,
            content,
            timestamp: Utc::now(),
        }
    }
}
