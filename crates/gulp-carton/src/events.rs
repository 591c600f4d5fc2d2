//! Status-change events and the bus they are published on.
//!
//! [`EventNotifier`] builds one [`Event`] per status change and hands it to
//! an [`EventBus`]. [`BroadcastEventBus`] fans events out in-process over
//! a tokio broadcast channel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

use gulp_core::{GulpConfig, Status, keys};

pub const ACTION_STATUS: &str = "status";
pub const EVENT_USER: &str = "user";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event bus closed")]
    Closed,

    #[error("event transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub metadata: BTreeMap<String, String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Actor: the node's account id.
    pub account_id: String,
    pub action: String,
    pub event_type: String,
    pub data: EventData,
    pub timestamp: DateTime<Local>,
}

/// Publishes events to the platform's event bus.
pub trait EventBus: Send + Sync {
    fn write(&self, event: &Event) -> Result<(), EventError>;
}

/// In-process event bus over a tokio broadcast channel.
///
/// Publishing with no subscribers succeeds; the event is dropped.
#[derive(Clone)]
pub struct BroadcastEventBus {
    sender: broadcast::Sender<Event>,
    closed: Arc<AtomicBool>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Refuse further writes.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus for BroadcastEventBus {
    fn write(&self, event: &Event) -> Result<(), EventError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EventError::Closed);
        }
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        debug!(action = %event.action, receivers, "event published");
        Ok(())
    }
}

/// Builds and publishes status-change events.
#[derive(Clone)]
pub struct EventNotifier {
    bus: Arc<dyn EventBus>,
    config: Arc<GulpConfig>,
}

impl EventNotifier {
    pub fn new(bus: Arc<dyn EventBus>, config: Arc<GulpConfig>) -> Self {
        Self { bus, config }
    }

    /// The event describing `assembly_id` moving to `status`.
    pub fn status_event(&self, assembly_id: &str, status: &Status) -> Event {
        let account_id = self.config.meta.account_id.clone();
        let mut metadata = BTreeMap::new();
        metadata.insert(keys::ASSEMBLY_ID.to_string(), assembly_id.to_string());
        metadata.insert(keys::ACCOUNT_ID.to_string(), account_id.clone());
        metadata.insert(keys::EVENT_TYPE.to_string(), status.event_type().to_string());

        Event {
            account_id,
            action: ACTION_STATUS.to_string(),
            event_type: EVENT_USER.to_string(),
            data: EventData {
                metadata,
                description: status.description(&self.config.meta.platform),
            },
            timestamp: Local::now(),
        }
    }

    /// Publish exactly one status-change event.
    pub fn notify(&self, assembly_id: &str, status: &Status) -> Result<(), EventError> {
        let event = self.status_event(assembly_id, status);
        self.bus.write(&event)
    }
}
