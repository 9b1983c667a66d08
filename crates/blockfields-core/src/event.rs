//! Event system for field notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! Rust's ownership model makes traditional observer patterns tricky.
//! We use `tokio::sync::broadcast` for a safe, async-friendly event bus.
//!
//! Fields emit events as values; a host (or a test) subscribes and
//! reacts without the field holding references to its observers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::media::MediaMode;

/// Unique identifier for a mounted field instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldId(Uuid);

impl FieldId {
    /// Creates a new unique field ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FieldId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which input pathway produced an accepted descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    Upload,
    Library,
    Url,
}

/// Events that can occur while fields are mounted.
#[derive(Debug, Clone)]
pub enum FieldEvent {
    // Media field events
    /// The field switched between editing and display
    ModeChanged { field: FieldId, mode: MediaMode },
    /// A descriptor was accepted and written to the attributes
    MediaAccepted {
        field: FieldId,
        url: String,
        source: MediaSource,
    },
    /// The user went back to editing and the media attributes were removed
    MediaRemoved { field: FieldId },
    /// The caption was edited
    CaptionChanged { field: FieldId },
    /// An upload task was spawned
    UploadStarted { field: FieldId, ticket: u64 },
    /// An upload finished without producing an accepted descriptor
    UploadDiscarded { field: FieldId, ticket: u64 },

    // Attribute store events
    /// An attribute was written
    AttributeChanged { key: String },
    /// An attribute was removed
    AttributeRemoved { key: String },
}

/// Event bus for broadcasting field events.
///
/// ## Design
///
/// Using a broadcast channel allows:
/// - Multiple subscribers (host UI, persistence, tests)
/// - Async reception
/// - Lagged receivers don't block senders
pub struct EventBus {
    sender: broadcast::Sender<FieldEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // Capacity of 256 events in the buffer
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: FieldEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<FieldEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}

/// Helper for processing events asynchronously.
///
/// ## Example
///
/// ```ignore
/// let mut handler = EventHandler::new(bus.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let FieldEvent::AttributeChanged { key } = event {
///             // Persist the attribute
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<FieldEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<FieldEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<FieldEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns every event already buffered, without waiting.
    pub fn drain(&mut self) -> Vec<FieldEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                }
                Err(_) => return events,
            }
        }
    }
}
