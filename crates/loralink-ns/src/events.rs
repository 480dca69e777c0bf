//! Registry event definitions and the event bus seam.
//!
//! Events are published only after a transaction commits; a publication
//! failure is logged by the caller and never rolls the change back.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::device::EndDeviceIdentifiers;
use crate::rights::Right;

/// Event emitted when a device record is created.
pub const EVT_CREATE_END_DEVICE: &str = "ns.end_device.create";
/// Event emitted when a device record is updated.
pub const EVT_UPDATE_END_DEVICE: &str = "ns.end_device.update";
/// Event emitted when a device record is deleted.
pub const EVT_DELETE_END_DEVICE: &str = "ns.end_device.delete";

/// A registry lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Stable event name.
    pub name: &'static str,
    /// Identifiers of the affected device.
    pub identifiers: EndDeviceIdentifiers,
    /// The field-mask paths the triggering request affected.
    pub paths: Vec<String>,
    /// The right required to observe this event.
    pub visibility: Right,
    /// When the event was created.
    pub time: DateTime<Utc>,
}

fn define(name: &'static str, identifiers: &EndDeviceIdentifiers, paths: Vec<String>) -> Event {
    Event {
        name,
        identifiers: identifiers.clone(),
        paths,
        visibility: Right::DevicesRead,
        time: Utc::now(),
    }
}

/// The `ns.end_device.create` event.
#[must_use]
pub fn create_end_device(identifiers: &EndDeviceIdentifiers, paths: Vec<String>) -> Event {
    define(EVT_CREATE_END_DEVICE, identifiers, paths)
}

/// The `ns.end_device.update` event.
#[must_use]
pub fn update_end_device(identifiers: &EndDeviceIdentifiers, paths: Vec<String>) -> Event {
    define(EVT_UPDATE_END_DEVICE, identifiers, paths)
}

/// The `ns.end_device.delete` event.
#[must_use]
pub fn delete_end_device(identifiers: &EndDeviceIdentifiers) -> Event {
    define(EVT_DELETE_END_DEVICE, identifiers, Vec::new())
}

/// Errors produced by event publication.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// The bus rejected or could not deliver the event.
    #[error("event publication failed: {reason}")]
    Publish {
        /// Bus-specific failure description.
        reason: String,
    },
}

/// Publishes registry lifecycle events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes an event.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::Publish`] when delivery fails; the caller
    /// logs and continues.
    async fn publish(&self, event: Event) -> Result<(), EventBusError>;
}

/// Collecting in-memory bus.
#[derive(Debug, Default)]
pub struct MemEventBus {
    events: Mutex<Vec<Event>>,
}

impl MemEventBus {
    /// An empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns the published events.
    #[must_use]
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut self.events.lock().expect("event bus lock"))
    }
}

#[async_trait]
impl EventBus for MemEventBus {
    async fn publish(&self, event: Event) -> Result<(), EventBusError> {
        self.events.lock().expect("event bus lock").push(event);
        Ok(())
    }
}
