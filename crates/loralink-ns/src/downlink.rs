//! Downlink task queue seam.
//!
//! After a Set touches fields that influence downlink scheduling, the
//! registry asks the queue to recompute the device's next downlink task.
//! The hint is best-effort: the device change is already durable, so
//! enqueue failures are logged by the caller and never surfaced.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::context::Context;
use crate::device::EndDeviceIdentifiers;

/// Errors produced by the downlink task queue.
#[derive(Debug, Error)]
pub enum DownlinkQueueError {
    /// The task could not be enqueued.
    #[error("downlink task enqueue failed: {reason}")]
    Enqueue {
        /// Queue-specific failure description.
        reason: String,
    },
}

/// Accepts downlink rescheduling hints after device mutations.
#[async_trait]
pub trait DownlinkTaskQueue: Send + Sync {
    /// Schedules a downlink recomputation for the device at `run_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DownlinkQueueError::Enqueue`] when the hint cannot be
    /// queued.
    async fn add(
        &self,
        ctx: &Context,
        identifiers: &EndDeviceIdentifiers,
        run_at: DateTime<Utc>,
    ) -> Result<(), DownlinkQueueError>;
}

/// Collecting in-memory queue.
#[derive(Debug, Default)]
pub struct MemDownlinkTasks {
    tasks: Mutex<Vec<(EndDeviceIdentifiers, DateTime<Utc>)>>,
}

impl MemDownlinkTasks {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns the queued hints.
    #[must_use]
    pub fn take(&self) -> Vec<(EndDeviceIdentifiers, DateTime<Utc>)> {
        std::mem::take(&mut self.tasks.lock().expect("downlink queue lock"))
    }
}

#[async_trait]
impl DownlinkTaskQueue for MemDownlinkTasks {
    async fn add(
        &self,
        _ctx: &Context,
        identifiers: &EndDeviceIdentifiers,
        run_at: DateTime<Utc>,
    ) -> Result<(), DownlinkQueueError> {
        self.tasks
            .lock()
            .expect("downlink queue lock")
            .push((identifiers.clone(), run_at));
        Ok(())
    }
}
