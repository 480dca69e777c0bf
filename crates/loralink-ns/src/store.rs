//! Device store seam.
//!
//! The store is the only mutable shared state of the registry. All writes
//! go through [`DeviceStore::set_by_id`], which provides per-device
//! linearization through optimistic concurrency: the transaction callback
//! may run multiple times and must not produce externally visible side
//! effects itself.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::context::Context;
use crate::device::{self, EndDevice};
use crate::error::RegistryError;

/// Errors produced by the device store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// No device exists under the given identifiers.
    #[error("device `{device_id}` not found in application `{application_id}`")]
    NotFound {
        /// The application searched.
        application_id: String,
        /// The device searched.
        device_id: String,
    },

    /// The storage backend failed.
    #[error("storage backend error: {reason}")]
    Backend {
        /// Backend-specific failure description.
        reason: String,
    },
}

/// The transaction callback of [`DeviceStore::set_by_id`].
///
/// Invoked with the current record projected onto the read mask, or `None`
/// when no record exists. Returns the device to persist together with the
/// paths to apply, or `None` to delete the record. May be invoked multiple
/// times under optimistic retry and must therefore be idempotent.
pub type TransactFn<'a> = Box<
    dyn FnMut(Option<&EndDevice>) -> Result<Option<(EndDevice, Vec<String>)>, RegistryError>
        + Send
        + 'a,
>;

/// Persistent device records with transactional read-modify-write.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Reads a device projected onto `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when no record exists.
    async fn get_by_id(
        &self,
        ctx: &Context,
        application_id: &str,
        device_id: &str,
        paths: &[String],
    ) -> Result<EndDevice, StoreError>;

    /// Atomically reads, transforms and persists a device.
    ///
    /// Reads the current record projected onto `read_paths` (identifiers
    /// are always readable), invokes `f`, then applies the returned set
    /// paths onto the stored record, retrying `f` on concurrent
    /// modification. A `None` return from `f` deletes the record.
    ///
    /// Returns the stored record after the transaction, or `None` when it
    /// was deleted (or never existed).
    ///
    /// # Errors
    ///
    /// Propagates callback errors verbatim and store failures as
    /// [`StoreError`].
    async fn set_by_id(
        &self,
        ctx: &Context,
        application_id: &str,
        device_id: &str,
        read_paths: &[String],
        f: TransactFn<'_>,
    ) -> Result<Option<EndDevice>, RegistryError>;
}

/// In-memory device store.
#[derive(Debug, Default)]
pub struct MemDeviceStore {
    devices: RwLock<HashMap<(String, String), EndDevice>>,
}

impl MemDeviceStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw stored record, for test assertions.
    #[must_use]
    pub fn raw(&self, application_id: &str, device_id: &str) -> Option<EndDevice> {
        self.devices
            .read()
            .expect("device store lock")
            .get(&(application_id.to_string(), device_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl DeviceStore for MemDeviceStore {
    async fn get_by_id(
        &self,
        _ctx: &Context,
        application_id: &str,
        device_id: &str,
        paths: &[String],
    ) -> Result<EndDevice, StoreError> {
        let devices = self.devices.read().expect("device store lock");
        devices
            .get(&(application_id.to_string(), device_id.to_string()))
            .map(|stored| device::filter_get(stored, paths))
            .ok_or_else(|| StoreError::NotFound {
                application_id: application_id.to_string(),
                device_id: device_id.to_string(),
            })
    }

    async fn set_by_id(
        &self,
        _ctx: &Context,
        application_id: &str,
        device_id: &str,
        read_paths: &[String],
        mut f: TransactFn<'_>,
    ) -> Result<Option<EndDevice>, RegistryError> {
        // A single write lock linearizes the whole transaction, so the
        // callback runs exactly once here; distributed implementations
        // retry it on conflicting writes instead.
        let mut devices = self.devices.write().expect("device store lock");
        let key = (application_id.to_string(), device_id.to_string());
        let current = devices.get(&key).cloned();
        let projected = current
            .as_ref()
            .map(|stored| device::filter_get(stored, read_paths));

        match f(projected.as_ref())? {
            None => {
                devices.remove(&key);
                Ok(None)
            }
            Some((returned, set_paths)) => {
                let mut stored = current.clone().unwrap_or_else(|| {
                    let mut fresh = EndDevice::default();
                    fresh.ids.application_ids.application_id = application_id.to_string();
                    fresh.ids.device_id = device_id.to_string();
                    fresh
                });
                device::set_fields(&mut stored, &returned, &set_paths);
                let now = Utc::now();
                if current.is_none() {
                    stored.created_at = Some(now);
                }
                stored.updated_at = Some(now);
                devices.insert(key, stored.clone());
                Ok(Some(stored))
            }
        }
    }
}
