//! # loralink-ns
//!
//! The loralink Network Server's end-device registry: per-device persistent
//! state (identifiers, session keys, MAC state, queued downlinks) served
//! over a typed field-mask protocol with Get/Set/Delete operations.
//!
//! The service orchestrates a set of collaborator seams:
//!
//! - [`store::DeviceStore`]: persistent device records with an optimistic
//!   transactional read-modify-write.
//! - [`vault::KeyVault`]: KEK resolution and key wrap/unwrap.
//! - [`rights::RightsFetcher`]: per-application authorization gates.
//! - [`events::EventBus`]: create/update/delete event publication.
//! - [`downlink::DownlinkTaskQueue`]: post-commit downlink rescheduling.
//! - [`frequency_plans::FrequencyPlanStore`]: frequency-plan to band
//!   resolution.
//!
//! Each seam ships with an in-memory implementation used by the tests and
//! usable as a default backend.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod device;
pub mod downlink;
pub mod error;
pub mod events;
pub mod frequency_plans;
pub mod mac_state;
pub mod registry;
pub mod rights;
pub mod store;
pub mod vault;

pub use config::RegistryConfig;
pub use context::Context;
pub use device::EndDevice;
pub use error::RegistryError;
pub use registry::DeviceRegistry;
