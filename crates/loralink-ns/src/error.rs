//! Registry error taxonomy.
//!
//! Validation and authorization errors are returned before any side effect;
//! storage, vault and band errors are wrapped with their cause chain
//! preserved.

use thiserror::Error;

use loralink_core::band::BandError;
use loralink_core::fieldmask::FieldMaskError;

use crate::downlink::DownlinkQueueError;
use crate::frequency_plans::FrequencyPlanError;
use crate::rights::RightsError;
use crate::store::StoreError;
use crate::vault::VaultError;

/// Errors surfaced by the end-device registry service.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A masked field carries an unusable value.
    #[error("invalid value for field `{field}`")]
    InvalidFieldValue {
        /// Dotted path of the offending field.
        field: String,
    },

    /// The field mask itself is unusable for the requested operation.
    #[error("invalid field mask")]
    InvalidFieldMask(#[from] FieldMaskError),

    /// An OTAA device was registered without a JoinEUI.
    #[error("JoinEUI is required for devices that support join")]
    NoJoinEui,

    /// An OTAA device was registered without a DevEUI.
    #[error("DevEUI is required for devices that support join")]
    NoDevEui,

    /// The caller lacks a required right.
    #[error(transparent)]
    Rights(#[from] RightsError),

    /// The device store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The key vault failed.
    #[error(transparent)]
    Vault(#[from] VaultError),

    /// The band registry rejected the device's radio configuration.
    #[error(transparent)]
    Band(#[from] BandError),

    /// The device references an unknown frequency plan.
    #[error(transparent)]
    FrequencyPlan(#[from] FrequencyPlanError),

    /// The downlink task queue failed.
    ///
    /// Only reachable from queue seams directly; the registry itself logs
    /// post-commit enqueue failures instead of surfacing them.
    #[error(transparent)]
    DownlinkQueue(#[from] DownlinkQueueError),
}

impl RegistryError {
    pub(crate) fn invalid_field_value(field: &str) -> Self {
        Self::InvalidFieldValue {
            field: field.to_string(),
        }
    }
}
