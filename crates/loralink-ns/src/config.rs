//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::device::MacSettings;

/// Configuration of the end-device registry service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Label of the KEK that newly written session keys are wrapped under.
    ///
    /// Empty disables at-rest wrapping and stores keys in plaintext
    /// envelopes.
    pub device_kek_label: String,

    /// Network-wide default MAC settings, applied beneath each device's
    /// own `mac_settings`.
    pub default_mac_settings: MacSettings,
}
