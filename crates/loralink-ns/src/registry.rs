//! The end-device registry service.
//!
//! Serves Get/Set/Delete over the typed field-mask protocol. Every
//! operation starts with a per-application rights check; mutations run
//! inside the store's optimistic transaction, with events and downlink
//! rescheduling deferred until after commit.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use tracing::{error, warn};

use loralink_core::band::{Band, Registry as BandRegistry};
use loralink_core::fieldmask;
use loralink_core::types::{KeyEnvelope, MacVersion, PhyVersion, SessionKeys};

use crate::config::RegistryConfig;
use crate::context::Context;
use crate::device::{self, EndDevice, MacParameters, KEY_CONTAINER_PREFIXES};
use crate::downlink::DownlinkTaskQueue;
use crate::error::RegistryError;
use crate::events::{self, Event, EventBus};
use crate::frequency_plans::FrequencyPlanStore;
use crate::mac_state;
use crate::rights::{Right, RightsFetcher};
use crate::store::{DeviceStore, StoreError};
use crate::vault::{self, KeyVault};

/// Session keys that Set accepts in plaintext and wraps before storage.
const WRAPPED_SESSION_KEYS: [&str; 3] = ["f_nwk_s_int_key", "nwk_s_enc_key", "s_nwk_s_int_key"];

/// Fields whose mutation requires recomputing the device's downlink task.
const DOWNLINK_TRIGGER_FIELDS: [&str; 5] = [
    "frequency_plan_id",
    "lorawan_phy_version",
    "mac_settings",
    "mac_state",
    "session",
];

/// Legacy MAC parameter fields and the exponent/value fields they derive
/// from.
const EXPONENT_DERIVED_FIELDS: [(&str, &str); 6] = [
    (
        "mac_state.current_parameters.adr_ack_delay",
        "mac_state.current_parameters.adr_ack_delay_exponent",
    ),
    (
        "mac_state.current_parameters.adr_ack_limit",
        "mac_state.current_parameters.adr_ack_limit_exponent",
    ),
    (
        "mac_state.current_parameters.ping_slot_data_rate_index",
        "mac_state.current_parameters.ping_slot_data_rate_index_value",
    ),
    (
        "mac_state.desired_parameters.adr_ack_delay",
        "mac_state.desired_parameters.adr_ack_delay_exponent",
    ),
    (
        "mac_state.desired_parameters.adr_ack_limit",
        "mac_state.desired_parameters.adr_ack_limit_exponent",
    ),
    (
        "mac_state.desired_parameters.ping_slot_data_rate_index",
        "mac_state.desired_parameters.ping_slot_data_rate_index_value",
    ),
];

/// Every plaintext key path of the schema, gating `DEVICES_READ_KEYS`.
fn plaintext_key_paths() -> &'static [String] {
    static PATHS: OnceLock<Vec<String>> = OnceLock::new();
    PATHS.get_or_init(|| {
        KEY_CONTAINER_PREFIXES
            .iter()
            .flat_map(|container| {
                SessionKeys::KEY_NAMES
                    .iter()
                    .map(move |name| format!("{container}.{name}.key"))
            })
            .collect()
    })
}

/// Every key-bearing path of the schema, gating `DEVICES_WRITE_KEYS`.
fn key_field_paths() -> &'static [String] {
    static PATHS: OnceLock<Vec<String>> = OnceLock::new();
    PATHS.get_or_init(|| {
        let mut paths = Vec::new();
        for container in KEY_CONTAINER_PREFIXES {
            paths.push(format!("{container}.session_key_id"));
            for name in SessionKeys::KEY_NAMES {
                for field in ["key", "encrypted_key", "kek_label"] {
                    paths.push(format!("{container}.{name}.{field}"));
                }
            }
        }
        paths
    })
}

fn as_strs(paths: &[String]) -> Vec<&str> {
    paths.iter().map(String::as_str).collect()
}

/// The end-device registry.
pub struct DeviceRegistry {
    devices: Arc<dyn DeviceStore>,
    key_vault: Arc<dyn KeyVault>,
    rights: Arc<dyn RightsFetcher>,
    events: Arc<dyn EventBus>,
    downlink_tasks: Arc<dyn DownlinkTaskQueue>,
    frequency_plans: Arc<dyn FrequencyPlanStore>,
    bands: Arc<BandRegistry>,
    config: RegistryConfig,
}

impl DeviceRegistry {
    /// Builds the registry over its collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        devices: Arc<dyn DeviceStore>,
        key_vault: Arc<dyn KeyVault>,
        rights: Arc<dyn RightsFetcher>,
        events: Arc<dyn EventBus>,
        downlink_tasks: Arc<dyn DownlinkTaskQueue>,
        frequency_plans: Arc<dyn FrequencyPlanStore>,
        bands: Arc<BandRegistry>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            devices,
            key_vault,
            rights,
            events,
            downlink_tasks,
            frequency_plans,
            bands,
            config,
        }
    }

    fn resolve_band(
        &self,
        frequency_plan_id: &str,
        phy_version: Option<PhyVersion>,
    ) -> Result<Band, RegistryError> {
        let plan = self.frequency_plans.get_by_id(frequency_plan_id)?;
        let version = phy_version
            .ok_or_else(|| RegistryError::invalid_field_value("lorawan_phy_version"))?;
        Ok(self.bands.get_by_id(&plan.band_id, version)?)
    }

    /// Reads a device projected onto the requested field mask.
    ///
    /// Requires `DEVICES_READ`; queued application downlinks additionally
    /// require `APPLICATION_LINK`, and plaintext key paths
    /// `DEVICES_READ_KEYS`. Requested plaintext keys are unwrapped through
    /// the key vault on the way out.
    ///
    /// # Errors
    ///
    /// Returns rights, store ([`StoreError::NotFound`] for absent devices)
    /// and vault errors, or [`RegistryError::InvalidFieldMask`] for paths
    /// outside the schema.
    pub async fn get(
        &self,
        ctx: &Context,
        application_id: &str,
        device_id: &str,
        paths: &[String],
    ) -> Result<EndDevice, RegistryError> {
        fieldmask::validate_paths(paths, device::field_paths())?;
        self.rights
            .require(ctx, application_id, Right::DevicesRead)
            .await?;
        if fieldmask::has_any_field(paths, &["queued_application_downlinks"]) {
            self.rights
                .require(ctx, application_id, Right::ApplicationLink)
                .await?;
        }

        let mut gets = paths.to_vec();
        if fieldmask::has_any_field(paths, &as_strs(plaintext_key_paths())) {
            self.rights
                .require(ctx, application_id, Right::DevicesReadKeys)
                .await?;
            for container in KEY_CONTAINER_PREFIXES {
                for name in SessionKeys::KEY_NAMES {
                    if fieldmask::has_any_field(paths, &[&format!("{container}.{name}.key")]) {
                        fieldmask::add_fields(
                            &mut gets,
                            &[
                                &format!("{container}.{name}.encrypted_key"),
                                &format!("{container}.{name}.kek_label"),
                            ],
                        );
                    }
                }
            }
        }
        for (legacy, source) in EXPONENT_DERIVED_FIELDS {
            if fieldmask::has_any_field(paths, &[legacy])
                && !fieldmask::has_any_field(&gets, &[source])
            {
                fieldmask::add_fields(&mut gets, &[source]);
            }
        }

        let mut device = self
            .devices
            .get_by_id(ctx, application_id, device_id, &gets)
            .await?;

        self.unwrap_requested_keys(ctx, &mut device, paths).await?;

        if let Some(mac_state) = device.mac_state.as_mut() {
            derive_legacy_parameters(
                paths,
                "mac_state.current_parameters",
                &mut mac_state.current_parameters,
            );
            derive_legacy_parameters(
                paths,
                "mac_state.desired_parameters",
                &mut mac_state.desired_parameters,
            );
        }

        Ok(device::filter_get(&device, paths))
    }

    async fn unwrap_requested_keys(
        &self,
        ctx: &Context,
        device: &mut EndDevice,
        paths: &[String],
    ) -> Result<(), RegistryError> {
        let join_accept_key_paths = [
            "mac_state.queued_join_accept.keys.app_s_key.key",
            "mac_state.queued_join_accept.keys.f_nwk_s_int_key.key",
            "mac_state.queued_join_accept.keys.nwk_s_enc_key.key",
            "mac_state.queued_join_accept.keys.s_nwk_s_int_key.key",
        ];
        if let Some(join_accept) = device
            .mac_state
            .as_mut()
            .and_then(|mac_state| mac_state.queued_join_accept.as_mut())
        {
            if fieldmask::has_any_field(paths, &join_accept_key_paths) {
                let app_s_key = join_accept.keys.app_s_key.take();
                let mut keys = vault::unwrap_selected_session_keys(
                    ctx,
                    self.key_vault.as_ref(),
                    join_accept.keys.clone(),
                    "mac_state.queued_join_accept.keys",
                    paths,
                )
                .await?;
                if fieldmask::has_any_field(
                    paths,
                    &["mac_state.queued_join_accept.keys.app_s_key.key"],
                ) {
                    if let Some(envelope) = app_s_key {
                        match vault::unwrap_aes128_key(ctx, &envelope, self.key_vault.as_ref())
                            .await
                        {
                            Ok(key) => keys.app_s_key = Some(KeyEnvelope::plain(key)),
                            // The join server may wrap the AppSKey under a
                            // KEK this network server does not hold; the
                            // key is then omitted from the response.
                            Err(err) if err.is_not_found() => {}
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
                join_accept.keys = keys;
            }
        }

        if let Some(session) = device.pending_session.as_mut() {
            if fieldmask::has_any_field(
                paths,
                &[
                    "pending_session.keys.f_nwk_s_int_key.key",
                    "pending_session.keys.nwk_s_enc_key.key",
                    "pending_session.keys.s_nwk_s_int_key.key",
                ],
            ) {
                session.keys = vault::unwrap_selected_session_keys(
                    ctx,
                    self.key_vault.as_ref(),
                    session.keys.clone(),
                    "pending_session.keys",
                    paths,
                )
                .await?;
            }
        }

        if let Some(session) = device.session.as_mut() {
            if fieldmask::has_any_field(
                paths,
                &[
                    "session.keys.f_nwk_s_int_key.key",
                    "session.keys.nwk_s_enc_key.key",
                    "session.keys.s_nwk_s_int_key.key",
                ],
            ) {
                session.keys = vault::unwrap_selected_session_keys(
                    ctx,
                    self.key_vault.as_ref(),
                    session.keys.clone(),
                    "session.keys",
                    paths,
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Creates or updates a device from the masked fields of `device`.
    ///
    /// Requires `DEVICES_WRITE`, plus `DEVICES_WRITE_KEYS` when any key
    /// field is set. Plaintext session keys are wrapped under the
    /// configured KEK before storage and reattached to the response.
    ///
    /// # Errors
    ///
    /// Returns validation errors ([`RegistryError::InvalidFieldValue`],
    /// [`RegistryError::InvalidFieldMask`], [`RegistryError::NoJoinEui`],
    /// [`RegistryError::NoDevEui`]) before any side effect, and rights,
    /// store, vault and band errors as they occur.
    pub async fn set(
        &self,
        ctx: &Context,
        device: EndDevice,
        paths: &[String],
    ) -> Result<EndDevice, RegistryError> {
        fieldmask::validate_paths(paths, device::field_paths())?;
        validate_set_fields(&device, paths)?;

        let application_id = device.ids.application_ids.application_id.clone();
        let device_id = device.ids.device_id.clone();
        self.rights
            .require(ctx, &application_id, Right::DevicesWrite)
            .await?;
        if fieldmask::has_any_field(paths, &as_strs(key_field_paths())) {
            self.rights
                .require(ctx, &application_id, Right::DevicesWriteKeys)
                .await?;
        }

        let mut input = device;
        let mut sets = paths.to_vec();
        let mut saved_plaintext: Vec<(&'static str, KeyEnvelope)> = Vec::new();
        for name in WRAPPED_SESSION_KEYS {
            if !fieldmask::has_any_field(paths, &[&format!("session.keys.{name}.key")]) {
                continue;
            }
            let Some(envelope) = input
                .session
                .as_ref()
                .and_then(|session| session.keys.envelope(name))
                .cloned()
            else {
                continue;
            };
            let Some(key) = envelope.plaintext().copied() else {
                continue;
            };
            let wrapped = vault::wrap_aes128_key(
                ctx,
                key,
                &self.config.device_kek_label,
                self.key_vault.as_ref(),
            )
            .await?;
            if let Some(slot) = input
                .session
                .as_mut()
                .and_then(|session| session.keys.envelope_mut(name))
            {
                *slot = Some(wrapped);
            }
            saved_plaintext.push((name, envelope));
            fieldmask::add_fields(
                &mut sets,
                &[
                    &format!("session.keys.{name}.encrypted_key"),
                    &format!("session.keys.{name}.kek_label"),
                ],
            );
        }

        let mut gets = paths.to_vec();
        let needs_downlink_check = DOWNLINK_TRIGGER_FIELDS
            .iter()
            .any(|field| fieldmask::touches(paths, field));
        if needs_downlink_check {
            fieldmask::add_fields(
                &mut gets,
                &[
                    "frequency_plan_id",
                    "last_dev_status_received_at",
                    "lorawan_phy_version",
                    "lorawan_version",
                    "mac_settings",
                    "mac_state",
                    "multicast",
                    "queued_application_downlinks",
                    "recent_uplinks",
                    "session.dev_addr",
                    "session.last_conf_f_cnt_down",
                    "session.last_f_cnt_up",
                    "session.last_n_f_cnt_down",
                    "supports_class_b",
                    "supports_class_c",
                    "supports_join",
                ],
            );
        }

        let mut event: Option<Event> = None;
        let base_sets = sets;
        let request_paths = paths.to_vec();
        let stored = self
            .devices
            .set_by_id(
                ctx,
                &application_id,
                &device_id,
                &gets,
                Box::new(|current| {
                    let mut device = input.clone();
                    let mut sets = base_sets.clone();
                    match current {
                        Some(current) => self.set_on_update(
                            current,
                            &mut device,
                            &mut sets,
                            &request_paths,
                            &mut event,
                        )?,
                        None => {
                            self.set_on_create(&mut device, &mut sets, &request_paths, &mut event)?;
                        }
                    }
                    Ok(Some((device, sets)))
                }),
            )
            .await?;
        let mut updated = stored.ok_or_else(|| {
            RegistryError::Store(StoreError::Backend {
                reason: "set transaction returned no device".to_string(),
            })
        })?;

        if let Some(event) = event {
            if let Err(err) = self.events.publish(event).await {
                warn!(error = %err, %device_id, "failed to publish end device event");
            }
        }
        if needs_downlink_check {
            if let Err(err) = self.downlink_tasks.add(ctx, &updated.ids, Utc::now()).await {
                error!(
                    error = %err,
                    %device_id,
                    "failed to update downlink task queue after device set"
                );
            }
        }

        for (name, envelope) in saved_plaintext {
            if let Some(slot) = updated
                .session
                .as_mut()
                .and_then(|session| session.keys.envelope_mut(name))
            {
                *slot = Some(envelope);
            }
        }
        Ok(device::filter_get(&updated, paths))
    }

    fn set_on_update(
        &self,
        current: &EndDevice,
        device: &mut EndDevice,
        sets: &mut Vec<String>,
        request_paths: &[String],
        event: &mut Option<Event>,
    ) -> Result<(), RegistryError> {
        *event = Some(events::update_end_device(
            &device.ids,
            request_paths.to_vec(),
        ));
        fieldmask::prohibit_fields(sets, &["ids.dev_addr", "multicast", "supports_join"])?;

        if fieldmask::has_any_field(sets, &["session.dev_addr"]) {
            if let Some(session) = device.session.as_ref() {
                device.ids.dev_addr = Some(session.dev_addr);
                fieldmask::add_fields(sets, &["ids.dev_addr"]);
            }
        }

        let radio_config_touched =
            fieldmask::has_any_field(sets, &["frequency_plan_id", "lorawan_phy_version"]);
        let first_session = fieldmask::touches(sets, "session")
            && device.session.is_some()
            && current.mac_state.is_none();

        if radio_config_touched || first_session {
            if !fieldmask::has_any_field(sets, &["frequency_plan_id"]) {
                device.frequency_plan_id = current.frequency_plan_id.clone();
            }
            if !fieldmask::has_any_field(sets, &["lorawan_phy_version"]) {
                device.lorawan_phy_version = current.lorawan_phy_version;
            }
            let band = self.resolve_band(&device.frequency_plan_id, device.lorawan_phy_version)?;

            // MAC state is synthesized exactly once, on the first Set that
            // supplies a session.
            if first_session {
                if !fieldmask::has_any_field(sets, &["lorawan_version"]) {
                    device.lorawan_version = current.lorawan_version;
                }
                self.provision_session(device, sets, &band)?;
            }
        }
        Ok(())
    }

    fn set_on_create(
        &self,
        device: &mut EndDevice,
        sets: &mut Vec<String>,
        request_paths: &[String],
        event: &mut Option<Event>,
    ) -> Result<(), RegistryError> {
        *event = Some(events::create_end_device(&device.ids, Vec::new()));
        fieldmask::require_fields(
            sets,
            &[
                "frequency_plan_id",
                "lorawan_phy_version",
                "lorawan_version",
                "supports_join",
            ],
        )?;
        let band = self.resolve_band(&device.frequency_plan_id, device.lorawan_phy_version)?;

        if fieldmask::has_any_field(sets, &["supports_class_b"]) && device.supports_class_b {
            if self.config.default_mac_settings.ping_slot_frequency.is_none()
                && band.ping_slot_frequency.is_none()
            {
                fieldmask::require_fields(sets, &["mac_settings.ping_slot_frequency.value"])?;
            }
            if self
                .config
                .default_mac_settings
                .ping_slot_periodicity
                .is_none()
                && fieldmask::has_any_field(request_paths, &["multicast"])
                && device.multicast
            {
                fieldmask::require_fields(sets, &["mac_settings.ping_slot_periodicity.value"])?;
            }
        }

        if let Some(dev_addr) = device.ids.dev_addr {
            let consistent = fieldmask::has_any_field(sets, &["session.dev_addr"])
                && device
                    .session
                    .as_ref()
                    .is_some_and(|session| session.dev_addr == dev_addr);
            if !consistent {
                return Err(RegistryError::invalid_field_value("ids.dev_addr"));
            }
        }

        fieldmask::add_fields(sets, &["ids.application_ids", "ids.device_id"]);
        if device.ids.join_eui.is_some() {
            fieldmask::add_fields(sets, &["ids.join_eui"]);
        }
        if device.ids.dev_eui.is_some_and(|eui| !eui.is_zero()) {
            fieldmask::add_fields(sets, &["ids.dev_eui"]);
        }

        if device.supports_join {
            if device.ids.join_eui.is_none() {
                return Err(RegistryError::NoJoinEui);
            }
            if device.ids.dev_eui.is_none() {
                return Err(RegistryError::NoDevEui);
            }
            // OTAA devices without a provisioned session persist as-is;
            // their session and MAC state materialize on join.
            if !fieldmask::touches(sets, "session") || device.session.is_none() {
                return Ok(());
            }
        }

        self.provision_session(device, sets, &band)
    }

    /// Validates and completes a newly supplied session, then synthesizes
    /// the device's initial MAC state.
    fn provision_session(
        &self,
        device: &mut EndDevice,
        sets: &mut Vec<String>,
        band: &Band,
    ) -> Result<(), RegistryError> {
        fieldmask::require_fields(
            sets,
            &["session.dev_addr", "session.keys.f_nwk_s_int_key.key"],
        )?;
        let Some(dev_addr) = device.session.as_ref().map(|session| session.dev_addr) else {
            return Err(RegistryError::invalid_field_value("session.dev_addr"));
        };
        device.ids.dev_addr = Some(dev_addr);
        fieldmask::add_fields(sets, &["ids.dev_addr"]);

        let lorawan_version = device
            .lorawan_version
            .ok_or_else(|| RegistryError::invalid_field_value("lorawan_version"))?;
        if lorawan_version >= MacVersion::V1_1 {
            fieldmask::require_fields(
                sets,
                &[
                    "session.keys.nwk_s_enc_key.key",
                    "session.keys.s_nwk_s_int_key.key",
                ],
            )?;
        } else {
            fieldmask::prohibit_fields(
                sets,
                &[
                    "session.keys.nwk_s_enc_key.encrypted_key",
                    "session.keys.nwk_s_enc_key.kek_label",
                    "session.keys.nwk_s_enc_key.key",
                    "session.keys.s_nwk_s_int_key.encrypted_key",
                    "session.keys.s_nwk_s_int_key.kek_label",
                    "session.keys.s_nwk_s_int_key.key",
                ],
            )?;
            if let Some(session) = device.session.as_mut() {
                session.keys.nwk_s_enc_key = session.keys.f_nwk_s_int_key.clone();
                session.keys.s_nwk_s_int_key = session.keys.f_nwk_s_int_key.clone();
            }
            fieldmask::add_fields(
                sets,
                &[
                    "session.keys.nwk_s_enc_key.encrypted_key",
                    "session.keys.nwk_s_enc_key.kek_label",
                    "session.keys.s_nwk_s_int_key.encrypted_key",
                    "session.keys.s_nwk_s_int_key.kek_label",
                ],
            );
        }

        if fieldmask::has_any_field(sets, &["session.started_at"]) {
            if device
                .session
                .as_ref()
                .is_some_and(|session| session.started_at.is_none())
            {
                return Err(RegistryError::invalid_field_value("session.started_at"));
            }
        } else {
            if let Some(session) = device.session.as_mut() {
                session.started_at = Some(Utc::now());
            }
            fieldmask::add_fields(sets, &["session.started_at"]);
        }

        let mac_state =
            mac_state::new_mac_state(device, band, &self.config.default_mac_settings)?;
        device.mac_state = Some(mac_state);
        fieldmask::add_fields(sets, &["mac_state"]);
        Ok(())
    }

    /// Deletes a device. Deleting an absent device succeeds and emits no
    /// event.
    ///
    /// Requires `DEVICES_WRITE`.
    ///
    /// # Errors
    ///
    /// Returns rights and store errors.
    pub async fn delete(
        &self,
        ctx: &Context,
        application_id: &str,
        device_id: &str,
    ) -> Result<(), RegistryError> {
        self.rights
            .require(ctx, application_id, Right::DevicesWrite)
            .await?;
        let mut event: Option<Event> = None;
        self.devices
            .set_by_id(
                ctx,
                application_id,
                device_id,
                &[],
                Box::new(|current| {
                    event = current.map(|device| events::delete_end_device(&device.ids));
                    Ok(None)
                }),
            )
            .await?;
        if let Some(event) = event {
            if let Err(err) = self.events.publish(event).await {
                warn!(error = %err, %device_id, "failed to publish end device event");
            }
        }
        Ok(())
    }
}

/// Pre-transaction validation of a Set request, before any side effect.
fn validate_set_fields(device: &EndDevice, paths: &[String]) -> Result<(), RegistryError> {
    if fieldmask::has_any_field(paths, &["frequency_plan_id"]) && device.frequency_plan_id.is_empty()
    {
        return Err(RegistryError::invalid_field_value("frequency_plan_id"));
    }
    if fieldmask::has_any_field(paths, &["lorawan_phy_version"])
        && device.lorawan_phy_version.is_none()
    {
        return Err(RegistryError::invalid_field_value("lorawan_phy_version"));
    }
    if fieldmask::has_any_field(paths, &["lorawan_version"]) && device.lorawan_version.is_none() {
        return Err(RegistryError::invalid_field_value("lorawan_version"));
    }

    if fieldmask::has_any_field(paths, &["session.dev_addr"])
        && !device
            .session
            .as_ref()
            .is_some_and(|session| !session.dev_addr.is_zero())
    {
        return Err(RegistryError::invalid_field_value("session.dev_addr"));
    }
    for name in WRAPPED_SESSION_KEYS {
        let path = format!("session.keys.{name}.key");
        if fieldmask::has_any_field(paths, &[&path])
            && !device
                .session
                .as_ref()
                .and_then(|session| session.keys.envelope(name))
                .and_then(KeyEnvelope::plaintext)
                .is_some_and(|key| !key.is_zero())
        {
            return Err(RegistryError::InvalidFieldValue { field: path });
        }
    }
    if fieldmask::has_any_field(paths, &["session.keys.session_key_id"])
        && !device
            .session
            .as_ref()
            .and_then(|session| session.keys.session_key_id.as_ref())
            .is_some_and(|id| !id.is_empty())
    {
        return Err(RegistryError::invalid_field_value(
            "session.keys.session_key_id",
        ));
    }

    if fieldmask::has_any_field(paths, &["multicast"])
        && fieldmask::has_any_field(paths, &["supports_join"])
        && device.multicast
        && device.supports_join
    {
        return Err(RegistryError::invalid_field_value("supports_join"));
    }
    Ok(())
}

fn derive_legacy_parameters(paths: &[String], prefix: &str, parameters: &mut MacParameters) {
    if fieldmask::has_any_field(paths, &[&format!("{prefix}.adr_ack_delay")]) {
        if let Some(exponent) = parameters.adr_ack_delay_exponent {
            parameters.adr_ack_delay = 1u32.checked_shl(exponent.value).unwrap_or(u32::MAX);
        }
    }
    if fieldmask::has_any_field(paths, &[&format!("{prefix}.adr_ack_limit")]) {
        if let Some(exponent) = parameters.adr_ack_limit_exponent {
            parameters.adr_ack_limit = 1u32.checked_shl(exponent.value).unwrap_or(u32::MAX);
        }
    }
    if fieldmask::has_any_field(paths, &[&format!("{prefix}.ping_slot_data_rate_index")]) {
        if let Some(value) = parameters.ping_slot_data_rate_index_value {
            parameters.ping_slot_data_rate_index = value.value;
        }
    }
}
