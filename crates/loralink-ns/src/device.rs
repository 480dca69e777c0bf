//! The end-device schema and its field-mask engine.
//!
//! Devices are keyed by `(application_id, device_id)` and addressed through
//! dotted field-mask paths (`session.keys.f_nwk_s_int_key.key`). Projection
//! and merge operate on the serde value tree of the schema, so the path
//! vocabulary and the struct definitions cannot drift apart.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use loralink_core::band::DataRateIndex;
use loralink_core::types::{DevAddr, Eui64, MacVersion, PhyVersion, SessionKeys};

/// Application identifiers of a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationIdentifiers {
    /// Unique application identifier.
    pub application_id: String,
}

/// End-device identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndDeviceIdentifiers {
    /// Owning application.
    pub application_ids: ApplicationIdentifiers,
    /// Unique device identifier within the application.
    pub device_id: String,
    /// DevEUI, where assigned.
    pub dev_eui: Option<Eui64>,
    /// JoinEUI of the join server, for OTAA devices.
    pub join_eui: Option<Eui64>,
    /// Device address of the active session.
    ///
    /// Kept equal to `session.dev_addr` by the registry.
    pub dev_addr: Option<DevAddr>,
}

/// A wrapped boolean setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoolValue {
    /// The setting value.
    pub value: bool,
}

/// A wrapped frequency in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyValue {
    /// Frequency in Hz.
    pub value: u64,
}

/// A wrapped data-rate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataRateIndexValue {
    /// The data-rate index.
    pub value: DataRateIndex,
}

/// A wrapped Rx1 delay in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RxDelayValue {
    /// Delay in seconds.
    pub value: u32,
}

/// A wrapped class-B ping-slot periodicity exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PingSlotPeriodValue {
    /// Periodicity exponent: ping slots every `2^value` seconds.
    pub value: u32,
}

/// A wrapped ADR acknowledgement exponent.
///
/// The legacy counter representation equals `2^value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdrAckExponentValue {
    /// The exponent.
    pub value: u32,
}

/// Operator-provided MAC overrides for a device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacSettings {
    /// Rx1 delay override.
    pub rx1_delay: Option<RxDelayValue>,
    /// Rx2 data-rate override.
    pub rx2_data_rate_index: Option<DataRateIndexValue>,
    /// Rx2 frequency override.
    pub rx2_frequency: Option<FrequencyValue>,
    /// Class-B ping-slot frequency override.
    pub ping_slot_frequency: Option<FrequencyValue>,
    /// Class-B ping-slot periodicity override.
    pub ping_slot_periodicity: Option<PingSlotPeriodValue>,
    /// Class-B ping-slot data-rate override.
    pub ping_slot_data_rate_index: Option<DataRateIndexValue>,
    /// Whether the network should use ADR for this device.
    pub use_adr: Option<BoolValue>,
    /// Whether the device resets frame counters on reboot (ABP).
    pub resets_f_cnt: Option<BoolValue>,
    /// Whether the device keeps 32-bit frame counters.
    pub supports_32_bit_f_cnt: Option<BoolValue>,
}

/// The device class a MAC state operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Class A.
    #[default]
    #[serde(rename = "CLASS_A")]
    A,
    /// Class B.
    #[serde(rename = "CLASS_B")]
    B,
    /// Class C.
    #[serde(rename = "CLASS_C")]
    C,
}

/// One logical channel of a MAC parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacChannel {
    /// Uplink frequency in Hz.
    pub uplink_frequency: u64,
    /// Rx1 downlink frequency in Hz.
    pub downlink_frequency: u64,
    /// Lowest usable data-rate index.
    pub min_data_rate_index: DataRateIndex,
    /// Highest usable data-rate index.
    pub max_data_rate_index: DataRateIndex,
    /// Whether the channel is enabled for uplinks.
    pub enable_uplink: bool,
}

/// One side (current or desired) of a device's MAC parameters.
///
/// ADR acknowledgement limits and the ping-slot data rate carry both the
/// legacy counter representation and the exponent/value one; the registry
/// derives the legacy fields on read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacParameters {
    /// Maximum EIRP in dBm.
    pub max_eirp: f32,
    /// ADR data-rate index.
    pub adr_data_rate_index: DataRateIndex,
    /// ADR Tx-power index.
    pub adr_tx_power_index: u32,
    /// ADR transmission count per uplink.
    pub adr_nb_trans: u32,
    /// Legacy ADR acknowledgement limit counter.
    pub adr_ack_limit: u32,
    /// ADR acknowledgement limit exponent.
    pub adr_ack_limit_exponent: Option<AdrAckExponentValue>,
    /// Legacy ADR acknowledgement delay counter.
    pub adr_ack_delay: u32,
    /// ADR acknowledgement delay exponent.
    pub adr_ack_delay_exponent: Option<AdrAckExponentValue>,
    /// Rx1 delay in seconds.
    pub rx1_delay: u32,
    /// Rx1 data-rate offset.
    pub rx1_data_rate_offset: u32,
    /// Rx2 data-rate index.
    pub rx2_data_rate_index: DataRateIndex,
    /// Rx2 frequency in Hz.
    pub rx2_frequency: u64,
    /// Class-B ping-slot frequency in Hz; 0 when the band hops.
    pub ping_slot_frequency: u64,
    /// Legacy class-B ping-slot data-rate index.
    pub ping_slot_data_rate_index: DataRateIndex,
    /// Class-B ping-slot data-rate index, wrapped form.
    pub ping_slot_data_rate_index_value: Option<DataRateIndexValue>,
    /// Class-B beacon frequency in Hz; 0 when the band hops.
    pub beacon_frequency: u64,
    /// The channel plan.
    pub channels: Vec<MacChannel>,
}

/// A join-accept queued for delivery to the device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinAccept {
    /// Session keys derived for the pending session.
    pub keys: SessionKeys,
    /// Encrypted join-accept payload.
    pub payload: Vec<u8>,
}

/// The MAC state of a device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MacState {
    /// Parameters the device currently operates with.
    pub current_parameters: MacParameters,
    /// Parameters the network negotiates towards.
    pub desired_parameters: MacParameters,
    /// Device class of this state.
    pub device_class: DeviceClass,
    /// MAC version the state was negotiated under.
    pub lorawan_version: MacVersion,
    /// Join-accept awaiting delivery, for OTAA devices mid-join.
    pub queued_join_accept: Option<JoinAccept>,
    /// Negotiated class-B ping-slot periodicity.
    pub ping_slot_periodicity: Option<PingSlotPeriodValue>,
}

/// An active or pending device session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Device address of the session.
    pub dev_addr: DevAddr,
    /// Session keys.
    pub keys: SessionKeys,
    /// Last uplink frame counter.
    pub last_f_cnt_up: u32,
    /// Last network downlink frame counter.
    pub last_n_f_cnt_down: u32,
    /// Last confirmed downlink frame counter.
    pub last_conf_f_cnt_down: u32,
    /// When the session started.
    pub started_at: Option<DateTime<Utc>>,
}

/// An application downlink queued for the device.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDownlink {
    /// Session the downlink was encrypted under.
    pub session_key_id: Vec<u8>,
    /// FPort.
    pub f_port: u32,
    /// Downlink frame counter.
    pub f_cnt: u32,
    /// Encrypted application payload.
    pub frm_payload: Vec<u8>,
    /// Whether the downlink requires confirmation.
    pub confirmed: bool,
}

/// A compact record of a recently received uplink.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UplinkSummary {
    /// When the uplink was received.
    pub received_at: Option<DateTime<Utc>>,
    /// Carrier frequency in Hz.
    pub frequency: u64,
    /// Data-rate index the uplink used.
    pub data_rate_index: DataRateIndex,
}

/// A registered end device.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndDevice {
    /// Identifiers.
    pub ids: EndDeviceIdentifiers,
    /// When the record was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the record was last updated.
    pub updated_at: Option<DateTime<Utc>>,

    /// Identifier of the frequency plan the device operates in.
    pub frequency_plan_id: String,
    /// MAC version of the device.
    pub lorawan_version: Option<MacVersion>,
    /// Regional Parameters version of the device.
    pub lorawan_phy_version: Option<PhyVersion>,

    /// Whether the device joins over the air (OTAA).
    pub supports_join: bool,
    /// Whether the device supports class B.
    pub supports_class_b: bool,
    /// Whether the device supports class C.
    pub supports_class_c: bool,
    /// Whether this record is a multicast group rather than a device.
    pub multicast: bool,

    /// Operator MAC overrides.
    pub mac_settings: Option<MacSettings>,
    /// Current MAC state; absent until the first session exists.
    pub mac_state: Option<MacState>,

    /// Active session.
    pub session: Option<Session>,
    /// Pending session awaiting first uplink after a (re)join.
    pub pending_session: Option<Session>,

    /// When the last device status was received.
    pub last_dev_status_received_at: Option<DateTime<Utc>>,
    /// Recently received uplinks.
    pub recent_uplinks: Vec<UplinkSummary>,
    /// Application downlinks awaiting transmission.
    pub queued_application_downlinks: Vec<ApplicationDownlink>,
}

/// The session-key container prefixes of the schema.
pub const KEY_CONTAINER_PREFIXES: [&str; 3] = [
    "session.keys",
    "pending_session.keys",
    "mac_state.queued_join_accept.keys",
];

/// The valid field-mask paths of the end-device schema.
///
/// Listed at leaf granularity; mask validation admits ancestors of these.
pub fn field_paths() -> &'static [String] {
    static PATHS: OnceLock<Vec<String>> = OnceLock::new();
    PATHS.get_or_init(|| {
        let mut paths: Vec<String> = [
            "ids.application_ids.application_id",
            "ids.device_id",
            "ids.dev_eui",
            "ids.join_eui",
            "ids.dev_addr",
            "created_at",
            "updated_at",
            "frequency_plan_id",
            "lorawan_version",
            "lorawan_phy_version",
            "supports_join",
            "supports_class_b",
            "supports_class_c",
            "multicast",
            "mac_settings.rx1_delay.value",
            "mac_settings.rx2_data_rate_index.value",
            "mac_settings.rx2_frequency.value",
            "mac_settings.ping_slot_frequency.value",
            "mac_settings.ping_slot_periodicity.value",
            "mac_settings.ping_slot_data_rate_index.value",
            "mac_settings.use_adr.value",
            "mac_settings.resets_f_cnt.value",
            "mac_settings.supports_32_bit_f_cnt.value",
            "mac_state.device_class",
            "mac_state.lorawan_version",
            "mac_state.ping_slot_periodicity.value",
            "mac_state.queued_join_accept.payload",
            "last_dev_status_received_at",
            "recent_uplinks",
            "queued_application_downlinks",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        for side in ["current_parameters", "desired_parameters"] {
            for field in [
                "max_eirp",
                "adr_data_rate_index",
                "adr_tx_power_index",
                "adr_nb_trans",
                "adr_ack_limit",
                "adr_ack_limit_exponent",
                "adr_ack_delay",
                "adr_ack_delay_exponent",
                "rx1_delay",
                "rx1_data_rate_offset",
                "rx2_data_rate_index",
                "rx2_frequency",
                "ping_slot_frequency",
                "ping_slot_data_rate_index",
                "ping_slot_data_rate_index_value",
                "beacon_frequency",
                "channels",
            ] {
                paths.push(format!("mac_state.{side}.{field}"));
            }
        }

        for session in ["session", "pending_session"] {
            for field in [
                "dev_addr",
                "last_f_cnt_up",
                "last_n_f_cnt_down",
                "last_conf_f_cnt_down",
                "started_at",
                "keys.session_key_id",
            ] {
                paths.push(format!("{session}.{field}"));
            }
        }

        for container in KEY_CONTAINER_PREFIXES {
            paths.push(format!("{container}.session_key_id"));
            for key in SessionKeys::KEY_NAMES {
                for field in ["key", "encrypted_key", "kek_label"] {
                    paths.push(format!("{container}.{key}.{field}"));
                }
            }
        }

        paths
    })
}

fn to_value(device: &EndDevice) -> Value {
    serde_json::to_value(device).expect("end-device schema serializes")
}

fn json_pointer(path: &str) -> String {
    format!("/{}", path.replace('.', "/"))
}

fn set_path(tree: &mut Value, path: &str, subtree: Value) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };
    let mut node = tree;
    if let Some(parents) = parents {
        for segment in parents.split('.') {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            node = node
                .as_object_mut()
                .expect("node was made an object")
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    node.as_object_mut()
        .expect("node was made an object")
        .insert(leaf.to_string(), subtree);
}

fn remove_path(tree: &mut Value, path: &str) {
    let (parents, leaf) = match path.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, path),
    };
    let node = match parents {
        Some(parents) => match tree.pointer_mut(&json_pointer(parents)) {
            Some(node) => node,
            None => return,
        },
        None => tree,
    };
    if let Some(map) = node.as_object_mut() {
        map.remove(leaf);
    }
}

/// Projects a device onto the given field-mask paths.
///
/// Identifiers are always retained.
#[must_use]
pub fn filter_get<S: AsRef<str>>(device: &EndDevice, paths: &[S]) -> EndDevice {
    let source = to_value(device);
    let mut projected = Value::Object(Map::new());
    set_path(
        &mut projected,
        "ids",
        source.get("ids").cloned().unwrap_or(Value::Null),
    );
    for path in paths {
        let path = path.as_ref();
        if let Some(subtree) = source.pointer(&json_pointer(path)) {
            if !subtree.is_null() {
                set_path(&mut projected, path, subtree.clone());
            }
        }
    }
    serde_json::from_value(projected).expect("projection of a valid device deserializes")
}

/// Applies the `paths` subtrees of `source` onto `target`.
///
/// A path that is absent (or explicitly unset) in `source` clears the
/// corresponding field of `target`.
pub fn set_fields<S: AsRef<str>>(target: &mut EndDevice, source: &EndDevice, paths: &[S]) {
    let source = to_value(source);
    let mut tree = to_value(target);
    for path in paths {
        let path = path.as_ref();
        match source.pointer(&json_pointer(path)) {
            Some(subtree) if !subtree.is_null() => set_path(&mut tree, path, subtree.clone()),
            _ => remove_path(&mut tree, path),
        }
    }
    *target = serde_json::from_value(tree).expect("merge of valid devices deserializes");
}

#[cfg(test)]
mod unit_tests {
    use loralink_core::fieldmask::validate_paths;
    use loralink_core::types::{Aes128Key, KeyEnvelope};

    use super::*;

    fn sample_device() -> EndDevice {
        EndDevice {
            ids: EndDeviceIdentifiers {
                application_ids: ApplicationIdentifiers {
                    application_id: "app".to_string(),
                },
                device_id: "dev".to_string(),
                dev_eui: Some(Eui64([1; 8])),
                ..EndDeviceIdentifiers::default()
            },
            frequency_plan_id: "EU_863_870_TTN".to_string(),
            lorawan_version: Some(MacVersion::V1_0_2),
            lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
            session: Some(Session {
                dev_addr: DevAddr([0, 0, 0, 42]),
                keys: SessionKeys {
                    f_nwk_s_int_key: Some(KeyEnvelope::plain(Aes128Key([7; 16]))),
                    ..SessionKeys::default()
                },
                last_f_cnt_up: 41,
                ..Session::default()
            }),
            ..EndDevice::default()
        }
    }

    #[test]
    fn test_schema_paths_are_self_consistent() {
        // Every generated path resolves inside a fully populated tree.
        let schema = field_paths();
        assert!(validate_paths(&["session.keys.f_nwk_s_int_key.key"], schema).is_ok());
        assert!(validate_paths(&["session"], schema).is_ok());
        assert!(validate_paths(&["mac_state.current_parameters.adr_ack_limit"], schema).is_ok());
        assert!(validate_paths(&["flux_capacitor"], schema).is_err());
    }

    #[test]
    fn test_filter_get_projects_and_keeps_ids() {
        let device = sample_device();
        let projected = filter_get(&device, &["frequency_plan_id"]);
        assert_eq!(projected.ids, device.ids);
        assert_eq!(projected.frequency_plan_id, device.frequency_plan_id);
        assert!(projected.session.is_none());
        assert!(projected.lorawan_version.is_none());
    }

    #[test]
    fn test_filter_get_projects_nested_leaf() {
        let device = sample_device();
        let projected = filter_get(&device, &["session.dev_addr"]);
        let session = projected.session.expect("projected session");
        assert_eq!(session.dev_addr, DevAddr([0, 0, 0, 42]));
        assert_eq!(session.last_f_cnt_up, 0);
        assert!(session.keys.f_nwk_s_int_key.is_none());
    }

    #[test]
    fn test_set_fields_merges_subtrees() {
        let mut target = sample_device();
        let mut source = sample_device();
        source.frequency_plan_id = "US_902_928_FSB_2".to_string();
        if let Some(session) = source.session.as_mut() {
            session.dev_addr = DevAddr([1, 2, 3, 4]);
            session.last_f_cnt_up = 99;
        }

        set_fields(&mut target, &source, &["frequency_plan_id", "session.dev_addr"]);
        assert_eq!(target.frequency_plan_id, "US_902_928_FSB_2");
        let session = target.session.expect("session kept");
        assert_eq!(session.dev_addr, DevAddr([1, 2, 3, 4]));
        // Not in the mask, so the target value stays.
        assert_eq!(session.last_f_cnt_up, 41);
    }

    #[test]
    fn test_set_fields_clears_absent_sources() {
        let mut target = sample_device();
        let source = EndDevice::default();
        set_fields(&mut target, &source, &["session", "frequency_plan_id"]);
        assert!(target.session.is_none());
        assert_eq!(target.frequency_plan_id, "");
    }

    #[test]
    fn test_set_fields_creates_missing_containers() {
        let mut target = EndDevice::default();
        let source = sample_device();
        set_fields(&mut target, &source, &["session.dev_addr"]);
        let session = target.session.expect("session created");
        assert_eq!(session.dev_addr, DevAddr([0, 0, 0, 42]));
        assert!(session.keys.f_nwk_s_int_key.is_none());
    }

    #[test]
    fn test_envelope_paths_round_trip_through_merge() {
        let mut target = EndDevice::default();
        let mut source = sample_device();
        if let Some(session) = source.session.as_mut() {
            session.keys.f_nwk_s_int_key =
                Some(KeyEnvelope::wrapped(vec![1, 2, 3], "ns/kek".to_string()));
        }
        set_fields(
            &mut target,
            &source,
            &[
                "session.keys.f_nwk_s_int_key.encrypted_key",
                "session.keys.f_nwk_s_int_key.kek_label",
            ],
        );
        let envelope = target
            .session
            .expect("session created")
            .keys
            .f_nwk_s_int_key
            .expect("envelope created");
        assert_eq!(envelope.encrypted_key.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(envelope.kek_label.as_deref(), Some("ns/kek"));
        assert!(envelope.key.is_none());
    }
}
