//! End-to-end device registry scenarios over the in-memory collaborators.

use std::sync::Arc;

use loralink_core::band::Registry as BandRegistry;
use loralink_core::fieldmask::FieldMaskError;
use loralink_core::types::{
    Aes128Key, DevAddr, Eui64, KeyEnvelope, MacVersion, PhyVersion, SessionKeys,
};

use loralink_ns::config::RegistryConfig;
use loralink_ns::context::Context;
use loralink_ns::device::{
    ApplicationIdentifiers, EndDevice, EndDeviceIdentifiers, Session,
};
use loralink_ns::downlink::MemDownlinkTasks;
use loralink_ns::error::RegistryError;
use loralink_ns::events::{MemEventBus, EVT_CREATE_END_DEVICE, EVT_DELETE_END_DEVICE, EVT_UPDATE_END_DEVICE};
use loralink_ns::frequency_plans::StaticFrequencyPlans;
use loralink_ns::registry::DeviceRegistry;
use loralink_ns::rights::{MemRights, Right, RightsError};
use loralink_ns::store::{MemDeviceStore, StoreError};
use loralink_ns::vault::MemKeyVault;

const APP: &str = "test-app";
const DEV: &str = "test-dev";
const KEK_LABEL: &str = "ns/test-kek";

struct Harness {
    registry: DeviceRegistry,
    store: Arc<MemDeviceStore>,
    events: Arc<MemEventBus>,
    downlinks: Arc<MemDownlinkTasks>,
    rights: Arc<MemRights>,
}

fn harness() -> Harness {
    let store = Arc::new(MemDeviceStore::new());
    let vault = Arc::new(MemKeyVault::with_keks([(KEK_LABEL, vec![0x42u8; 16])]));
    let rights = Arc::new(MemRights::new());
    rights.grant(
        "admin",
        APP,
        &[
            Right::DevicesRead,
            Right::DevicesReadKeys,
            Right::DevicesWrite,
            Right::DevicesWriteKeys,
            Right::ApplicationLink,
        ],
    );
    let events = Arc::new(MemEventBus::new());
    let downlinks = Arc::new(MemDownlinkTasks::new());
    let plans = Arc::new(StaticFrequencyPlans::with_plans([
        ("EU_863_870_TTN", "EU_863_870"),
        ("US_902_928_FSB_2", "US_902_928"),
    ]));
    let registry = DeviceRegistry::new(
        store.clone(),
        vault,
        rights.clone(),
        events.clone(),
        downlinks.clone(),
        plans,
        Arc::new(BandRegistry::new()),
        RegistryConfig {
            device_kek_label: KEK_LABEL.to_string(),
            ..RegistryConfig::default()
        },
    );
    Harness {
        registry,
        store,
        events,
        downlinks,
        rights,
    }
}

fn admin() -> Context {
    Context::new("admin")
}

fn paths(entries: &[&str]) -> Vec<String> {
    entries.iter().map(ToString::to_string).collect()
}

fn ids() -> EndDeviceIdentifiers {
    EndDeviceIdentifiers {
        application_ids: ApplicationIdentifiers {
            application_id: APP.to_string(),
        },
        device_id: DEV.to_string(),
        ..EndDeviceIdentifiers::default()
    }
}

fn f_nwk_s_int_key() -> Aes128Key {
    Aes128Key([0x5A; 16])
}

fn otaa_device() -> EndDevice {
    EndDevice {
        ids: EndDeviceIdentifiers {
            join_eui: Some(Eui64([0xAA; 8])),
            dev_eui: Some(Eui64([0xBB; 8])),
            ..ids()
        },
        frequency_plan_id: "EU_863_870_TTN".to_string(),
        lorawan_version: Some(MacVersion::V1_0_2),
        lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
        supports_join: true,
        ..EndDevice::default()
    }
}

fn abp_session(dev_addr: DevAddr) -> Session {
    Session {
        dev_addr,
        keys: SessionKeys {
            f_nwk_s_int_key: Some(KeyEnvelope::plain(f_nwk_s_int_key())),
            ..SessionKeys::default()
        },
        ..Session::default()
    }
}

const CREATE_MASK: [&str; 4] = [
    "frequency_plan_id",
    "lorawan_phy_version",
    "lorawan_version",
    "supports_join",
];

#[tokio::test]
async fn otaa_create_then_session_set_end_to_end() {
    let h = harness();
    let ctx = admin();

    // Create the OTAA device without a session.
    h.registry
        .set(&ctx, otaa_device(), &paths(&CREATE_MASK))
        .await
        .expect("OTAA create");

    let events = h.events.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, EVT_CREATE_END_DEVICE);
    assert!(!h.downlinks.take().is_empty(), "downlink recheck expected");

    let stored = h.store.raw(APP, DEV).expect("stored device");
    assert!(stored.supports_join);
    assert!(stored.session.is_none());
    assert!(stored.mac_state.is_none());
    assert_eq!(stored.ids.join_eui, Some(Eui64([0xAA; 8])));
    assert_eq!(stored.ids.dev_eui, Some(Eui64([0xBB; 8])));

    // Provision an ABP-style session on the existing record.
    let dev_addr = DevAddr([0x26, 0x01, 0x13, 0x37]);
    let update = EndDevice {
        ids: ids(),
        session: Some(abp_session(dev_addr)),
        ..EndDevice::default()
    };
    let returned = h
        .registry
        .set(
            &ctx,
            update,
            &paths(&["session.dev_addr", "session.keys.f_nwk_s_int_key.key"]),
        )
        .await
        .expect("session set");

    let events = h.events.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, EVT_UPDATE_END_DEVICE);
    assert!(!h.downlinks.take().is_empty(), "downlink recheck expected");

    let stored = h.store.raw(APP, DEV).expect("stored device");
    let session = stored.session.expect("session stored");
    assert_eq!(stored.ids.dev_addr, Some(dev_addr));
    assert_eq!(session.dev_addr, dev_addr);
    assert!(session.started_at.is_some());

    // Keys are wrapped at rest, and the 1.0.x network keys are synthesized
    // from FNwkSIntKey.
    let f_envelope = session.keys.f_nwk_s_int_key.expect("f_nwk envelope");
    assert!(f_envelope.key.is_none());
    assert_eq!(f_envelope.kek_label.as_deref(), Some(KEK_LABEL));
    assert_eq!(session.keys.nwk_s_enc_key.as_ref(), Some(&f_envelope));
    assert_eq!(session.keys.s_nwk_s_int_key.as_ref(), Some(&f_envelope));

    assert!(stored.mac_state.is_some(), "MAC state initialized");

    // The response carries the plaintext key back to the caller.
    let returned_key = returned
        .session
        .and_then(|session| session.keys.f_nwk_s_int_key)
        .and_then(|envelope| envelope.key);
    assert_eq!(returned_key, Some(f_nwk_s_int_key()));
}

#[tokio::test]
async fn abp_create_synthesizes_keys_and_mac_state() {
    let h = harness();
    let ctx = admin();
    let dev_addr = DevAddr([0x26, 0x00, 0x00, 0x01]);
    let device = EndDevice {
        ids: ids(),
        frequency_plan_id: "EU_863_870_TTN".to_string(),
        lorawan_version: Some(MacVersion::V1_0_2),
        lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
        session: Some(abp_session(dev_addr)),
        ..EndDevice::default()
    };
    let mut mask = paths(&CREATE_MASK);
    mask.extend(paths(&[
        "session.dev_addr",
        "session.keys.f_nwk_s_int_key.key",
    ]));

    h.registry.set(&ctx, device, &mask).await.expect("ABP create");

    let stored = h.store.raw(APP, DEV).expect("stored device");
    assert_eq!(stored.ids.dev_addr, Some(dev_addr));
    let keys = stored.session.expect("session").keys;
    assert_eq!(keys.nwk_s_enc_key, keys.f_nwk_s_int_key);
    assert_eq!(keys.s_nwk_s_int_key, keys.f_nwk_s_int_key);
    let mac_state = stored.mac_state.expect("MAC state");
    assert_eq!(mac_state.lorawan_version, MacVersion::V1_0_2);
    assert_eq!(mac_state.current_parameters.channels.len(), 3);
}

#[tokio::test]
async fn lorawan_1_1_requires_the_full_key_set() {
    let h = harness();
    let ctx = admin();
    let device = EndDevice {
        ids: ids(),
        frequency_plan_id: "EU_863_870_TTN".to_string(),
        lorawan_version: Some(MacVersion::V1_1),
        lorawan_phy_version: Some(PhyVersion::V1_1RevA),
        session: Some(abp_session(DevAddr([1, 2, 3, 4]))),
        ..EndDevice::default()
    };
    let mut mask = paths(&CREATE_MASK);
    mask.extend(paths(&[
        "session.dev_addr",
        "session.keys.f_nwk_s_int_key.key",
    ]));

    let err = h.registry.set(&ctx, device, &mask).await.unwrap_err();
    match err {
        RegistryError::InvalidFieldMask(FieldMaskError::MissingField { path }) => {
            assert_eq!(path, "session.keys.nwk_s_enc_key.key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.store.raw(APP, DEV).is_none(), "no partial state");
    assert!(h.events.take().is_empty(), "no event on validation failure");
}

#[tokio::test]
async fn multicast_and_supports_join_are_mutually_exclusive() {
    let h = harness();
    let ctx = admin();
    let mut device = otaa_device();
    device.multicast = true;
    let mut mask = paths(&CREATE_MASK);
    mask.push("multicast".to_string());

    let err = h.registry.set(&ctx, device, &mask).await.unwrap_err();
    match err {
        RegistryError::InvalidFieldValue { field } => assert_eq!(field, "supports_join"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn session_dev_addr_without_f_nwk_key_is_rejected() {
    let h = harness();
    let ctx = admin();
    let device = EndDevice {
        ids: ids(),
        frequency_plan_id: "EU_863_870_TTN".to_string(),
        lorawan_version: Some(MacVersion::V1_0_2),
        lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
        session: Some(Session {
            dev_addr: DevAddr([1, 2, 3, 4]),
            ..Session::default()
        }),
        ..EndDevice::default()
    };
    let mut mask = paths(&CREATE_MASK);
    mask.push("session.dev_addr".to_string());

    let err = h.registry.set(&ctx, device, &mask).await.unwrap_err();
    assert!(
        matches!(
            err,
            RegistryError::InvalidFieldMask(FieldMaskError::MissingField { ref path })
                if path == "session.keys.f_nwk_s_int_key.key"
        ),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn plaintext_key_reads_are_gated_and_round_trip() {
    let h = harness();
    let ctx = admin();
    let dev_addr = DevAddr([0x26, 0x00, 0x00, 0x02]);
    let device = EndDevice {
        ids: ids(),
        frequency_plan_id: "EU_863_870_TTN".to_string(),
        lorawan_version: Some(MacVersion::V1_0_2),
        lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
        session: Some(abp_session(dev_addr)),
        ..EndDevice::default()
    };
    let mut mask = paths(&CREATE_MASK);
    mask.extend(paths(&[
        "session.dev_addr",
        "session.keys.f_nwk_s_int_key.key",
    ]));
    h.registry.set(&ctx, device, &mask).await.expect("create");

    // A caller without DEVICES_READ_KEYS is denied.
    h.rights.grant("reader", APP, &[Right::DevicesRead]);
    let reader = Context::new("reader");
    let err = h
        .registry
        .get(
            &reader,
            APP,
            DEV,
            &paths(&["session.keys.f_nwk_s_int_key.key"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Rights(RightsError::PermissionDenied {
            right: Right::DevicesReadKeys,
            ..
        })
    ));

    // With the right, the stored envelope unwraps to the original key.
    let device = h
        .registry
        .get(&ctx, APP, DEV, &paths(&["session.keys.f_nwk_s_int_key.key"]))
        .await
        .expect("get with keys");
    let envelope = device
        .session
        .and_then(|session| session.keys.f_nwk_s_int_key)
        .expect("envelope");
    assert_eq!(envelope.key, Some(f_nwk_s_int_key()));
}

#[tokio::test]
async fn get_projects_onto_the_requested_mask() {
    let h = harness();
    let ctx = admin();
    h.registry
        .set(&ctx, otaa_device(), &paths(&CREATE_MASK))
        .await
        .expect("create");

    let device = h
        .registry
        .get(&ctx, APP, DEV, &paths(&["frequency_plan_id"]))
        .await
        .expect("get");
    assert_eq!(device.frequency_plan_id, "EU_863_870_TTN");
    assert_eq!(device.ids.device_id, DEV, "identifiers always project");
    assert!(device.lorawan_version.is_none(), "unrequested field");

    let err = h.registry.get(&ctx, APP, "ghost", &paths(&["frequency_plan_id"])).await;
    assert!(matches!(
        err,
        Err(RegistryError::Store(StoreError::NotFound { .. }))
    ));
}

#[tokio::test]
async fn update_cannot_flip_identity_flags() {
    let h = harness();
    let ctx = admin();
    h.registry
        .set(&ctx, otaa_device(), &paths(&CREATE_MASK))
        .await
        .expect("create");
    h.events.take();

    let mut device = otaa_device();
    device.multicast = true;
    let err = h
        .registry
        .set(&ctx, device, &paths(&["multicast"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidFieldMask(FieldMaskError::ForbiddenField { ref path })
            if path == "multicast"
    ));
    assert!(h.events.take().is_empty(), "no event on rejected update");
}

#[tokio::test]
async fn delete_emits_one_event_only_when_the_device_existed() {
    let h = harness();
    let ctx = admin();

    // Deleting a nonexistent device succeeds silently.
    h.registry.delete(&ctx, APP, DEV).await.expect("idempotent delete");
    assert!(h.events.take().is_empty());

    h.registry
        .set(&ctx, otaa_device(), &paths(&CREATE_MASK))
        .await
        .expect("create");
    h.events.take();

    h.registry.delete(&ctx, APP, DEV).await.expect("delete");
    let events = h.events.take();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, EVT_DELETE_END_DEVICE);
    assert!(h.store.raw(APP, DEV).is_none());

    h.registry.delete(&ctx, APP, DEV).await.expect("second delete");
    assert!(h.events.take().is_empty());
}

#[tokio::test]
async fn writes_require_the_write_right() {
    let h = harness();
    h.rights.grant("reader", APP, &[Right::DevicesRead]);
    let reader = Context::new("reader");
    let err = h
        .registry
        .set(&reader, otaa_device(), &paths(&CREATE_MASK))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Rights(RightsError::PermissionDenied {
            right: Right::DevicesWrite,
            ..
        })
    ));
}

#[tokio::test]
async fn key_writes_require_the_write_keys_right() {
    let h = harness();
    h.rights.grant(
        "operator",
        APP,
        &[Right::DevicesRead, Right::DevicesWrite],
    );
    let operator = Context::new("operator");
    let device = EndDevice {
        ids: ids(),
        frequency_plan_id: "EU_863_870_TTN".to_string(),
        lorawan_version: Some(MacVersion::V1_0_2),
        lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
        session: Some(abp_session(DevAddr([1, 2, 3, 4]))),
        ..EndDevice::default()
    };
    let mut mask = paths(&CREATE_MASK);
    mask.extend(paths(&[
        "session.dev_addr",
        "session.keys.f_nwk_s_int_key.key",
    ]));
    let err = h.registry.set(&operator, device, &mask).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Rights(RightsError::PermissionDenied {
            right: Right::DevicesWriteKeys,
            ..
        })
    ));
}

#[tokio::test]
async fn unknown_mask_paths_are_rejected() {
    let h = harness();
    let ctx = admin();
    let err = h
        .registry
        .get(&ctx, APP, DEV, &paths(&["warp_drive.enabled"]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidFieldMask(FieldMaskError::UnknownField { .. })
    ));
}
