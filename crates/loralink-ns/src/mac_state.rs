//! Initial MAC state synthesis.
//!
//! When a device first gains a session, the registry materializes its MAC
//! state from the band's defaults, layered with the network-wide default
//! MAC settings and the device's own overrides.

use loralink_core::band::{Band, BeaconFrequencies};

use crate::device::{
    AdrAckExponentValue, DataRateIndexValue, DeviceClass, EndDevice, MacChannel, MacParameters,
    MacSettings, MacState,
};
use crate::error::RegistryError;

fn setting<T>(
    device_settings: Option<&MacSettings>,
    defaults: &MacSettings,
    pick: impl Fn(&MacSettings) -> Option<T>,
) -> Option<T> {
    device_settings.and_then(&pick).or_else(|| pick(defaults))
}

/// The device class a freshly initialized MAC state operates in.
///
/// Unicast devices start in class A regardless of their capabilities;
/// multicast groups have no join or class negotiation and start directly
/// in class B or C.
fn initial_device_class(device: &EndDevice) -> DeviceClass {
    if !device.multicast {
        DeviceClass::A
    } else if device.supports_class_b {
        DeviceClass::B
    } else {
        DeviceClass::C
    }
}

/// Synthesizes the initial MAC state of `device` on `band`.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidFieldValue`] when the device carries no
/// LoRaWAN version.
#[allow(clippy::cast_possible_truncation)]
pub fn new_mac_state(
    device: &EndDevice,
    band: &Band,
    defaults: &MacSettings,
) -> Result<MacState, RegistryError> {
    let lorawan_version = device
        .lorawan_version
        .ok_or_else(|| RegistryError::invalid_field_value("lorawan_version"))?;
    let settings = device.mac_settings.as_ref();

    let channels: Vec<MacChannel> = band
        .uplink_channels
        .iter()
        .enumerate()
        .map(|(i, channel)| {
            let downlink_frequency = if band.downlink_channels.is_empty() {
                channel.frequency
            } else {
                let index = usize::from(band.rx1_channel_index(i as u8));
                band.downlink_channels[index % band.downlink_channels.len()].frequency
            };
            MacChannel {
                uplink_frequency: channel.frequency,
                downlink_frequency,
                min_data_rate_index: channel.min_data_rate,
                max_data_rate_index: channel.max_data_rate,
                enable_uplink: true,
            }
        })
        .collect();

    let rx1_delay = setting(settings, defaults, |s| s.rx1_delay)
        .map_or(band.receive_delay_1.as_secs() as u32, |delay| delay.value);

    let ping_slot_frequency = setting(settings, defaults, |s| s.ping_slot_frequency)
        .map(|frequency| frequency.value)
        .or(band.ping_slot_frequency)
        .unwrap_or(0);
    let ping_slot_data_rate_index = setting(settings, defaults, |s| s.ping_slot_data_rate_index)
        .map_or(band.beacon.data_rate_index, |index| index.value);

    let beacon_frequency = match band.beacon.frequencies {
        BeaconFrequencies::Fixed(frequency) => frequency,
        BeaconFrequencies::Hopping(_) => 0,
    };

    let current = MacParameters {
        max_eirp: band.default_max_eirp,
        adr_data_rate_index: 0,
        adr_tx_power_index: 0,
        adr_nb_trans: 1,
        adr_ack_limit: band.adr_ack_limit,
        adr_ack_limit_exponent: Some(AdrAckExponentValue {
            value: band.adr_ack_limit.trailing_zeros(),
        }),
        adr_ack_delay: band.adr_ack_delay,
        adr_ack_delay_exponent: Some(AdrAckExponentValue {
            value: band.adr_ack_delay.trailing_zeros(),
        }),
        rx1_delay,
        rx1_data_rate_offset: 0,
        rx2_data_rate_index: band.default_rx2.data_rate_index,
        rx2_frequency: band.default_rx2.frequency,
        ping_slot_frequency,
        ping_slot_data_rate_index,
        ping_slot_data_rate_index_value: Some(DataRateIndexValue {
            value: ping_slot_data_rate_index,
        }),
        beacon_frequency,
        channels,
    };

    let mut desired = current.clone();
    if let Some(index) = setting(settings, defaults, |s| s.rx2_data_rate_index) {
        desired.rx2_data_rate_index = index.value;
    }
    if let Some(frequency) = setting(settings, defaults, |s| s.rx2_frequency) {
        desired.rx2_frequency = frequency.value;
    }

    Ok(MacState {
        current_parameters: current,
        desired_parameters: desired,
        device_class: initial_device_class(device),
        lorawan_version,
        queued_join_accept: None,
        ping_slot_periodicity: setting(settings, defaults, |s| s.ping_slot_periodicity),
    })
}

#[cfg(test)]
mod unit_tests {
    use loralink_core::band::{Region, Registry};
    use loralink_core::types::{MacVersion, PhyVersion};

    use crate::device::{DataRateIndexValue, FrequencyValue, RxDelayValue};

    use super::*;

    fn eu_band() -> Band {
        Registry::new()
            .get(Region::Eu863_870, PhyVersion::V1_0_2RevB)
            .unwrap()
    }

    fn base_device() -> EndDevice {
        EndDevice {
            lorawan_version: Some(MacVersion::V1_0_2),
            lorawan_phy_version: Some(PhyVersion::V1_0_2RevB),
            ..EndDevice::default()
        }
    }

    #[test]
    fn test_state_mirrors_band_defaults() {
        let state = new_mac_state(&base_device(), &eu_band(), &MacSettings::default()).unwrap();
        assert_eq!(state.device_class, DeviceClass::A);
        assert_eq!(state.lorawan_version, MacVersion::V1_0_2);
        assert!(state.queued_join_accept.is_none());

        let current = &state.current_parameters;
        assert_eq!(current.rx1_delay, 1);
        assert_eq!(current.rx2_data_rate_index, 0);
        assert_eq!(current.rx2_frequency, 869_525_000);
        assert_eq!(current.adr_ack_limit, 64);
        assert_eq!(current.adr_ack_limit_exponent.unwrap().value, 6);
        assert_eq!(current.adr_ack_delay_exponent.unwrap().value, 5);
        assert_eq!(current.channels.len(), 3);
        assert_eq!(current.channels[1].uplink_frequency, 868_300_000);
        assert_eq!(current.channels[1].downlink_frequency, 868_300_000);
        assert_eq!(current.beacon_frequency, 869_525_000);
        assert_eq!(current.ping_slot_frequency, 869_525_000);
    }

    #[test]
    fn test_settings_override_desired_parameters() {
        let mut device = base_device();
        device.mac_settings = Some(MacSettings {
            rx1_delay: Some(RxDelayValue { value: 5 }),
            rx2_data_rate_index: Some(DataRateIndexValue { value: 3 }),
            rx2_frequency: Some(FrequencyValue { value: 869_100_000 }),
            ..MacSettings::default()
        });

        let state = new_mac_state(&device, &eu_band(), &MacSettings::default()).unwrap();
        assert_eq!(state.current_parameters.rx1_delay, 5);
        // Current Rx2 keeps the band default; desired carries the override.
        assert_eq!(state.current_parameters.rx2_data_rate_index, 0);
        assert_eq!(state.desired_parameters.rx2_data_rate_index, 3);
        assert_eq!(state.desired_parameters.rx2_frequency, 869_100_000);
    }

    #[test]
    fn test_network_defaults_apply_beneath_device_settings() {
        let defaults = MacSettings {
            rx2_data_rate_index: Some(DataRateIndexValue { value: 2 }),
            ..MacSettings::default()
        };
        let state = new_mac_state(&base_device(), &eu_band(), &defaults).unwrap();
        assert_eq!(state.desired_parameters.rx2_data_rate_index, 2);
    }

    #[test]
    fn test_multicast_class_selection() {
        let mut device = base_device();
        device.multicast = true;
        let state = new_mac_state(&device, &eu_band(), &MacSettings::default()).unwrap();
        assert_eq!(state.device_class, DeviceClass::C);

        device.supports_class_b = true;
        let state = new_mac_state(&device, &eu_band(), &MacSettings::default()).unwrap();
        assert_eq!(state.device_class, DeviceClass::B);
    }

    #[test]
    fn test_us_band_channel_mapping() {
        let band = Registry::new()
            .get(Region::Us902_928, PhyVersion::V1_0_3RevA)
            .unwrap();
        let state = new_mac_state(&base_device(), &band, &MacSettings::default()).unwrap();
        let channels = &state.current_parameters.channels;
        assert_eq!(channels.len(), 72);
        assert_eq!(channels[9].uplink_frequency, 904_100_000);
        // Rx1 downlink channel is the uplink index modulo 8.
        assert_eq!(channels[9].downlink_frequency, 923_900_000);
        // US beacons hop, so no fixed beacon or ping-slot frequency.
        assert_eq!(state.current_parameters.beacon_frequency, 0);
        assert_eq!(state.current_parameters.ping_slot_frequency, 0);
    }

    #[test]
    fn test_missing_lorawan_version_is_rejected() {
        let mut device = base_device();
        device.lorawan_version = None;
        let err = new_mac_state(&device, &eu_band(), &MacSettings::default()).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidFieldValue { field } if field == "lorawan_version"));
    }
}
