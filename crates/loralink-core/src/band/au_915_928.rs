//! The Australian 915-928 MHz band.

use std::collections::BTreeMap;

use crate::types::PhyVersion;

use super::{
    lora_data_rate, us_au_beacon_frequencies, us_au_tx_offsets, Band, Beacon, BeaconFrequencies,
    CfListType, Channel, ChannelMaskScheme, DataRate, DataRateIndex, Overlay, Region, Rx1Channel,
    Rx1DataRateTable, Rx2Parameters, SubBand, DEFAULT_ADR_ACK_DELAY, DEFAULT_ADR_ACK_LIMIT,
    DEFAULT_JOIN_ACCEPT_DELAY_1, DEFAULT_JOIN_ACCEPT_DELAY_2, DEFAULT_MAX_ACK_TIMEOUT,
    DEFAULT_MAX_F_CNT_GAP, DEFAULT_MIN_ACK_TIMEOUT, DEFAULT_RECEIVE_DELAY_1,
    DEFAULT_RECEIVE_DELAY_2,
};

/// 500 kHz downlink data rates shared by every revision of the band.
fn downlink_data_rates() -> [(DataRateIndex, DataRate); 6] {
    [
        (8, lora_data_rate(12, 500_000, 41)),
        (9, lora_data_rate(11, 500_000, 117)),
        (10, lora_data_rate(10, 500_000, 230)),
        (11, lora_data_rate(9, 500_000, 230)),
        (12, lora_data_rate(8, 500_000, 230)),
        (13, lora_data_rate(7, 500_000, 230)),
    ]
}

/// Data-rate table as revised in Regional Parameters 1.0.2 Rev B, which
/// moved the band from the US-style SF10-SF7 plan to the SF12-based plan.
pub(crate) fn data_rates_1_0_2() -> BTreeMap<DataRateIndex, DataRate> {
    let mut table = BTreeMap::from([
        (0, lora_data_rate(12, 125_000, 59)),
        (1, lora_data_rate(11, 125_000, 59)),
        (2, lora_data_rate(10, 125_000, 59)),
        (3, lora_data_rate(9, 125_000, 123)),
        (4, lora_data_rate(8, 125_000, 230)),
        (5, lora_data_rate(7, 125_000, 230)),
        (6, lora_data_rate(8, 500_000, 230)),
    ]);
    table.extend(downlink_data_rates());
    table
}

pub(crate) fn band() -> Band {
    let mut uplink_channels = Vec::with_capacity(72);
    for i in 0..64u64 {
        uplink_channels.push(Channel {
            frequency: 915_200_000 + 200_000 * i,
            min_data_rate: 0,
            max_data_rate: 3,
        });
    }
    for i in 0..8u64 {
        uplink_channels.push(Channel {
            frequency: 915_900_000 + 1_600_000 * i,
            min_data_rate: 4,
            max_data_rate: 4,
        });
    }

    let mut downlink_channels = Vec::with_capacity(8);
    for i in 0..8u64 {
        downlink_channels.push(Channel {
            frequency: 923_300_000 + 600_000 * i,
            min_data_rate: 8,
            max_data_rate: 13,
        });
    }

    let mut data_rates = BTreeMap::from([
        (0, lora_data_rate(10, 125_000, 19)),
        (1, lora_data_rate(9, 125_000, 61)),
        (2, lora_data_rate(8, 125_000, 133)),
        (3, lora_data_rate(7, 125_000, 250)),
        (4, lora_data_rate(8, 500_000, 250)),
    ]);
    data_rates.extend(downlink_data_rates());

    Band {
        id: Region::Au915_928,

        max_uplink_channels: 72,
        uplink_channels,
        max_downlink_channels: 8,
        downlink_channels,

        // Radiocommunications (Low Interference Potential Devices)
        // Class Licence 2015.
        sub_bands: vec![SubBand {
            min_frequency: 915_000_000,
            max_frequency: 928_000_000,
            duty_cycle: 1.0,
            max_eirp: 30.0,
        }],

        data_rates,
        max_adr_data_rate_index: 3,

        receive_delay_1: DEFAULT_RECEIVE_DELAY_1,
        receive_delay_2: DEFAULT_RECEIVE_DELAY_2,
        join_accept_delay_1: DEFAULT_JOIN_ACCEPT_DELAY_1,
        join_accept_delay_2: DEFAULT_JOIN_ACCEPT_DELAY_2,
        max_f_cnt_gap: DEFAULT_MAX_F_CNT_GAP,
        adr_ack_limit: DEFAULT_ADR_ACK_LIMIT,
        adr_ack_delay: DEFAULT_ADR_ACK_DELAY,
        min_ack_timeout: DEFAULT_MIN_ACK_TIMEOUT,
        max_ack_timeout: DEFAULT_MAX_ACK_TIMEOUT,

        default_max_eirp: 30.0,
        tx_offsets: us_au_tx_offsets(),
        max_tx_power_index: 10,

        rx1_channel: Rx1Channel::Modulo(8),
        rx1_data_rates: Rx1DataRateTable::new(vec![
            vec![8, 8, 8, 8, 8, 8],
            vec![9, 8, 8, 8, 8, 8],
            vec![10, 9, 8, 8, 8, 8],
            vec![11, 10, 9, 8, 8, 8],
            vec![12, 11, 10, 9, 8, 8],
            vec![13, 12, 11, 10, 9, 8],
            vec![13, 13, 12, 11, 10, 9],
        ]),

        channel_mask: ChannelMaskScheme::Mask72 { cntl5: false },

        lora_coding_rate: "4/5",

        freq_multiplier: 100,
        implements_cf_list: true,
        cf_list_type: CfListType::ChannelMasks,

        default_rx2: Rx2Parameters {
            data_rate_index: 8,
            frequency: 923_300_000,
        },
        beacon: Beacon {
            data_rate_index: 8,
            coding_rate: "4/5",
            frequencies: BeaconFrequencies::Hopping(us_au_beacon_frequencies()),
        },
        ping_slot_frequency: None,
        tx_param_setup_req_support: false,

        // Not defined in Regional Parameters 1.0.
        overlays: BTreeMap::from([
            (PhyVersion::V1_0_1, Overlay::Identity),
            (PhyVersion::V1_0_2RevA, Overlay::Identity),
            (
                PhyVersion::V1_0_2RevB,
                Overlay::Compose(vec![
                    Overlay::AuDataRates102,
                    Overlay::SetMaxTxPowerIndex(10),
                ]),
            ),
            (
                PhyVersion::V1_0_3RevA,
                Overlay::Compose(vec![
                    Overlay::EnableChMaskCntl5,
                    Overlay::EnableTxParamSetupReq,
                    Overlay::SetMaxTxPowerIndex(15),
                ]),
            ),
            (PhyVersion::V1_1RevA, Overlay::SetMaxTxPowerIndex(14)),
        ]),
    }
}
