//! The United States 902-928 MHz band.

use std::collections::BTreeMap;

use crate::types::PhyVersion;

use super::{
    lora_data_rate, us_au_beacon_frequencies, us_au_tx_offsets, Band, Beacon, BeaconFrequencies,
    CfListType, Channel, ChannelMaskScheme, Overlay, Region, Rx1Channel, Rx1DataRateTable,
    Rx2Parameters, SubBand, DEFAULT_ADR_ACK_DELAY, DEFAULT_ADR_ACK_LIMIT,
    DEFAULT_JOIN_ACCEPT_DELAY_1, DEFAULT_JOIN_ACCEPT_DELAY_2, DEFAULT_MAX_ACK_TIMEOUT,
    DEFAULT_MAX_F_CNT_GAP, DEFAULT_MIN_ACK_TIMEOUT, DEFAULT_RECEIVE_DELAY_1,
    DEFAULT_RECEIVE_DELAY_2, EIRP_DELTA,
};

/// Beacon parameters as revised in Regional Parameters 1.0.2 Rev B.
pub(crate) fn beacon_1_0_2() -> Beacon {
    Beacon {
        data_rate_index: 8,
        coding_rate: "4/5",
        frequencies: BeaconFrequencies::Hopping(us_au_beacon_frequencies()),
    }
}

pub(crate) fn band() -> Band {
    let mut uplink_channels = Vec::with_capacity(72);
    for i in 0..64u64 {
        uplink_channels.push(Channel {
            frequency: 902_300_000 + 200_000 * i,
            min_data_rate: 0,
            max_data_rate: 3,
        });
    }
    for i in 0..8u64 {
        uplink_channels.push(Channel {
            frequency: 903_000_000 + 1_600_000 * i,
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

    Band {
        id: Region::Us902_928,

        max_uplink_channels: 72,
        uplink_channels,
        max_downlink_channels: 8,
        downlink_channels,

        // FCC rules for unlicensed wireless equipment in the ISM bands.
        sub_bands: vec![
            SubBand {
                min_frequency: 902_300_000,
                max_frequency: 914_900_000,
                duty_cycle: 1.0,
                max_eirp: 21.0 + EIRP_DELTA,
            },
            SubBand {
                min_frequency: 923_300_000,
                max_frequency: 927_500_000,
                duty_cycle: 1.0,
                max_eirp: 26.0 + EIRP_DELTA,
            },
        ],

        data_rates: BTreeMap::from([
            (0, lora_data_rate(10, 125_000, 19)),
            (1, lora_data_rate(9, 125_000, 61)),
            (2, lora_data_rate(8, 125_000, 133)),
            (3, lora_data_rate(7, 125_000, 250)),
            (4, lora_data_rate(8, 500_000, 250)),
            (8, lora_data_rate(12, 500_000, 41)),
            (9, lora_data_rate(11, 500_000, 117)),
            (10, lora_data_rate(10, 500_000, 230)),
            (11, lora_data_rate(9, 500_000, 230)),
            (12, lora_data_rate(8, 500_000, 230)),
            (13, lora_data_rate(7, 500_000, 230)),
        ]),
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
            vec![10, 9, 8, 8],
            vec![11, 10, 9, 8],
            vec![12, 11, 10, 9],
            vec![13, 12, 11, 10],
            vec![13, 13, 12, 11],
        ]),

        channel_mask: ChannelMaskScheme::Mask72 { cntl5: false },

        lora_coding_rate: "4/5",

        freq_multiplier: 100,
        implements_cf_list: false,
        cf_list_type: CfListType::ChannelMasks,

        default_rx2: Rx2Parameters {
            data_rate_index: 8,
            frequency: 923_300_000,
        },
        beacon: Beacon {
            data_rate_index: 10,
            coding_rate: "4/5",
            frequencies: BeaconFrequencies::Hopping(us_au_beacon_frequencies()),
        },
        ping_slot_frequency: None,
        tx_param_setup_req_support: false,

        overlays: BTreeMap::from([
            (PhyVersion::V1_0, Overlay::Identity),
            (PhyVersion::V1_0_1, Overlay::Identity),
            (PhyVersion::V1_0_2RevA, Overlay::Identity),
            (PhyVersion::V1_0_2RevB, Overlay::UsBeacon102),
            (
                PhyVersion::V1_0_3RevA,
                Overlay::Compose(vec![
                    Overlay::EnableCfList,
                    Overlay::EnableChMaskCntl5,
                    Overlay::SetMaxTxPowerIndex(15),
                ]),
            ),
            (PhyVersion::V1_1RevA, Overlay::SetMaxTxPowerIndex(14)),
        ]),
    }
}
