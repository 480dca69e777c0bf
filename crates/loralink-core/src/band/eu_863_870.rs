//! The European 863-870 MHz band.

use std::collections::BTreeMap;

use crate::types::PhyVersion;

use super::{
    fsk_data_rate, lora_data_rate, Band, Beacon, BeaconFrequencies, CfListType, Channel,
    ChannelMaskScheme, Overlay, Region, Rx1Channel, Rx1DataRateTable, Rx2Parameters, SubBand,
    DEFAULT_ADR_ACK_DELAY, DEFAULT_ADR_ACK_LIMIT, DEFAULT_JOIN_ACCEPT_DELAY_1,
    DEFAULT_JOIN_ACCEPT_DELAY_2, DEFAULT_MAX_ACK_TIMEOUT, DEFAULT_MAX_F_CNT_GAP,
    DEFAULT_MIN_ACK_TIMEOUT, DEFAULT_RECEIVE_DELAY_1, DEFAULT_RECEIVE_DELAY_2, EIRP_DELTA,
    EU_CN_TX_OFFSETS,
};

const BEACON_FREQUENCY: u64 = 869_525_000;

pub(crate) fn band() -> Band {
    let default_channels = vec![
        Channel {
            frequency: 868_100_000,
            min_data_rate: 0,
            max_data_rate: 5,
        },
        Channel {
            frequency: 868_300_000,
            min_data_rate: 0,
            max_data_rate: 5,
        },
        Channel {
            frequency: 868_500_000,
            min_data_rate: 0,
            max_data_rate: 5,
        },
    ];

    Band {
        id: Region::Eu863_870,

        max_uplink_channels: 16,
        uplink_channels: default_channels.clone(),
        max_downlink_channels: 16,
        downlink_channels: default_channels,

        // ETSI EN 300.220-2 V3.1.1 (2017-02); band O is skipped.
        sub_bands: vec![
            SubBand {
                // Band K
                min_frequency: 863_000_000,
                max_frequency: 865_000_000,
                duty_cycle: 0.001,
                max_eirp: 14.0 + EIRP_DELTA,
            },
            SubBand {
                // Band L
                min_frequency: 865_000_000,
                max_frequency: 868_000_000,
                duty_cycle: 0.01,
                max_eirp: 14.0 + EIRP_DELTA,
            },
            SubBand {
                // Band M
                min_frequency: 868_000_000,
                max_frequency: 868_600_000,
                duty_cycle: 0.01,
                max_eirp: 14.0 + EIRP_DELTA,
            },
            SubBand {
                // Band N
                min_frequency: 868_700_000,
                max_frequency: 869_200_000,
                duty_cycle: 0.001,
                max_eirp: 14.0 + EIRP_DELTA,
            },
            SubBand {
                // Band P
                min_frequency: 869_400_000,
                max_frequency: 869_650_000,
                duty_cycle: 0.1,
                max_eirp: 27.0 + EIRP_DELTA,
            },
            SubBand {
                // Band R
                min_frequency: 869_700_000,
                max_frequency: 870_000_000,
                duty_cycle: 0.01,
                max_eirp: 14.0 + EIRP_DELTA,
            },
        ],

        data_rates: BTreeMap::from([
            (0, lora_data_rate(12, 125_000, 59)),
            (1, lora_data_rate(11, 125_000, 59)),
            (2, lora_data_rate(10, 125_000, 59)),
            (3, lora_data_rate(9, 125_000, 123)),
            (4, lora_data_rate(8, 125_000, 230)),
            (5, lora_data_rate(7, 125_000, 230)),
            (6, lora_data_rate(7, 250_000, 230)),
            (7, fsk_data_rate(50_000, 230)),
        ]),
        max_adr_data_rate_index: 5,

        receive_delay_1: DEFAULT_RECEIVE_DELAY_1,
        receive_delay_2: DEFAULT_RECEIVE_DELAY_2,
        join_accept_delay_1: DEFAULT_JOIN_ACCEPT_DELAY_1,
        join_accept_delay_2: DEFAULT_JOIN_ACCEPT_DELAY_2,
        max_f_cnt_gap: DEFAULT_MAX_F_CNT_GAP,
        adr_ack_limit: DEFAULT_ADR_ACK_LIMIT,
        adr_ack_delay: DEFAULT_ADR_ACK_DELAY,
        min_ack_timeout: DEFAULT_MIN_ACK_TIMEOUT,
        max_ack_timeout: DEFAULT_MAX_ACK_TIMEOUT,

        default_max_eirp: 16.0,
        tx_offsets: EU_CN_TX_OFFSETS,
        max_tx_power_index: 5,

        rx1_channel: Rx1Channel::Identity,
        rx1_data_rates: Rx1DataRateTable::new(vec![
            vec![0, 0, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0, 0],
            vec![2, 1, 0, 0, 0, 0],
            vec![3, 2, 1, 0, 0, 0],
            vec![4, 3, 2, 1, 0, 0],
            vec![5, 4, 3, 2, 1, 0],
            vec![6, 5, 4, 3, 2, 1],
            vec![7, 6, 5, 4, 3, 2],
        ]),

        channel_mask: ChannelMaskScheme::Mask16,

        lora_coding_rate: "4/5",

        freq_multiplier: 100,
        implements_cf_list: true,
        cf_list_type: CfListType::Frequencies,

        default_rx2: Rx2Parameters {
            data_rate_index: 0,
            frequency: BEACON_FREQUENCY,
        },
        beacon: Beacon {
            data_rate_index: 3,
            coding_rate: "4/5",
            frequencies: BeaconFrequencies::Fixed(BEACON_FREQUENCY),
        },
        ping_slot_frequency: Some(BEACON_FREQUENCY),
        tx_param_setup_req_support: false,

        overlays: BTreeMap::from([
            (PhyVersion::V1_0, Overlay::Identity),
            (PhyVersion::V1_0_1, Overlay::Identity),
            (PhyVersion::V1_0_2RevA, Overlay::Identity),
            (PhyVersion::V1_0_2RevB, Overlay::SetMaxTxPowerIndex(7)),
            (PhyVersion::V1_0_3RevA, Overlay::Identity),
            (PhyVersion::V1_1RevA, Overlay::Identity),
        ]),
    }
}
