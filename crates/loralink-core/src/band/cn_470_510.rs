//! The Chinese 470-510 MHz band.

use std::collections::BTreeMap;

use crate::types::PhyVersion;

use super::{
    cn_beacon_frequencies, lora_data_rate, Band, Beacon, BeaconFrequencies, CfListType, Channel,
    ChannelMaskScheme, Overlay, Region, Rx1Channel, Rx1DataRateTable, Rx2Parameters, SubBand,
    DEFAULT_ADR_ACK_DELAY, DEFAULT_ADR_ACK_LIMIT, DEFAULT_JOIN_ACCEPT_DELAY_1,
    DEFAULT_JOIN_ACCEPT_DELAY_2, DEFAULT_MAX_ACK_TIMEOUT, DEFAULT_MAX_F_CNT_GAP,
    DEFAULT_MIN_ACK_TIMEOUT, DEFAULT_RECEIVE_DELAY_1, DEFAULT_RECEIVE_DELAY_2, EIRP_DELTA,
    EU_CN_TX_OFFSETS,
};

pub(crate) fn band() -> Band {
    let mut uplink_channels = Vec::with_capacity(96);
    for i in 0..96u64 {
        uplink_channels.push(Channel {
            frequency: 470_300_000 + 200_000 * i,
            min_data_rate: 0,
            max_data_rate: 5,
        });
    }

    let mut downlink_channels = Vec::with_capacity(48);
    for i in 0..48u64 {
        downlink_channels.push(Channel {
            frequency: 500_300_000 + 200_000 * i,
            min_data_rate: 0,
            max_data_rate: 5,
        });
    }

    Band {
        id: Region::Cn470_510,

        max_uplink_channels: 96,
        uplink_channels,
        max_downlink_channels: 48,
        downlink_channels,

        // IEEE 11-11/0972r0.
        sub_bands: vec![SubBand {
            min_frequency: 470_000_000,
            max_frequency: 510_000_000,
            duty_cycle: 1.0,
            max_eirp: 17.0 + EIRP_DELTA,
        }],

        data_rates: BTreeMap::from([
            (0, lora_data_rate(12, 125_000, 59)),
            (1, lora_data_rate(11, 125_000, 59)),
            (2, lora_data_rate(10, 125_000, 59)),
            (3, lora_data_rate(9, 125_000, 123)),
            (4, lora_data_rate(8, 125_000, 230)),
            (5, lora_data_rate(7, 125_000, 230)),
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

        default_max_eirp: 19.15,
        tx_offsets: EU_CN_TX_OFFSETS,
        max_tx_power_index: 7,

        rx1_channel: Rx1Channel::Modulo(48),
        rx1_data_rates: Rx1DataRateTable::new(vec![
            vec![0, 0, 0, 0, 0, 0],
            vec![1, 0, 0, 0, 0, 0],
            vec![2, 1, 0, 0, 0, 0],
            vec![3, 2, 1, 0, 0, 0],
            vec![4, 3, 2, 1, 0, 0],
            vec![5, 4, 3, 2, 1, 0],
        ]),

        channel_mask: ChannelMaskScheme::Mask96,

        lora_coding_rate: "4/5",

        freq_multiplier: 100,
        implements_cf_list: false,
        cf_list_type: CfListType::ChannelMasks,

        default_rx2: Rx2Parameters {
            data_rate_index: 0,
            frequency: 505_300_000,
        },
        beacon: Beacon {
            data_rate_index: 2,
            coding_rate: "4/5",
            frequencies: BeaconFrequencies::Hopping(cn_beacon_frequencies()),
        },
        ping_slot_frequency: None,
        tx_param_setup_req_support: false,

        // Not defined in Regional Parameters 1.0.
        overlays: BTreeMap::from([
            (PhyVersion::V1_0_1, Overlay::Identity),
            (PhyVersion::V1_0_2RevA, Overlay::Identity),
            (PhyVersion::V1_0_2RevB, Overlay::Identity),
            (PhyVersion::V1_0_3RevA, Overlay::EnableCfList),
            (PhyVersion::V1_1RevA, Overlay::Identity),
        ]),
    }
}
