//! The band registry: regional radio parameters for LoRaWAN.
//!
//! Each region is described by a [`Band`]: its frequency plan, data-rate
//! table, sub-band regulations, timing constants and MAC capabilities. A
//! band is stored in its oldest supported form together with a catalog of
//! per-revision [`Overlay`] transforms; materializing a band for a given
//! Regional Parameters version composes the overlays of every revision up
//! to and including the requested one, in ascending order.

mod au_915_928;
mod chmask;
mod cn_470_510;
mod eu_863_870;
mod us_902_928;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::types::PhyVersion;

pub use chmask::{ChMaskCntlPair, ChannelMaskScheme};

/// Index into a band's data-rate table.
pub type DataRateIndex = u8;

/// Errors produced by the band registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BandError {
    /// The uplink data-rate index exceeds the band's Rx1 table.
    #[error("data rate index too high (maximum {max})")]
    DataRateIndexTooHigh {
        /// Highest uplink data-rate index the band defines.
        max: u8,
    },

    /// The Rx1 data-rate offset exceeds the band's Rx1 table.
    #[error("data rate offset too high (maximum {max})")]
    DataRateOffsetTooHigh {
        /// Highest data-rate offset the band defines.
        max: u8,
    },

    /// The channel-mask control code is reserved or undefined.
    #[error("channel mask control code {cntl} is not supported")]
    UnsupportedChMaskCntl {
        /// The offending control code.
        cntl: u8,
    },

    /// The band does not exist in the requested Regional Parameters version.
    #[error("band {band} does not support LoRaWAN Regional Parameters {version}")]
    UnsupportedPhyVersion {
        /// The band.
        band: Region,
        /// The unsupported version.
        version: PhyVersion,
    },

    /// No band is registered under the given identifier.
    #[error("unknown band `{id}`")]
    UnknownBand {
        /// The offending identifier.
        id: String,
    },
}

/// Identifier of a supported regulatory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Europe 863-870 MHz.
    Eu863_870,
    /// United States 902-928 MHz.
    Us902_928,
    /// Australia 915-928 MHz.
    Au915_928,
    /// China 470-510 MHz.
    Cn470_510,
}

impl Region {
    /// The wire-stable band identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eu863_870 => "EU_863_870",
            Self::Us902_928 => "US_902_928",
            Self::Au915_928 => "AU_915_928",
            Self::Cn470_510 => "CN_470_510",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = BandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EU_863_870" => Ok(Self::Eu863_870),
            "US_902_928" => Ok(Self::Us902_928),
            "AU_915_928" => Ok(Self::Au915_928),
            "CN_470_510" => Ok(Self::Cn470_510),
            _ => Err(BandError::UnknownBand { id: s.to_string() }),
        }
    }
}

/// A single uplink or downlink channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    /// Center frequency in Hz.
    pub frequency: u64,
    /// Lowest data-rate index usable on this channel.
    pub min_data_rate: DataRateIndex,
    /// Highest data-rate index usable on this channel.
    pub max_data_rate: DataRateIndex,
}

/// Regulatory parameters of a sub-band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubBand {
    /// Lower frequency bound in Hz (inclusive).
    pub min_frequency: u64,
    /// Upper frequency bound in Hz (exclusive).
    pub max_frequency: u64,
    /// Fraction of time a device may transmit, in (0, 1].
    pub duty_cycle: f32,
    /// Maximum EIRP in dBm.
    pub max_eirp: f32,
}

/// Physical-layer modulation of a data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// LoRa chirp spread spectrum.
    Lora {
        /// Spreading factor (7-12).
        spreading_factor: u8,
        /// Bandwidth in Hz.
        bandwidth: u32,
    },
    /// FSK.
    Fsk {
        /// Bit rate in bit/s.
        bit_rate: u32,
    },
}

/// Maximum MAC payload sizes of a data rate.
///
/// Two sizes exist per data rate: the regular one and the one applying when
/// the network operates through repeaters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxMacPayloadSize {
    /// Size in bytes without repeater compatibility.
    pub standalone: u16,
    /// Size in bytes when repeater compatible.
    pub repeater_compatible: u16,
}

impl MaxMacPayloadSize {
    /// Both sizes equal, the common case in the regional parameters.
    #[must_use]
    pub const fn constant(size: u16) -> Self {
        Self {
            standalone: size,
            repeater_compatible: size,
        }
    }

    /// The applicable size.
    #[must_use]
    pub const fn size(&self, repeater_compatible: bool) -> u16 {
        if repeater_compatible {
            self.repeater_compatible
        } else {
            self.standalone
        }
    }
}

/// One entry of a band's data-rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRate {
    /// Modulation and its parameters.
    pub modulation: Modulation,
    /// Maximum MAC payload sizes.
    pub max_mac_payload: MaxMacPayloadSize,
}

pub(crate) const fn lora_data_rate(
    spreading_factor: u8,
    bandwidth: u32,
    max_payload: u16,
) -> DataRate {
    DataRate {
        modulation: Modulation::Lora {
            spreading_factor,
            bandwidth,
        },
        max_mac_payload: MaxMacPayloadSize::constant(max_payload),
    }
}

pub(crate) const fn fsk_data_rate(bit_rate: u32, max_payload: u16) -> DataRate {
    DataRate {
        modulation: Modulation::Fsk { bit_rate },
        max_mac_payload: MaxMacPayloadSize::constant(max_payload),
    }
}

/// Mapping from an uplink channel index to the Rx1 downlink channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rx1Channel {
    /// Downlink uses the uplink channel (EU-style).
    Identity,
    /// Downlink channel is the uplink index modulo `n` (US/AU/CN-style).
    Modulo(u8),
}

impl Rx1Channel {
    /// The Rx1 downlink channel index for an uplink channel index.
    #[must_use]
    pub const fn downlink_index(&self, uplink_index: u8) -> u8 {
        match self {
            Self::Identity => uplink_index,
            Self::Modulo(n) => uplink_index % *n,
        }
    }
}

/// The region-specific Rx1 downlink data-rate table.
///
/// Indexed by uplink data-rate index and Rx1 data-rate offset. Regions that
/// ignore the downlink dwell-time flag discard it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rx1DataRateTable {
    rows: Vec<Vec<DataRateIndex>>,
}

impl Rx1DataRateTable {
    pub(crate) fn new(rows: Vec<Vec<DataRateIndex>>) -> Self {
        debug_assert!(!rows.is_empty());
        debug_assert!(rows.iter().all(|row| row.len() == rows[0].len()));
        Self { rows }
    }

    /// Looks up the Rx1 downlink data rate.
    ///
    /// # Errors
    ///
    /// Returns [`BandError::DataRateIndexTooHigh`] or
    /// [`BandError::DataRateOffsetTooHigh`] when either coordinate exceeds
    /// the table, each carrying the applicable maximum.
    pub fn lookup(
        &self,
        index: DataRateIndex,
        offset: u8,
        _downlink_dwell_time: bool,
    ) -> Result<DataRateIndex, BandError> {
        let max_index = u8::try_from(self.rows.len() - 1).unwrap_or(u8::MAX);
        if index > max_index {
            return Err(BandError::DataRateIndexTooHigh { max: max_index });
        }
        let max_offset = u8::try_from(self.rows[0].len() - 1).unwrap_or(u8::MAX);
        if offset > max_offset {
            return Err(BandError::DataRateOffsetTooHigh { max: max_offset });
        }
        Ok(self.rows[usize::from(index)][usize::from(offset)])
    }

    /// All `(uplink index, offset)` coordinates the table defines.
    pub(crate) fn coordinates(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        let offsets = self.rows[0].len();
        (0..self.rows.len())
            .flat_map(move |i| (0..offsets).map(move |o| (i as u8, o as u8)))
    }
}

/// Default Rx2 window parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rx2Parameters {
    /// Rx2 data-rate index.
    pub data_rate_index: DataRateIndex,
    /// Rx2 frequency in Hz.
    pub frequency: u64,
}

/// Class-B beacon frequency plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconFrequencies {
    /// Beacons on a single fixed frequency.
    Fixed(u64),
    /// Beacons hop over eight frequencies by beacon period.
    Hopping([u64; 8]),
}

impl BeaconFrequencies {
    /// The beacon frequency for a beacon time in seconds since the epoch.
    #[must_use]
    pub fn frequency(&self, beacon_time: f64) -> u64 {
        match self {
            Self::Fixed(frequency) => *frequency,
            #[allow(clippy::cast_possible_truncation)]
            Self::Hopping(table) => {
                let period = (beacon_time as i64) / 128;
                table[usize::try_from(period.rem_euclid(8)).expect("modulo 8 fits")]
            }
        }
    }
}

/// Class-B beacon parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beacon {
    /// Data-rate index used for beacons.
    pub data_rate_index: DataRateIndex,
    /// Coding rate used for beacons.
    pub coding_rate: &'static str,
    /// Beacon frequency plan.
    pub frequencies: BeaconFrequencies,
}

/// The encoding carried by a join-accept CFList.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfListType {
    /// A list of channel frequencies.
    Frequencies,
    /// A set of channel masks.
    ChannelMasks,
}

/// A named per-revision transform over a band.
///
/// Each region carries a map from Regional Parameters revision to the
/// overlay introduced by that revision. Materialization composes them
/// left-to-right in ascending revision order over the region's base band.
#[derive(Debug, Clone)]
pub enum Overlay {
    /// No change in this revision.
    Identity,
    /// Raise (or lower) the highest valid Tx-power index.
    SetMaxTxPowerIndex(u8),
    /// The revision introduces CFList support.
    EnableCfList,
    /// The revision defines channel-mask control code 5 as a bank selector.
    EnableChMaskCntl5,
    /// The revision introduces `TxParamSetupReq` support.
    EnableTxParamSetupReq,
    /// The US beacon parameters revised in 1.0.2 Rev B.
    UsBeacon102,
    /// The AU data-rate table revised in 1.0.2 Rev B.
    AuDataRates102,
    /// Left-to-right composition.
    Compose(Vec<Overlay>),
}

impl Overlay {
    /// Applies the transform.
    #[must_use]
    pub fn apply(&self, mut band: Band) -> Band {
        match self {
            Self::Identity => band,
            Self::SetMaxTxPowerIndex(max) => {
                band.max_tx_power_index = *max;
                band
            }
            Self::EnableCfList => {
                band.implements_cf_list = true;
                band
            }
            Self::EnableChMaskCntl5 => {
                if let ChannelMaskScheme::Mask72 { cntl5 } = &mut band.channel_mask {
                    *cntl5 = true;
                }
                band
            }
            Self::EnableTxParamSetupReq => {
                band.tx_param_setup_req_support = true;
                band
            }
            Self::UsBeacon102 => {
                band.beacon = us_902_928::beacon_1_0_2();
                band
            }
            Self::AuDataRates102 => {
                band.data_rates = au_915_928::data_rates_1_0_2();
                band.max_adr_data_rate_index = 5;
                band
            }
            Self::Compose(overlays) => {
                for overlay in overlays {
                    band = overlay.apply(band);
                }
                band
            }
        }
    }
}

/// The radio parameters of one region.
///
/// Fields describe the band in its oldest supported Regional Parameters
/// revision; [`Band::at_version`] materializes any later revision.
#[derive(Debug, Clone)]
pub struct Band {
    /// Region identifier.
    pub id: Region,

    /// Highest number of uplink channels the region admits.
    pub max_uplink_channels: usize,
    /// Default uplink channels.
    pub uplink_channels: Vec<Channel>,
    /// Highest number of downlink channels the region admits.
    pub max_downlink_channels: usize,
    /// Default downlink channels.
    pub downlink_channels: Vec<Channel>,

    /// Regulatory sub-bands.
    pub sub_bands: Vec<SubBand>,

    /// The data-rate table.
    pub data_rates: BTreeMap<DataRateIndex, DataRate>,
    /// Highest data-rate index assignable through ADR.
    pub max_adr_data_rate_index: DataRateIndex,

    /// Delay before the Rx1 window.
    pub receive_delay_1: Duration,
    /// Delay before the Rx2 window.
    pub receive_delay_2: Duration,
    /// Delay before the join-accept Rx1 window.
    pub join_accept_delay_1: Duration,
    /// Delay before the join-accept Rx2 window.
    pub join_accept_delay_2: Duration,
    /// Highest tolerated uplink frame-counter gap.
    pub max_f_cnt_gap: u32,
    /// Uplinks before a device starts requesting ADR acknowledgements.
    pub adr_ack_limit: u32,
    /// Uplinks a device waits for an ADR acknowledgement.
    pub adr_ack_delay: u32,
    /// Lower bound of the confirmed-downlink ack timeout.
    pub min_ack_timeout: Duration,
    /// Upper bound of the confirmed-downlink ack timeout.
    pub max_ack_timeout: Duration,

    /// Default maximum EIRP in dBm.
    pub default_max_eirp: f32,
    /// Tx-power offsets in dB; entries beyond the maximum index are
    /// reserved.
    pub tx_offsets: [f32; 16],
    /// Highest valid index into [`Self::tx_offsets`].
    pub max_tx_power_index: u8,

    /// Uplink-to-Rx1-downlink channel mapping.
    pub rx1_channel: Rx1Channel,
    /// Rx1 downlink data-rate table.
    pub rx1_data_rates: Rx1DataRateTable,

    /// Channel-mask encoding used by LinkADRReq.
    pub channel_mask: ChannelMaskScheme,

    /// LoRa coding rate.
    pub lora_coding_rate: &'static str,

    /// CFList frequency unit in Hz per stored step.
    pub freq_multiplier: u64,
    /// Whether the band supports a join-accept CFList.
    pub implements_cf_list: bool,
    /// CFList encoding of this band.
    pub cf_list_type: CfListType,

    /// Default Rx2 window parameters.
    pub default_rx2: Rx2Parameters,
    /// Class-B beacon parameters.
    pub beacon: Beacon,
    /// Fixed ping-slot frequency, where the region defines one.
    pub ping_slot_frequency: Option<u64>,
    /// Whether the band supports `TxParamSetupReq`.
    pub tx_param_setup_req_support: bool,

    /// Overlay per supported Regional Parameters revision. A revision
    /// absent from the map is unsupported by the region.
    pub(crate) overlays: BTreeMap<PhyVersion, Overlay>,
}

impl Band {
    /// Materializes this band for a Regional Parameters version.
    ///
    /// Composes the overlays of every catalogued revision up to and
    /// including `version`, ascending, over the base band.
    ///
    /// # Errors
    ///
    /// Returns [`BandError::UnsupportedPhyVersion`] when the region does
    /// not exist in the requested version.
    pub fn at_version(&self, version: PhyVersion) -> Result<Self, BandError> {
        if !self.overlays.contains_key(&version) {
            return Err(BandError::UnsupportedPhyVersion {
                band: self.id,
                version,
            });
        }
        let overlays: Vec<Overlay> = self
            .overlays
            .range(..=version)
            .map(|(_, overlay)| overlay.clone())
            .collect();
        let mut band = self.clone();
        for overlay in overlays {
            band = overlay.apply(band);
        }
        Ok(band)
    }

    /// The Regional Parameters versions this band supports.
    #[must_use]
    pub fn supported_phy_versions(&self) -> Vec<PhyVersion> {
        self.overlays.keys().copied().collect()
    }

    /// The Rx1 downlink data rate for an uplink.
    ///
    /// # Errors
    ///
    /// See [`Rx1DataRateTable::lookup`].
    pub fn rx1_data_rate(
        &self,
        index: DataRateIndex,
        offset: u8,
        downlink_dwell_time: bool,
    ) -> Result<DataRateIndex, BandError> {
        self.rx1_data_rates.lookup(index, offset, downlink_dwell_time)
    }

    /// The Rx1 downlink channel index for an uplink channel index.
    #[must_use]
    pub const fn rx1_channel_index(&self, uplink_index: u8) -> u8 {
        self.rx1_channel.downlink_index(uplink_index)
    }

    /// Checks the structural invariants of a materialized band.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        for ch in self.uplink_channels.iter().chain(&self.downlink_channels) {
            if ch.frequency == 0 {
                return Err(format!("{}: channel with zero frequency", self.id));
            }
            if ch.min_data_rate > ch.max_data_rate {
                return Err(format!("{}: channel with min DR > max DR", self.id));
            }
            for dr in [ch.min_data_rate, ch.max_data_rate] {
                if !self.data_rates.contains_key(&dr) {
                    return Err(format!("{}: channel references undefined DR {dr}", self.id));
                }
            }
        }
        for (i, a) in self.sub_bands.iter().enumerate() {
            if !(a.duty_cycle > 0.0 && a.duty_cycle <= 1.0) {
                return Err(format!("{}: duty cycle out of (0, 1]", self.id));
            }
            for b in &self.sub_bands[i + 1..] {
                if a.min_frequency < b.max_frequency && b.min_frequency < a.max_frequency {
                    return Err(format!("{}: overlapping sub-bands", self.id));
                }
            }
        }
        for (index, offset) in self.rx1_data_rates.coordinates() {
            let dr = self
                .rx1_data_rates
                .lookup(index, offset, false)
                .map_err(|err| err.to_string())?;
            if !self.data_rates.contains_key(&dr) {
                return Err(format!(
                    "{}: Rx1 DR table yields undefined DR {dr} at ({index}, {offset})",
                    self.id
                ));
            }
        }
        if !self.data_rates.contains_key(&self.default_rx2.data_rate_index) {
            return Err(format!("{}: Rx2 DR not in data-rate table", self.id));
        }
        if !self.data_rates.contains_key(&self.beacon.data_rate_index) {
            return Err(format!("{}: beacon DR not in data-rate table", self.id));
        }
        Ok(())
    }
}

/// The immutable catalog of all supported bands.
///
/// Built once at startup; lookups clone-and-materialize, so the registry is
/// freely shareable across request handlers.
#[derive(Debug, Clone)]
pub struct Registry {
    bands: BTreeMap<Region, Band>,
}

impl Registry {
    /// Builds the registry with every supported region.
    #[must_use]
    pub fn new() -> Self {
        let mut bands = BTreeMap::new();
        bands.insert(Region::Eu863_870, eu_863_870::band());
        bands.insert(Region::Us902_928, us_902_928::band());
        bands.insert(Region::Au915_928, au_915_928::band());
        bands.insert(Region::Cn470_510, cn_470_510::band());
        Self { bands }
    }

    /// The band of `region`, materialized for `version`.
    ///
    /// # Errors
    ///
    /// Returns [`BandError::UnsupportedPhyVersion`] when the region does
    /// not exist in the requested version.
    pub fn get(&self, region: Region, version: PhyVersion) -> Result<Band, BandError> {
        self.bands
            .get(&region)
            .expect("every region is registered")
            .at_version(version)
    }

    /// Looks up a band by its wire identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BandError::UnknownBand`] for unknown identifiers and
    /// [`BandError::UnsupportedPhyVersion`] for unsupported versions.
    pub fn get_by_id(&self, id: &str, version: PhyVersion) -> Result<Band, BandError> {
        self.get(id.parse()?, version)
    }

    /// All registered regions.
    #[must_use]
    pub fn list_regions(&self) -> Vec<Region> {
        self.bands.keys().copied().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// Timing defaults shared by every region.
pub(crate) const DEFAULT_RECEIVE_DELAY_1: Duration = Duration::from_secs(1);
pub(crate) const DEFAULT_RECEIVE_DELAY_2: Duration = Duration::from_secs(2);
pub(crate) const DEFAULT_JOIN_ACCEPT_DELAY_1: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_JOIN_ACCEPT_DELAY_2: Duration = Duration::from_secs(6);
pub(crate) const DEFAULT_MAX_F_CNT_GAP: u32 = 16_384;
pub(crate) const DEFAULT_ADR_ACK_LIMIT: u32 = 64;
pub(crate) const DEFAULT_ADR_ACK_DELAY: u32 = 32;
pub(crate) const DEFAULT_MIN_ACK_TIMEOUT: Duration = Duration::from_millis(800);
pub(crate) const DEFAULT_MAX_ACK_TIMEOUT: Duration = Duration::from_millis(1200);

/// Antenna gain delta between dBm and dBi EIRP figures.
pub(crate) const EIRP_DELTA: f32 = 2.15;

/// Tx-power offset table shared by the US and AU bands: 2 dB steps over
/// indices 0-14, index 15 reserved.
pub(crate) fn us_au_tx_offsets() -> [f32; 16] {
    let mut offsets = [0.0; 16];
    for (i, offset) in offsets.iter_mut().take(15).enumerate() {
        #[allow(clippy::cast_precision_loss)]
        {
            *offset = -2.0 * i as f32;
        }
    }
    offsets
}

/// Tx-power offset table shared by the EU and CN bands.
pub(crate) const EU_CN_TX_OFFSETS: [f32; 16] = [
    0.0, -2.0, -4.0, -6.0, -8.0, -10.0, -12.0, -14.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// US/AU class-B beacon hopping table: 923.3 MHz + 600 kHz steps.
pub(crate) fn us_au_beacon_frequencies() -> [u64; 8] {
    std::array::from_fn(|i| 923_300_000 + 600_000 * i as u64)
}

/// CN 470-510 class-B beacon hopping table: 508.3 MHz + 200 kHz steps.
pub(crate) fn cn_beacon_frequencies() -> [u64; 8] {
    std::array::from_fn(|i| 508_300_000 + 200_000 * i as u64)
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_registry_lists_all_regions() {
        let registry = Registry::new();
        assert_eq!(
            registry.list_regions(),
            vec![
                Region::Eu863_870,
                Region::Us902_928,
                Region::Au915_928,
                Region::Cn470_510,
            ]
        );
    }

    #[test]
    fn test_get_by_id_round_trips_wire_names() {
        let registry = Registry::new();
        for region in registry.list_regions() {
            let band = registry
                .get_by_id(region.as_str(), PhyVersion::V1_1RevA)
                .unwrap();
            assert_eq!(band.id, region);
        }
        assert_eq!(
            registry
                .get_by_id("MARS_42", PhyVersion::V1_1RevA)
                .unwrap_err(),
            BandError::UnknownBand {
                id: "MARS_42".to_string()
            }
        );
    }

    #[test]
    fn test_overlay_composition_is_left_to_right() {
        let band = Registry::new()
            .get(Region::Eu863_870, PhyVersion::V1_0)
            .unwrap();
        let composed = Overlay::Compose(vec![
            Overlay::SetMaxTxPowerIndex(3),
            Overlay::SetMaxTxPowerIndex(9),
        ])
        .apply(band);
        assert_eq!(composed.max_tx_power_index, 9);
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let registry = Registry::new();
        for region in [Region::Au915_928, Region::Cn470_510] {
            assert_eq!(
                registry.get(region, PhyVersion::V1_0).unwrap_err(),
                BandError::UnsupportedPhyVersion {
                    band: region,
                    version: PhyVersion::V1_0,
                }
            );
        }
    }

    #[test]
    fn test_rx1_channel_mappings() {
        assert_eq!(Rx1Channel::Identity.downlink_index(2), 2);
        assert_eq!(Rx1Channel::Modulo(8).downlink_index(13), 5);
        assert_eq!(Rx1Channel::Modulo(48).downlink_index(50), 2);
    }

    #[test]
    fn test_beacon_frequency_hopping() {
        let table = us_au_beacon_frequencies();
        let beacon = BeaconFrequencies::Hopping(table);
        assert_eq!(beacon.frequency(0.0), table[0]);
        assert_eq!(beacon.frequency(128.0), table[1]);
        assert_eq!(beacon.frequency(128.0 * 9.0), table[1]);
        assert_eq!(BeaconFrequencies::Fixed(869_525_000).frequency(512.0), 869_525_000);
    }

    #[test]
    fn test_max_payload_lookup() {
        let size = MaxMacPayloadSize {
            standalone: 230,
            repeater_compatible: 222,
        };
        assert_eq!(size.size(false), 230);
        assert_eq!(size.size(true), 222);
    }
}
