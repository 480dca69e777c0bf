//! LoRaWAN primitive types shared across the network server.
//!
//! Identifiers and keys are fixed-size byte newtypes that serialize as
//! upper-case hex strings, matching their wire representation in the
//! registry API.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors produced when parsing primitive types from their string forms.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input is not valid hex of the expected width.
    #[error("invalid hex string of length {expected_len}: `{input}`")]
    InvalidHex {
        /// The offending input.
        input: String,
        /// Expected number of hex characters.
        expected_len: usize,
    },

    /// The input does not name a known version.
    #[error("unknown version `{input}`")]
    UnknownVersion {
        /// The offending input.
        input: String,
    },
}

macro_rules! hex_newtype {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Returns the raw bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Returns whether every byte is zero.
            #[must_use]
            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; $len]
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for b in &self.0 {
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let err = || ParseError::InvalidHex {
                    input: s.to_string(),
                    expected_len: $len * 2,
                };
                if s.len() != $len * 2 {
                    return Err(err());
                }
                let mut bytes = [0u8; $len];
                for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
                    let chunk = std::str::from_utf8(chunk).map_err(|_| err())?;
                    bytes[i] = u8::from_str_radix(chunk, 16).map_err(|_| err())?;
                }
                Ok(Self(bytes))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(D::Error::custom)
            }
        }
    };
}

hex_newtype!(
    /// A 64-bit extended unique identifier (JoinEUI or DevEUI).
    Eui64,
    8
);

hex_newtype!(
    /// A 32-bit LoRaWAN device address.
    DevAddr,
    4
);

hex_newtype!(
    /// A 128-bit AES session or application key.
    Aes128Key,
    16
);

/// An at-rest representation of a session key.
///
/// A key is either carried in plaintext (`key`) or wrapped under a KEK
/// (`encrypted_key` + `kek_label`). The registry never persists the
/// plaintext form: Set wraps inbound plaintext before storage and Get
/// unwraps on demand. An envelope carrying both forms exists only
/// transiently inside Set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEnvelope {
    /// Plaintext key material.
    pub key: Option<Aes128Key>,
    /// Key material wrapped per RFC 3394.
    pub encrypted_key: Option<Vec<u8>>,
    /// Label of the KEK used to wrap `encrypted_key`.
    pub kek_label: Option<String>,
}

impl KeyEnvelope {
    /// An envelope carrying a plaintext key.
    #[must_use]
    pub const fn plain(key: Aes128Key) -> Self {
        Self {
            key: Some(key),
            encrypted_key: None,
            kek_label: None,
        }
    }

    /// An envelope carrying a wrapped key.
    #[must_use]
    pub const fn wrapped(encrypted_key: Vec<u8>, kek_label: String) -> Self {
        Self {
            key: None,
            encrypted_key: Some(encrypted_key),
            kek_label: Some(kek_label),
        }
    }

    /// Returns the plaintext key, if this envelope carries one.
    #[must_use]
    pub const fn plaintext(&self) -> Option<&Aes128Key> {
        self.key.as_ref()
    }
}

/// The session key set of a device session or queued join-accept.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionKeys {
    /// Join-server assigned session key identifier.
    pub session_key_id: Option<Vec<u8>>,
    /// Forwarding network session integrity key.
    pub f_nwk_s_int_key: Option<KeyEnvelope>,
    /// Serving network session integrity key (LoRaWAN 1.1).
    pub s_nwk_s_int_key: Option<KeyEnvelope>,
    /// Network session encryption key (LoRaWAN 1.1).
    pub nwk_s_enc_key: Option<KeyEnvelope>,
    /// Application session key.
    pub app_s_key: Option<KeyEnvelope>,
}

impl SessionKeys {
    /// Field names of the key envelopes, as used in field-mask paths.
    pub const KEY_NAMES: [&'static str; 4] = [
        "f_nwk_s_int_key",
        "s_nwk_s_int_key",
        "nwk_s_enc_key",
        "app_s_key",
    ];

    /// The envelope stored under a field name.
    #[must_use]
    pub fn envelope(&self, name: &str) -> Option<&KeyEnvelope> {
        match name {
            "f_nwk_s_int_key" => self.f_nwk_s_int_key.as_ref(),
            "s_nwk_s_int_key" => self.s_nwk_s_int_key.as_ref(),
            "nwk_s_enc_key" => self.nwk_s_enc_key.as_ref(),
            "app_s_key" => self.app_s_key.as_ref(),
            _ => None,
        }
    }

    /// Mutable access to the envelope slot of a field name.
    pub fn envelope_mut(&mut self, name: &str) -> Option<&mut Option<KeyEnvelope>> {
        match name {
            "f_nwk_s_int_key" => Some(&mut self.f_nwk_s_int_key),
            "s_nwk_s_int_key" => Some(&mut self.s_nwk_s_int_key),
            "nwk_s_enc_key" => Some(&mut self.nwk_s_enc_key),
            "app_s_key" => Some(&mut self.app_s_key),
            _ => None,
        }
    }
}

/// LoRaWAN MAC specification version implemented by a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum MacVersion {
    /// LoRaWAN 1.0.
    #[default]
    #[serde(rename = "1.0")]
    V1_0,
    /// LoRaWAN 1.0.1.
    #[serde(rename = "1.0.1")]
    V1_0_1,
    /// LoRaWAN 1.0.2.
    #[serde(rename = "1.0.2")]
    V1_0_2,
    /// LoRaWAN 1.0.3.
    #[serde(rename = "1.0.3")]
    V1_0_3,
    /// LoRaWAN 1.1.
    #[serde(rename = "1.1")]
    V1_1,
}

impl MacVersion {
    /// Canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_0_1 => "1.0.1",
            Self::V1_0_2 => "1.0.2",
            Self::V1_0_3 => "1.0.3",
            Self::V1_1 => "1.1",
        }
    }
}

impl fmt::Display for MacVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MacVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.0.1" => Ok(Self::V1_0_1),
            "1.0.2" => Ok(Self::V1_0_2),
            "1.0.3" => Ok(Self::V1_0_3),
            "1.1" => Ok(Self::V1_1),
            _ => Err(ParseError::UnknownVersion {
                input: s.to_string(),
            }),
        }
    }
}

/// LoRaWAN Regional Parameters revision implemented by a device.
///
/// Variants are declared in publication order, so the derived ordering is
/// the revision ordering used by overlay composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PhyVersion {
    /// Regional Parameters 1.0.
    #[serde(rename = "1.0")]
    V1_0,
    /// Regional Parameters 1.0.1.
    #[serde(rename = "1.0.1")]
    V1_0_1,
    /// Regional Parameters 1.0.2 Revision A.
    #[serde(rename = "1.0.2-a")]
    V1_0_2RevA,
    /// Regional Parameters 1.0.2 Revision B.
    #[serde(rename = "1.0.2-b")]
    V1_0_2RevB,
    /// Regional Parameters 1.0.3 Revision A.
    #[serde(rename = "1.0.3-a")]
    V1_0_3RevA,
    /// Regional Parameters 1.1 Revision A.
    #[serde(rename = "1.1-a")]
    V1_1RevA,
}

impl PhyVersion {
    /// All known revisions, in ascending order.
    pub const ALL: [Self; 6] = [
        Self::V1_0,
        Self::V1_0_1,
        Self::V1_0_2RevA,
        Self::V1_0_2RevB,
        Self::V1_0_3RevA,
        Self::V1_1RevA,
    ];

    /// Canonical string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_0_1 => "1.0.1",
            Self::V1_0_2RevA => "1.0.2-a",
            Self::V1_0_2RevB => "1.0.2-b",
            Self::V1_0_3RevA => "1.0.3-a",
            Self::V1_1RevA => "1.1-a",
        }
    }
}

impl fmt::Display for PhyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhyVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.0.1" => Ok(Self::V1_0_1),
            "1.0.2-a" => Ok(Self::V1_0_2RevA),
            "1.0.2-b" => Ok(Self::V1_0_2RevB),
            "1.0.3-a" => Ok(Self::V1_0_3RevA),
            "1.1-a" => Ok(Self::V1_1RevA),
            _ => Err(ParseError::UnknownVersion {
                input: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_eui_hex_round_trip() {
        let eui: Eui64 = "0102030405060708".parse().unwrap();
        assert_eq!(eui.0, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(eui.to_string(), "0102030405060708");
    }

    #[test]
    fn test_dev_addr_is_zero() {
        assert!(DevAddr::default().is_zero());
        assert!(!DevAddr([0, 0, 0, 1]).is_zero());
    }

    #[test]
    fn test_invalid_hex_rejected() {
        let err = "zzzz".parse::<DevAddr>().unwrap_err();
        assert!(matches!(err, ParseError::InvalidHex { .. }));
        assert!("01020304FF".parse::<DevAddr>().is_err());
    }

    #[test]
    fn test_key_serde_as_hex_string() {
        let key = Aes128Key([0xAB; 16]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"ABABABABABABABABABABABABABABABAB\"");
        let back: Aes128Key = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_mac_version_ordering() {
        assert!(MacVersion::V1_0_2 < MacVersion::V1_1);
        assert!(MacVersion::V1_1 >= MacVersion::V1_1);
        assert_eq!("1.0.2".parse::<MacVersion>().unwrap(), MacVersion::V1_0_2);
    }

    #[test]
    fn test_phy_version_ordering_matches_publication_order() {
        let mut sorted = PhyVersion::ALL;
        sorted.sort();
        assert_eq!(sorted, PhyVersion::ALL);
        assert!(PhyVersion::V1_0_2RevB < PhyVersion::V1_0_3RevA);
    }

    #[test]
    fn test_version_parse_errors() {
        assert!("2.0".parse::<MacVersion>().is_err());
        assert!("1.0.2".parse::<PhyVersion>().is_err());
    }

    #[test]
    fn test_key_envelope_constructors() {
        let plain = KeyEnvelope::plain(Aes128Key([1; 16]));
        assert!(plain.plaintext().is_some());
        assert!(plain.encrypted_key.is_none());

        let wrapped = KeyEnvelope::wrapped(vec![0; 24], "ns/kek".to_string());
        assert!(wrapped.plaintext().is_none());
        assert_eq!(wrapped.kek_label.as_deref(), Some("ns/kek"));
    }
}
