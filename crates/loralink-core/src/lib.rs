//! # loralink-core
//!
//! Domain primitives for the loralink LoRaWAN Network Server:
//!
//! - **Types**: EUIs, device addresses, AES-128 keys, key envelopes, and the
//!   LoRaWAN MAC/PHY version enums.
//! - **Key wrapping**: the RFC 3394 AES Key Wrap codec used to protect
//!   session keys at rest.
//! - **Field masks**: dotted-path helpers driving the registry's typed
//!   Get/Set protocol.
//! - **Band registry**: the catalog of regional radio parameters with
//!   per-revision overlays for every supported LoRaWAN Regional Parameters
//!   version.
//!
//! Everything in this crate is pure and synchronous; service orchestration
//! lives in `loralink-ns`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod band;
pub mod fieldmask;
pub mod keywrap;
pub mod types;

pub use band::{Band, Region, Registry};
pub use types::{Aes128Key, DevAddr, Eui64, KeyEnvelope, MacVersion, PhyVersion, SessionKeys};
