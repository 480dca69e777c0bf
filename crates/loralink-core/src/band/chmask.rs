//! LinkADRReq channel-mask encoding.
//!
//! Three encodings exist across the supported regions: a single 16-bit mask
//! (EU-style), the 72-channel encoding (US/AU, 64 × 125 kHz + 8 × 500 kHz)
//! and the 96-channel encoding (CN 470-510). Parsers update a caller-held
//! enabled bitmap; generators emit the `(ChMask, ChMaskCntl)` pairs that
//! move a device from its current bitmap to the desired one.

use super::BandError;

/// A single LinkADRReq `(ChMask, ChMaskCntl)` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChMaskCntlPair {
    /// The ChMaskCntl control code.
    pub cntl: u8,
    /// The 16-bit channel mask.
    pub mask: [bool; 16],
}

/// The channel-mask encoding used by a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMaskScheme {
    /// Up to 16 channels in a single mask with control code 0.
    Mask16,
    /// 72 channels in five 16-channel groups plus control codes 5-7.
    ///
    /// Control code 5 selects 8-channel banks of the 125 kHz plan; its
    /// semantics are version-dependent and it parses as reserved unless
    /// `cntl5` is set by the band's version overlays.
    Mask72 {
        /// Whether control code 5 is defined for the materialized version.
        cntl5: bool,
    },
    /// 96 channels in six 16-channel groups plus control code 6 (all on).
    Mask96,
}

impl ChannelMaskScheme {
    /// Number of channels addressed by this encoding.
    #[must_use]
    pub const fn channel_count(&self) -> usize {
        match self {
            Self::Mask16 => 16,
            Self::Mask72 { .. } => 72,
            Self::Mask96 => 96,
        }
    }

    /// Applies one `(ChMask, ChMaskCntl)` block to `enabled`.
    ///
    /// `enabled` must hold [`Self::channel_count`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`BandError::UnsupportedChMaskCntl`] for control codes the
    /// encoding does not define (including code 5 where the materialized
    /// version marks it reserved).
    pub fn parse(
        &self,
        enabled: &mut [bool],
        mask: &[bool; 16],
        cntl: u8,
    ) -> Result<(), BandError> {
        debug_assert_eq!(enabled.len(), self.channel_count());
        match self {
            Self::Mask16 => match cntl {
                0 => {
                    enabled.copy_from_slice(mask);
                    Ok(())
                }
                _ => Err(BandError::UnsupportedChMaskCntl { cntl }),
            },
            Self::Mask72 { cntl5 } => match cntl {
                0..=4 => {
                    apply_group(enabled, mask, usize::from(cntl));
                    Ok(())
                }
                5 if *cntl5 => {
                    for bank in 0..8 {
                        for ch in enabled[bank * 8..(bank + 1) * 8].iter_mut() {
                            *ch = mask[bank];
                        }
                    }
                    Ok(())
                }
                6 => {
                    enabled[..64].fill(true);
                    enabled[64..].copy_from_slice(&mask[..8]);
                    Ok(())
                }
                7 => {
                    enabled[..64].fill(false);
                    enabled[64..].copy_from_slice(&mask[..8]);
                    Ok(())
                }
                _ => Err(BandError::UnsupportedChMaskCntl { cntl }),
            },
            Self::Mask96 => match cntl {
                0..=5 => {
                    apply_group(enabled, mask, usize::from(cntl));
                    Ok(())
                }
                6 => {
                    enabled.fill(true);
                    Ok(())
                }
                _ => Err(BandError::UnsupportedChMaskCntl { cntl }),
            },
        }
    }

    /// Emits the block sequence that turns `current` into `desired`.
    ///
    /// Both bitmaps must hold [`Self::channel_count`] entries. The result
    /// is never empty: a device always receives at least one block.
    ///
    /// # Errors
    ///
    /// Currently infallible for all encodings; the `Result` mirrors the
    /// parser signature for symmetry at the band seam.
    pub fn generate(
        &self,
        current: &[bool],
        desired: &[bool],
    ) -> Result<Vec<ChMaskCntlPair>, BandError> {
        debug_assert_eq!(current.len(), self.channel_count());
        debug_assert_eq!(desired.len(), self.channel_count());
        match self {
            Self::Mask16 => {
                let mut mask = [false; 16];
                mask.copy_from_slice(desired);
                Ok(vec![ChMaskCntlPair { cntl: 0, mask }])
            }
            Self::Mask72 { cntl5 } => {
                let mut wide = [false; 16];
                wide[..8].copy_from_slice(&desired[64..]);
                if desired[..64].iter().all(|on| *on) {
                    return Ok(vec![ChMaskCntlPair {
                        cntl: 6,
                        mask: wide,
                    }]);
                }
                if desired[..64].iter().all(|on| !*on) {
                    return Ok(vec![ChMaskCntlPair {
                        cntl: 7,
                        mask: wide,
                    }]);
                }
                if *cntl5 && desired[64..] == current[64..] {
                    if let Some(banks) = uniform_banks(&desired[..64]) {
                        return Ok(vec![ChMaskCntlPair {
                            cntl: 5,
                            mask: banks,
                        }]);
                    }
                }
                Ok(group_blocks(current, desired, 5))
            }
            Self::Mask96 => {
                if desired.iter().all(|on| *on) {
                    return Ok(vec![ChMaskCntlPair {
                        cntl: 6,
                        mask: [false; 16],
                    }]);
                }
                Ok(group_blocks(current, desired, 6))
            }
        }
    }
}

fn apply_group(enabled: &mut [bool], mask: &[bool; 16], group: usize) {
    for (i, on) in mask.iter().enumerate() {
        let ch = group * 16 + i;
        if ch < enabled.len() {
            enabled[ch] = *on;
        }
    }
}

fn group_slice(bitmap: &[bool], group: usize) -> [bool; 16] {
    let mut mask = [false; 16];
    for (i, slot) in mask.iter_mut().enumerate() {
        let ch = group * 16 + i;
        if ch < bitmap.len() {
            *slot = bitmap[ch];
        }
    }
    mask
}

/// Emits one block per 16-channel group whose desired state differs from
/// the current one, falling back to a single group-0 block when none do.
fn group_blocks(current: &[bool], desired: &[bool], groups: u8) -> Vec<ChMaskCntlPair> {
    let mut blocks = Vec::new();
    for group in 0..groups {
        let mask = group_slice(desired, usize::from(group));
        if mask != group_slice(current, usize::from(group)) {
            blocks.push(ChMaskCntlPair { cntl: group, mask });
        }
    }
    if blocks.is_empty() {
        blocks.push(ChMaskCntlPair {
            cntl: 0,
            mask: group_slice(desired, 0),
        });
    }
    blocks
}

/// Returns the per-bank mask if every 8-channel bank is uniformly enabled
/// or disabled.
fn uniform_banks(m125: &[bool]) -> Option<[bool; 16]> {
    let mut banks = [false; 16];
    for (bank, slot) in banks.iter_mut().take(8).enumerate() {
        let window = &m125[bank * 8..(bank + 1) * 8];
        if window.iter().all(|on| *on) {
            *slot = true;
        } else if window.iter().any(|on| *on) {
            return None;
        }
    }
    Some(banks)
}
