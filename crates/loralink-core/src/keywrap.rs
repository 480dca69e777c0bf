//! RFC 3394 AES Key Wrap.
//!
//! Wraps device session keys under a key-encryption key (KEK) before they
//! reach storage. The KEK may be 128, 192 or 256 bits; the wrapped payload
//! must be a whole number of 64-bit blocks and at least two of them.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};
use thiserror::Error;

/// RFC 3394 §2.2.3 initial value.
const IV: u64 = 0xA6A6_A6A6_A6A6_A6A6;

const SEMIBLOCK: usize = 8;

/// Errors produced by [`wrap`] and [`unwrap`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyWrapError {
    /// Input is not a positive multiple of 8 bytes.
    #[error("key data length must be a positive multiple of 8 bytes, got {len}")]
    InvalidLength {
        /// The offending input length.
        len: usize,
    },

    /// Input is too short to carry key material.
    #[error("no key material present")]
    NoKeyPresent,

    /// The integrity check failed during unwrap.
    #[error("corrupt key data")]
    Corrupt,

    /// The KEK is not a valid AES key size.
    #[error("KEK must be 16, 24 or 32 bytes, got {len}")]
    InvalidKekLength {
        /// The offending KEK length.
        len: usize,
    },
}

enum Kek {
    Aes128(Box<Aes128>),
    Aes192(Box<Aes192>),
    Aes256(Box<Aes256>),
}

impl Kek {
    fn new(kek: &[u8]) -> Result<Self, KeyWrapError> {
        match kek.len() {
            16 => Ok(Self::Aes128(Box::new(Aes128::new(
                GenericArray::from_slice(kek),
            )))),
            24 => Ok(Self::Aes192(Box::new(Aes192::new(
                GenericArray::from_slice(kek),
            )))),
            32 => Ok(Self::Aes256(Box::new(Aes256::new(
                GenericArray::from_slice(kek),
            )))),
            len => Err(KeyWrapError::InvalidKekLength { len }),
        }
    }

    fn encrypt(&self, block: &mut [u8; 16]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }

    fn decrypt(&self, block: &mut [u8; 16]) {
        let block = GenericArray::from_mut_slice(block);
        match self {
            Self::Aes128(c) => c.decrypt_block(block),
            Self::Aes192(c) => c.decrypt_block(block),
            Self::Aes256(c) => c.decrypt_block(block),
        }
    }
}

/// Wraps `plaintext` under `kek` per RFC 3394 §2.2.1.
///
/// The plaintext must be at least 16 bytes and a multiple of 8; the output
/// is 8 bytes longer than the input.
///
/// # Errors
///
/// Returns [`KeyWrapError::InvalidLength`] for inputs that are not a
/// positive multiple of 8 bytes, [`KeyWrapError::NoKeyPresent`] for inputs
/// shorter than two semiblocks, and [`KeyWrapError::InvalidKekLength`] for
/// KEKs that are not valid AES key sizes.
pub fn wrap(plaintext: &[u8], kek: &[u8]) -> Result<Vec<u8>, KeyWrapError> {
    if plaintext.is_empty() || plaintext.len() % SEMIBLOCK != 0 {
        return Err(KeyWrapError::InvalidLength {
            len: plaintext.len(),
        });
    }
    let n = plaintext.len() / SEMIBLOCK;
    if n < 2 {
        return Err(KeyWrapError::NoKeyPresent);
    }
    let cipher = Kek::new(kek)?;

    let mut a = IV;
    let mut r: Vec<[u8; SEMIBLOCK]> = plaintext
        .chunks_exact(SEMIBLOCK)
        .map(|c| c.try_into().expect("exact chunk"))
        .collect();

    let mut block = [0u8; 16];
    for j in 0..=5u64 {
        for (i, ri) in r.iter_mut().enumerate() {
            block[..SEMIBLOCK].copy_from_slice(&a.to_be_bytes());
            block[SEMIBLOCK..].copy_from_slice(ri);
            cipher.encrypt(&mut block);
            let t = (n as u64) * j + (i as u64 + 1);
            a = u64::from_be_bytes(block[..SEMIBLOCK].try_into().expect("semiblock")) ^ t;
            ri.copy_from_slice(&block[SEMIBLOCK..]);
        }
    }

    let mut ciphertext = Vec::with_capacity(SEMIBLOCK * (n + 1));
    ciphertext.extend_from_slice(&a.to_be_bytes());
    for ri in &r {
        ciphertext.extend_from_slice(ri);
    }
    Ok(ciphertext)
}

/// Unwraps `ciphertext` under `kek` per RFC 3394 §2.2.2.
///
/// # Errors
///
/// Returns [`KeyWrapError::InvalidLength`] or [`KeyWrapError::NoKeyPresent`]
/// for malformed lengths, [`KeyWrapError::InvalidKekLength`] for bad KEK
/// sizes, and [`KeyWrapError::Corrupt`] when the integrity register does
/// not match the RFC 3394 initial value after unwrapping.
pub fn unwrap(ciphertext: &[u8], kek: &[u8]) -> Result<Vec<u8>, KeyWrapError> {
    if ciphertext.is_empty() || ciphertext.len() % SEMIBLOCK != 0 {
        return Err(KeyWrapError::InvalidLength {
            len: ciphertext.len(),
        });
    }
    let n = ciphertext.len() / SEMIBLOCK - 1;
    if n < 2 {
        return Err(KeyWrapError::NoKeyPresent);
    }
    let cipher = Kek::new(kek)?;

    let mut a = u64::from_be_bytes(ciphertext[..SEMIBLOCK].try_into().expect("semiblock"));
    let mut r: Vec<[u8; SEMIBLOCK]> = ciphertext[SEMIBLOCK..]
        .chunks_exact(SEMIBLOCK)
        .map(|c| c.try_into().expect("exact chunk"))
        .collect();

    let mut block = [0u8; 16];
    for j in (0..=5u64).rev() {
        for i in (0..n).rev() {
            let t = (n as u64) * j + (i as u64 + 1);
            block[..SEMIBLOCK].copy_from_slice(&(a ^ t).to_be_bytes());
            block[SEMIBLOCK..].copy_from_slice(&r[i]);
            cipher.decrypt(&mut block);
            a = u64::from_be_bytes(block[..SEMIBLOCK].try_into().expect("semiblock"));
            r[i].copy_from_slice(&block[SEMIBLOCK..]);
        }
    }

    if a != IV {
        return Err(KeyWrapError::Corrupt);
    }

    let mut plaintext = Vec::with_capacity(SEMIBLOCK * n);
    for ri in &r {
        plaintext.extend_from_slice(ri);
    }
    Ok(plaintext)
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    // Test vectors from RFC 3394 §4.

    #[test]
    fn test_wrap_128_data_128_kek() {
        let kek = hex::decode("000102030405060708090A0B0C0D0E0F").unwrap();
        let plaintext = hex::decode("00112233445566778899AABBCCDDEEFF").unwrap();
        let ciphertext = wrap(&plaintext, &kek).unwrap();
        assert_eq!(
            hex::encode_upper(&ciphertext),
            "1FA68B0A8112B447AEF34BD8FB5A7B829D3E862371D2CFE5"
        );
        assert_eq!(unwrap(&ciphertext, &kek).unwrap(), plaintext);
    }

    #[test]
    fn test_wrap_128_data_256_kek() {
        let kek =
            hex::decode("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F")
                .unwrap();
        let plaintext = hex::decode("00112233445566778899AABBCCDDEEFF").unwrap();
        let ciphertext = wrap(&plaintext, &kek).unwrap();
        assert_eq!(
            hex::encode_upper(&ciphertext),
            "64E8C3F9CE0F5BA263E9777905818A2A93C8191E7D6E8AE7"
        );
        assert_eq!(unwrap(&ciphertext, &kek).unwrap(), plaintext);
    }

    #[test]
    fn test_wrap_256_data_256_kek() {
        let kek =
            hex::decode("000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F")
                .unwrap();
        let plaintext =
            hex::decode("00112233445566778899AABBCCDDEEFF000102030405060708090A0B0C0D0E0F")
                .unwrap();
        let ciphertext = wrap(&plaintext, &kek).unwrap();
        assert_eq!(
            hex::encode_upper(&ciphertext),
            "28C9F404C4B810F4CBCCB35CFB87F8263F5786E2D80ED326CBC7F0E71A99F43BFB988B9B7A02DD21"
        );
        assert_eq!(unwrap(&ciphertext, &kek).unwrap(), plaintext);
    }

    #[test]
    fn test_round_trip_192_kek() {
        let kek = [0x42u8; 24];
        let plaintext = [0x17u8; 40];
        let ciphertext = wrap(&plaintext, &kek).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len() + 8);
        assert_eq!(unwrap(&ciphertext, &kek).unwrap(), plaintext);
    }

    #[test]
    fn test_single_semiblock_rejected() {
        let err = wrap(&[0u8; 8], &[0u8; 16]).unwrap_err();
        assert_eq!(err, KeyWrapError::NoKeyPresent);
    }

    #[test]
    fn test_unaligned_length_rejected() {
        let err = wrap(&[0u8; 7], &[0u8; 16]).unwrap_err();
        assert_eq!(err, KeyWrapError::InvalidLength { len: 7 });
        let err = unwrap(&[0u8; 23], &[0u8; 16]).unwrap_err();
        assert_eq!(err, KeyWrapError::InvalidLength { len: 23 });
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let err = unwrap(&[0u8; 16], &[0u8; 16]).unwrap_err();
        assert_eq!(err, KeyWrapError::NoKeyPresent);
    }

    #[test]
    fn test_invalid_kek_size_rejected() {
        let err = wrap(&[0u8; 16], &[0u8; 17]).unwrap_err();
        assert_eq!(err, KeyWrapError::InvalidKekLength { len: 17 });
    }

    #[test]
    fn test_corruption_detected_in_every_byte() {
        let kek = [0x01u8; 16];
        let plaintext = [0x02u8; 16];
        let ciphertext = wrap(&plaintext, &kek).unwrap();
        for i in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[i] ^= 0x80;
            assert_eq!(
                unwrap(&tampered, &kek).unwrap_err(),
                KeyWrapError::Corrupt,
                "byte {i} tampering went undetected"
            );
        }
    }
}
