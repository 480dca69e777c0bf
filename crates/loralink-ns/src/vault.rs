//! Key vault seam and the at-rest key envelope helpers.
//!
//! The vault resolves KEK labels and wraps/unwraps key material with
//! RFC 3394. The helper layer translates between raw key material and
//! [`KeyEnvelope`]s: an empty KEK label means keys pass through in
//! plaintext, mirroring deployments without a configured vault.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use loralink_core::keywrap::{self, KeyWrapError};
use loralink_core::types::{Aes128Key, KeyEnvelope, SessionKeys};
use loralink_core::fieldmask;

use crate::context::Context;

/// Errors produced by the key vault.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VaultError {
    /// No KEK is registered under the label.
    #[error("unknown KEK `{label}`")]
    UnknownKek {
        /// The unresolved label.
        label: String,
    },

    /// The envelope carries no key material to unwrap.
    #[error("key envelope is empty")]
    EmptyEnvelope,

    /// The wrap or unwrap operation failed.
    #[error("key wrap failed")]
    KeyWrap(#[from] KeyWrapError),
}

impl VaultError {
    /// Whether this is the *not-found* error class.
    ///
    /// Unresolved-label errors are tolerable for the queued join-accept
    /// `AppSKey`; every other vault error is fatal.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UnknownKek { .. })
    }
}

/// Resolves KEKs by label and wraps/unwraps key material under them.
#[async_trait]
pub trait KeyVault: Send + Sync {
    /// Wraps `plaintext` under the KEK registered as `kek_label`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UnknownKek`] for unregistered labels.
    async fn wrap(
        &self,
        ctx: &Context,
        plaintext: &[u8],
        kek_label: &str,
    ) -> Result<Vec<u8>, VaultError>;

    /// Unwraps `ciphertext` under the KEK registered as `kek_label`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::UnknownKek`] for unregistered labels and
    /// [`VaultError::KeyWrap`] for corrupt ciphertext.
    async fn unwrap(
        &self,
        ctx: &Context,
        ciphertext: &[u8],
        kek_label: &str,
    ) -> Result<Vec<u8>, VaultError>;
}

/// Wraps an AES-128 key into its at-rest envelope.
///
/// An empty `kek_label` produces a plaintext envelope.
///
/// # Errors
///
/// Propagates vault errors.
pub async fn wrap_aes128_key(
    ctx: &Context,
    key: Aes128Key,
    kek_label: &str,
    vault: &dyn KeyVault,
) -> Result<KeyEnvelope, VaultError> {
    if kek_label.is_empty() {
        return Ok(KeyEnvelope::plain(key));
    }
    let encrypted = vault.wrap(ctx, key.as_bytes(), kek_label).await?;
    Ok(KeyEnvelope::wrapped(encrypted, kek_label.to_string()))
}

/// Recovers the AES-128 key from an envelope.
///
/// # Errors
///
/// Returns [`VaultError::EmptyEnvelope`] when the envelope carries neither
/// plaintext nor wrapped material, and propagates vault errors otherwise.
pub async fn unwrap_aes128_key(
    ctx: &Context,
    envelope: &KeyEnvelope,
    vault: &dyn KeyVault,
) -> Result<Aes128Key, VaultError> {
    if let Some(key) = envelope.plaintext() {
        return Ok(*key);
    }
    let (Some(encrypted), Some(label)) = (&envelope.encrypted_key, &envelope.kek_label) else {
        return Err(VaultError::EmptyEnvelope);
    };
    let plaintext = vault.unwrap(ctx, encrypted, label).await?;
    let bytes: [u8; 16] = plaintext
        .as_slice()
        .try_into()
        .map_err(|_| VaultError::KeyWrap(KeyWrapError::InvalidLength {
            len: plaintext.len(),
        }))?;
    Ok(Aes128Key(bytes))
}

/// Unwraps every session key whose plaintext path under `prefix` is in the
/// requested field mask, leaving the others untouched.
///
/// # Errors
///
/// Propagates the first unwrap failure.
pub async fn unwrap_selected_session_keys<S: AsRef<str> + Sync>(
    ctx: &Context,
    vault: &dyn KeyVault,
    mut keys: SessionKeys,
    prefix: &str,
    paths: &[S],
) -> Result<SessionKeys, VaultError> {
    for name in SessionKeys::KEY_NAMES {
        if !fieldmask::has_any_field(paths, &[&format!("{prefix}.{name}.key")]) {
            continue;
        }
        let slot = keys.envelope_mut(name).expect("known key name");
        if let Some(envelope) = slot.as_ref() {
            let key = unwrap_aes128_key(ctx, envelope, vault).await?;
            *slot = Some(KeyEnvelope::plain(key));
        }
    }
    Ok(keys)
}

/// In-memory KEK registry backed by the RFC 3394 codec.
#[derive(Debug, Default)]
pub struct MemKeyVault {
    keks: HashMap<String, Vec<u8>>,
}

impl MemKeyVault {
    /// An empty vault.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A vault with the given labeled KEKs.
    #[must_use]
    pub fn with_keks<I, L, K>(keks: I) -> Self
    where
        I: IntoIterator<Item = (L, K)>,
        L: Into<String>,
        K: Into<Vec<u8>>,
    {
        Self {
            keks: keks
                .into_iter()
                .map(|(label, kek)| (label.into(), kek.into()))
                .collect(),
        }
    }

    fn kek(&self, label: &str) -> Result<&[u8], VaultError> {
        self.keks
            .get(label)
            .map(Vec::as_slice)
            .ok_or_else(|| VaultError::UnknownKek {
                label: label.to_string(),
            })
    }
}

#[async_trait]
impl KeyVault for MemKeyVault {
    async fn wrap(
        &self,
        _ctx: &Context,
        plaintext: &[u8],
        kek_label: &str,
    ) -> Result<Vec<u8>, VaultError> {
        Ok(keywrap::wrap(plaintext, self.kek(kek_label)?)?)
    }

    async fn unwrap(
        &self,
        _ctx: &Context,
        ciphertext: &[u8],
        kek_label: &str,
    ) -> Result<Vec<u8>, VaultError> {
        Ok(keywrap::unwrap(ciphertext, self.kek(kek_label)?)?)
    }
}
