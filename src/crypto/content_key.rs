// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Symmetric content keys and record encryption.
//!
//! Every patient has one content key (AES-128 or AES-256). Record payloads
//! are sealed with AES-GCM under a fresh random 96-bit nonce per call; the
//! stored form is a [`ContentBlob`] `{iv, ciphertext}` where the ciphertext
//! carries the 16-byte authentication tag.

use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, ValidationError};
use crate::models::base64_bytes;

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Supported content key lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLength {
    Aes128,
    Aes256,
}

impl KeyLength {
    pub fn bytes(&self) -> usize {
        match self {
            KeyLength::Aes128 => 16,
            KeyLength::Aes256 => 32,
        }
    }

    fn algorithm(&self) -> &'static aead::Algorithm {
        match self {
            KeyLength::Aes128 => &aead::AES_128_GCM,
            KeyLength::Aes256 => &aead::AES_256_GCM,
        }
    }
}

/// A patient's symmetric content key.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey {
    length: KeyLength,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl ContentKey {
    /// Generate a fresh key from the system CSPRNG.
    pub fn generate(length: KeyLength) -> Result<Self, CryptoError> {
        let mut bytes = vec![0u8; length.bytes()];
        SystemRandom::new()
            .fill(&mut bytes)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        Ok(Self { length, bytes })
    }

    /// Build a key from raw bytes. Only 16 and 32 byte keys are accepted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let length = match bytes.len() {
            16 => KeyLength::Aes128,
            32 => KeyLength::Aes256,
            other => return Err(ValidationError::InvalidKeyLength(other)),
        };
        Ok(Self {
            length,
            bytes: bytes.to_vec(),
        })
    }

    pub fn length(&self) -> KeyLength {
        self.length
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn aead_key(&self) -> Result<LessSafeKey, CryptoError> {
        let unbound = UnboundKey::new(self.length.algorithm(), &self.bytes)
            .map_err(|_| CryptoError::EncryptionFailed)?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<ContentBlob, CryptoError> {
        let key = self.aead_key()?;

        let mut iv = [0u8; NONCE_SIZE];
        SystemRandom::new()
            .fill(&mut iv)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut in_out = plaintext.to_vec();
        key.seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(ContentBlob {
            iv: iv.to_vec(),
            ciphertext: in_out,
        })
    }

    /// Decrypt a blob. Fails closed: any tag, nonce or key mismatch yields
    /// [`CryptoError::DecryptionFailed`] and no plaintext.
    pub fn decrypt(&self, blob: &ContentBlob) -> Result<Vec<u8>, CryptoError> {
        let key = self.aead_key().map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = Nonce::try_assume_unique_for_key(&blob.iv)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let mut in_out = blob.ciphertext.clone();
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        Ok(plaintext.to_vec())
    }
}

/// Encrypted payload as stored in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlob {
    #[serde(with = "base64_bytes")]
    pub iv: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
}

impl ContentBlob {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CryptoError> {
        serde_json::to_vec(self).map_err(|_| CryptoError::EncryptionFailed)
    }

    /// Parse a stored blob. Malformed input is reported as a decryption
    /// failure so callers see one error for every unreadable blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        serde_json::from_slice(bytes).map_err(|_| CryptoError::DecryptionFailed)
    }
}
