// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content-key wrapping for a single recipient (ECIES on secp256k1).
//!
//! # Protocol
//!
//! To wrap a content key for a recipient:
//! 1. Generate an ephemeral secp256k1 key
//! 2. ECDH between the ephemeral secret and the recipient public key
//! 3. HKDF-SHA256 over the shared secret, salted with both public keys,
//!    yields an AES-256-GCM key-encryption key
//! 4. Seal the raw content key under a random nonce, authenticating the
//!    ephemeral public key as associated data
//!
//! The recipient repeats step 2 with its private key and the ephemeral
//! public key carried in the wrapped key.
//!
//! # Wire Format
//!
//! ```text
//! [ ephemeral_pubkey: 33 bytes ][ nonce: 12 bytes ][ sealed_key: 16|32 bytes + 16 tag ]
//! ```
//!
//! A fresh ephemeral key and nonce per call make wrapping non-deterministic:
//! wrapping the same key twice for the same recipient gives different bytes.

use k256::ecdh::{diffie_hellman, EphemeralSecret};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use ring::aead::{self, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::hkdf;
use ring::rand::{SecureRandom, SystemRandom};

use super::content_key::{ContentKey, NONCE_SIZE};
use super::keypair::{PrivateKey, PublicKey, PUBLIC_KEY_SIZE};
use crate::error::CryptoError;
use crate::models::WrappedKey;

/// HKDF info string binding derived keys to this use.
const WRAP_INFO: &[u8] = b"patient-vault/content-key-wrap/v1";

const TAG_SIZE: usize = 16;

/// Smallest valid wrapped key (16-byte content key).
pub const MIN_WRAPPED_SIZE: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + 16 + TAG_SIZE;

/// Largest valid wrapped key (32-byte content key).
pub const MAX_WRAPPED_SIZE: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + 32 + TAG_SIZE;

fn key_encryption_key(
    shared_secret: &[u8],
    ephemeral: &[u8],
    recipient: &[u8],
) -> Result<LessSafeKey, ()> {
    let mut salt = Vec::with_capacity(ephemeral.len() + recipient.len());
    salt.extend_from_slice(ephemeral);
    salt.extend_from_slice(recipient);

    let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, &salt).extract(shared_secret);
    let okm = prk
        .expand(&[WRAP_INFO], &aead::AES_256_GCM)
        .map_err(|_| ())?;
    Ok(LessSafeKey::new(UnboundKey::from(okm)))
}

/// Wrap `key` so that only the holder of `recipient`'s private key can
/// recover it.
pub fn wrap_key(key: &ContentKey, recipient: &PublicKey) -> Result<WrappedKey, CryptoError> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_public = ephemeral.public_key().to_encoded_point(true);
    let shared = ephemeral.diffie_hellman(&recipient.0);

    let kek = key_encryption_key(
        shared.raw_secret_bytes().as_slice(),
        ephemeral_public.as_bytes(),
        &recipient.to_sec1_bytes(),
    )
    .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut nonce = [0u8; NONCE_SIZE];
    SystemRandom::new()
        .fill(&mut nonce)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut sealed = key.as_bytes().to_vec();
    kek.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce),
        Aad::from(ephemeral_public.as_bytes()),
        &mut sealed,
    )
    .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(PUBLIC_KEY_SIZE + NONCE_SIZE + sealed.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(WrappedKey(out))
}

/// Recover a content key with the recipient's private key.
///
/// Every failure, including a malformed wrapped key, a key wrapped for
/// someone else, and tampering, is reported as
/// [`CryptoError::DecryptionFailed`].
pub fn unwrap_key(wrapped: &WrappedKey, recipient: &PrivateKey) -> Result<ContentKey, CryptoError> {
    let bytes = wrapped.as_bytes();
    if !(MIN_WRAPPED_SIZE..=MAX_WRAPPED_SIZE).contains(&bytes.len()) {
        return Err(CryptoError::DecryptionFailed);
    }

    let (ephemeral_bytes, rest) = bytes.split_at(PUBLIC_KEY_SIZE);
    let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);

    let ephemeral =
        PublicKey::from_sec1_bytes(ephemeral_bytes).map_err(|_| CryptoError::DecryptionFailed)?;
    let shared = diffie_hellman(recipient.0.to_nonzero_scalar(), ephemeral.0.as_affine());

    let kek = key_encryption_key(
        shared.raw_secret_bytes().as_slice(),
        ephemeral_bytes,
        &recipient.public_key().to_sec1_bytes(),
    )
    .map_err(|_| CryptoError::DecryptionFailed)?;
    let nonce =
        Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| CryptoError::DecryptionFailed)?;

    let mut in_out = sealed.to_vec();
    let raw = kek
        .open_in_place(nonce, Aad::from(ephemeral_bytes), &mut in_out)
        .map_err(|_| CryptoError::DecryptionFailed)?;

    ContentKey::from_bytes(raw).map_err(|_| CryptoError::DecryptionFailed)
}
