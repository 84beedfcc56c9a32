// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Custodian
//!
//! Private keys live outside the ledger in a PIN-gated custodian. The
//! protocol treats the custodian as an untrusted, possibly absent side
//! channel: every failure other than a wrong PIN surfaces as
//! [`CryptoError::KeyUnavailable`] and nothing in this crate persists a
//! private key.
//!
//! ## Implementations
//!
//! - [`InMemoryKeyCustodian`]: process-local, PINs kept only as HMAC-SHA256
//!   verifiers with a per-entry salt
//! - [`HttpKeyCustodian`]: client for a remote custodian service

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use url::Url;

use crate::crypto::PrivateKey;
use crate::error::CryptoError;
use crate::models::PrincipalId;

type HmacSha256 = Hmac<Sha256>;

const SALT_SIZE: usize = 16;

/// Source of actors' private keys.
pub trait KeyCustodian: Send + Sync {
    fn fetch_private_key(
        &self,
        principal: &PrincipalId,
        pin: &str,
    ) -> impl Future<Output = Result<PrivateKey, CryptoError>> + Send;
}

// =============================================================================
// In-memory custodian
// =============================================================================

struct CustodyEntry {
    salt: [u8; SALT_SIZE],
    pin_tag: Vec<u8>,
    private_key_pem: String,
}

fn pin_mac(salt: &[u8], principal: &PrincipalId, pin: &str) -> Result<HmacSha256, CryptoError> {
    let mut mac = HmacSha256::new_from_slice(salt).map_err(|_| CryptoError::KeyUnavailable)?;
    mac.update(principal.as_str().as_bytes());
    mac.update(&[0]);
    mac.update(pin.as_bytes());
    Ok(mac)
}

/// Process-local custodian.
#[derive(Default)]
pub struct InMemoryKeyCustodian {
    entries: RwLock<HashMap<PrincipalId, CustodyEntry>>,
}

impl InMemoryKeyCustodian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `key` for `principal`, replacing any earlier deposit.
    pub fn deposit(
        &self,
        principal: &PrincipalId,
        key: &PrivateKey,
        pin: &str,
    ) -> Result<(), CryptoError> {
        let mut salt = [0u8; SALT_SIZE];
        SystemRandom::new()
            .fill(&mut salt)
            .map_err(|_| CryptoError::KeyUnavailable)?;
        let pin_tag = pin_mac(&salt, principal, pin)?.finalize().into_bytes().to_vec();

        let entry = CustodyEntry {
            salt,
            pin_tag,
            private_key_pem: key.to_pem()?,
        };
        self.entries
            .write()
            .map_err(|_| CryptoError::KeyUnavailable)?
            .insert(principal.clone(), entry);
        tracing::debug!(principal = %principal, "private key deposited with custodian");
        Ok(())
    }
}

impl KeyCustodian for InMemoryKeyCustodian {
    async fn fetch_private_key(
        &self,
        principal: &PrincipalId,
        pin: &str,
    ) -> Result<PrivateKey, CryptoError> {
        let entries = self.entries.read().map_err(|_| CryptoError::KeyUnavailable)?;
        let entry = entries.get(principal).ok_or(CryptoError::KeyUnavailable)?;

        pin_mac(&entry.salt, principal, pin)?
            .verify_slice(&entry.pin_tag)
            .map_err(|_| CryptoError::InvalidPin)?;

        PrivateKey::from_pem(&entry.private_key_pem).map_err(|_| CryptoError::KeyUnavailable)
    }
}

// =============================================================================
// HTTP custodian client
// =============================================================================

#[derive(Serialize)]
struct UnlockRequest<'a> {
    pin: &'a str,
}

#[derive(Deserialize)]
struct UnlockResponse {
    private_key_pem: String,
}

/// Client for a remote custodian.
///
/// `POST {base_url}/v1/keys/{principal}/unlock` with `{"pin": ...}`; the
/// PIN travels in the body, never in the URL.
#[derive(Clone)]
pub struct HttpKeyCustodian {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpKeyCustodian {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn unlock_url(&self, principal: &PrincipalId) -> Result<Url, CryptoError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CryptoError::KeyUnavailable)?
            .pop_if_empty()
            .extend(["v1", "keys", principal.as_str(), "unlock"]);
        Ok(url)
    }
}

impl KeyCustodian for HttpKeyCustodian {
    async fn fetch_private_key(
        &self,
        principal: &PrincipalId,
        pin: &str,
    ) -> Result<PrivateKey, CryptoError> {
        let url = self.unlock_url(principal)?;
        let response = self
            .client
            .post(url)
            .json(&UnlockRequest { pin })
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(principal = %principal, error = %e, "key custodian unreachable");
                CryptoError::KeyUnavailable
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CryptoError::InvalidPin);
        }
        if !status.is_success() {
            tracing::warn!(principal = %principal, status = %status, "key custodian refused request");
            return Err(CryptoError::KeyUnavailable);
        }

        let body: UnlockResponse = response.json().await.map_err(|e| {
            tracing::warn!(principal = %principal, error = %e, "malformed key custodian response");
            CryptoError::KeyUnavailable
        })?;
        PrivateKey::from_pem(&body.private_key_pem).map_err(|_| CryptoError::KeyUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[tokio::test]
    async fn deposit_and_fetch_with_correct_pin() {
        let custodian = InMemoryKeyCustodian::new();
        let principal = PrincipalId::from("patient");
        let pair = Keypair::generate();
        custodian.deposit(&principal, &pair.private, "4321").unwrap();

        let key = custodian.fetch_private_key(&principal, "4321").await.unwrap();
        assert_eq!(key.public_key(), pair.public);
    }

    #[tokio::test]
    async fn wrong_pin_is_rejected() {
        let custodian = InMemoryKeyCustodian::new();
        let principal = PrincipalId::from("patient");
        custodian
            .deposit(&principal, &Keypair::generate().private, "4321")
            .unwrap();

        assert_eq!(
            custodian.fetch_private_key(&principal, "0000").await.err(),
            Some(CryptoError::InvalidPin)
        );
    }

    #[tokio::test]
    async fn pin_is_bound_to_principal() {
        let custodian = InMemoryKeyCustodian::new();
        let alice = PrincipalId::from("alice");
        let bob = PrincipalId::from("bob");
        custodian.deposit(&alice, &Keypair::generate().private, "1111").unwrap();
        custodian.deposit(&bob, &Keypair::generate().private, "2222").unwrap();

        assert_eq!(
            custodian.fetch_private_key(&bob, "1111").await.err(),
            Some(CryptoError::InvalidPin)
        );
    }

    #[tokio::test]
    async fn unknown_principal_is_unavailable() {
        let custodian = InMemoryKeyCustodian::new();
        assert_eq!(
            custodian
                .fetch_private_key(&PrincipalId::from("nobody"), "1234")
                .await
                .err(),
            Some(CryptoError::KeyUnavailable)
        );
    }

    #[test]
    fn unlock_url_keeps_pin_out_of_path() {
        let custodian = HttpKeyCustodian::new(Url::parse("https://custody.example/api/").unwrap());
        let url = custodian.unlock_url(&PrincipalId::from("0xabc")).unwrap();
        assert_eq!(url.as_str(), "https://custody.example/api/v1/keys/0xabc/unlock");
    }

    #[tokio::test]
    async fn unreachable_custodian_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let custodian = HttpKeyCustodian::new(Url::parse(&format!("http://{addr}")).unwrap());
        let result = custodian
            .fetch_private_key(&PrincipalId::from("patient"), "1234")
            .await;
        assert_eq!(result.err(), Some(CryptoError::KeyUnavailable));
    }
}
