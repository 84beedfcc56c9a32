// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Content-addressed blob store interface.
//!
//! Blobs are immutable and addressed by the SHA-256 of their bytes, so a
//! fetch can be retried freely and a returned blob can be checked against
//! its CID.

use std::collections::HashMap;
use std::future::Future;

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::CryptoError;
use crate::models::Cid;

/// Prefix of CIDs produced by [`cid_for`].
pub const CID_PREFIX: &str = "sha256-";

/// CID of `bytes`: `sha256-` followed by the unpadded base64url digest.
pub fn cid_for(bytes: &[u8]) -> Cid {
    let digest = Sha256::digest(bytes);
    Cid(format!("{CID_PREFIX}{}", Base64UrlUnpadded::encode_string(&digest)))
}

/// External blob store. `put` is idempotent; there is no delete.
pub trait ContentStore: Send + Sync {
    fn put(&self, bytes: Vec<u8>) -> impl Future<Output = Result<Cid, CryptoError>> + Send;

    /// Fails with `ContentUnavailable` when the CID is unknown or the
    /// returned bytes do not hash to it.
    fn get(&self, cid: &Cid) -> impl Future<Output = Result<Vec<u8>, CryptoError>> + Send;
}

/// Process-local store for tests and single-node deployments.
#[derive(Default)]
pub struct InMemoryContentStore {
    blobs: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

impl ContentStore for InMemoryContentStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<Cid, CryptoError> {
        let cid = cid_for(&bytes);
        self.blobs
            .write()
            .await
            .entry(cid.clone())
            .or_insert(bytes);
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, CryptoError> {
        let bytes = self
            .blobs
            .read()
            .await
            .get(cid)
            .cloned()
            .ok_or_else(|| CryptoError::ContentUnavailable(cid.to_string()))?;
        if cid_for(&bytes) != *cid {
            return Err(CryptoError::ContentUnavailable(cid.to_string()));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cid_is_deterministic_and_prefixed() {
        let a = cid_for(b"hello");
        assert_eq!(a, cid_for(b"hello"));
        assert_ne!(a, cid_for(b"hello!"));
        assert!(a.as_str().starts_with(CID_PREFIX));
        // 32-byte digest in unpadded base64url.
        assert_eq!(a.as_str().len(), CID_PREFIX.len() + 43);
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = InMemoryContentStore::new();
        let cid = store.put(b"blob".to_vec()).await.unwrap();
        assert_eq!(store.get(&cid).await.unwrap(), b"blob");

        // Same bytes, same CID, one entry.
        assert_eq!(store.put(b"blob".to_vec()).await.unwrap(), cid);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_cid_is_unavailable() {
        let store = InMemoryContentStore::new();
        assert!(store.is_empty().await);
        let result = store.get(&Cid::from("sha256-missing")).await;
        assert!(matches!(result, Err(CryptoError::ContentUnavailable(_))));
    }
}
