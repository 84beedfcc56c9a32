// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Medical record plaintext and its sealed form.
//!
//! A [`PatientRecord`] is serialized to JSON and encrypted under the
//! patient's content key into a [`ContentBlob`]; only the blob ever reaches
//! the content store.

pub mod anonymize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use anonymize::{anonymize, Gender, ResearchEntry};

use crate::crypto::{ContentBlob, ContentKey};
use crate::error::CryptoError;
use crate::models::PrincipalId;

/// Plaintext of one uploaded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: String,
    pub identification_number: String,
    pub gender: String,
    pub age: i32,
    /// Structured health fields (diagnoses, vitals, medication, ...).
    pub health_records: serde_json::Value,
    /// Whether the patient allows insurers to see this record.
    pub insurance_access: bool,
    /// Patient the record belongs to.
    pub account: PrincipalId,
    pub timestamp: DateTime<Utc>,
}

impl PatientRecord {
    /// Serialize and encrypt under `key`.
    pub fn seal(&self, key: &ContentKey) -> Result<ContentBlob, CryptoError> {
        let plaintext = serde_json::to_vec(self).map_err(|_| CryptoError::EncryptionFailed)?;
        key.encrypt(&plaintext)
    }

    /// Decrypt and parse. Undecodable plaintext is reported like any other
    /// decryption failure.
    pub fn open(blob: &ContentBlob, key: &ContentKey) -> Result<Self, CryptoError> {
        let plaintext = key.decrypt(blob)?;
        serde_json::from_slice(&plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn record(account: &str) -> PatientRecord {
        PatientRecord {
            name: "Ada Lovelace".into(),
            identification_number: "ID-1815-12-10".into(),
            gender: "Female".into(),
            age: 36,
            health_records: serde_json::json!({
                "diagnosis": "hypertension",
                "blood_pressure": "140/90",
            }),
            insurance_access: true,
            account: PrincipalId::from(account),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::record;
    use super::*;
    use crate::crypto::KeyLength;

    #[test]
    fn seal_and_open() {
        let key = ContentKey::generate(KeyLength::Aes256).unwrap();
        let record = record("patient");

        let blob = record.seal(&key).unwrap();
        assert_eq!(PatientRecord::open(&blob, &key).unwrap(), record);
    }

    #[test]
    fn sealed_blob_hides_plaintext() {
        let key = ContentKey::generate(KeyLength::Aes128).unwrap();
        let blob = record("patient").seal(&key).unwrap();
        let stored = String::from_utf8(blob.to_bytes().unwrap()).unwrap();
        assert!(!stored.contains("Lovelace"));
        assert!(stored.contains("\"iv\""));
        assert!(stored.contains("\"ciphertext\""));
    }

    #[test]
    fn open_with_wrong_key_fails() {
        let key = ContentKey::generate(KeyLength::Aes256).unwrap();
        let other = ContentKey::generate(KeyLength::Aes256).unwrap();
        let blob = record("patient").seal(&key).unwrap();
        assert_eq!(
            PatientRecord::open(&blob, &other),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn non_record_plaintext_fails_uniformly() {
        let key = ContentKey::generate(KeyLength::Aes256).unwrap();
        let blob = key.encrypt(b"[1, 2, 3]").unwrap();
        assert_eq!(
            PatientRecord::open(&blob, &key),
            Err(CryptoError::DecryptionFailed)
        );
    }
}
