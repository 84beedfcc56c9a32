// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity registries for doctors and insurance companies.
//!
//! Mutation is gated on the registry [`Authority`](crate::auth::Authority).
//! Removing an identity keeps its row with an empty name, `active = false`
//! and no published key, so lookups of removed principals behave exactly
//! like lookups of unknown ones.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, WriteTransaction};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::database::{get_json, put_json, IDENTITIES};
use super::events::{append, LedgerEvent, LedgerEventType};
use super::AuthorizationLedger;
use crate::auth::ViewerKind;
use crate::crypto::PublicKey;
use crate::error::{AuthorizationError, ValidationError, VaultResult};
use crate::models::PrincipalId;

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub principal: PrincipalId,
    pub kind: ViewerKind,
    /// Non-empty while `active`.
    pub display_name: String,
    pub active: bool,
    /// SPKI PEM published by the principal itself.
    pub public_key: Option<String>,
    pub added_at: Option<DateTime<Utc>>,
}

impl IdentityRecord {
    fn cleared(principal: &PrincipalId, kind: ViewerKind) -> Self {
        Self {
            principal: principal.clone(),
            kind,
            display_name: String::new(),
            active: false,
            public_key: None,
            added_at: None,
        }
    }
}

/// Registry key: `kind|principal`.
fn identity_key(kind: ViewerKind, principal: &PrincipalId) -> String {
    format!("{}|{}", kind.as_str(), principal)
}

/// Trim and NFC-normalize a display name; empty names are rejected.
pub fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let normalized: String = name.trim().nfc().collect();
    if normalized.is_empty() {
        Err(ValidationError::InvalidName)
    } else {
        Ok(normalized)
    }
}

fn insert_identity(
    txn: &WriteTransaction,
    caller: &PrincipalId,
    kind: ViewerKind,
    principal: &PrincipalId,
    name: String,
) -> VaultResult<()> {
    let key = identity_key(kind, principal);
    let existing: Option<IdentityRecord> = {
        let table = txn.open_table(IDENTITIES)?;
        get_json(&table, &key)?
    };
    let record = IdentityRecord {
        principal: principal.clone(),
        kind,
        display_name: name.clone(),
        active: true,
        // Re-adding a name keeps a key the principal already published.
        public_key: existing.filter(|r| r.active).and_then(|r| r.public_key),
        added_at: Some(Utc::now()),
    };
    put_json(txn, IDENTITIES, &key, &record)?;
    append(
        txn,
        LedgerEvent::new(LedgerEventType::IdentityAdded)
            .with_actor(caller)
            .with_subject(principal)
            .with_kind(kind)
            .with_details(serde_json::json!({ "name": name })),
    )?;
    Ok(())
}

fn clear_identity(
    txn: &WriteTransaction,
    caller: &PrincipalId,
    kind: ViewerKind,
    principal: &PrincipalId,
) -> VaultResult<()> {
    put_json(
        txn,
        IDENTITIES,
        &identity_key(kind, principal),
        &IdentityRecord::cleared(principal, kind),
    )?;
    append(
        txn,
        LedgerEvent::new(LedgerEventType::IdentityRemoved)
            .with_actor(caller)
            .with_subject(principal)
            .with_kind(kind),
    )?;
    Ok(())
}

impl AuthorizationLedger {
    /// Add (or rename) one identity.
    pub fn add_identity(
        &self,
        caller: &PrincipalId,
        kind: ViewerKind,
        principal: &PrincipalId,
        name: &str,
    ) -> VaultResult<()> {
        self.authority.verify(kind, caller)?;
        let name = normalize_name(name)?;
        self.write(|txn| insert_identity(txn, caller, kind, principal, name))?;
        tracing::info!(kind = %kind, principal = %principal, "identity added");
        Ok(())
    }

    /// Clear one identity's name, active flag and published key.
    pub fn remove_identity(
        &self,
        caller: &PrincipalId,
        kind: ViewerKind,
        principal: &PrincipalId,
    ) -> VaultResult<()> {
        self.authority.verify(kind, caller)?;
        self.write(|txn| clear_identity(txn, caller, kind, principal))?;
        tracing::info!(kind = %kind, principal = %principal, "identity removed");
        Ok(())
    }

    /// Add identities pairwise. All names are validated before anything is
    /// written; the whole batch commits or none of it does.
    pub fn batch_add_identities(
        &self,
        caller: &PrincipalId,
        kind: ViewerKind,
        principals: &[PrincipalId],
        names: &[String],
    ) -> VaultResult<()> {
        self.authority.verify(kind, caller)?;
        if principals.len() != names.len() {
            return Err(ValidationError::LengthMismatch {
                left: principals.len(),
                right: names.len(),
            }
            .into());
        }
        let names = names
            .iter()
            .map(|name| normalize_name(name))
            .collect::<Result<Vec<_>, _>>()?;

        self.write(|txn| {
            for (principal, name) in principals.iter().zip(names) {
                insert_identity(txn, caller, kind, principal, name)?;
            }
            Ok(())
        })?;
        tracing::info!(kind = %kind, count = principals.len(), "identities batch added");
        Ok(())
    }

    pub fn batch_remove_identities(
        &self,
        caller: &PrincipalId,
        kind: ViewerKind,
        principals: &[PrincipalId],
    ) -> VaultResult<()> {
        self.authority.verify(kind, caller)?;
        self.write(|txn| {
            for principal in principals {
                clear_identity(txn, caller, kind, principal)?;
            }
            Ok(())
        })?;
        tracing::info!(kind = %kind, count = principals.len(), "identities batch removed");
        Ok(())
    }

    /// Publish the caller's own public key in the `kind` registry.
    ///
    /// Only active identities may publish; the key must parse as SPKI PEM.
    pub fn publish_identity_key(
        &self,
        caller: &PrincipalId,
        kind: ViewerKind,
        public_key_pem: &str,
    ) -> VaultResult<()> {
        let canonical = PublicKey::from_pem(public_key_pem)?.to_pem()?;
        let key = identity_key(kind, caller);

        self.write(|txn| {
            let mut record: IdentityRecord = {
                let table = txn.open_table(IDENTITIES)?;
                get_json::<IdentityRecord, _>(&table, &key)?
            }
            .filter(|r| r.active)
            .ok_or(AuthorizationError::Unauthorized)?;

            record.public_key = Some(canonical);
            put_json(txn, IDENTITIES, &key, &record)?;
            append(
                txn,
                LedgerEvent::new(LedgerEventType::IdentityKeyPublished)
                    .with_actor(caller)
                    .with_subject(caller)
                    .with_kind(kind),
            )?;
            Ok(())
        })?;
        tracing::info!(kind = %kind, principal = %caller, "identity key published");
        Ok(())
    }

    /// Registry entry as stored, including cleared entries.
    pub fn identity(
        &self,
        kind: ViewerKind,
        principal: &PrincipalId,
    ) -> VaultResult<Option<IdentityRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITIES)?;
        Ok(get_json(&table, &identity_key(kind, principal))?)
    }

    /// Registry membership as seen by an open write transaction.
    pub(crate) fn is_active_in(
        txn: &WriteTransaction,
        kind: ViewerKind,
        principal: &PrincipalId,
    ) -> VaultResult<bool> {
        let table = txn.open_table(IDENTITIES)?;
        let record: Option<IdentityRecord> = get_json(&table, &identity_key(kind, principal))?;
        Ok(record.is_some_and(|r| r.active))
    }

    pub fn is_active(&self, kind: ViewerKind, principal: &PrincipalId) -> VaultResult<bool> {
        Ok(self
            .identity(kind, principal)?
            .is_some_and(|record| record.active))
    }

    /// Display name, or an empty string for unknown or removed principals.
    pub fn name_of(&self, kind: ViewerKind, principal: &PrincipalId) -> VaultResult<String> {
        Ok(self
            .identity(kind, principal)?
            .map(|record| record.display_name)
            .unwrap_or_default())
    }

    /// Published key of an active identity.
    pub fn identity_public_key(
        &self,
        kind: ViewerKind,
        principal: &PrincipalId,
    ) -> VaultResult<Option<String>> {
        Ok(self
            .identity(kind, principal)?
            .filter(|record| record.active)
            .and_then(|record| record.public_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::error::VaultError;
    use crate::ledger::test_support::*;

    #[test]
    fn add_and_lookup() {
        let ledger = ledger();
        let authority = principal(AUTHORITY);
        let doctor = principal("0xd0c");

        assert!(!ledger.is_active(ViewerKind::Doctor, &doctor).unwrap());
        assert_eq!(ledger.name_of(ViewerKind::Doctor, &doctor).unwrap(), "");

        ledger
            .add_identity(&authority, ViewerKind::Doctor, &doctor, "  Dr. House ")
            .unwrap();

        assert!(ledger.is_active(ViewerKind::Doctor, &doctor).unwrap());
        assert_eq!(
            ledger.name_of(ViewerKind::Doctor, &doctor).unwrap(),
            "Dr. House"
        );
        // Registries are independent.
        assert!(!ledger
            .is_active(ViewerKind::InsuranceCompany, &doctor)
            .unwrap());
    }

    #[test]
    fn add_rejects_empty_name() {
        let ledger = ledger();
        let result = ledger.add_identity(
            &principal(AUTHORITY),
            ViewerKind::Doctor,
            &principal("0xd0c"),
            "   ",
        );
        assert!(matches!(
            result,
            Err(VaultError::Validation(ValidationError::InvalidName))
        ));
    }

    #[test]
    fn names_are_nfc_normalized() {
        assert_eq!(normalize_name("Jose\u{301}").unwrap(), "Jos\u{e9}");
    }

    #[test]
    fn only_authority_mutates() {
        let ledger = ledger();
        let intruder = principal("intruder");
        let doctor = principal("0xd0c");

        let add = ledger.add_identity(&intruder, ViewerKind::Doctor, &doctor, "Dr. Who");
        assert!(matches!(
            add,
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));

        let remove = ledger.remove_identity(&intruder, ViewerKind::Doctor, &doctor);
        assert!(matches!(
            remove,
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));

        let batch = ledger.batch_add_identities(
            &intruder,
            ViewerKind::InsuranceCompany,
            &[doctor.clone()],
            &["X".to_string()],
        );
        assert!(matches!(
            batch,
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
        assert!(ledger.events(None, 100).unwrap().is_empty());
    }

    #[test]
    fn remove_clears_entry() {
        let ledger = ledger();
        let authority = principal(AUTHORITY);
        let doctor = principal("0xd0c");
        let pair = Keypair::generate();

        ledger
            .add_identity(&authority, ViewerKind::Doctor, &doctor, "Dr. House")
            .unwrap();
        ledger
            .publish_identity_key(&doctor, ViewerKind::Doctor, &pair.public.to_pem().unwrap())
            .unwrap();
        ledger
            .remove_identity(&authority, ViewerKind::Doctor, &doctor)
            .unwrap();

        let record = ledger.identity(ViewerKind::Doctor, &doctor).unwrap().unwrap();
        assert!(!record.active);
        assert_eq!(record.display_name, "");
        assert_eq!(record.public_key, None);
        assert_eq!(ledger.name_of(ViewerKind::Doctor, &doctor).unwrap(), "");
    }

    #[test]
    fn batch_add_length_mismatch_changes_nothing() {
        let ledger = ledger();
        let principals = vec![principal("a"), principal("b")];
        let names = vec!["Alpha".to_string()];

        let result = ledger.batch_add_identities(
            &principal(AUTHORITY),
            ViewerKind::Doctor,
            &principals,
            &names,
        );
        assert!(matches!(
            result,
            Err(VaultError::Validation(ValidationError::LengthMismatch {
                left: 2,
                right: 1
            }))
        ));
        for p in &principals {
            assert!(!ledger.is_active(ViewerKind::Doctor, p).unwrap());
        }
        assert!(ledger.events(None, 100).unwrap().is_empty());
    }

    #[test]
    fn batch_add_with_one_bad_name_changes_nothing() {
        let ledger = ledger();
        let principals = vec![principal("a"), principal("b")];
        let names = vec!["Alpha".to_string(), "".to_string()];

        let result = ledger.batch_add_identities(
            &principal(AUTHORITY),
            ViewerKind::Doctor,
            &principals,
            &names,
        );
        assert!(matches!(
            result,
            Err(VaultError::Validation(ValidationError::InvalidName))
        ));
        assert!(!ledger.is_active(ViewerKind::Doctor, &principals[0]).unwrap());
    }

    #[test]
    fn batch_add_and_remove() {
        let ledger = ledger();
        let authority = principal(AUTHORITY);
        let principals = vec![principal("a"), principal("b"), principal("c")];
        let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        ledger
            .batch_add_identities(&authority, ViewerKind::InsuranceCompany, &principals, &names)
            .unwrap();
        for (p, n) in principals.iter().zip(&names) {
            assert!(ledger.is_active(ViewerKind::InsuranceCompany, p).unwrap());
            assert_eq!(&ledger.name_of(ViewerKind::InsuranceCompany, p).unwrap(), n);
        }

        ledger
            .batch_remove_identities(&authority, ViewerKind::InsuranceCompany, &principals[..2])
            .unwrap();
        assert!(!ledger
            .is_active(ViewerKind::InsuranceCompany, &principals[0])
            .unwrap());
        assert!(!ledger
            .is_active(ViewerKind::InsuranceCompany, &principals[1])
            .unwrap());
        assert!(ledger
            .is_active(ViewerKind::InsuranceCompany, &principals[2])
            .unwrap());

        let events = ledger.events(None, 100).unwrap();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0].details, Some(serde_json::json!({"name": "A"})));
        assert_eq!(events[4].event_type, LedgerEventType::IdentityRemoved);
    }

    #[test]
    fn publish_key_requires_active_identity() {
        let ledger = ledger();
        let doctor = principal("0xd0c");
        let pem = Keypair::generate().public.to_pem().unwrap();

        let result = ledger.publish_identity_key(&doctor, ViewerKind::Doctor, &pem);
        assert!(matches!(
            result,
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));

        ledger
            .add_identity(&principal(AUTHORITY), ViewerKind::Doctor, &doctor, "Dr. House")
            .unwrap();
        ledger
            .publish_identity_key(&doctor, ViewerKind::Doctor, &pem)
            .unwrap();
        assert_eq!(
            ledger
                .identity_public_key(ViewerKind::Doctor, &doctor)
                .unwrap()
                .as_deref(),
            Some(pem.as_str())
        );
    }

    #[test]
    fn publish_key_rejects_garbage() {
        let ledger = populated_ledger();
        let result =
            ledger.publish_identity_key(&principal("doctor"), ViewerKind::Doctor, "not a key");
        assert!(matches!(
            result,
            Err(VaultError::Crypto(crate::error::CryptoError::InvalidKey(_)))
        ));
    }
}
