// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authorization Ledger
//!
//! The transactional store of record for identity rosters, patient vaults,
//! the research pool and the event log.
//!
//! ## Transaction Model
//!
//! Every mutating operation takes an explicit `caller` and runs as one redb
//! write transaction:
//!
//! 1. Load the affected rows
//! 2. Check the caller and the state machine
//! 3. Write the new rows and append a [`LedgerEvent`]
//! 4. Commit, or abort on the first error
//!
//! redb allows one writer at a time, so transactions never interleave and a
//! failed operation leaves no partial state behind. Read operations open a
//! read transaction and only observe committed data.
//!
//! ## Modules
//!
//! - `identity` - doctor and insurance-company registries
//! - `vault` - pure vault state and access state machine
//! - `access` - vault registration and the request/grant/revoke workflow
//! - `research` - append-only anonymized research pool
//! - `events` - event log

pub mod access;
pub mod database;
pub mod events;
pub mod identity;
pub mod ownership;
pub mod research;
pub mod vault;

use std::path::Path;

use redb::{Database, ReadableDatabase, WriteTransaction};

pub use database::{StoreError, StoreResult};
pub use events::{LedgerEvent, LedgerEventType, MAX_EVENT_PAGE};
pub use identity::IdentityRecord;
pub use ownership::{OwnedResource, OwnershipEnforcer};
pub use vault::{AccessEntry, AccessState, PatientVault, ViewerTrack};

use crate::auth::Authority;
use crate::error::{RegistrationError, VaultResult};
use crate::models::PrincipalId;

/// File name of the ledger inside the data directory.
pub const LEDGER_FILE: &str = "ledger.redb";

/// Handle to the authorization ledger.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct AuthorizationLedger {
    db: Database,
    authority: Authority,
}

impl AuthorizationLedger {
    /// Open (or create) a ledger file.
    pub fn open(path: &Path, authority: Authority) -> StoreResult<Self> {
        let db = database::open_file(path)?;
        tracing::info!(path = %path.display(), "opened authorization ledger");
        Ok(Self { db, authority })
    }

    /// Create an in-memory ledger.
    pub fn in_memory(authority: Authority) -> StoreResult<Self> {
        let db = database::open_in_memory()?;
        Ok(Self { db, authority })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Run `op` in a write transaction; commit on success, abort on error.
    fn write<T>(&self, op: impl FnOnce(&WriteTransaction) -> VaultResult<T>) -> VaultResult<T> {
        let txn = self.db.begin_write()?;
        match op(&txn) {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::warn!(error = %abort_err, "failed to abort ledger transaction");
                }
                Err(err)
            }
        }
    }

    /// Load a vault inside a write transaction.
    fn load_vault_in(txn: &WriteTransaction, owner: &PrincipalId) -> VaultResult<Option<PatientVault>> {
        let table = txn.open_table(database::VAULTS)?;
        Ok(database::get_json(&table, owner.as_str())?)
    }

    /// Load a vault inside a write transaction, failing if it is absent.
    fn require_vault_in(txn: &WriteTransaction, owner: &PrincipalId) -> VaultResult<PatientVault> {
        Self::load_vault_in(txn, owner)?.ok_or_else(|| RegistrationError::PatientUnregistered.into())
    }

    fn store_vault_in(txn: &WriteTransaction, vault: &PatientVault) -> VaultResult<()> {
        database::put_json(txn, database::VAULTS, vault.owner.as_str(), vault)?;
        Ok(())
    }

    /// Load a vault from committed state.
    fn read_vault(&self, owner: &PrincipalId) -> VaultResult<Option<PatientVault>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(database::VAULTS)?;
        Ok(database::get_json(&table, owner.as_str())?)
    }

    fn require_vault(&self, owner: &PrincipalId) -> VaultResult<PatientVault> {
        self.read_vault(owner)?
            .ok_or_else(|| RegistrationError::PatientUnregistered.into())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn failed_transaction_leaves_no_state() {
        let ledger = ledger();
        let result: VaultResult<()> = ledger.write(|txn| {
            let vault = PatientVault::new(principal("ghost"), chrono::Utc::now());
            AuthorizationLedger::store_vault_in(txn, &vault)?;
            Err(RegistrationError::AlreadyRegistered.into())
        });
        assert!(result.is_err());
        assert!(ledger.get_vault(&principal("ghost")).unwrap().is_none());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(LEDGER_FILE);
        let authority = Authority::single(principal(AUTHORITY));
        {
            let ledger = AuthorizationLedger::open(&path, authority.clone()).unwrap();
            ledger.register_patient(&principal("patient")).unwrap();
        }

        let ledger = AuthorizationLedger::open(&path, authority).unwrap();
        assert!(ledger.get_vault(&principal("patient")).unwrap().is_some());
    }
}
