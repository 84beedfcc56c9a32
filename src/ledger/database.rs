// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded ledger database backed by redb (pure Rust, ACID).
//!
//! redb serializes write transactions, which gives the ledger its strong
//! ordering: every mutation runs in exactly one write transaction and
//! readers only ever see committed state.
//!
//! ## Table Layout
//!
//! - `identities`: `kind|principal` → serialized IdentityRecord
//! - `vaults`: owner principal → serialized PatientVault
//! - `research_pool`: index → CID
//! - `events`: sequence number → serialized LedgerEvent
//! - `ledger_state`: key → value (schema version)

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const IDENTITIES: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");

pub(crate) const VAULTS: TableDefinition<&str, &[u8]> = TableDefinition::new("vaults");

pub(crate) const RESEARCH_POOL: TableDefinition<u64, &str> = TableDefinition::new("research_pool");

pub(crate) const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

pub(crate) const LEDGER_STATE: TableDefinition<&str, u64> = TableDefinition::new("ledger_state");

const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Current on-disk layout version.
pub const SCHEMA_VERSION: u64 = 1;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt ledger data: {0}")]
    Corrupt(String),

    #[error("unsupported ledger schema version {found} (expected {expected})")]
    SchemaVersion { found: u64, expected: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Open / Create
// =============================================================================

/// Open (or create) the ledger database file at `path`.
pub fn open_file(path: &Path) -> StoreResult<Database> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::create(path)?;
    initialize(&db)?;
    Ok(db)
}

/// Create a volatile ledger held entirely in memory.
pub fn open_in_memory() -> StoreResult<Database> {
    let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
    initialize(&db)?;
    Ok(db)
}

/// Pre-create all tables so later read transactions don't fail, and stamp
/// or check the schema version.
fn initialize(db: &Database) -> StoreResult<()> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(IDENTITIES)?;
        let _ = write_txn.open_table(VAULTS)?;
        let _ = write_txn.open_table(RESEARCH_POOL)?;
        let _ = write_txn.open_table(EVENTS)?;

        let mut state = write_txn.open_table(LEDGER_STATE)?;
        let found = state.get(SCHEMA_VERSION_KEY)?.map(|v| v.value());
        match found {
            None => {
                state.insert(SCHEMA_VERSION_KEY, SCHEMA_VERSION)?;
                tracing::info!(version = SCHEMA_VERSION, "initialized ledger schema");
            }
            Some(version) if version == SCHEMA_VERSION => {}
            Some(version) => {
                return Err(StoreError::SchemaVersion {
                    found: version,
                    expected: SCHEMA_VERSION,
                });
            }
        }
    }
    write_txn.commit()?;
    Ok(())
}

// =============================================================================
// JSON Row Helpers
// =============================================================================

/// Read and decode a JSON row keyed by string.
pub(crate) fn get_json<T, R>(table: &R, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON row keyed by string.
pub(crate) fn put_json<T: Serialize>(
    txn: &WriteTransaction,
    table: TableDefinition<'static, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let json = serde_json::to_vec(value)?;
    let mut table = txn.open_table(table)?;
    table.insert(key, json.as_slice())?;
    Ok(())
}

/// Next free key of an append-only `u64`-keyed table.
pub(crate) fn next_index<V, R>(table: &R) -> StoreResult<u64>
where
    V: redb::Value + 'static,
    R: ReadableTable<u64, V>,
{
    Ok(table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::ReadableDatabase;
    use tempfile::TempDir;

    #[test]
    fn open_creates_tables_and_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("ledger.redb");
        let db = open_file(&path).unwrap();
        assert!(path.exists());

        let read = db.begin_read().unwrap();
        let state = read.open_table(LEDGER_STATE).unwrap();
        assert_eq!(
            state.get(SCHEMA_VERSION_KEY).unwrap().unwrap().value(),
            SCHEMA_VERSION
        );
        read.open_table(VAULTS).unwrap();
        read.open_table(EVENTS).unwrap();
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.redb");
        {
            let db = open_file(&path).unwrap();
            let txn = db.begin_write().unwrap();
            put_json(&txn, VAULTS, "alice", &serde_json::json!({"x": 1})).unwrap();
            txn.commit().unwrap();
        }

        let db = open_file(&path).unwrap();
        let read = db.begin_read().unwrap();
        let table = read.open_table(VAULTS).unwrap();
        let value: Option<serde_json::Value> = get_json(&table, "alice").unwrap();
        assert_eq!(value, Some(serde_json::json!({"x": 1})));
    }

    #[test]
    fn schema_version_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.redb");
        {
            let db = open_file(&path).unwrap();
            let txn = db.begin_write().unwrap();
            txn.open_table(LEDGER_STATE)
                .unwrap()
                .insert(SCHEMA_VERSION_KEY, 99u64)
                .unwrap();
            txn.commit().unwrap();
        }

        assert!(matches!(
            open_file(&path),
            Err(StoreError::SchemaVersion { found: 99, .. })
        ));
    }

    #[test]
    fn next_index_counts_from_zero() {
        let db = open_in_memory().unwrap();
        let txn = db.begin_write().unwrap();
        {
            let mut table = txn.open_table(RESEARCH_POOL).unwrap();
            assert_eq!(next_index(&table).unwrap(), 0);
            table.insert(0u64, "a").unwrap();
            table.insert(1u64, "b").unwrap();
            assert_eq!(next_index(&table).unwrap(), 2);
        }
        txn.commit().unwrap();
    }
}
