// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only research pool of anonymized record references.
//!
//! A contribution needs the patient's opt-in and must come from the patient
//! or a doctor authorized on that vault. The stored entry is only the CID.
//! Contributions append nothing to the event log: a public event per entry,
//! next to the `content_ref_added` event of the same upload, would tie each
//! pool index back to its patient.

use redb::{ReadableDatabase, ReadableTable, WriteTransaction};

use super::database::{next_index, RESEARCH_POOL};
use super::events::{append, LedgerEvent, LedgerEventType};
use super::vault::PatientVault;
use super::AuthorizationLedger;
use crate::auth::ViewerKind;
use crate::error::{AuthorizationError, ValidationError, VaultResult};
use crate::models::{Cid, PrincipalId};

/// Check that `caller` may contribute on behalf of `vault` and append `cid`
/// to the pool inside `txn`. Returns the new index.
fn contribute_in(
    txn: &WriteTransaction,
    vault: &PatientVault,
    caller: &PrincipalId,
    cid: &Cid,
) -> VaultResult<u64> {
    let contributor =
        vault.owner == *caller || vault.track(ViewerKind::Doctor).is_authorized(caller);
    if !contributor {
        return Err(AuthorizationError::Unauthorized.into());
    }
    if !vault.research_opt_in {
        return Err(AuthorizationError::ResearchOptOut.into());
    }

    let mut table = txn.open_table(RESEARCH_POOL)?;
    let index = next_index(&table)?;
    table.insert(index, cid.as_str())?;
    Ok(index)
}

impl AuthorizationLedger {
    /// Append `cid` to the pool on behalf of `patient`. Returns its index.
    pub fn add_research_entry(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        cid: Cid,
    ) -> VaultResult<u64> {
        let index = self.write(|txn| {
            let vault = Self::require_vault_in(txn, patient)?;
            contribute_in(txn, &vault, caller, &cid)
        })?;
        tracing::info!(index, "research entry added");
        Ok(index)
    }

    /// Reference `cid` from `patient`'s vault and, when `research_cid` is
    /// given, contribute it to the pool in the same transaction.
    ///
    /// Either both writes commit or neither does; a patient that opted out
    /// fails the whole upload with `ResearchOptOut`.
    pub fn add_record(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        cid: Cid,
        research_cid: Option<Cid>,
    ) -> VaultResult<Option<u64>> {
        let index = self.write(|txn| {
            let mut vault = Self::require_vault_in(txn, patient)?;
            if !vault.can_add_content(caller) {
                return Err(AuthorizationError::Unauthorized.into());
            }
            let index = match &research_cid {
                Some(research_cid) => Some(contribute_in(txn, &vault, caller, research_cid)?),
                None => None,
            };
            vault.content_refs.push(cid);
            Self::store_vault_in(txn, &vault)?;
            append(
                txn,
                LedgerEvent::new(LedgerEventType::ContentRefAdded)
                    .with_actor(caller)
                    .with_subject(patient),
            )?;
            Ok(index)
        })?;
        tracing::info!(patient = %patient, research = index.is_some(), "record added");
        Ok(index)
    }

    /// All pool entries in insertion order.
    pub fn research_entries(&self) -> VaultResult<Vec<Cid>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESEARCH_POOL)?;
        let mut entries = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            entries.push(Cid::from(value.value()));
        }
        Ok(entries)
    }

    pub fn research_len(&self) -> VaultResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESEARCH_POOL)?;
        Ok(next_index(&table)?)
    }

    /// Entry at `index`; `IndexOutOfRange` past the end.
    pub fn research_entry_at(&self, index: u64) -> VaultResult<Cid> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESEARCH_POOL)?;
        match table.get(index)? {
            Some(value) => Ok(Cid::from(value.value())),
            None => Err(ValidationError::IndexOutOfRange {
                index,
                len: next_index(&table)?,
            }
            .into()),
        }
    }
}
