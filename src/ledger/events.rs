// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger event log.
//!
//! Every committed vault or registry transition appends one event in the
//! same write transaction, so the log and the state can never disagree.
//! Events carry principals but never key material or CIDs. Research pool
//! contributions are not logged.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable, WriteTransaction};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{next_index, StoreResult, EVENTS};
use super::AuthorizationLedger;
use crate::auth::ViewerKind;
use crate::error::VaultResult;
use crate::models::PrincipalId;

/// Types of ledger events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventType {
    // Identity registry events
    IdentityAdded,
    IdentityRemoved,
    IdentityKeyPublished,

    // Vault events
    PatientRegistered,
    VaultKeyUpdated,
    ContentRefAdded,
    ResearchOptInChanged,

    // Access workflow events
    AccessRequested,
    AccessGranted,
    AccessRevoked,
    RequestWithdrawn,
}

/// A committed ledger event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct LedgerEvent {
    /// Position in the log, assigned at append time.
    pub seq: u64,
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: LedgerEventType,
    /// Principal that performed the transition.
    pub actor: Option<PrincipalId>,
    /// Principal the transition is about (vault owner, registry entry).
    pub subject: Option<PrincipalId>,
    pub viewer_kind: Option<ViewerKind>,
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl LedgerEvent {
    pub fn new(event_type: LedgerEventType) -> Self {
        Self {
            seq: 0,
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            actor: None,
            subject: None,
            viewer_kind: None,
            details: None,
        }
    }

    pub fn with_actor(mut self, actor: &PrincipalId) -> Self {
        self.actor = Some(actor.clone());
        self
    }

    pub fn with_subject(mut self, subject: &PrincipalId) -> Self {
        self.subject = Some(subject.clone());
        self
    }

    pub fn with_kind(mut self, kind: ViewerKind) -> Self {
        self.viewer_kind = Some(kind);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether `principal` is the actor or the subject of this event.
    pub fn involves(&self, principal: &PrincipalId) -> bool {
        self.actor.as_ref() == Some(principal) || self.subject.as_ref() == Some(principal)
    }
}

/// Append `event` inside an open write transaction and return it with its
/// sequence number.
pub(crate) fn append(txn: &WriteTransaction, mut event: LedgerEvent) -> StoreResult<LedgerEvent> {
    let mut table = txn.open_table(EVENTS)?;
    event.seq = next_index(&table)?;
    let json = serde_json::to_vec(&event)?;
    table.insert(event.seq, json.as_slice())?;
    Ok(event)
}

/// Maximum number of events returned by one query.
pub const MAX_EVENT_PAGE: usize = 500;

impl AuthorizationLedger {
    /// Events with `seq > after`, oldest first, at most `limit`.
    pub fn events(&self, after: Option<u64>, limit: usize) -> VaultResult<Vec<LedgerEvent>> {
        let start = after.map(|seq| seq.saturating_add(1)).unwrap_or(0);
        let limit = limit.min(MAX_EVENT_PAGE);

        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        let mut events = Vec::new();
        for row in table.range(start..)? {
            if events.len() >= limit {
                break;
            }
            let (_, value) = row?;
            events.push(serde_json::from_slice(value.value())?);
        }
        Ok(events)
    }

    /// All events in which `principal` is actor or subject, oldest first.
    pub fn events_for(&self, principal: &PrincipalId) -> VaultResult<Vec<LedgerEvent>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(EVENTS)?;
        let mut events = Vec::new();
        for row in table.iter()? {
            let (_, value) = row?;
            let event: LedgerEvent = serde_json::from_slice(value.value())?;
            if event.involves(principal) {
                events.push(event);
            }
        }
        Ok(events)
    }
}
