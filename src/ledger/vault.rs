// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patient vault state and the per-track access state machine.
//!
//! ```text
//!            request              grant
//!   NONE ─────────────▶ PENDING ─────────▶ AUTHORIZED
//!    ▲  ◀───────────────   │                  │
//!    │      withdraw       │ grant (direct)   │ revoke
//!    │                     ▼                  │
//!    └─────────────────────────────────────────┘
//! ```
//!
//! A viewer is in exactly one state per track. Grant overwrites any earlier
//! entry (last write wins). Revoke always returns the viewer to `NONE`, from
//! where it may request again.
//!
//! Everything in this module is pure; persistence and caller checks live in
//! [`super::access`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::ViewerKind;
use crate::error::AuthorizationError;
use crate::models::{Cid, PrincipalId, VaultRef, WrappedKey};

use super::ownership::OwnedResource;

/// Relation of one viewer to one vault on one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    None,
    Pending,
    Authorized,
}

/// Authorization of one viewer: its copy of the content key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEntry {
    pub wrapped_key: WrappedKey,
    pub granted_at: DateTime<Utc>,
}

/// One independent request/grant/revoke track (doctors or insurers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerTrack {
    authorized: BTreeMap<PrincipalId, AccessEntry>,
    pending: BTreeSet<PrincipalId>,
}

impl ViewerTrack {
    pub fn state(&self, viewer: &PrincipalId) -> AccessState {
        if self.authorized.contains_key(viewer) {
            AccessState::Authorized
        } else if self.pending.contains(viewer) {
            AccessState::Pending
        } else {
            AccessState::None
        }
    }

    pub fn is_authorized(&self, viewer: &PrincipalId) -> bool {
        self.authorized.contains_key(viewer)
    }

    pub fn entry(&self, viewer: &PrincipalId) -> Option<&AccessEntry> {
        self.authorized.get(viewer)
    }

    pub fn pending(&self) -> Vec<PrincipalId> {
        self.pending.iter().cloned().collect()
    }

    pub fn authorized(&self) -> Vec<PrincipalId> {
        self.authorized.keys().cloned().collect()
    }

    /// NONE → PENDING.
    pub fn request(&mut self, viewer: &PrincipalId) -> Result<(), AuthorizationError> {
        match self.state(viewer) {
            AccessState::None => {
                self.pending.insert(viewer.clone());
                Ok(())
            }
            AccessState::Pending | AccessState::Authorized => {
                Err(AuthorizationError::AlreadyRequested)
            }
        }
    }

    /// PENDING → NONE, initiated by the requester.
    pub fn withdraw(&mut self, viewer: &PrincipalId) -> Result<(), AuthorizationError> {
        if self.pending.remove(viewer) {
            Ok(())
        } else {
            Err(AuthorizationError::NoPendingRequest)
        }
    }

    /// Any state → AUTHORIZED. Returns the replaced entry, if any.
    pub fn grant(
        &mut self,
        viewer: &PrincipalId,
        wrapped_key: WrappedKey,
        granted_at: DateTime<Utc>,
    ) -> Option<AccessEntry> {
        self.pending.remove(viewer);
        self.authorized.insert(
            viewer.clone(),
            AccessEntry {
                wrapped_key,
                granted_at,
            },
        )
    }

    /// AUTHORIZED → NONE.
    pub fn revoke(&mut self, viewer: &PrincipalId) -> Result<AccessEntry, AuthorizationError> {
        self.authorized
            .remove(viewer)
            .ok_or(AuthorizationError::NotAuthorized)
    }
}

/// One patient's vault as persisted in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientVault {
    pub owner: PrincipalId,
    /// Owner's public key (SPKI PEM).
    pub public_key: Option<String>,
    /// Owner's content key wrapped under its own public key.
    pub wrapped_own_key: Option<WrappedKey>,
    pub content_refs: Vec<Cid>,
    pub research_opt_in: bool,
    pub doctors: ViewerTrack,
    pub insurers: ViewerTrack,
    pub created_at: DateTime<Utc>,
}

impl PatientVault {
    pub fn new(owner: PrincipalId, created_at: DateTime<Utc>) -> Self {
        Self {
            owner,
            public_key: None,
            wrapped_own_key: None,
            content_refs: Vec::new(),
            research_opt_in: false,
            doctors: ViewerTrack::default(),
            insurers: ViewerTrack::default(),
            created_at,
        }
    }

    pub fn vault_ref(&self) -> VaultRef {
        VaultRef {
            owner: self.owner.clone(),
            created_at: self.created_at,
        }
    }

    pub fn track(&self, kind: ViewerKind) -> &ViewerTrack {
        match kind {
            ViewerKind::Doctor => &self.doctors,
            ViewerKind::InsuranceCompany => &self.insurers,
        }
    }

    pub fn track_mut(&mut self, kind: ViewerKind) -> &mut ViewerTrack {
        match kind {
            ViewerKind::Doctor => &mut self.doctors,
            ViewerKind::InsuranceCompany => &mut self.insurers,
        }
    }

    /// Owner, or a viewer authorized on any track.
    pub fn can_read_content(&self, principal: &PrincipalId) -> bool {
        self.owner == *principal
            || ViewerKind::ALL
                .iter()
                .any(|kind| self.track(*kind).is_authorized(principal))
    }

    /// Owner, or an authorized viewer whose kind may upload.
    pub fn can_add_content(&self, principal: &PrincipalId) -> bool {
        self.owner == *principal
            || ViewerKind::ALL
                .iter()
                .any(|kind| kind.can_upload() && self.track(*kind).is_authorized(principal))
    }
}

impl OwnedResource for PatientVault {
    fn owner(&self) -> &PrincipalId {
        &self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(s: &str) -> PrincipalId {
        PrincipalId::from(s)
    }

    fn key(byte: u8) -> WrappedKey {
        WrappedKey(vec![byte; 8])
    }

    #[test]
    fn request_grant_revoke_cycle() {
        let mut track = ViewerTrack::default();
        let doctor = principal("doctor");

        assert_eq!(track.state(&doctor), AccessState::None);
        track.request(&doctor).unwrap();
        assert_eq!(track.state(&doctor), AccessState::Pending);
        assert_eq!(track.pending(), vec![doctor.clone()]);

        assert!(track.grant(&doctor, key(1), Utc::now()).is_none());
        assert_eq!(track.state(&doctor), AccessState::Authorized);
        assert!(track.pending().is_empty());

        let entry = track.revoke(&doctor).unwrap();
        assert_eq!(entry.wrapped_key, key(1));
        assert_eq!(track.state(&doctor), AccessState::None);
    }

    #[test]
    fn duplicate_request_is_rejected_in_pending_and_authorized() {
        let mut track = ViewerTrack::default();
        let doctor = principal("doctor");

        track.request(&doctor).unwrap();
        assert_eq!(
            track.request(&doctor),
            Err(AuthorizationError::AlreadyRequested)
        );

        track.grant(&doctor, key(1), Utc::now());
        assert_eq!(
            track.request(&doctor),
            Err(AuthorizationError::AlreadyRequested)
        );
    }

    #[test]
    fn revoked_viewer_may_request_again() {
        let mut track = ViewerTrack::default();
        let doctor = principal("doctor");

        track.request(&doctor).unwrap();
        track.grant(&doctor, key(1), Utc::now());
        track.revoke(&doctor).unwrap();

        track.request(&doctor).unwrap();
        assert_eq!(track.state(&doctor), AccessState::Pending);
    }

    #[test]
    fn revoke_of_unknown_viewer_fails() {
        let mut track = ViewerTrack::default();
        let doctor = principal("doctor");
        assert_eq!(
            track.revoke(&doctor),
            Err(AuthorizationError::NotAuthorized)
        );

        track.request(&doctor).unwrap();
        assert_eq!(
            track.revoke(&doctor),
            Err(AuthorizationError::NotAuthorized)
        );
        assert_eq!(track.state(&doctor), AccessState::Pending);
    }

    #[test]
    fn grant_is_last_write_wins() {
        let mut track = ViewerTrack::default();
        let doctor = principal("doctor");

        track.grant(&doctor, key(1), Utc::now());
        let previous = track.grant(&doctor, key(2), Utc::now()).unwrap();
        assert_eq!(previous.wrapped_key, key(1));
        assert_eq!(track.entry(&doctor).unwrap().wrapped_key, key(2));
        assert_eq!(track.authorized(), vec![doctor]);
    }

    #[test]
    fn withdraw_only_from_pending() {
        let mut track = ViewerTrack::default();
        let doctor = principal("doctor");

        assert_eq!(
            track.withdraw(&doctor),
            Err(AuthorizationError::NoPendingRequest)
        );
        track.request(&doctor).unwrap();
        track.withdraw(&doctor).unwrap();
        assert_eq!(track.state(&doctor), AccessState::None);
    }

    #[test]
    fn tracks_are_independent() {
        let mut vault = PatientVault::new(principal("patient"), Utc::now());
        let actor = principal("dual-role");

        vault.track_mut(ViewerKind::Doctor).request(&actor).unwrap();
        vault
            .track_mut(ViewerKind::InsuranceCompany)
            .grant(&actor, key(3), Utc::now());

        assert_eq!(vault.track(ViewerKind::Doctor).state(&actor), AccessState::Pending);
        assert_eq!(
            vault.track(ViewerKind::InsuranceCompany).state(&actor),
            AccessState::Authorized
        );
    }

    #[test]
    fn content_permissions() {
        let mut vault = PatientVault::new(principal("patient"), Utc::now());
        let doctor = principal("doctor");
        let insurer = principal("insurer");

        assert!(vault.can_read_content(&principal("patient")));
        assert!(vault.can_add_content(&principal("patient")));
        assert!(!vault.can_read_content(&doctor));

        vault.doctors.grant(&doctor, key(1), Utc::now());
        vault.insurers.grant(&insurer, key(2), Utc::now());

        assert!(vault.can_read_content(&doctor));
        assert!(vault.can_add_content(&doctor));
        assert!(vault.can_read_content(&insurer));
        assert!(!vault.can_add_content(&insurer));
    }

    #[test]
    fn vault_json_roundtrip_keeps_tracks() {
        let mut vault = PatientVault::new(principal("patient"), Utc::now());
        vault.doctors.request(&principal("d1")).unwrap();
        vault.insurers.grant(&principal("i1"), key(9), Utc::now());

        let json = serde_json::to_vec(&vault).unwrap();
        let back: PatientVault = serde_json::from_slice(&json).unwrap();
        assert_eq!(back, vault);
    }
}
