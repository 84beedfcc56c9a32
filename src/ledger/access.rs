// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Vault registration and the request/grant/revoke workflow.
//!
//! Doctor and insurance-company access are the same state machine on two
//! tracks, selected by [`ViewerKind`]. Caller checks happen here, state
//! transitions in [`super::vault`].

use chrono::Utc;

use super::events::{append, LedgerEvent, LedgerEventType};
use super::ownership::OwnershipEnforcer;
use super::vault::{AccessState, PatientVault};
use super::AuthorizationLedger;
use crate::auth::ViewerKind;
use crate::crypto::PublicKey;
use crate::error::{AuthorizationError, RegistrationError, VaultResult};
use crate::models::{Cid, PrincipalId, VaultRef, WrappedKey};

impl AuthorizationLedger {
    // =========================================================================
    // Vault Lifecycle
    // =========================================================================

    /// Create the caller's vault. Each principal has at most one.
    pub fn register_patient(&self, caller: &PrincipalId) -> VaultResult<VaultRef> {
        self.create_vault(caller, None, None)
    }

    /// Create the caller's vault together with its key material in one
    /// transaction.
    pub fn register_patient_with_keys(
        &self,
        caller: &PrincipalId,
        public_key_pem: &str,
        wrapped_own_key: WrappedKey,
    ) -> VaultResult<VaultRef> {
        let canonical = PublicKey::from_pem(public_key_pem)?.to_pem()?;
        self.create_vault(caller, Some(canonical), Some(wrapped_own_key))
    }

    fn create_vault(
        &self,
        caller: &PrincipalId,
        public_key: Option<String>,
        wrapped_own_key: Option<WrappedKey>,
    ) -> VaultResult<VaultRef> {
        let vault_ref = self.write(|txn| {
            if Self::load_vault_in(txn, caller)?.is_some() {
                return Err(RegistrationError::AlreadyRegistered.into());
            }
            let mut vault = PatientVault::new(caller.clone(), Utc::now());
            vault.public_key = public_key;
            vault.wrapped_own_key = wrapped_own_key;
            Self::store_vault_in(txn, &vault)?;
            append(
                txn,
                LedgerEvent::new(LedgerEventType::PatientRegistered)
                    .with_actor(caller)
                    .with_subject(caller),
            )?;
            Ok(vault.vault_ref())
        })?;
        tracing::info!(patient = %caller, "patient registered");
        Ok(vault_ref)
    }

    /// Look up a vault. `None` means the owner is not registered; errors are
    /// reserved for storage failures.
    pub fn get_vault(&self, owner: &PrincipalId) -> VaultResult<Option<VaultRef>> {
        Ok(self.read_vault(owner)?.map(|vault| vault.vault_ref()))
    }

    /// Replace the owner's public key.
    pub fn set_public_key(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        public_key_pem: &str,
    ) -> VaultResult<()> {
        let canonical = PublicKey::from_pem(public_key_pem)?.to_pem()?;
        self.update_vault(caller, patient, LedgerEventType::VaultKeyUpdated, |vault| {
            vault.verify_ownership(caller)?;
            vault.public_key = Some(canonical);
            Ok(Some(serde_json::json!({ "field": "public_key" })))
        })
    }

    /// Replace the owner's self-wrapped content key.
    pub fn set_wrapped_own_key(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        wrapped: WrappedKey,
    ) -> VaultResult<()> {
        self.update_vault(caller, patient, LedgerEventType::VaultKeyUpdated, |vault| {
            vault.verify_ownership(caller)?;
            vault.wrapped_own_key = Some(wrapped);
            Ok(Some(serde_json::json!({ "field": "wrapped_own_key" })))
        })
    }

    /// Published public key of a patient.
    pub fn vault_public_key(&self, owner: &PrincipalId) -> VaultResult<Option<String>> {
        Ok(self.require_vault(owner)?.public_key)
    }

    /// The owner's self-wrapped content key.
    pub fn wrapped_own_key(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
    ) -> VaultResult<Option<WrappedKey>> {
        let vault = self.require_vault(patient)?;
        vault.verify_ownership(caller)?;
        Ok(vault.wrapped_own_key)
    }

    // =========================================================================
    // Content References & Research Consent
    // =========================================================================

    /// Append a CID to the vault. Allowed for the owner and for authorized
    /// viewers whose kind may upload.
    pub fn add_content_ref(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        cid: Cid,
    ) -> VaultResult<()> {
        self.add_record(caller, patient, cid, None).map(|_| ())
    }

    /// Content references of a vault, for the owner or any authorized viewer.
    pub fn content_refs(&self, caller: &PrincipalId, patient: &PrincipalId) -> VaultResult<Vec<Cid>> {
        let vault = self.require_vault(patient)?;
        if !vault.can_read_content(caller) {
            return Err(AuthorizationError::Unauthorized.into());
        }
        Ok(vault.content_refs)
    }

    pub fn set_research_opt_in(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        opt_in: bool,
    ) -> VaultResult<()> {
        self.update_vault(caller, patient, LedgerEventType::ResearchOptInChanged, |vault| {
            vault.verify_ownership(caller)?;
            vault.research_opt_in = opt_in;
            Ok(Some(serde_json::json!({ "opt_in": opt_in })))
        })
    }

    pub fn research_opt_in(&self, patient: &PrincipalId) -> VaultResult<bool> {
        Ok(self.require_vault(patient)?.research_opt_in)
    }

    // =========================================================================
    // Access Workflow
    // =========================================================================

    /// Ask for access to `patient`'s vault on the `kind` track.
    ///
    /// Checks, in order: self-request, patient registered, caller active in
    /// the `kind` registry, no existing request or grant.
    pub fn request_access(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
    ) -> VaultResult<LedgerEvent> {
        if caller == patient {
            return Err(AuthorizationError::SelfRequestDenied.into());
        }

        let event = self.write(|txn| {
            let mut vault = Self::require_vault_in(txn, patient)?;
            if !Self::is_active_in(txn, kind, caller)? {
                return Err(AuthorizationError::Unauthorized.into());
            }
            vault.track_mut(kind).request(caller)?;
            Self::store_vault_in(txn, &vault)?;
            Ok(append(
                txn,
                LedgerEvent::new(LedgerEventType::AccessRequested)
                    .with_actor(caller)
                    .with_subject(patient)
                    .with_kind(kind),
            )?)
        })?;
        tracing::info!(patient = %patient, viewer = %caller, kind = %kind, "access requested");
        Ok(event)
    }

    /// Requester cancels its own pending request.
    pub fn withdraw_request(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
    ) -> VaultResult<()> {
        self.update_vault(caller, patient, LedgerEventType::RequestWithdrawn, |vault| {
            vault.track_mut(kind).withdraw(caller)?;
            Ok(Some(serde_json::json!({ "kind": kind })))
        })?;
        tracing::info!(patient = %patient, viewer = %caller, kind = %kind, "access request withdrawn");
        Ok(())
    }

    /// Owner authorizes `viewer`, storing its wrapped copy of the content
    /// key. Clears a pending request; re-granting replaces the stored key.
    pub fn grant_access(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
        viewer: &PrincipalId,
        wrapped_key: WrappedKey,
    ) -> VaultResult<()> {
        self.update_vault(caller, patient, LedgerEventType::AccessGranted, |vault| {
            vault.verify_ownership(caller)?;
            let replaced = vault
                .track_mut(kind)
                .grant(viewer, wrapped_key, Utc::now())
                .is_some();
            Ok(Some(serde_json::json!({
                "kind": kind,
                "viewer": viewer.as_str(),
                "replaced": replaced,
            })))
        })?;
        tracing::info!(patient = %patient, viewer = %viewer, kind = %kind, "access granted");
        Ok(())
    }

    /// Owner removes `viewer`'s authorization and wrapped key. The viewer
    /// returns to `NONE` and may request again.
    pub fn revoke_access(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
        viewer: &PrincipalId,
    ) -> VaultResult<()> {
        self.update_vault(caller, patient, LedgerEventType::AccessRevoked, |vault| {
            vault.verify_ownership(caller)?;
            vault.track_mut(kind).revoke(viewer)?;
            Ok(Some(serde_json::json!({ "kind": kind, "viewer": viewer.as_str() })))
        })?;
        tracing::info!(patient = %patient, viewer = %viewer, kind = %kind, "access revoked");
        Ok(())
    }

    /// True iff `viewer` is authorized on the `kind` track. Unregistered
    /// patients have no authorized viewers.
    pub fn check_access(
        &self,
        patient: &PrincipalId,
        kind: ViewerKind,
        viewer: &PrincipalId,
    ) -> VaultResult<bool> {
        Ok(self.access_state(patient, kind, viewer)? == AccessState::Authorized)
    }

    pub fn access_state(
        &self,
        patient: &PrincipalId,
        kind: ViewerKind,
        viewer: &PrincipalId,
    ) -> VaultResult<AccessState> {
        Ok(self
            .read_vault(patient)?
            .map(|vault| vault.track(kind).state(viewer))
            .unwrap_or(AccessState::None))
    }

    /// Pending requests on a vault; owner only.
    pub fn pending_requests(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
    ) -> VaultResult<Vec<PrincipalId>> {
        let vault = self.require_vault(patient)?;
        vault.verify_ownership(caller)?;
        Ok(vault.track(kind).pending())
    }

    /// Authorized viewers on a vault; owner only.
    pub fn authorized_viewers(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
    ) -> VaultResult<Vec<PrincipalId>> {
        let vault = self.require_vault(patient)?;
        vault.verify_ownership(caller)?;
        Ok(vault.track(kind).authorized())
    }

    /// Wrapped key stored for `viewer`. Readable by that viewer and by the
    /// vault owner.
    pub fn viewer_wrapped_key(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        kind: ViewerKind,
        viewer: &PrincipalId,
    ) -> VaultResult<WrappedKey> {
        let vault = self.require_vault(patient)?;
        let is_owner = vault.verify_ownership(caller).is_ok();
        if !is_owner && caller != viewer {
            return Err(AuthorizationError::Unauthorized.into());
        }
        match vault.track(kind).entry(viewer) {
            Some(entry) => Ok(entry.wrapped_key.clone()),
            None if is_owner => Err(AuthorizationError::NotAuthorized.into()),
            None => Err(AuthorizationError::Unauthorized.into()),
        }
    }

    /// Load `patient`'s vault, apply `change`, store it and append an event
    /// of `event_type` with the returned details, all in one transaction.
    fn update_vault(
        &self,
        caller: &PrincipalId,
        patient: &PrincipalId,
        event_type: LedgerEventType,
        change: impl FnOnce(&mut PatientVault) -> VaultResult<Option<serde_json::Value>>,
    ) -> VaultResult<()> {
        self.write(|txn| {
            let mut vault = Self::require_vault_in(txn, patient)?;
            let details = change(&mut vault)?;
            Self::store_vault_in(txn, &vault)?;
            let mut event = LedgerEvent::new(event_type)
                .with_actor(caller)
                .with_subject(patient);
            if let Some(details) = details {
                event = event.with_details(details);
            }
            append(txn, event)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;
    use crate::ledger::test_support::*;

    fn wk(byte: u8) -> WrappedKey {
        WrappedKey(vec![byte; 77])
    }

    #[test]
    fn register_twice_fails() {
        let ledger = ledger();
        let patient = principal("patient");

        let vault = ledger.register_patient(&patient).unwrap();
        assert_eq!(vault.owner, patient);
        assert!(matches!(
            ledger.register_patient(&patient),
            Err(VaultError::Registration(RegistrationError::AlreadyRegistered))
        ));
    }

    #[test]
    fn get_vault_returns_none_for_unknown_owner() {
        let ledger = ledger();
        assert_eq!(ledger.get_vault(&principal("nobody")).unwrap(), None);
    }

    #[test]
    fn self_request_is_denied() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        for kind in ViewerKind::ALL {
            assert!(matches!(
                ledger.request_access(&patient, &patient, kind),
                Err(VaultError::Authorization(AuthorizationError::SelfRequestDenied))
            ));
        }
    }

    #[test]
    fn request_to_unregistered_patient_fails() {
        let ledger = ledger();
        let result = ledger.request_access(
            &principal("unregistered-viewer"),
            &principal("unregistered-patient"),
            ViewerKind::Doctor,
        );
        assert!(matches!(
            result,
            Err(VaultError::Registration(RegistrationError::PatientUnregistered))
        ));
    }

    #[test]
    fn request_requires_registry_membership() {
        let ledger = populated_ledger();
        let result =
            ledger.request_access(&principal("stranger"), &principal("patient"), ViewerKind::Doctor);
        assert!(matches!(
            result,
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));

        // The insurer is not on the doctor roster.
        let result =
            ledger.request_access(&principal("insurer"), &principal("patient"), ViewerKind::Doctor);
        assert!(matches!(
            result,
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
    }

    #[test]
    fn request_grant_revoke_scenario() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        let doctor = principal("doctor");

        ledger.add_content_ref(&patient, &patient, Cid::from("sha256-a")).unwrap();

        let event = ledger
            .request_access(&doctor, &patient, ViewerKind::Doctor)
            .unwrap();
        assert_eq!(event.event_type, LedgerEventType::AccessRequested);
        assert_eq!(event.actor, Some(doctor.clone()));
        assert_eq!(event.subject, Some(patient.clone()));
        assert_eq!(
            ledger.pending_requests(&patient, &patient, ViewerKind::Doctor).unwrap(),
            vec![doctor.clone()]
        );
        assert!(matches!(
            ledger.request_access(&doctor, &patient, ViewerKind::Doctor),
            Err(VaultError::Authorization(AuthorizationError::AlreadyRequested))
        ));

        ledger
            .grant_access(&patient, &patient, ViewerKind::Doctor, &doctor, wk(1))
            .unwrap();
        assert!(ledger
            .check_access(&patient, ViewerKind::Doctor, &doctor)
            .unwrap());
        assert!(ledger
            .pending_requests(&patient, &patient, ViewerKind::Doctor)
            .unwrap()
            .is_empty());
        assert_eq!(
            ledger.content_refs(&doctor, &patient).unwrap(),
            vec![Cid::from("sha256-a")]
        );

        ledger
            .revoke_access(&patient, &patient, ViewerKind::Doctor, &doctor)
            .unwrap();
        assert!(!ledger
            .check_access(&patient, ViewerKind::Doctor, &doctor)
            .unwrap());
        assert!(matches!(
            ledger.content_refs(&doctor, &patient),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
        assert!(matches!(
            ledger.viewer_wrapped_key(&doctor, &patient, ViewerKind::Doctor, &doctor),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));

        // Revoke returns the doctor to NONE; it may ask again.
        ledger
            .request_access(&doctor, &patient, ViewerKind::Doctor)
            .unwrap();
        assert_eq!(
            ledger
                .access_state(&patient, ViewerKind::Doctor, &doctor)
                .unwrap(),
            AccessState::Pending
        );
    }

    #[test]
    fn only_owner_mutates_and_lists() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        let doctor = principal("doctor");
        let insurer = principal("insurer");

        let unauthorized = |result: VaultResult<()>| {
            matches!(
                result,
                Err(VaultError::Authorization(AuthorizationError::Unauthorized))
            )
        };

        assert!(unauthorized(ledger.grant_access(
            &doctor,
            &patient,
            ViewerKind::Doctor,
            &doctor,
            wk(1)
        )));
        assert!(unauthorized(ledger.revoke_access(
            &insurer,
            &patient,
            ViewerKind::Doctor,
            &doctor
        )));
        assert!(unauthorized(ledger.set_research_opt_in(&doctor, &patient, true)));
        assert!(unauthorized(ledger.set_wrapped_own_key(&doctor, &patient, wk(3))));
        assert!(matches!(
            ledger.pending_requests(&doctor, &patient, ViewerKind::Doctor),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
        assert!(matches!(
            ledger.wrapped_own_key(&doctor, &patient),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
        assert!(!ledger
            .check_access(&patient, ViewerKind::Doctor, &doctor)
            .unwrap());
    }

    #[test]
    fn grants_are_scoped_to_one_vault() {
        let ledger = populated_ledger();
        let doctor = principal("doctor");
        let other = principal("other");

        ledger.register_patient(&other).unwrap();
        ledger
            .grant_access(&other, &other, ViewerKind::Doctor, &doctor, wk(2))
            .unwrap();

        assert!(ledger
            .check_access(&other, ViewerKind::Doctor, &doctor)
            .unwrap());
        assert!(!ledger
            .check_access(&principal("patient"), ViewerKind::Doctor, &doctor)
            .unwrap());
    }

    #[test]
    fn revoke_never_authorized_fails() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        assert!(matches!(
            ledger.revoke_access(&patient, &patient, ViewerKind::Doctor, &principal("doctor")),
            Err(VaultError::Authorization(AuthorizationError::NotAuthorized))
        ));
    }

    #[test]
    fn grant_is_last_write_wins() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        let doctor = principal("doctor");

        ledger
            .grant_access(&patient, &patient, ViewerKind::Doctor, &doctor, wk(1))
            .unwrap();
        ledger
            .grant_access(&patient, &patient, ViewerKind::Doctor, &doctor, wk(2))
            .unwrap();

        assert_eq!(
            ledger
                .viewer_wrapped_key(&doctor, &patient, ViewerKind::Doctor, &doctor)
                .unwrap(),
            wk(2)
        );
        assert_eq!(
            ledger
                .authorized_viewers(&patient, &patient, ViewerKind::Doctor)
                .unwrap(),
            vec![doctor]
        );
    }

    #[test]
    fn owner_reads_any_viewer_key_but_others_cannot() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        let doctor = principal("doctor");
        let insurer = principal("insurer");

        ledger
            .grant_access(&patient, &patient, ViewerKind::Doctor, &doctor, wk(4))
            .unwrap();

        assert_eq!(
            ledger
                .viewer_wrapped_key(&patient, &patient, ViewerKind::Doctor, &doctor)
                .unwrap(),
            wk(4)
        );
        assert!(matches!(
            ledger.viewer_wrapped_key(&insurer, &patient, ViewerKind::Doctor, &doctor),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
        assert!(matches!(
            ledger.viewer_wrapped_key(&patient, &patient, ViewerKind::InsuranceCompany, &insurer),
            Err(VaultError::Authorization(AuthorizationError::NotAuthorized))
        ));
    }

    #[test]
    fn tracks_are_independent_for_one_principal() {
        let ledger = populated_ledger();
        let authority = principal(AUTHORITY);
        let patient = principal("patient");
        let dual = principal("dual");

        ledger
            .add_identity(&authority, ViewerKind::Doctor, &dual, "Dr. Dual")
            .unwrap();
        ledger
            .add_identity(&authority, ViewerKind::InsuranceCompany, &dual, "Dual Mutual")
            .unwrap();

        ledger
            .request_access(&dual, &patient, ViewerKind::Doctor)
            .unwrap();
        ledger
            .grant_access(&patient, &patient, ViewerKind::InsuranceCompany, &dual, wk(5))
            .unwrap();

        assert_eq!(
            ledger.access_state(&patient, ViewerKind::Doctor, &dual).unwrap(),
            AccessState::Pending
        );
        assert_eq!(
            ledger
                .access_state(&patient, ViewerKind::InsuranceCompany, &dual)
                .unwrap(),
            AccessState::Authorized
        );
    }

    #[test]
    fn withdraw_request() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        let insurer = principal("insurer");

        assert!(matches!(
            ledger.withdraw_request(&insurer, &patient, ViewerKind::InsuranceCompany),
            Err(VaultError::Authorization(AuthorizationError::NoPendingRequest))
        ));
        ledger
            .request_access(&insurer, &patient, ViewerKind::InsuranceCompany)
            .unwrap();
        ledger
            .withdraw_request(&insurer, &patient, ViewerKind::InsuranceCompany)
            .unwrap();
        assert!(ledger
            .pending_requests(&patient, &patient, ViewerKind::InsuranceCompany)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn content_refs_permissions() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        let doctor = principal("doctor");
        let insurer = principal("insurer");

        assert!(matches!(
            ledger.add_content_ref(&doctor, &patient, Cid::from("x")),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));

        ledger
            .grant_access(&patient, &patient, ViewerKind::Doctor, &doctor, wk(1))
            .unwrap();
        ledger
            .grant_access(&patient, &patient, ViewerKind::InsuranceCompany, &insurer, wk(2))
            .unwrap();

        ledger
            .add_content_ref(&doctor, &patient, Cid::from("from-doctor"))
            .unwrap();
        assert!(matches!(
            ledger.add_content_ref(&insurer, &patient, Cid::from("from-insurer")),
            Err(VaultError::Authorization(AuthorizationError::Unauthorized))
        ));
        assert_eq!(
            ledger.content_refs(&insurer, &patient).unwrap(),
            vec![Cid::from("from-doctor")]
        );

        let uploads: Vec<_> = ledger
            .events_for(&patient)
            .unwrap()
            .into_iter()
            .filter(|e| e.event_type == LedgerEventType::ContentRefAdded)
            .collect();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].actor, Some(doctor));
    }

    #[test]
    fn vault_key_material() {
        let ledger = ledger();
        let patient = principal("patient");
        let pair = crate::crypto::Keypair::generate();
        let pem = pair.public.to_pem().unwrap();

        ledger
            .register_patient_with_keys(&patient, &pem, wk(7))
            .unwrap();
        assert_eq!(ledger.vault_public_key(&patient).unwrap(), Some(pem));
        assert_eq!(ledger.wrapped_own_key(&patient, &patient).unwrap(), Some(wk(7)));

        ledger.set_wrapped_own_key(&patient, &patient, wk(8)).unwrap();
        assert_eq!(ledger.wrapped_own_key(&patient, &patient).unwrap(), Some(wk(8)));

        assert!(matches!(
            ledger.set_public_key(&patient, &patient, "nonsense"),
            Err(VaultError::Crypto(_))
        ));
    }

    #[test]
    fn research_opt_in_toggle() {
        let ledger = populated_ledger();
        let patient = principal("patient");

        assert!(!ledger.research_opt_in(&patient).unwrap());
        ledger.set_research_opt_in(&patient, &patient, true).unwrap();
        assert!(ledger.research_opt_in(&patient).unwrap());

        assert!(matches!(
            ledger.research_opt_in(&principal("nobody")),
            Err(VaultError::Registration(RegistrationError::PatientUnregistered))
        ));
    }

    #[test]
    fn events_never_contain_wrapped_keys() {
        let ledger = populated_ledger();
        let patient = principal("patient");
        ledger
            .grant_access(&patient, &patient, ViewerKind::Doctor, &principal("doctor"), wk(0xAB))
            .unwrap();

        let dump = serde_json::to_string(&ledger.events(None, 100).unwrap()).unwrap();
        let encoded = serde_json::to_string(&wk(0xAB)).unwrap();
        assert!(!dump.contains(encoded.trim_matches('"')));
    }
}
