// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Sessions
//!
//! Caller-side protocol flows. Everything involving plaintext or private keys
//! happens here, off the ledger: content keys are unwrapped and re-wrapped
//! locally and only ciphertext reaches the content store.
//!
//! A [`PatientClient`] owns one vault. A [`ViewerClient`] acts for a doctor
//! or an insurance company on the track of its kind.

use std::sync::Arc;

use crate::auth::ViewerKind;
use crate::content_store::ContentStore;
use crate::crypto::{unwrap_key, wrap_key, ContentBlob, ContentKey, KeyLength, Keypair, PrivateKey, PublicKey};
use crate::custodian::KeyCustodian;
use crate::error::{AuthorizationError, CryptoError, RegistrationError, VaultResult};
use crate::ledger::{AccessState, AuthorizationLedger, LedgerEvent};
use crate::models::{Cid, PrincipalId, VaultRef};
use crate::records::{anonymize, PatientRecord, ResearchEntry};

// =============================================================================
// Shared flows
// =============================================================================

/// Seal `record`, store it, reference it from `patient`'s vault and, when
/// the patient has opted in, contribute its anonymized form to the pool.
///
/// Both blobs are stored before the ledger is touched; the reference and the
/// contribution then commit together or not at all.
async fn upload<S: ContentStore>(
    ledger: &AuthorizationLedger,
    store: &S,
    caller: &PrincipalId,
    patient: &PrincipalId,
    key: &ContentKey,
    record: &PatientRecord,
) -> VaultResult<Cid> {
    let blob = record.seal(key)?;
    let cid = store.put(blob.to_bytes()?).await?;

    let research_cid = if ledger.research_opt_in(patient)? {
        let entry = anonymize(record);
        Some(store.put(entry.to_bytes()?).await?)
    } else {
        None
    };
    ledger.add_record(caller, patient, cid.clone(), research_cid)?;
    tracing::debug!(patient = %patient, cid = %cid, "record uploaded");
    Ok(cid)
}

async fn fetch_records<S: ContentStore>(
    ledger: &AuthorizationLedger,
    store: &S,
    caller: &PrincipalId,
    patient: &PrincipalId,
    key: &ContentKey,
) -> VaultResult<Vec<PatientRecord>> {
    let mut records = Vec::new();
    for cid in ledger.content_refs(caller, patient)? {
        let bytes = store.get(&cid).await?;
        let blob = ContentBlob::from_bytes(&bytes)?;
        records.push(PatientRecord::open(&blob, key)?);
    }
    Ok(records)
}

/// Decode every entry in the research pool, in insertion order. A blob that
/// is not a research entry fails the read with `ContentUnavailable`.
pub async fn read_research_pool<S: ContentStore>(
    ledger: &AuthorizationLedger,
    store: &S,
) -> VaultResult<Vec<ResearchEntry>> {
    let mut entries = Vec::new();
    for cid in ledger.research_entries()? {
        let bytes = store.get(&cid).await?;
        let entry = ResearchEntry::from_bytes(&bytes).map_err(|e| {
            tracing::warn!(cid = %cid, error = %e, "undecodable research entry");
            CryptoError::ContentUnavailable(cid.to_string())
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

// =============================================================================
// Patient
// =============================================================================

pub struct PatientClient<S> {
    ledger: Arc<AuthorizationLedger>,
    store: Arc<S>,
    principal: PrincipalId,
    private_key: PrivateKey,
}

impl<S: ContentStore> PatientClient<S> {
    /// Create a vault for `principal` with a fresh keypair and content key.
    ///
    /// The content key is wrapped for the patient's own public key and stored
    /// with the vault in one ledger transaction. The returned session holds
    /// the private key; hand it to a custodian via [`Self::private_key`].
    pub fn register(
        ledger: Arc<AuthorizationLedger>,
        store: Arc<S>,
        principal: PrincipalId,
        key_length: KeyLength,
    ) -> VaultResult<(Self, VaultRef)> {
        let keypair = Keypair::generate();
        let content_key = ContentKey::generate(key_length)?;
        let wrapped = wrap_key(&content_key, &keypair.public)?;
        let vault_ref =
            ledger.register_patient_with_keys(&principal, &keypair.public.to_pem()?, wrapped)?;

        let client = Self {
            ledger,
            store,
            principal,
            private_key: keypair.private,
        };
        Ok((client, vault_ref))
    }

    /// Resume a session with the private key held by `custodian`.
    pub async fn unlock<C: KeyCustodian>(
        ledger: Arc<AuthorizationLedger>,
        store: Arc<S>,
        principal: PrincipalId,
        custodian: &C,
        pin: &str,
    ) -> VaultResult<Self> {
        let published = ledger
            .vault_public_key(&principal)?
            .ok_or(CryptoError::KeyUnavailable)?;
        let private_key = custodian.fetch_private_key(&principal, pin).await?;
        if private_key.public_key() != PublicKey::from_pem(&published)? {
            return Err(CryptoError::InvalidKey("custodian key does not match vault".into()).into());
        }
        Ok(Self {
            ledger,
            store,
            principal,
            private_key,
        })
    }

    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    fn content_key(&self) -> VaultResult<ContentKey> {
        let wrapped = self
            .ledger
            .wrapped_own_key(&self.principal, &self.principal)?
            .ok_or(CryptoError::KeyUnavailable)?;
        Ok(unwrap_key(&wrapped, &self.private_key)?)
    }

    pub async fn upload_record(&self, record: &PatientRecord) -> VaultResult<Cid> {
        let key = self.content_key()?;
        upload(
            &self.ledger,
            self.store.as_ref(),
            &self.principal,
            &self.principal,
            &key,
            record,
        )
        .await
    }

    /// Authorize `viewer` by wrapping the content key for its published key.
    pub fn grant(&self, kind: ViewerKind, viewer: &PrincipalId) -> VaultResult<()> {
        let viewer_key = self
            .ledger
            .identity_public_key(kind, viewer)?
            .ok_or(CryptoError::KeyUnavailable)?;
        let viewer_key = PublicKey::from_pem(&viewer_key)?;
        let wrapped = wrap_key(&self.content_key()?, &viewer_key)?;
        self.ledger
            .grant_access(&self.principal, &self.principal, kind, viewer, wrapped)
    }

    pub fn revoke(&self, kind: ViewerKind, viewer: &PrincipalId) -> VaultResult<()> {
        self.ledger
            .revoke_access(&self.principal, &self.principal, kind, viewer)
    }

    pub fn pending(&self, kind: ViewerKind) -> VaultResult<Vec<PrincipalId>> {
        self.ledger
            .pending_requests(&self.principal, &self.principal, kind)
    }

    pub fn set_research_opt_in(&self, opt_in: bool) -> VaultResult<()> {
        self.ledger
            .set_research_opt_in(&self.principal, &self.principal, opt_in)
    }

    pub async fn read_records(&self) -> VaultResult<Vec<PatientRecord>> {
        let key = self.content_key()?;
        fetch_records(
            &self.ledger,
            self.store.as_ref(),
            &self.principal,
            &self.principal,
            &key,
        )
        .await
    }
}

// =============================================================================
// Viewer
// =============================================================================

pub struct ViewerClient<S> {
    ledger: Arc<AuthorizationLedger>,
    store: Arc<S>,
    principal: PrincipalId,
    kind: ViewerKind,
    private_key: PrivateKey,
}

impl<S: ContentStore> ViewerClient<S> {
    /// Generate a keypair and publish its public half in the `kind`
    /// registry. The principal must already be an active identity there.
    pub fn enroll(
        ledger: Arc<AuthorizationLedger>,
        store: Arc<S>,
        principal: PrincipalId,
        kind: ViewerKind,
    ) -> VaultResult<Self> {
        let keypair = Keypair::generate();
        ledger.publish_identity_key(&principal, kind, &keypair.public.to_pem()?)?;
        Ok(Self {
            ledger,
            store,
            principal,
            kind,
            private_key: keypair.private,
        })
    }

    /// Resume a session with the private key held by `custodian`. The key
    /// must match the one published in the `kind` registry.
    pub async fn unlock<C: KeyCustodian>(
        ledger: Arc<AuthorizationLedger>,
        store: Arc<S>,
        principal: PrincipalId,
        kind: ViewerKind,
        custodian: &C,
        pin: &str,
    ) -> VaultResult<Self> {
        let published = ledger
            .identity_public_key(kind, &principal)?
            .ok_or(CryptoError::KeyUnavailable)?;
        let private_key = custodian.fetch_private_key(&principal, pin).await?;
        if private_key.public_key() != PublicKey::from_pem(&published)? {
            return Err(
                CryptoError::InvalidKey("custodian key does not match registry".into()).into(),
            );
        }
        Ok(Self {
            ledger,
            store,
            principal,
            kind,
            private_key,
        })
    }

    pub fn principal(&self) -> &PrincipalId {
        &self.principal
    }

    pub fn kind(&self) -> ViewerKind {
        self.kind
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn request_access(&self, patient: &PrincipalId) -> VaultResult<LedgerEvent> {
        self.ledger.request_access(&self.principal, patient, self.kind)
    }

    pub fn withdraw_request(&self, patient: &PrincipalId) -> VaultResult<()> {
        self.ledger.withdraw_request(&self.principal, patient, self.kind)
    }

    pub fn access_state(&self, patient: &PrincipalId) -> VaultResult<AccessState> {
        self.ledger.access_state(patient, self.kind, &self.principal)
    }

    pub fn has_access(&self, patient: &PrincipalId) -> VaultResult<bool> {
        self.ledger.check_access(patient, self.kind, &self.principal)
    }

    fn content_key(&self, patient: &PrincipalId) -> VaultResult<ContentKey> {
        let wrapped =
            self.ledger
                .viewer_wrapped_key(&self.principal, patient, self.kind, &self.principal)?;
        Ok(unwrap_key(&wrapped, &self.private_key)?)
    }

    /// Records of `patient` visible to this viewer. Insurance companies only
    /// see records the patient released for insurance access.
    pub async fn read_records(&self, patient: &PrincipalId) -> VaultResult<Vec<PatientRecord>> {
        let key = self.content_key(patient)?;
        let records =
            fetch_records(&self.ledger, self.store.as_ref(), &self.principal, patient, &key).await?;
        Ok(match self.kind {
            ViewerKind::Doctor => records,
            ViewerKind::InsuranceCompany => {
                records.into_iter().filter(|r| r.insurance_access).collect()
            }
        })
    }

    /// Upload on behalf of `patient`. Only doctors may upload.
    pub async fn upload_record(
        &self,
        patient: &PrincipalId,
        record: &PatientRecord,
    ) -> VaultResult<Cid> {
        if !self.kind.can_upload() {
            return Err(AuthorizationError::Unauthorized.into());
        }
        if self.ledger.get_vault(patient)?.is_none() {
            return Err(RegistrationError::PatientUnregistered.into());
        }
        let key = self.content_key(patient)?;
        upload(
            &self.ledger,
            self.store.as_ref(),
            &self.principal,
            patient,
            &key,
            record,
        )
        .await
    }
}
