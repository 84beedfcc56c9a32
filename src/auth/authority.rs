// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry authority capability.

use super::ViewerKind;
use crate::error::AuthorizationError;
use crate::models::PrincipalId;

/// Owners of the identity registries.
///
/// Injected into the ledger at construction; only the owner of a registry
/// may add or remove identities in it. Two ledgers with different
/// authorities are fully independent, which keeps tests isolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    doctor_registry: PrincipalId,
    insurance_registry: PrincipalId,
}

impl Authority {
    pub fn new(doctor_registry: PrincipalId, insurance_registry: PrincipalId) -> Self {
        Self {
            doctor_registry,
            insurance_registry,
        }
    }

    /// One principal owning both registries.
    pub fn single(owner: PrincipalId) -> Self {
        Self::new(owner.clone(), owner)
    }

    pub fn owner_of(&self, kind: ViewerKind) -> &PrincipalId {
        match kind {
            ViewerKind::Doctor => &self.doctor_registry,
            ViewerKind::InsuranceCompany => &self.insurance_registry,
        }
    }

    /// Fails with `Unauthorized` unless `caller` owns the `kind` registry.
    pub fn verify(&self, kind: ViewerKind, caller: &PrincipalId) -> Result<(), AuthorizationError> {
        if self.owner_of(kind) == caller {
            Ok(())
        } else {
            Err(AuthorizationError::Unauthorized)
        }
    }
}
