// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for owner-only ledger transitions.
//!
//! Setting keys, granting, revoking, toggling research consent and listing
//! pending requests are all gated on the caller being the vault owner.

use crate::error::AuthorizationError;
use crate::models::PrincipalId;

/// Trait for ledger resources that have an owner.
pub trait OwnedResource {
    fn owner(&self) -> &PrincipalId;
}

/// Trait for enforcing ownership on ledger operations.
pub trait OwnershipEnforcer {
    /// Verify that `caller` owns this resource.
    ///
    /// # Errors
    /// Returns `AuthorizationError::Unauthorized` if it does not.
    fn verify_ownership(&self, caller: &PrincipalId) -> Result<(), AuthorizationError>;
}

impl<T: OwnedResource> OwnershipEnforcer for T {
    fn verify_ownership(&self, caller: &PrincipalId) -> Result<(), AuthorizationError> {
        if self.owner() == caller {
            Ok(())
        } else {
            Err(AuthorizationError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: PrincipalId,
    }

    impl OwnedResource for TestResource {
        fn owner(&self) -> &PrincipalId {
            &self.owner
        }
    }

    #[test]
    fn ownership_verification_passes_for_owner() {
        let resource = TestResource {
            owner: PrincipalId::from("patient_123"),
        };
        assert!(resource
            .verify_ownership(&PrincipalId::from("patient_123"))
            .is_ok());
    }

    #[test]
    fn ownership_verification_fails_for_non_owner() {
        let resource = TestResource {
            owner: PrincipalId::from("patient_123"),
        };
        assert_eq!(
            resource.verify_ownership(&PrincipalId::from("doctor_456")),
            Err(AuthorizationError::Unauthorized)
        );
    }
}
