// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy and its HTTP mapping.
//!
//! Domain operations return [`VaultError`], which groups the four families
//! of protocol failures plus storage failures of the ledger itself. Handlers
//! convert it into [`ApiError`] with `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::ledger::StoreError;

/// Caller is not allowed to perform the transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthorizationError {
    #[error("caller is not authorized for this operation")]
    Unauthorized,
    #[error("a principal cannot request access to its own vault")]
    SelfRequestDenied,
    #[error("access already requested or granted")]
    AlreadyRequested,
    #[error("viewer is not authorized on this vault")]
    NotAuthorized,
    #[error("no pending access request")]
    NoPendingRequest,
    #[error("patient has not opted into research")]
    ResearchOptOut,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("patient already registered")]
    AlreadyRegistered,
    #[error("patient is not registered")]
    PatientUnregistered,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    InvalidName,
    #[error("input arrays must have the same length ({left} != {right})")]
    LengthMismatch { left: usize, right: usize },
    #[error("content key must be 16 or 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: u64, len: u64 },
}

/// Cryptographic and key-custody failures.
///
/// `DecryptionFailed` is deliberately uniform: a wrong key, a corrupted
/// ciphertext and a wrong recipient are indistinguishable to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("key material is unavailable")]
    KeyUnavailable,
    #[error("invalid PIN")]
    InvalidPin,
    #[error("invalid key encoding: {0}")]
    InvalidKey(String),
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("content {0} is unavailable")]
    ContentUnavailable(String),
}

/// Umbrella error for ledger operations and client flows.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("ledger storage error: {0}")]
    Storage(#[from] StoreError),
}

pub type VaultResult<T> = Result<T, VaultError>;

macro_rules! storage_error_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for VaultError {
                fn from(err: $source) -> Self {
                    VaultError::Storage(StoreError::from(err))
                }
            }
        )+
    };
}

storage_error_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
);

// =============================================================================
// HTTP Error
// =============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        let message = err.to_string();
        match err {
            VaultError::Authorization(AuthorizationError::AlreadyRequested) => {
                ApiError::conflict(message)
            }
            VaultError::Authorization(AuthorizationError::NoPendingRequest) => {
                ApiError::not_found(message)
            }
            VaultError::Authorization(_) => ApiError::forbidden(message),
            VaultError::Registration(RegistrationError::AlreadyRegistered) => {
                ApiError::conflict(message)
            }
            VaultError::Registration(RegistrationError::PatientUnregistered) => {
                ApiError::not_found(message)
            }
            VaultError::Validation(ValidationError::IndexOutOfRange { .. }) => {
                ApiError::not_found(message)
            }
            VaultError::Validation(_) => ApiError::unprocessable(message),
            VaultError::Crypto(CryptoError::KeyUnavailable)
            | VaultError::Crypto(CryptoError::ContentUnavailable(_)) => {
                ApiError::new(StatusCode::SERVICE_UNAVAILABLE, message)
            }
            VaultError::Crypto(CryptoError::InvalidPin) => {
                ApiError::new(StatusCode::UNAUTHORIZED, message)
            }
            VaultError::Crypto(_) => ApiError::unprocessable(message),
            VaultError::Storage(err) => {
                tracing::error!(error = %err, "ledger storage failure");
                ApiError::internal("internal storage error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
