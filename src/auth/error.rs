// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller identification errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Rejection of the [`Caller`](super::Caller) extractor.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    /// No `x-principal-id` header present
    MissingPrincipal,
    /// Header present but not a usable principal id
    InvalidPrincipal,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingPrincipal => "missing_principal",
            AuthError::InvalidPrincipal => "invalid_principal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingPrincipal => StatusCode::UNAUTHORIZED,
            AuthError::InvalidPrincipal => StatusCode::BAD_REQUEST,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingPrincipal => write!(f, "x-principal-id header is required"),
            AuthError::InvalidPrincipal => write!(f, "x-principal-id header is not a valid principal"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
