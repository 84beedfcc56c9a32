// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the calling principal.
//!
//! Authentication happens upstream; the identity layer forwards the
//! authenticated principal in the `x-principal-id` header. A middleware may
//! instead place a [`PrincipalId`] in the request extensions, which takes
//! precedence.
//!
//! ```rust,ignore
//! async fn my_handler(Caller(principal): Caller) -> impl IntoResponse {
//!     // principal is the PrincipalId of the caller
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::AuthError;
use crate::models::PrincipalId;

pub const PRINCIPAL_HEADER: &str = "x-principal-id";

const MAX_PRINCIPAL_LEN: usize = 256;

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub PrincipalId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<PrincipalId>().cloned() {
            return Ok(Caller(principal));
        }

        let raw = parts
            .headers
            .get(PRINCIPAL_HEADER)
            .ok_or(AuthError::MissingPrincipal)?
            .to_str()
            .map_err(|_| AuthError::InvalidPrincipal)?
            .trim();

        if raw.is_empty() || raw.len() > MAX_PRINCIPAL_LEN || raw.chars().any(char::is_control) {
            return Err(AuthError::InvalidPrincipal);
        }
        Ok(Caller(PrincipalId::from(raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, AuthError> {
        let mut parts = request.into_parts().0;
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn requires_principal_header() {
        let request = Request::builder().uri("/test").body(()).unwrap();
        assert_eq!(extract(request).await.err(), Some(AuthError::MissingPrincipal));
    }

    #[tokio::test]
    async fn reads_principal_header() {
        let request = Request::builder()
            .uri("/test")
            .header(PRINCIPAL_HEADER, " 0xpatient ")
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap().0, PrincipalId::from("0xpatient"));
    }

    #[tokio::test]
    async fn rejects_blank_or_oversized_principal() {
        let blank = Request::builder()
            .uri("/test")
            .header(PRINCIPAL_HEADER, "   ")
            .body(())
            .unwrap();
        assert_eq!(extract(blank).await.err(), Some(AuthError::InvalidPrincipal));

        let long = Request::builder()
            .uri("/test")
            .header(PRINCIPAL_HEADER, "a".repeat(MAX_PRINCIPAL_LEN + 1))
            .body(())
            .unwrap();
        assert_eq!(extract(long).await.err(), Some(AuthError::InvalidPrincipal));
    }

    #[tokio::test]
    async fn prefers_extensions() {
        let mut request = Request::builder()
            .uri("/test")
            .header(PRINCIPAL_HEADER, "from-header")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(PrincipalId::from("from-middleware"));
        assert_eq!(
            extract(request).await.unwrap().0,
            PrincipalId::from("from-middleware")
        );
    }
}
