// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity registry endpoints.
//!
//! Adding and removing identities is reserved for the registry authority of
//! the kind in the path. Lookups are public.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::parse_kind;
use crate::{
    auth::{Caller, ViewerKind},
    error::ApiError,
    models::{
        AddIdentityRequest, BatchAddIdentitiesRequest, BatchRemoveIdentitiesRequest,
        IdentityResponse, PrincipalId, PublicKeyBody,
    },
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/registries/{kind}/identities",
    params(("kind" = String, Path, description = "`doctor` or `insurance_company`")),
    request_body = AddIdentityRequest,
    tag = "Registries",
    responses(
        (status = 201, body = IdentityResponse),
        (status = 403, description = "Caller is not the registry authority"),
        (status = 422, description = "Empty name")
    )
)]
pub async fn add_identity(
    Caller(caller): Caller,
    Path(kind): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AddIdentityRequest>,
) -> Result<(StatusCode, Json<IdentityResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .ledger
        .add_identity(&caller, kind, &request.principal, &request.name)?;
    let identity = lookup(&state, kind, request.principal)?;
    Ok((StatusCode::CREATED, Json(identity)))
}

#[utoipa::path(
    post,
    path = "/v1/registries/{kind}/identities/batch",
    params(("kind" = String, Path, description = "`doctor` or `insurance_company`")),
    request_body = BatchAddIdentitiesRequest,
    tag = "Registries",
    responses(
        (status = 204, description = "All identities added"),
        (status = 403, description = "Caller is not the registry authority"),
        (status = 422, description = "Length mismatch or empty name; nothing was added")
    )
)]
pub async fn batch_add_identities(
    Caller(caller): Caller,
    Path(kind): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<BatchAddIdentitiesRequest>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .ledger
        .batch_add_identities(&caller, kind, &request.principals, &request.names)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/registries/{kind}/identities/batch-remove",
    params(("kind" = String, Path, description = "`doctor` or `insurance_company`")),
    request_body = BatchRemoveIdentitiesRequest,
    tag = "Registries",
    responses(
        (status = 204, description = "All identities removed"),
        (status = 403, description = "Caller is not the registry authority")
    )
)]
pub async fn batch_remove_identities(
    Caller(caller): Caller,
    Path(kind): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<BatchRemoveIdentitiesRequest>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .ledger
        .batch_remove_identities(&caller, kind, &request.principals)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/registries/{kind}/identities/{principal}",
    params(
        ("kind" = String, Path, description = "`doctor` or `insurance_company`"),
        ("principal" = String, Path, description = "Identity to remove")
    ),
    tag = "Registries",
    responses(
        (status = 204, description = "Identity removed (idempotent)"),
        (status = 403, description = "Caller is not the registry authority")
    )
)]
pub async fn remove_identity(
    Caller(caller): Caller,
    Path((kind, principal)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .ledger
        .remove_identity(&caller, kind, &PrincipalId::from(principal))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Registry entry of `principal`. Unknown principals are reported inactive
/// with an empty name rather than as an error.
#[utoipa::path(
    get,
    path = "/v1/registries/{kind}/identities/{principal}",
    params(
        ("kind" = String, Path, description = "`doctor` or `insurance_company`"),
        ("principal" = String, Path, description = "Identity to look up")
    ),
    tag = "Registries",
    responses((status = 200, body = IdentityResponse))
)]
pub async fn get_identity(
    Path((kind, principal)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<IdentityResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(lookup(&state, kind, PrincipalId::from(principal))?))
}

/// Publish the caller's own public key in the registry of `kind`.
#[utoipa::path(
    put,
    path = "/v1/registries/{kind}/public-key",
    params(("kind" = String, Path, description = "`doctor` or `insurance_company`")),
    request_body = PublicKeyBody,
    tag = "Registries",
    responses(
        (status = 204, description = "Key published"),
        (status = 403, description = "Caller is not an active identity of this kind"),
        (status = 422, description = "Malformed public key")
    )
)]
pub async fn publish_identity_key(
    Caller(caller): Caller,
    Path(kind): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<PublicKeyBody>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .ledger
        .publish_identity_key(&caller, kind, &body.public_key)?;
    Ok(StatusCode::NO_CONTENT)
}

fn lookup(
    state: &AppState,
    kind: ViewerKind,
    principal: PrincipalId,
) -> Result<IdentityResponse, ApiError> {
    let record = state.ledger.identity(kind, &principal)?;
    Ok(match record {
        Some(record) => IdentityResponse {
            principal,
            kind,
            name: record.display_name,
            active: record.active,
            public_key: record.public_key,
        },
        None => IdentityResponse {
            principal,
            kind,
            name: String::new(),
            active: false,
            public_key: None,
        },
    })
}
