// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Patient vault endpoints.
//!
//! Registration creates the caller's own vault. Key material, research
//! consent and listing content are owner operations; authorized viewers may
//! also list content, and authorized doctors may append to it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    auth::Caller,
    error::ApiError,
    models::{
        AddContentRefRequest, Cid, PrincipalId, PublicKeyBody, RegisterPatientRequest,
        ResearchOptInBody, VaultRef, WrappedKeyBody,
    },
    state::AppState,
};

/// Content references of a vault in upload order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ContentRefsResponse {
    pub cids: Vec<Cid>,
    pub total: usize,
}

/// Register the caller as a patient.
///
/// Public key and self-wrapped content key are stored with the vault when
/// both are given; supplying only one of them is rejected.
#[utoipa::path(
    post,
    path = "/v1/vaults",
    request_body = RegisterPatientRequest,
    tag = "Vaults",
    responses(
        (status = 201, body = VaultRef),
        (status = 409, description = "Caller already has a vault"),
        (status = 422, description = "Malformed or incomplete key material")
    )
)]
pub async fn register_patient(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<VaultRef>), ApiError> {
    let vault_ref = match (request.public_key, request.wrapped_own_key) {
        (Some(public_key), Some(wrapped)) => {
            state
                .ledger
                .register_patient_with_keys(&caller, &public_key, wrapped)?
        }
        (None, None) => state.ledger.register_patient(&caller)?,
        _ => {
            return Err(ApiError::unprocessable(
                "public_key and wrapped_own_key must be supplied together",
            ))
        }
    };
    Ok((StatusCode::CREATED, Json(vault_ref)))
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}",
    params(("owner" = String, Path, description = "Patient principal")),
    tag = "Vaults",
    responses(
        (status = 200, body = VaultRef),
        (status = 404, description = "Patient not registered")
    )
)]
pub async fn get_vault(
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<VaultRef>, ApiError> {
    state
        .ledger
        .get_vault(&PrincipalId::from(owner))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("patient is not registered"))
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/public-key",
    params(("owner" = String, Path, description = "Patient principal")),
    tag = "Vaults",
    responses(
        (status = 200, body = PublicKeyBody),
        (status = 404, description = "Patient not registered or no key set")
    )
)]
pub async fn get_public_key(
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PublicKeyBody>, ApiError> {
    state
        .ledger
        .vault_public_key(&PrincipalId::from(owner))?
        .map(|public_key| Json(PublicKeyBody { public_key }))
        .ok_or_else(|| ApiError::not_found("no public key set"))
}

#[utoipa::path(
    put,
    path = "/v1/vaults/{owner}/public-key",
    params(("owner" = String, Path, description = "Patient principal")),
    request_body = PublicKeyBody,
    tag = "Vaults",
    responses(
        (status = 204, description = "Key replaced"),
        (status = 403, description = "Caller does not own the vault")
    )
)]
pub async fn set_public_key(
    Caller(caller): Caller,
    Path(owner): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<PublicKeyBody>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .set_public_key(&caller, &PrincipalId::from(owner), &body.public_key)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/wrapped-key",
    params(("owner" = String, Path, description = "Patient principal")),
    tag = "Vaults",
    responses(
        (status = 200, body = WrappedKeyBody),
        (status = 403, description = "Caller does not own the vault"),
        (status = 404, description = "Patient not registered or no key set")
    )
)]
pub async fn get_wrapped_own_key(
    Caller(caller): Caller,
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<WrappedKeyBody>, ApiError> {
    state
        .ledger
        .wrapped_own_key(&caller, &PrincipalId::from(owner))?
        .map(|wrapped_key| Json(WrappedKeyBody { wrapped_key }))
        .ok_or_else(|| ApiError::not_found("no wrapped key set"))
}

#[utoipa::path(
    put,
    path = "/v1/vaults/{owner}/wrapped-key",
    params(("owner" = String, Path, description = "Patient principal")),
    request_body = WrappedKeyBody,
    tag = "Vaults",
    responses(
        (status = 204, description = "Wrapped key replaced"),
        (status = 403, description = "Caller does not own the vault")
    )
)]
pub async fn set_wrapped_own_key(
    Caller(caller): Caller,
    Path(owner): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<WrappedKeyBody>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .set_wrapped_own_key(&caller, &PrincipalId::from(owner), body.wrapped_key)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/content",
    params(("owner" = String, Path, description = "Patient principal")),
    tag = "Vaults",
    responses(
        (status = 200, body = ContentRefsResponse),
        (status = 403, description = "Caller is neither owner nor authorized viewer")
    )
)]
pub async fn list_content(
    Caller(caller): Caller,
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ContentRefsResponse>, ApiError> {
    let cids = state
        .ledger
        .content_refs(&caller, &PrincipalId::from(owner))?;
    let total = cids.len();
    Ok(Json(ContentRefsResponse { cids, total }))
}

#[utoipa::path(
    post,
    path = "/v1/vaults/{owner}/content",
    params(("owner" = String, Path, description = "Patient principal")),
    request_body = AddContentRefRequest,
    tag = "Vaults",
    responses(
        (status = 204, description = "Reference appended, with its research contribution if any"),
        (status = 403, description = "Caller may not upload to this vault, or the patient opted out of research")
    )
)]
pub async fn add_content(
    Caller(caller): Caller,
    Path(owner): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AddContentRefRequest>,
) -> Result<StatusCode, ApiError> {
    state.ledger.add_record(
        &caller,
        &PrincipalId::from(owner),
        request.cid,
        request.research_cid,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/research-opt-in",
    params(("owner" = String, Path, description = "Patient principal")),
    tag = "Vaults",
    responses((status = 200, body = ResearchOptInBody))
)]
pub async fn get_research_opt_in(
    Path(owner): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ResearchOptInBody>, ApiError> {
    let opt_in = state.ledger.research_opt_in(&PrincipalId::from(owner))?;
    Ok(Json(ResearchOptInBody { opt_in }))
}

#[utoipa::path(
    put,
    path = "/v1/vaults/{owner}/research-opt-in",
    params(("owner" = String, Path, description = "Patient principal")),
    request_body = ResearchOptInBody,
    tag = "Vaults",
    responses(
        (status = 204, description = "Consent updated"),
        (status = 403, description = "Caller does not own the vault")
    )
)]
pub async fn set_research_opt_in(
    Caller(caller): Caller,
    Path(owner): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<ResearchOptInBody>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .set_research_opt_in(&caller, &PrincipalId::from(owner), body.opt_in)?;
    Ok(StatusCode::NO_CONTENT)
}
