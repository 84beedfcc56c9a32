// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access workflow endpoints.
//!
//! Viewers request and withdraw on their own behalf; the vault owner lists,
//! grants and revokes. The access state of any viewer is public.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::parse_kind;
use crate::{
    auth::{Caller, ViewerKind},
    error::ApiError,
    ledger::AccessState,
    models::{AccessStatusResponse, PrincipalId, PrincipalListResponse, WrappedKeyBody},
    state::AppState,
};

fn status(
    state: &AppState,
    patient: PrincipalId,
    kind: ViewerKind,
    viewer: PrincipalId,
) -> Result<AccessStatusResponse, ApiError> {
    let access = state.ledger.access_state(&patient, kind, &viewer)?;
    Ok(AccessStatusResponse {
        patient,
        viewer,
        kind,
        state: access,
        authorized: access == AccessState::Authorized,
    })
}

#[utoipa::path(
    post,
    path = "/v1/vaults/{owner}/access/{kind}/requests",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`")
    ),
    tag = "Access",
    responses(
        (status = 201, body = AccessStatusResponse),
        (status = 403, description = "Self-request or caller not in the registry"),
        (status = 404, description = "Patient not registered"),
        (status = 409, description = "Already pending or authorized")
    )
)]
pub async fn request_access(
    Caller(caller): Caller,
    Path((owner, kind)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AccessStatusResponse>), ApiError> {
    let kind = parse_kind(&kind)?;
    let patient = PrincipalId::from(owner);
    state.ledger.request_access(&caller, &patient, kind)?;
    Ok((
        StatusCode::CREATED,
        Json(status(&state, patient, kind, caller)?),
    ))
}

#[utoipa::path(
    delete,
    path = "/v1/vaults/{owner}/access/{kind}/requests",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`")
    ),
    tag = "Access",
    responses(
        (status = 204, description = "Pending request withdrawn"),
        (status = 404, description = "No pending request")
    )
)]
pub async fn withdraw_request(
    Caller(caller): Caller,
    Path((owner, kind)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state
        .ledger
        .withdraw_request(&caller, &PrincipalId::from(owner), kind)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/access/{kind}/requests",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`")
    ),
    tag = "Access",
    responses(
        (status = 200, body = PrincipalListResponse),
        (status = 403, description = "Caller does not own the vault")
    )
)]
pub async fn list_pending(
    Caller(caller): Caller,
    Path((owner, kind)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<PrincipalListResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let principals = state
        .ledger
        .pending_requests(&caller, &PrincipalId::from(owner), kind)?;
    Ok(Json(PrincipalListResponse { principals }))
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/access/{kind}/viewers",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`")
    ),
    tag = "Access",
    responses(
        (status = 200, body = PrincipalListResponse),
        (status = 403, description = "Caller does not own the vault")
    )
)]
pub async fn list_authorized(
    Caller(caller): Caller,
    Path((owner, kind)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<PrincipalListResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    let principals = state
        .ledger
        .authorized_viewers(&caller, &PrincipalId::from(owner), kind)?;
    Ok(Json(PrincipalListResponse { principals }))
}

#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/access/{kind}/viewers/{viewer}",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`"),
        ("viewer" = String, Path, description = "Viewer principal")
    ),
    tag = "Access",
    responses((status = 200, body = AccessStatusResponse))
)]
pub async fn check_access(
    Path((owner, kind, viewer)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<AccessStatusResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(status(
        &state,
        PrincipalId::from(owner),
        kind,
        PrincipalId::from(viewer),
    )?))
}

/// Authorize `viewer` with its copy of the content key, wrapped by the
/// patient for the viewer's published public key.
#[utoipa::path(
    put,
    path = "/v1/vaults/{owner}/access/{kind}/viewers/{viewer}",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`"),
        ("viewer" = String, Path, description = "Viewer principal")
    ),
    request_body = WrappedKeyBody,
    tag = "Access",
    responses(
        (status = 204, description = "Viewer authorized"),
        (status = 403, description = "Caller does not own the vault")
    )
)]
pub async fn grant_access(
    Caller(caller): Caller,
    Path((owner, kind, viewer)): Path<(String, String, String)>,
    State(state): State<AppState>,
    Json(body): Json<WrappedKeyBody>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state.ledger.grant_access(
        &caller,
        &PrincipalId::from(owner),
        kind,
        &PrincipalId::from(viewer),
        body.wrapped_key,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/v1/vaults/{owner}/access/{kind}/viewers/{viewer}",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`"),
        ("viewer" = String, Path, description = "Viewer principal")
    ),
    tag = "Access",
    responses(
        (status = 204, description = "Authorization revoked"),
        (status = 403, description = "Caller does not own the vault or viewer is not authorized")
    )
)]
pub async fn revoke_access(
    Caller(caller): Caller,
    Path((owner, kind, viewer)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let kind = parse_kind(&kind)?;
    state.ledger.revoke_access(
        &caller,
        &PrincipalId::from(owner),
        kind,
        &PrincipalId::from(viewer),
    )?;
    Ok(StatusCode::NO_CONTENT)
}

/// Wrapped content key stored for `viewer`; readable by that viewer and the
/// vault owner.
#[utoipa::path(
    get,
    path = "/v1/vaults/{owner}/access/{kind}/viewers/{viewer}/wrapped-key",
    params(
        ("owner" = String, Path, description = "Patient principal"),
        ("kind" = String, Path, description = "`doctor` or `insurance_company`"),
        ("viewer" = String, Path, description = "Viewer principal")
    ),
    tag = "Access",
    responses(
        (status = 200, body = WrappedKeyBody),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn viewer_wrapped_key(
    Caller(caller): Caller,
    Path((owner, kind, viewer)): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<WrappedKeyBody>, ApiError> {
    let kind = parse_kind(&kind)?;
    let wrapped_key = state.ledger.viewer_wrapped_key(
        &caller,
        &PrincipalId::from(owner),
        kind,
        &PrincipalId::from(viewer),
    )?;
    Ok(Json(WrappedKeyBody { wrapped_key }))
}
