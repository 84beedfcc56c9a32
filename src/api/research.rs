// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Research pool endpoints.

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
    models::{AddResearchEntryRequest, ResearchEntryResponse},
    state::AppState,
};

/// All research pool entries in insertion order.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ResearchPoolResponse {
    pub entries: Vec<ResearchEntryResponse>,
    pub total: u64,
}

/// Contribute an anonymized record reference.
///
/// The patient must have opted in; the caller must be the patient or a
/// doctor authorized on the patient's vault. The stored entry carries no
/// link to either.
#[utoipa::path(
    post,
    path = "/v1/research/entries",
    request_body = AddResearchEntryRequest,
    tag = "Research",
    responses(
        (status = 201, body = ResearchEntryResponse),
        (status = 403, description = "Caller may not contribute or patient has not opted in"),
        (status = 404, description = "Patient not registered")
    )
)]
pub async fn add_entry(
    Caller(caller): Caller,
    State(state): State<AppState>,
    Json(request): Json<AddResearchEntryRequest>,
) -> Result<(StatusCode, Json<ResearchEntryResponse>), ApiError> {
    let index = state
        .ledger
        .add_research_entry(&caller, &request.patient, request.cid.clone())?;
    Ok((
        StatusCode::CREATED,
        Json(ResearchEntryResponse {
            index,
            cid: request.cid,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/research/entries",
    tag = "Research",
    responses((status = 200, body = ResearchPoolResponse))
)]
pub async fn list_entries(
    State(state): State<AppState>,
) -> Result<Json<ResearchPoolResponse>, ApiError> {
    let entries: Vec<ResearchEntryResponse> = state
        .ledger
        .research_entries()?
        .into_iter()
        .zip(0u64..)
        .map(|(cid, index)| ResearchEntryResponse { index, cid })
        .collect();
    let total = entries.len() as u64;
    Ok(Json(ResearchPoolResponse { entries, total }))
}

#[utoipa::path(
    get,
    path = "/v1/research/entries/{index}",
    params(("index" = u64, Path, description = "Zero-based position in the pool")),
    tag = "Research",
    responses(
        (status = 200, body = ResearchEntryResponse),
        (status = 404, description = "Index past the end of the pool")
    )
)]
pub async fn get_entry(
    Path(index): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<ResearchEntryResponse>, ApiError> {
    let cid = state.ledger.research_entry_at(index)?;
    Ok(Json(ResearchEntryResponse { index, cid }))
}
