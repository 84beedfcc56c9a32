// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger event log endpoints.
//!
//! The log is public like the ledger it describes. Wrapped keys never
//! appear in events.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    ledger::{LedgerEvent, MAX_EVENT_PAGE},
    models::PrincipalId,
    state::AppState,
};

const DEFAULT_EVENT_PAGE: usize = 100;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct EventQuery {
    /// Return events with a sequence number greater than this.
    pub after: Option<u64>,
    /// Page size, capped at 500.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventListResponse {
    pub events: Vec<LedgerEvent>,
    /// Sequence number to pass as `after` for the next page.
    pub next_after: Option<u64>,
}

#[utoipa::path(
    get,
    path = "/v1/events",
    params(EventQuery),
    tag = "Events",
    responses((status = 200, body = EventListResponse))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_PAGE).min(MAX_EVENT_PAGE);
    let events = state.ledger.events(query.after, limit)?;
    let next_after = events.last().map(|event| event.seq).or(query.after);
    Ok(Json(EventListResponse { events, next_after }))
}

/// Events in which `principal` acted or was the subject, oldest first.
#[utoipa::path(
    get,
    path = "/v1/events/principals/{principal}",
    params(("principal" = String, Path, description = "Actor or subject")),
    tag = "Events",
    responses((status = 200, body = EventListResponse))
)]
pub async fn principal_events(
    Path(principal): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<EventListResponse>, ApiError> {
    let events = state.ledger.events_for(&PrincipalId::from(principal))?;
    Ok(Json(EventListResponse {
        events,
        next_after: None,
    }))
}
