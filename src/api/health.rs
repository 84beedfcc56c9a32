// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and readiness probes.
//!
//! Readiness opens a read transaction on the ledger and, for file-backed
//! ledgers, looks for the data directory.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Outcome of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Ok,
    Degraded,
    Missing,
    Unavailable,
}

impl ProbeStatus {
    fn is_ok(self) -> bool {
        self == ProbeStatus::Ok
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessReport {
    pub status: ProbeStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessReport {
    /// `ok` when every probe passed, `degraded` otherwise.
    pub status: ProbeStatus,
    pub ledger: ProbeStatus,
    /// Not reported for in-memory ledgers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<ProbeStatus>,
}

fn probe_ledger(state: &AppState) -> ProbeStatus {
    match state.ledger.research_len() {
        Ok(_) => ProbeStatus::Ok,
        Err(e) => {
            tracing::warn!(error = %e, "ledger readiness probe failed");
            ProbeStatus::Unavailable
        }
    }
}

fn probe_data_dir(state: &AppState) -> Option<ProbeStatus> {
    state.data_dir.as_ref().map(|dir| {
        if dir.is_dir() {
            ProbeStatus::Ok
        } else {
            ProbeStatus::Missing
        }
    })
}

fn readiness_report(state: &AppState) -> (StatusCode, Json<ReadinessReport>) {
    let ledger = probe_ledger(state);
    let data_dir = probe_data_dir(state);
    let ready = ledger.is_ok() && data_dir.is_none_or(ProbeStatus::is_ok);

    let report = ReadinessReport {
        status: if ready {
            ProbeStatus::Ok
        } else {
            ProbeStatus::Degraded
        },
        ledger,
        data_dir,
    };
    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(report))
}

/// Full readiness report; 503 when the ledger or data directory is unusable.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Ledger reachable", body = ReadinessReport),
        (status = 503, description = "Ledger or data directory unusable", body = ReadinessReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    readiness_report(&state)
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is up", body = LivenessReport))
)]
pub async fn liveness() -> Json<LivenessReport> {
    Json(LivenessReport {
        status: ProbeStatus::Ok,
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve ledger requests", body = ReadinessReport),
        (status = 503, description = "Not ready", body = ReadinessReport)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    readiness_report(&state)
}
