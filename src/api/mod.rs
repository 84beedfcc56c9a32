// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::Request,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::ViewerKind,
    error::ApiError,
    ledger::{AccessState, LedgerEvent, LedgerEventType},
    models::{
        AccessStatusResponse, AddContentRefRequest, AddIdentityRequest, AddResearchEntryRequest,
        BatchAddIdentitiesRequest, BatchRemoveIdentitiesRequest, Cid, IdentityResponse,
        PrincipalId, PrincipalListResponse, PublicKeyBody, RegisterPatientRequest,
        ResearchEntryResponse, ResearchOptInBody, VaultRef, WrappedKeyBody,
    },
    state::AppState,
};

pub mod access;
pub mod events;
pub mod health;
pub mod identities;
pub mod research;
pub mod vaults;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Parse the `{kind}` path segment. Accepts `insurance-company` as well as
/// the canonical `insurance_company`.
pub(crate) fn parse_kind(raw: &str) -> Result<ViewerKind, ApiError> {
    ViewerKind::from_str(&raw.replace('-', "_"))
        .ok_or_else(|| ApiError::bad_request(format!("unknown viewer kind '{raw}'")))
}

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        // Registries
        .route(
            "/registries/{kind}/identities",
            post(identities::add_identity),
        )
        .route(
            "/registries/{kind}/identities/batch",
            post(identities::batch_add_identities),
        )
        .route(
            "/registries/{kind}/identities/batch-remove",
            post(identities::batch_remove_identities),
        )
        .route(
            "/registries/{kind}/identities/{principal}",
            get(identities::get_identity).delete(identities::remove_identity),
        )
        .route(
            "/registries/{kind}/public-key",
            put(identities::publish_identity_key),
        )
        // Vaults
        .route("/vaults", post(vaults::register_patient))
        .route("/vaults/{owner}", get(vaults::get_vault))
        .route(
            "/vaults/{owner}/public-key",
            get(vaults::get_public_key).put(vaults::set_public_key),
        )
        .route(
            "/vaults/{owner}/wrapped-key",
            get(vaults::get_wrapped_own_key).put(vaults::set_wrapped_own_key),
        )
        .route(
            "/vaults/{owner}/content",
            get(vaults::list_content).post(vaults::add_content),
        )
        .route(
            "/vaults/{owner}/research-opt-in",
            get(vaults::get_research_opt_in).put(vaults::set_research_opt_in),
        )
        // Access workflow
        .route(
            "/vaults/{owner}/access/{kind}/requests",
            get(access::list_pending)
                .post(access::request_access)
                .delete(access::withdraw_request),
        )
        .route(
            "/vaults/{owner}/access/{kind}/viewers",
            get(access::list_authorized),
        )
        .route(
            "/vaults/{owner}/access/{kind}/viewers/{viewer}",
            get(access::check_access)
                .put(access::grant_access)
                .delete(access::revoke_access),
        )
        .route(
            "/vaults/{owner}/access/{kind}/viewers/{viewer}/wrapped-key",
            get(access::viewer_wrapped_key),
        )
        // Research pool
        .route(
            "/research/entries",
            get(research::list_entries).post(research::add_entry),
        )
        .route("/research/entries/{index}", get(research::get_entry))
        // Event log
        .route("/events", get(events::list_events))
        .route(
            "/events/principals/{principal}",
            get(events::principal_events),
        );

    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace_layer)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        identities::add_identity,
        identities::batch_add_identities,
        identities::batch_remove_identities,
        identities::remove_identity,
        identities::get_identity,
        identities::publish_identity_key,
        vaults::register_patient,
        vaults::get_vault,
        vaults::get_public_key,
        vaults::set_public_key,
        vaults::get_wrapped_own_key,
        vaults::set_wrapped_own_key,
        vaults::list_content,
        vaults::add_content,
        vaults::get_research_opt_in,
        vaults::set_research_opt_in,
        access::request_access,
        access::withdraw_request,
        access::list_pending,
        access::list_authorized,
        access::check_access,
        access::grant_access,
        access::revoke_access,
        access::viewer_wrapped_key,
        research::add_entry,
        research::list_entries,
        research::get_entry,
        events::list_events,
        events::principal_events
    ),
    components(
        schemas(
            PrincipalId,
            Cid,
            ViewerKind,
            AccessState,
            LedgerEvent,
            LedgerEventType,
            AddIdentityRequest,
            BatchAddIdentitiesRequest,
            BatchRemoveIdentitiesRequest,
            IdentityResponse,
            PublicKeyBody,
            RegisterPatientRequest,
            VaultRef,
            WrappedKeyBody,
            AddContentRefRequest,
            ResearchOptInBody,
            AccessStatusResponse,
            PrincipalListResponse,
            AddResearchEntryRequest,
            ResearchEntryResponse,
            vaults::ContentRefsResponse,
            research::ResearchPoolResponse,
            events::EventListResponse,
            health::ProbeStatus,
            health::ReadinessReport,
            health::LivenessReport
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Registries", description = "Doctor and insurance company registries"),
        (name = "Vaults", description = "Patient vault registration, key material and content"),
        (name = "Access", description = "Request, grant and revoke viewer access"),
        (name = "Research", description = "Anonymized research pool"),
        (name = "Events", description = "Ledger event log")
    )
)]
struct ApiDoc;
