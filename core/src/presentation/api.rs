// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP transport.
//!
//! Thin axum handlers over the shared operation facade; every error kind
//! maps to its contract status code through [`ApiError`].

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::application::agent_service::AgentService;
use crate::application::listing_service::{ListTarget, ListingService};
use crate::application::review_service::ReviewService;
use crate::domain::error::ServiceError;
use crate::domain::principal::Principal;
use crate::presentation::dto::{
    AgentProcessRequest, AgentToolRequest, AppealReviewRequest, AuditAppealRequest,
    AuditReviewRequest, CreateReviewRequest, PageQuery, ReplyReviewRequest,
};
use crate::presentation::ops;

pub struct AppState {
    pub reviews: Arc<ReviewService>,
    pub listings: Arc<ListingService>,
    pub agent: Arc<AgentService>,
}

/// Error envelope for the HTTP surface.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub fn app(
    reviews: Arc<ReviewService>,
    listings: Arc<ListingService>,
    agent: Arc<AgentService>,
) -> Router {
    let state = Arc::new(AppState {
        reviews,
        listings,
        agent,
    });

    Router::new()
        .route("/v1/review", post(create_review))
        .route("/v1/review/:id", get(get_review))
        .route("/v1/review/store/:id", get(list_by_store))
        .route("/v1/review/user/:id", get(list_by_user))
        .route("/v1/review/status/:code", get(list_by_status))
        .route("/v1/review/reply", post(reply_review))
        .route("/v1/review/audit", post(audit_review))
        .route("/v1/review/appeal", post(appeal_review))
        .route("/v1/appeal/audit", post(audit_appeal))
        .route("/v1/appeal/status/:code", get(list_appeals_by_status))
        .route("/v1/agent/process", post(agent_process))
        .route("/v1/agent/tool", post(agent_call_tool))
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|_| {
        ApiError(ServiceError::InvalidArguments(format!(
            "'{raw}' is not a valid id"
        )))
    })
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::create_review(&state, &principal, request).await?))
}

async fn get_review(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::get_review(&state, parse_id(&id)?).await?))
}

async fn list_by_store(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        ops::list_reviews(&state, ListTarget::Store, parse_id(&id)?, page).await?,
    ))
}

async fn list_by_user(
    State(state): State<Arc<AppState>>,
    _principal: Principal,
    Path(id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        ops::list_reviews(&state, ListTarget::User, parse_id(&id)?, page).await?,
    ))
}

async fn list_by_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(code): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_id(&code)? as i16;
    Ok(Json(
        ops::list_reviews_by_status(&state, &principal, status, page).await?,
    ))
}

async fn reply_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<ReplyReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::reply_review(&state, &principal, request).await?))
}

async fn audit_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<AuditReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::audit_review(&state, &principal, request).await?))
}

async fn appeal_review(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<AppealReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::appeal_review(&state, &principal, request).await?))
}

async fn audit_appeal(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<AuditAppealRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::audit_appeal(&state, &principal, request).await?))
}

async fn list_appeals_by_status(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Path(code): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = parse_id(&code)? as i16;
    Ok(Json(
        ops::list_appeals_by_status(&state, &principal, status, page).await?,
    ))
}

async fn agent_process(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<AgentProcessRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(ops::agent_process(&state, &principal, request).await?))
}

async fn agent_call_tool(
    State(state): State<Arc<AppState>>,
    principal: Principal,
    Json(request): Json<AgentToolRequest>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(
        ops::agent_call_tool(&state, &principal, request).await?,
    ))
}
