//! Request handlers for the pelada HTTP API

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::auth::Actor;
use crate::error::PeladaError;
use crate::rating::PlayerVote;
use crate::service::{HealthCheck, HealthStatus};
use crate::types::{
    MatchRecord, OrganizationId, OrganizationSettings, PlayerAttributes, PlayerId,
    PositionProfile, TeamId, TournamentId,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequestParts, Path, State,
    },
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

/// Header carrying the authenticated user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the per-user super-admin flag
pub const SUPER_ADMIN_HEADER: &str = "x-super-admin";

type ApiResult<T> = std::result::Result<T, ApiError>;

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
        };

        let user_id = header(USER_ID_HEADER).ok_or_else(|| PeladaError::Forbidden {
            reason: format!("missing {} header", USER_ID_HEADER),
        })?;
        let user_id = user_id.parse().map_err(|_| PeladaError::InvalidRequest {
            reason: format!("invalid {} header: {}", USER_ID_HEADER, user_id),
        })?;
        let is_super_admin = header(SUPER_ADMIN_HEADER)
            .map(|value| value.eq_ignore_ascii_case("true") || value == "1")
            .unwrap_or(false);

        Ok(Actor {
            user_id,
            is_super_admin,
        })
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    let Json(value) = payload?;
    Ok(value)
}

fn path<T>(segments: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    let Path(value) = segments?;
    Ok(value)
}

/// Attribute values must already be on the 0-100 scale
fn validate_attributes(attributes: &PlayerAttributes) -> ApiResult<()> {
    if attributes.clamped() != *attributes {
        return Err(PeladaError::InvalidRequest {
            reason: "attribute values must be between 0 and 100".to_string(),
        }
        .into());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct OverallRequest {
    pub attributes: PlayerAttributes,
    #[serde(default)]
    pub profile: PositionProfile,
}

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    #[serde(default)]
    pub profile: PositionProfile,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub player_id: PlayerId,
    pub speed: u8,
    pub finishing: u8,
    pub passing: u8,
    pub dribbling: u8,
    pub defense: u8,
    pub physical: u8,
    #[serde(default)]
    pub sportsmanship: Option<u8>,
}

impl VoteRequest {
    /// The voter is always the authenticated caller
    fn into_vote(self, organization_id: OrganizationId, voter_id: PlayerId) -> PlayerVote {
        PlayerVote {
            organization_id,
            voter_id,
            player_id: self.player_id,
            speed: self.speed,
            finishing: self.finishing,
            passing: self.passing,
            dribbling: self.dribbling,
            defense: self.defense,
            physical: self.physical,
            sportsmanship: self.sportsmanship,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StandingsRequest {
    #[serde(default)]
    pub matches: Vec<MatchRecord>,
    #[serde(default)]
    pub teams: Option<Vec<TeamId>>,
}

/// Root endpoint handler - shows service information
pub async fn root_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(json!({
        "service": state.app.config().service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/ratings/overall",
            "/organizations/{org}/...",
            "/tournaments/{tournament}/standings"
        ]
    }))
}

/// Health check with component status and counters
pub async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    debug!("Health check requested");

    match HealthCheck::check(state.app.clone()).await {
        Ok(health) => {
            let code = match health.status {
                HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            };
            (code, Json(json!(health)))
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "error": e.to_string() })),
            )
        }
    }
}

/// Readiness check endpoint handler
pub async fn ready_handler(State(state): State<ApiState>) -> impl IntoResponse {
    match HealthCheck::readiness_check(state.app.clone()).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

/// Liveness check endpoint handler
pub async fn alive_handler(State(state): State<ApiState>) -> impl IntoResponse {
    match HealthCheck::liveness_check(state.app.clone()).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
pub async fn metrics_handler(State(state): State<ApiState>) -> Response {
    let metric_families = state.app.metrics().registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", encoder.format_type().to_string())],
            output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

pub async fn overall_handler(
    State(state): State<ApiState>,
    payload: Result<Json<OverallRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request = body(payload)?;
    validate_attributes(&request.attributes)?;

    let result = state
        .app
        .calculate_overall(&request.attributes, &request.profile);
    Ok(Json(result))
}

pub async fn settings_handler(
    State(state): State<ApiState>,
    actor: Actor,
    segments: Result<Path<OrganizationId>, PathRejection>,
    payload: Result<Json<OrganizationSettings>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = path(segments)?;
    let capability = state.app.authorize(&actor)?;
    let settings = body(payload)?;

    let stored = state
        .app
        .configure_organization(&capability, organization_id, settings)?;
    Ok(Json(stored))
}

pub async fn attributes_handler(
    State(state): State<ApiState>,
    segments: Result<Path<(OrganizationId, PlayerId)>, PathRejection>,
    payload: Result<Json<OverallRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let (organization_id, player_id) = path(segments)?;
    let request = body(payload)?;
    validate_attributes(&request.attributes)?;

    let update = state.app.update_attributes(
        organization_id,
        player_id,
        request.attributes,
        request.profile,
    )?;
    Ok(Json(update))
}

pub async fn membership_handler(
    State(state): State<ApiState>,
    segments: Result<Path<(OrganizationId, PlayerId)>, PathRejection>,
    payload: Result<Json<MembershipRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let (organization_id, player_id) = path(segments)?;
    let request = body(payload)?;

    let update = state
        .app
        .add_member(organization_id, player_id, request.profile)?;
    Ok((StatusCode::CREATED, Json(update)))
}

pub async fn leave_handler(
    State(state): State<ApiState>,
    segments: Result<Path<(OrganizationId, PlayerId)>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let (organization_id, player_id) = path(segments)?;
    state.app.remove_member(organization_id, player_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_handler(
    State(state): State<ApiState>,
    actor: Actor,
    segments: Result<Path<OrganizationId>, PathRejection>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = path(segments)?;
    let vote = body(payload)?.into_vote(organization_id, actor.user_id);

    let outcome = state.app.cast_vote(vote)?;
    Ok(Json(outcome))
}

pub async fn snapshots_handler(
    State(state): State<ApiState>,
    segments: Result<Path<(OrganizationId, PlayerId)>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let (organization_id, player_id) = path(segments)?;
    let snapshots = state.app.player_history(organization_id, player_id)?;
    Ok(Json(json!({ "snapshots": snapshots })))
}

pub async fn active_season_handler(
    State(state): State<ApiState>,
    segments: Result<Path<OrganizationId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = path(segments)?;
    let view = state.app.active_season(organization_id)?;
    Ok(Json(view))
}

pub async fn bootstrap_handler(
    State(state): State<ApiState>,
    actor: Actor,
    segments: Result<Path<OrganizationId>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let organization_id = path(segments)?;
    let capability = state.app.authorize(&actor)?;

    let report = state
        .app
        .bootstrap_organization(&capability, organization_id)?;
    Ok(Json(report))
}

pub async fn standings_handler(
    State(state): State<ApiState>,
    segments: Result<Path<TournamentId>, PathRejection>,
    payload: Result<Json<StandingsRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let tournament_id = path(segments)?;
    let request = body(payload)?;

    let rows = state
        .app
        .standings(tournament_id, &request.matches, request.teams.as_deref());
    Ok(Json(json!({ "standings": rows })))
}
