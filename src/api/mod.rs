//! HTTP API for the pelada service
//!
//! This module serves the rating, season and standings operations together
//! with health checks and Prometheus metrics using Axum.

pub mod error;
pub mod handlers;

pub use error::ApiError;

use crate::service::AppState;
use anyhow::{Context, Result};
use axum::{
    extract::{MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to bind the API server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for the request handlers
#[derive(Clone)]
pub struct ApiState {
    pub app: Arc<AppState>,
}

/// HTTP server exposing the service operations
pub struct ApiServer {
    config: ApiServerConfig,
    state: ApiState,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, app: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: ApiState { app },
            shutdown_tx,
        }
    }

    /// Start the API server and serve until `stop` is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid API server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr).await?;

        info!("API server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("API server shutdown signal received");
            })
            .await?;

        info!("API server stopped");
        Ok(())
    }

    /// Create the Axum router with all endpoints
    pub fn create_router(&self) -> Router {
        create_router(self.state.app.clone())
    }

    /// Stop the API server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping API server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to API server: {}", e);
        }

        Ok(())
    }
}

/// Build the router for an application state
pub fn create_router(app: Arc<AppState>) -> Router {
    let state = ApiState { app };

    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/ready", get(handlers::ready_handler))
        .route("/alive", get(handlers::alive_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/ratings/overall", post(handlers::overall_handler))
        .route(
            "/organizations/{org}/settings",
            put(handlers::settings_handler),
        )
        .route(
            "/organizations/{org}/players/{player}/attributes",
            put(handlers::attributes_handler),
        )
        .route(
            "/organizations/{org}/players/{player}/membership",
            post(handlers::membership_handler).delete(handlers::leave_handler),
        )
        .route(
            "/organizations/{org}/players/{player}/snapshots",
            get(handlers::snapshots_handler),
        )
        .route("/organizations/{org}/votes", post(handlers::vote_handler))
        .route(
            "/organizations/{org}/seasons/active",
            get(handlers::active_season_handler),
        )
        .route(
            "/organizations/{org}/seasons/bootstrap",
            post(handlers::bootstrap_handler),
        )
        .route(
            "/tournaments/{tournament}/standings",
            post(handlers::standings_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .with_state(state)
}

/// Count and time every routed request
async fn track_requests(State(state): State<ApiState>, request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let metrics = state.app.metrics();
    let timer = metrics.start_timer();
    let response = next.run(request).await;
    let elapsed = timer.stop();

    debug!(
        "{} -> {} in {:.2}ms",
        route,
        response.status(),
        elapsed.as_secs_f64() * 1000.0
    );
    metrics.record_http_request(&route, response.status().as_u16(), elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt; // for oneshot

    async fn started_app() -> Arc<AppState> {
        let mut config = AppConfig::default();
        config.admin.super_admin_ids = vec![1];
        let mut state = AppState::new(config).expect("Failed to create app state");
        state.start().await.unwrap();
        Arc::new(state)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn with_user(mut request: Request<Body>, user_id: u64) -> Request<Body> {
        request
            .headers_mut()
            .insert(handlers::USER_ID_HEADER, user_id.to_string().parse().unwrap());
        request
    }

    async fn read_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_health_when_not_started() {
        let state = Arc::new(AppState::new(AppConfig::default()).unwrap());
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/alive").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = started_app().await;
        let app = create_router(state);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/ratings/overall",
                json!({
                    "attributes": {"speed": 50, "finishing": 50, "passing": 50,
                                   "dribbling": 50, "defense": 50, "physical": 50},
                    "profile": {"positions": ["Meio"]}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("text/plain"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("pelada_overall_computations_total{role=\"midfielder\"} 1"));
    }

    #[tokio::test]
    async fn test_overall_endpoint() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(json_request(
                "POST",
                "/ratings/overall",
                json!({
                    "attributes": {"speed": 80, "finishing": 90, "passing": 60,
                                   "dribbling": 70, "defense": 40, "physical": 75},
                    "profile": {"is_goalkeeper": false, "positions": ["Ataque"]}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["overall"], 77);
        assert_eq!(body["role"], "striker");
    }

    #[tokio::test]
    async fn test_position_labels_are_free_text() {
        let app = create_router(started_app().await);
        let attributes = json!({"speed": 80, "finishing": 90, "passing": 60,
                                "dribbling": 70, "defense": 40, "physical": 75});

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/ratings/overall",
                json!({"attributes": attributes, "profile": {"positions": ["ataque"]}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["overall"], 77);
        assert_eq!(body["role"], "striker");

        // unrecognised labels fall back to a zero overall
        let response = app
            .oneshot(json_request(
                "POST",
                "/ratings/overall",
                json!({"attributes": attributes, "profile": {"positions": ["Lateral"]}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["overall"], 0);
        assert!(body["role"].is_null());
    }

    #[tokio::test]
    async fn test_bad_path_segment_is_json_error() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(json_request(
                "PUT",
                "/organizations/abc/players/1/attributes",
                json!({
                    "attributes": {"speed": 50, "finishing": 50, "passing": 50,
                                   "dribbling": 50, "defense": 50, "physical": 50}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn test_vote_is_cast_as_caller() {
        let state = started_app().await;
        for player in [1, 2] {
            state
                .add_member(3, player, crate::types::PositionProfile::default())
                .unwrap();
        }
        let app = create_router(state);
        let ballot = json!({"player_id": 2, "speed": 4, "finishing": 4, "passing": 4,
                            "dribbling": 4, "defense": 4, "physical": 4});

        // no identity, no vote
        let response = app
            .clone()
            .oneshot(json_request("POST", "/organizations/3/votes", ballot.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // a voter id in the body cannot override the caller
        let mut spoofed = ballot.clone();
        spoofed["voter_id"] = json!(1);
        let response = app
            .clone()
            .oneshot(with_user(
                json_request("POST", "/organizations/3/votes", spoofed),
                2,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid vote"));

        let response = app
            .oneshot(with_user(
                json_request("POST", "/organizations/3/votes", ballot),
                1,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["votes"], 1);
    }

    #[tokio::test]
    async fn test_out_of_range_attributes_rejected() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(json_request(
                "POST",
                "/ratings/overall",
                json!({
                    "attributes": {"speed": 180, "finishing": 0, "passing": 0,
                                   "dribbling": 0, "defense": 0, "physical": 0},
                    "profile": {"is_goalkeeper": true}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("between 0 and 100"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(json_request("POST", "/ratings/overall", json!({"nope": 1})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(read_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_settings_require_super_admin() {
        let app = create_router(started_app().await);
        let settings = json!({"seasons_enabled": true, "season_duration_days": 30});

        let missing_actor = app
            .clone()
            .oneshot(json_request("PUT", "/organizations/5/settings", settings.clone()))
            .await
            .unwrap();
        assert_eq!(missing_actor.status(), StatusCode::FORBIDDEN);

        let mut request = json_request("PUT", "/organizations/5/settings", settings.clone());
        request
            .headers_mut()
            .insert("x-user-id", "9".parse().unwrap());
        let regular_user = app.clone().oneshot(request).await.unwrap();
        assert_eq!(regular_user.status(), StatusCode::FORBIDDEN);

        let mut request = json_request("PUT", "/organizations/5/settings", settings);
        request
            .headers_mut()
            .insert("x-user-id", "1".parse().unwrap());
        let admin = app.oneshot(request).await.unwrap();
        assert_eq!(admin.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let app = create_router(started_app().await);

        let mut request = json_request(
            "PUT",
            "/organizations/5/settings",
            json!({"seasons_enabled": true}),
        );
        request
            .headers_mut()
            .insert("x-user-id", "2".parse().unwrap());
        request
            .headers_mut()
            .insert("x-super-admin", "true".parse().unwrap());

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_membership_and_snapshots() {
        let app = create_router(started_app().await);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/organizations/3/players/10/membership",
                json!({"profile": {"is_goalkeeper": true}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = read_json(response).await;
        // (60 + 60 + 100) / 3
        assert_eq!(body["overall"], 73);
        assert_eq!(body["season"], "all_time");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/organizations/3/players/10/snapshots")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["snapshots"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_leaving_organization() {
        let app = create_router(started_app().await);
        let uri = "/organizations/3/players/11/membership";

        let response = app
            .clone()
            .oneshot(json_request("POST", uri, json!({"profile": {"positions": ["Meio"]}})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let leave = || Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(leave()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(leave()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_vote_for_unknown_player_is_not_found() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(with_user(
                json_request(
                    "POST",
                    "/organizations/3/votes",
                    json!({"player_id": 2, "speed": 3, "finishing": 3,
                           "passing": 3, "dribbling": 3, "defense": 3, "physical": 3}),
                ),
                1,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_active_season_not_found_before_first_write() {
        let state = started_app().await;
        let admin = state.authorize(&crate::auth::Actor::new(1)).unwrap();
        state
            .configure_organization(&admin, 5, crate::types::OrganizationSettings::with_seasons(30))
            .unwrap();
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/organizations/5/seasons/active")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_standings_endpoint() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(json_request(
                "POST",
                "/tournaments/2/standings",
                json!({
                    "matches": [
                        {"id": 1, "tournament_id": 2, "team_a": 7, "team_b": 8,
                         "status": "finished", "goals_a": 1, "goals_b": 1},
                        {"id": 2, "tournament_id": 2, "team_a": 7, "team_b": 9,
                         "status": "open"}
                    ],
                    "teams": [7, 8, 9]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        let rows = body["standings"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["points"], 1);
        assert_eq!(rows[2]["team_id"], 9);
    }

    #[tokio::test]
    async fn test_404_handling() {
        let app = create_router(started_app().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_api_server_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
    }
}
