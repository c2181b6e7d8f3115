use axum::{
    Json, Router,
    extract::{FromRef, Request, State},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Route access control: classification tables and the pure decision function.
pub mod access;
// Session tokens, cookies and the `AuthUser` extractor.
pub mod auth;
pub mod config;
pub mod fixtures;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod repository;

// Routing split by required access (Public, Authenticated, Admin).
pub mod routes;
use access::{AccessDecision, RouteClass, RouteTable, Session};
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{FixtureRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login, handlers::logout, handlers::auth_callback,
        handlers::list_comments, handlers::label_comment, handlers::next_comment,
        handlers::list_predictions, handlers::review_prediction, handlers::override_prediction,
        handlers::list_videos, handlers::video_comments, handlers::export_dataset,
        handlers::update_settings
    ),
    components(
        schemas(
            models::Label, models::Comment, models::Prediction, models::CategoryScores,
            models::ReviewAction, models::Video, models::Settings, models::LabelingOrder,
            models::ExportFormat, models::LoginRequest, models::LoginResponse, models::UserProfile,
            models::ApiMessage, models::LabelCommentRequest, models::ReviewPredictionRequest,
            models::OverridePredictionRequest, models::CommentListResponse,
            models::CommentResponse, models::PredictionListResponse, models::PredictionResponse,
            models::VideoListResponse,
        )
    ),
    tags(
        (name = "moderation-admin", description = "Comment moderation dashboard API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for the services every request needs.
#[derive(Clone)]
pub struct AppState {
    /// Data layer (fixture-backed by default).
    pub repo: RepositoryState,
    /// The loaded configuration.
    pub config: AppConfig,
    /// Route classification tables consumed by the access gate.
    pub routes: Arc<RouteTable>,
}

impl AppState {
    /// Builds state with the built-in route table.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            config,
            routes: Arc::new(RouteTable::default()),
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// decision_response
///
/// Turns a non-`Allow` decision into the HTTP response the client sees: a 307 to the
/// target (carrying `then=<original path>` when asked) or a 401 JSON body for APIs.
/// Returns `None` for `Allow`.
pub fn decision_response(decision: AccessDecision, original_path: &str) -> Option<Response> {
    match decision {
        AccessDecision::Allow => None,
        AccessDecision::RedirectTo {
            path,
            preserve_return_to,
        } => {
            let location = access::redirect_location(path, preserve_return_to, original_path);
            Some(Redirect::temporary(&location).into_response())
        }
        AccessDecision::RejectUnauthorized => Some(
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "error": "Unauthorized" })),
            )
                .into_response(),
        ),
    }
}

/// access_gate
///
/// Middleware wrapping every route. Excluded paths pass straight through without a
/// session lookup. Everything else resolves the caller's session (any failure counts
/// as anonymous), asks the route table for a decision, and either forwards the request
/// with the resolved `AuthUser` attached or answers with a redirect / 401.
async fn access_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = access::normalize_path(request.uri().path());
    let class = state.routes.classify(&path);
    if class == RouteClass::Excluded {
        return next.run(request).await;
    }

    let identity = auth::resolve_identity(request.headers(), &state.repo, &state.config).await;
    let session = identity
        .as_ref()
        .map(AuthUser::session)
        .unwrap_or_else(Session::anonymous);
    let decision = access::decide(class, &session);

    tracing::debug!(
        path = %path,
        class = ?class,
        authenticated = session.authenticated,
        role = ?session.role,
        decision = ?decision,
        "access decision"
    );

    if let Some(response) = decision_response(decision, &path) {
        return response;
    }

    if let Some(user) = identity {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, the access gate and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .fallback(pages::not_found)
        // The gate covers every route including the fallback, so unknown paths get the
        // same default-secure treatment as protected pages.
        .layer(middleware::from_fn_with_state(state.clone(), access_gate))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer` tagging every log line of a request with its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
