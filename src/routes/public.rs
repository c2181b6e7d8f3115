use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session.
///
/// `/health` and `/api/auth/*` are excluded from the gate entirely. The auth pages are
/// evaluated: anonymous callers get through, signed-in callers are sent to the dashboard.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Credential check; sets the session cookie and returns the token.
        .route("/api/auth/login", post(handlers::login))
        // POST /api/auth/logout
        .route("/api/auth/logout", post(handlers::logout))
        // GET /auth/callback?code=&then=&error_description=
        // Installs a session handed back by a sign-in link and forwards to `then`.
        .route("/auth/callback", get(handlers::auth_callback))
        // Logged-out pages.
        .route("/login", get(pages::auth_page))
        .route("/signup", get(pages::auth_page))
        .route("/reset-password", get(pages::auth_page))
        .route("/update-password", get(pages::auth_page))
        .route("/auth/redirect", get(pages::auth_page))
}
