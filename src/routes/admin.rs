use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// Model analytics and workflow settings.
///
/// Access Control:
/// The two pages are admin-only in the gate's route table, so non-admins are redirected
/// to the dashboard before reaching them. `PUT /api/settings` only needs a session at the
/// gate; its handler performs the role check and answers 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /analytics
        // Model metrics, confusion matrix and misclassified samples.
        .route("/analytics", get(pages::analytics))
        // GET /settings
        // Labeling settings and the operator list.
        .route("/settings", get(pages::settings))
        // PUT /api/settings
        .route("/api/settings", put(handlers::update_settings))
}
