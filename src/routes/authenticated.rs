use crate::{AppState, handlers, pages};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Everything an annotator or reviewer uses day to day. The gate rejects anonymous
/// `/api/*` calls with 401 and redirects anonymous page loads to `/login?then=...`,
/// so handlers here can rely on a session being present.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Pages ---
        .route("/dashboard", get(pages::dashboard))
        .route("/annotate", get(pages::annotate))
        .route("/moderation", get(pages::moderation))
        .route("/dataset", get(pages::dataset))
        .route("/videos", get(pages::videos))
        // --- Comment labeling ---
        // GET lists with filters, PATCH records a human label.
        .route(
            "/api/comments",
            get(handlers::list_comments).patch(handlers::label_comment),
        )
        // GET /api/comments/next
        // Next unlabeled comment for the annotation queue.
        .route("/api/comments/next", get(handlers::next_comment))
        // --- Moderation queue ---
        .route(
            "/api/predictions",
            get(handlers::list_predictions).patch(handlers::review_prediction),
        )
        .route(
            "/api/predictions/{id}/override",
            post(handlers::override_prediction),
        )
        // --- Videos ---
        .route("/api/videos", get(handlers::list_videos))
        .route("/api/videos/{id}/comments", get(handlers::video_comments))
        // --- Dataset ---
        // GET /api/dataset/export?format=csv|jsonl
        .route("/api/dataset/export", get(handlers::export_dataset))
}
