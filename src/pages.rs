//! Page payloads for the dashboard's navigations. Each handler returns the data its
//! screen renders; access to the page itself has already been decided by the gate.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    AppState,
    auth::AuthUser,
    models::{
        AnalyticsPage, AnnotatePage, ApiMessage, AuthPage, DashboardPage, DatasetPage,
        PredictionListResponse, SettingsPage, VideoListResponse,
    },
    repository::{CommentQuery, CommentStatus, PredictionQuery},
};

const RECENT_ACTIVITY: usize = 10;
const DATASET_PREVIEW: usize = 10;
const MODERATION_PAGE_SIZE: usize = 10;
// Large enough to list every synced video on one page.
const ALL_VIDEOS: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct AuthPageQuery {
    pub then: Option<String>,
    pub error: Option<String>,
}

/// auth_page
///
/// Login, signup and password pages. Echoes the return path and any forwarded error
/// so the form can carry them through the sign-in flow.
pub async fn auth_page(uri: Uri, Query(query): Query<AuthPageQuery>) -> Json<AuthPage> {
    Json(AuthPage {
        page: uri.path().trim_matches('/').to_string(),
        then: query.then,
        error: query.error,
    })
}

/// dashboard
pub async fn dashboard(State(state): State<AppState>) -> Json<DashboardPage> {
    Json(DashboardPage {
        kpis: state.repo.get_kpis(Utc::now()).await,
        activity: state.repo.get_activity(RECENT_ACTIVITY).await,
    })
}

/// annotate
///
/// The next comment in the labeling queue, with the video it belongs to.
pub async fn annotate(State(state): State<AppState>) -> Json<AnnotatePage> {
    let comment = state.repo.next_unlabeled_comment(None).await;
    let video = match &comment {
        Some(c) => state.repo.get_video(&c.video_id).await,
        None => None,
    };
    Json(AnnotatePage { comment, video })
}

/// moderation
pub async fn moderation(State(state): State<AppState>) -> Json<PredictionListResponse> {
    let (predictions, total) = state
        .repo
        .get_predictions(PredictionQuery {
            page: 1,
            limit: MODERATION_PAGE_SIZE,
            ..PredictionQuery::default()
        })
        .await;

    Json(PredictionListResponse {
        success: true,
        data: predictions,
        total,
        page: 1,
        limit: MODERATION_PAGE_SIZE,
    })
}

/// analytics
///
/// *RBAC*: admin-only. Rechecked here in case the page is ever mounted outside the gate.
pub async fn analytics(user: AuthUser, State(state): State<AppState>) -> Response {
    if !user.is_admin() {
        return StatusCode::FORBIDDEN.into_response();
    }

    Json(AnalyticsPage {
        metrics: state.repo.get_model_metrics().await,
        error_samples: state.repo.get_error_samples().await,
    })
    .into_response()
}

/// dataset
pub async fn dataset(State(state): State<AppState>) -> Json<DatasetPage> {
    let kpis = state.repo.get_kpis(Utc::now()).await;
    let preview = state
        .repo
        .get_comments(CommentQuery {
            video_id: None,
            status: CommentStatus::All,
            limit: DATASET_PREVIEW,
        })
        .await;

    Json(DatasetPage {
        total: kpis.total,
        labeled: kpis.labeled,
        preview,
    })
}

/// videos
pub async fn videos(State(state): State<AppState>) -> Json<VideoListResponse> {
    let videos = state.repo.get_videos(None, ALL_VIDEOS).await;
    Json(VideoListResponse {
        success: true,
        total: videos.len(),
        data: videos,
    })
}

/// settings
///
/// *RBAC*: admin-only, rechecked like `analytics`.
pub async fn settings(user: AuthUser, State(state): State<AppState>) -> Response {
    if !user.is_admin() {
        return StatusCode::FORBIDDEN.into_response();
    }

    Json(SettingsPage {
        settings: state.repo.get_settings().await,
        users: state.repo.get_users().await,
    })
    .into_response()
}

/// not_found
///
/// Fallback for paths no route serves. Only reached once the gate allowed the request.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiMessage::error("Not found")))
}
