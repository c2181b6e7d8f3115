use crate::{
    AppState,
    auth::{self, AuthUser},
    models::{
        self, ActivityKind, ApiMessage, CommentListResponse, CommentResponse, ExportFormat,
        LabelCommentRequest, LoginRequest, LoginResponse, OverridePredictionRequest,
        PredictionListResponse, PredictionResponse, ReviewPredictionRequest, Settings,
        UserProfile, VideoListResponse,
    },
    repository::{CommentQuery, CommentStatus, PredictionQuery},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

/// Upper bound on any client-supplied page size.
const MAX_LIMIT: usize = 100;
const DEFAULT_COMMENT_LIMIT: usize = 10;
const DEFAULT_PREDICTION_LIMIT: usize = 10;
const DEFAULT_VIDEO_LIMIT: usize = 20;
const VIDEO_COMMENT_PREVIEW: usize = 5;
const MAX_BATCH_SIZE: u32 = 100;

// --- Filter Structs ---

/// CommentFilter
///
/// Query parameters for `GET /api/comments`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CommentFilter {
    /// Only comments of this video.
    pub video_id: Option<String>,
    /// `all` (default), `labeled` or `unlabeled`.
    pub status: Option<String>,
    /// Maximum rows returned (default 10).
    pub limit: Option<usize>,
}

/// NextCommentFilter
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct NextCommentFilter {
    pub video_id: Option<String>,
}

/// PredictionFilter
///
/// Query parameters for `GET /api/predictions`. All filters combine with AND.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct PredictionFilter {
    pub label: Option<models::Label>,
    pub video_id: Option<String>,
    pub min_confidence: Option<f64>,
    pub max_confidence: Option<f64>,
    /// 1-based page number (default 1).
    pub page: Option<usize>,
    /// Page size (default 10).
    pub limit: Option<usize>,
}

/// VideoFilter
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct VideoFilter {
    /// Case-insensitive match on title or channel title.
    pub search: Option<String>,
    pub limit: Option<usize>,
}

/// ExportFilter
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ExportFilter {
    /// `csv` (default) or `jsonl`.
    pub format: Option<ExportFormat>,
}

/// CallbackQuery
///
/// Parameters the auth provider (or a login link) sends back to `/auth/callback`.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub then: Option<String>,
    pub error_description: Option<String>,
}

fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(ApiMessage::error(message))).into_response()
}

// --- Authentication ---

/// login
///
/// [Public Route] Exchanges operator credentials for a session. On success the token is
/// returned in the body (for programmatic callers) and set as an HttpOnly cookie (for the
/// browser).
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiMessage)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Response {
    let Some(user) = state
        .repo
        .find_user_by_credentials(payload.email.trim(), &payload.password)
        .await
    else {
        tracing::info!(email = %payload.email, "login rejected");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::error("Invalid credentials")),
        )
            .into_response();
    };

    let token = match auth::issue_token(user.id, &state.config) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "failed to sign session token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiMessage::error("Internal server error")),
            )
                .into_response();
        }
    };

    tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");

    let jar = jar.add(auth::session_cookie(token.clone(), &state.config));
    let body = LoginResponse {
        success: true,
        user: UserProfile::from(&user),
        token,
    };
    (jar, Json(body)).into_response()
}

/// logout
///
/// [Public Route] Clears the session cookie. Works even when the session already expired.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(auth::clear_session_cookie(&state.config));
    (jar, StatusCode::NO_CONTENT)
}

/// Only same-origin absolute paths are honoured as post-login destinations.
/// Browsers read `//host` and `/\host` as protocol-relative, so a second `/` or `\`
/// is refused, as is any control character.
fn local_return_path(then: Option<&str>) -> &str {
    match then {
        Some(path)
            if path.starts_with('/')
                && !matches!(path.as_bytes().get(1), Some(b'/' | b'\\'))
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => crate::access::DASHBOARD_PATH,
    }
}

fn login_error_redirect(error: &str) -> Response {
    let target = format!("/login?error={}", urlencoding::encode(error));
    Redirect::temporary(&target).into_response()
}

/// auth_callback
///
/// [Auth Route] Completes a sign-in started elsewhere (magic link, external provider).
/// An `error_description` is bounced back to the login form; a `code` must be a valid
/// session token and is installed as the session cookie. Finally the user is sent to
/// `then` when it is a local path, otherwise to the dashboard.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(CallbackQuery),
    responses((status = 307, description = "Redirect to destination or login"))
)]
pub async fn auth_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    tracing::info!(
        has_code = query.code.is_some(),
        error = ?query.error_description,
        then = ?query.then,
        "auth callback"
    );

    if let Some(error) = query.error_description.as_deref() {
        return login_error_redirect(error);
    }

    let mut jar = jar;
    if let Some(code) = query.code {
        if let Err(reason) = auth::decode_token(&code, &state.config) {
            tracing::warn!(%reason, "auth callback code rejected");
            return login_error_redirect("callback_failed");
        }
        jar = jar.add(auth::session_cookie(code, &state.config));
    }

    let destination = local_return_path(query.then.as_deref());
    (jar, Redirect::temporary(destination)).into_response()
}

// --- Comments ---

/// list_comments
///
/// [Authenticated Route] Lists comments filtered by video and labeling status.
#[utoipa::path(
    get,
    path = "/api/comments",
    params(CommentFilter),
    responses((status = 200, description = "Comments", body = CommentListResponse))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> Json<CommentListResponse> {
    let query = CommentQuery {
        video_id: filter.video_id,
        status: CommentStatus::parse(filter.status.as_deref()),
        limit: clamp_limit(filter.limit, DEFAULT_COMMENT_LIMIT),
    };
    let comments = state.repo.get_comments(query).await;

    Json(CommentListResponse {
        success: true,
        total: comments.len(),
        data: comments,
    })
}

/// label_comment
///
/// [Authenticated Route] Records a human label on a comment. The labeler is taken from
/// the session, never from the body.
#[utoipa::path(
    patch,
    path = "/api/comments",
    request_body = LabelCommentRequest,
    responses(
        (status = 200, description = "Labeled", body = CommentResponse),
        (status = 404, description = "Unknown comment", body = ApiMessage)
    )
)]
pub async fn label_comment(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<LabelCommentRequest>,
) -> Response {
    let Some(comment) = state
        .repo
        .label_comment(&payload.id, payload.label, &email)
        .await
    else {
        return not_found("Comment not found");
    };

    state
        .repo
        .record_activity(
            ActivityKind::Annotation,
            format!("Labeled comment {} as {}", comment.id, payload.label.as_str()),
            &email,
        )
        .await;

    Json(CommentResponse {
        success: true,
        data: comment,
    })
    .into_response()
}

/// next_comment
///
/// [Authenticated Route] Serves the next unlabeled comment for the annotation queue.
#[utoipa::path(
    get,
    path = "/api/comments/next",
    params(NextCommentFilter),
    responses(
        (status = 200, description = "Next comment", body = CommentResponse),
        (status = 404, description = "Queue exhausted", body = ApiMessage)
    )
)]
pub async fn next_comment(
    State(state): State<AppState>,
    Query(filter): Query<NextCommentFilter>,
) -> Response {
    let scoped = filter.video_id.is_some();
    match state.repo.next_unlabeled_comment(filter.video_id).await {
        Some(comment) => Json(CommentResponse {
            success: true,
            data: comment,
        })
        .into_response(),
        None if scoped => not_found("No more comments for this video"),
        None => not_found("No more comments to label"),
    }
}

// --- Predictions ---

/// list_predictions
///
/// [Authenticated Route] Paginated model predictions for the moderation queue.
#[utoipa::path(
    get,
    path = "/api/predictions",
    params(PredictionFilter),
    responses((status = 200, description = "Predictions", body = PredictionListResponse))
)]
pub async fn list_predictions(
    State(state): State<AppState>,
    Query(filter): Query<PredictionFilter>,
) -> Json<PredictionListResponse> {
    let page = filter.page.unwrap_or(1).max(1);
    let limit = clamp_limit(filter.limit, DEFAULT_PREDICTION_LIMIT);

    let (predictions, total) = state
        .repo
        .get_predictions(PredictionQuery {
            label: filter.label,
            video_id: filter.video_id,
            min_confidence: filter.min_confidence,
            max_confidence: filter.max_confidence,
            page,
            limit,
        })
        .await;

    Json(PredictionListResponse {
        success: true,
        data: predictions,
        total,
        page,
        limit,
    })
}

/// review_prediction
///
/// [Authenticated Route] Approves or rejects a prediction from the moderation queue.
#[utoipa::path(
    patch,
    path = "/api/predictions",
    request_body = ReviewPredictionRequest,
    responses(
        (status = 200, description = "Reviewed", body = ApiMessage),
        (status = 404, description = "Unknown prediction", body = ApiMessage)
    )
)]
pub async fn review_prediction(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ReviewPredictionRequest>,
) -> Response {
    if state
        .repo
        .review_prediction(&payload.id, payload.action, &email)
        .await
        .is_none()
    {
        return not_found("Prediction not found");
    }

    let verdict = payload.action.past_tense();
    state
        .repo
        .record_activity(
            ActivityKind::Moderation,
            format!("Prediction {} {}", payload.id, verdict),
            &email,
        )
        .await;

    Json(ApiMessage::ok(format!("Prediction {verdict} successfully"))).into_response()
}

/// override_prediction
///
/// [Authenticated Route] Replaces the model's label with a human judgement.
#[utoipa::path(
    post,
    path = "/api/predictions/{id}/override",
    params(("id" = String, Path, description = "Prediction ID")),
    request_body = OverridePredictionRequest,
    responses(
        (status = 200, description = "Overridden", body = PredictionResponse),
        (status = 404, description = "Unknown prediction", body = ApiMessage)
    )
)]
pub async fn override_prediction(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<OverridePredictionRequest>,
) -> Response {
    let Some(prediction) = state
        .repo
        .override_prediction(&id, payload.label, &email)
        .await
    else {
        return not_found("Prediction not found");
    };

    state
        .repo
        .record_activity(
            ActivityKind::Moderation,
            format!("Overrode prediction {} to {}", id, payload.label.as_str()),
            &email,
        )
        .await;

    Json(PredictionResponse {
        success: true,
        data: prediction,
    })
    .into_response()
}

// --- Videos ---

/// list_videos
///
/// [Authenticated Route] Lists synced videos, optionally filtered by a search term.
#[utoipa::path(
    get,
    path = "/api/videos",
    params(VideoFilter),
    responses((status = 200, description = "Videos", body = VideoListResponse))
)]
pub async fn list_videos(
    State(state): State<AppState>,
    Query(filter): Query<VideoFilter>,
) -> Json<VideoListResponse> {
    let videos = state
        .repo
        .get_videos(filter.search, clamp_limit(filter.limit, DEFAULT_VIDEO_LIMIT))
        .await;

    Json(VideoListResponse {
        success: true,
        total: videos.len(),
        data: videos,
    })
}

/// video_comments
///
/// [Authenticated Route] A short preview of a video's comments.
#[utoipa::path(
    get,
    path = "/api/videos/{id}/comments",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Comments", body = CommentListResponse),
        (status = 404, description = "Unknown video", body = ApiMessage)
    )
)]
pub async fn video_comments(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.repo.get_video(&id).await.is_none() {
        return not_found("Video not found");
    }

    let comments = state
        .repo
        .get_video_comments(&id, VIDEO_COMMENT_PREVIEW)
        .await;

    Json(CommentListResponse {
        success: true,
        total: comments.len(),
        data: comments,
    })
    .into_response()
}

// --- Dataset ---

/// RFC 4180 field quoting.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// render_export
///
/// Serializes export records as CSV (`id,text,label,confidence`) or JSON Lines.
pub fn render_export(records: &[models::ExportRecord], format: ExportFormat) -> String {
    match format {
        ExportFormat::Csv => {
            let mut out = String::from("id,text,label,confidence\n");
            for record in records {
                let confidence = record.confidence.map(|c| c.to_string()).unwrap_or_default();
                out.push_str(&format!(
                    "{},{},{},{}\n",
                    csv_field(&record.id),
                    csv_field(&record.text),
                    record.label.as_str(),
                    confidence
                ));
            }
            out
        }
        ExportFormat::Jsonl => records
            .iter()
            .filter_map(|record| serde_json::to_string(record).ok())
            .map(|line| line + "\n")
            .collect(),
    }
}

/// export_dataset
///
/// [Authenticated Route] Downloads every labeled comment with its effective label.
#[utoipa::path(
    get,
    path = "/api/dataset/export",
    params(ExportFilter),
    responses(
        (status = 200, description = "Dataset file", body = String, content_type = "text/csv")
    )
)]
pub async fn export_dataset(
    AuthUser { email, .. }: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<ExportFilter>,
) -> Response {
    let format = filter.format.unwrap_or_default();
    let records = state.repo.export_records().await;
    let body = render_export(&records, format);

    let (content_type, filename) = match format {
        ExportFormat::Csv => ("text/csv; charset=utf-8", "dataset.csv"),
        ExportFormat::Jsonl => ("application/x-ndjson", "dataset.jsonl"),
    };

    state
        .repo
        .record_activity(
            ActivityKind::Export,
            format!("Exported {} labeled comments to {}", records.len(), filename),
            &email,
        )
        .await;

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

// --- Settings ---

/// update_settings
///
/// [Admin Route] Replaces the labeling workflow settings.
///
/// *RBAC*: the gate already keeps non-admins away from the settings page; the API is
/// checked again here because `/api/*` only requires a session.
#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = Settings,
    responses(
        (status = 200, description = "Updated", body = Settings),
        (status = 403, description = "Not an admin"),
        (status = 422, description = "Invalid settings", body = ApiMessage)
    )
)]
pub async fn update_settings(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<Settings>,
) -> Response {
    if !user.is_admin() {
        return StatusCode::FORBIDDEN.into_response();
    }
    if payload.batch_size == 0 || payload.batch_size > MAX_BATCH_SIZE {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiMessage::error(format!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}"
            ))),
        )
            .into_response();
    }

    let settings = state.repo.update_settings(payload).await;
    tracing::info!(user = %user.email, "settings updated");
    Json(settings).into_response()
}
