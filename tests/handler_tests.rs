use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use moderation_admin::{
    AppConfig, AppState, FixtureRepository, auth, create_router,
    fixtures::{ADMIN_ID, ANNOTATOR_ID},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

// --- Helpers ---

/// A router over a fresh fixture repository. Tests that need to observe writes reuse
/// the same router by cloning it.
fn app() -> Router {
    create_router(AppState::new(
        Arc::new(FixtureRepository::default()),
        AppConfig::default(),
    ))
}

fn cookie_for(user_id: Uuid) -> String {
    let token = auth::issue_token(user_id, &AppConfig::default()).unwrap();
    format!("{}={}", auth::SESSION_COOKIE, token)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        builder = builder.header(header::COOKIE, cookie_for(user_id));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = send(app, Method::GET, uri, Some(ANNOTATOR_ID), None).await;
    let status = response.status();
    (status, json_body(response).await)
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// --- Login / Logout ---

#[tokio::test]
async fn test_login_sets_cookie_and_returns_usable_token() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": " Admin@Example.com ", "password": "admin123" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body.get("password").is_none());

    let token = body["token"].as_str().unwrap();
    let request = Request::builder()
        .uri("/settings")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let settings = app.oneshot(request).await.unwrap();
    assert_eq!(settings.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let response = send(
        &app(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_logout_clears_cookie_without_a_session() {
    let response = send(&app(), Method::POST, "/api/auth/logout", None, None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("session_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

// --- Auth callback ---

#[tokio::test]
async fn test_callback_installs_session_and_follows_local_then() {
    let token = auth::issue_token(ANNOTATOR_ID, &AppConfig::default()).unwrap();
    let uri = format!("/auth/callback?code={token}&then=%2Fvideos");
    let response = send(&app(), Method::GET, &uri, None, None).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/videos");
    assert!(set_cookie(&response).starts_with(&format!("session_token={token}")));
}

#[tokio::test]
async fn test_callback_rejects_external_then() {
    let response = send(
        &app(),
        Method::GET,
        "/auth/callback?then=%2F%2Fevil.example.com",
        None,
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn test_callback_rejects_backslash_and_control_characters_in_then() {
    let external = [
        "%2F%5Cevil.example.com",
        "%5Cevil.example.com",
        "%2Fvideos%0D%0AX-Evil%3A%201",
    ];
    for then in external {
        let uri = format!("/auth/callback?then={then}");
        let response = send(&app(), Method::GET, &uri, None, None).await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&response), "/dashboard", "then={then}");
    }

    // Backslashes later in the path stay on this site.
    let uri = "/auth/callback?then=%2Fvideos%5Cx";
    let response = send(&app(), Method::GET, uri, None, None).await;
    assert_eq!(location(&response), "/videos\\x");
}

#[tokio::test]
async fn test_callback_errors_return_to_login() {
    let forwarded = send(
        &app(),
        Method::GET,
        "/auth/callback?error_description=Link%20expired",
        None,
        None,
    )
    .await;
    assert_eq!(location(&forwarded), "/login?error=Link%20expired");

    let bad_code = send(&app(), Method::GET, "/auth/callback?code=garbage", None, None).await;
    assert_eq!(location(&bad_code), "/login?error=callback_failed");
    assert!(bad_code.headers().get(header::SET_COOKIE).is_none());
}

// --- Comments ---

#[tokio::test]
async fn test_list_comments_filters_by_status_and_video() {
    let app = app();

    let (status, unlabeled) = get_json(&app, "/api/comments?status=unlabeled").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&unlabeled), ["1", "2", "3"]);

    let (_, labeled) = get_json(&app, "/api/comments?status=labeled").await;
    assert_eq!(ids(&labeled), ["4", "5"]);

    let (_, scoped) = get_json(&app, "/api/comments?video_id=vid-1&status=unlabeled").await;
    assert_eq!(ids(&scoped), ["1", "2"]);
    assert_eq!(scoped["total"], 2);

    let (_, limited) = get_json(&app, "/api/comments?limit=2").await;
    assert_eq!(ids(&limited), ["1", "2"]);
}

#[tokio::test]
async fn test_label_comment_records_labeler_and_video_progress() {
    let app = app();
    let response = send(
        &app,
        Method::PATCH,
        "/api/comments",
        Some(ANNOTATOR_ID),
        Some(json!({ "id": "1", "label": "non_bullying" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["human_label"], "non_bullying");
    assert_eq!(body["data"]["labeled_by"], "annotator@example.com");

    let (_, videos) = get_json(&app, "/api/videos?search=Machine").await;
    assert_eq!(videos["data"][0]["labeled_comments"], 321);

    // Relabeling must not count the comment twice.
    send(
        &app,
        Method::PATCH,
        "/api/comments",
        Some(ANNOTATOR_ID),
        Some(json!({ "id": "1", "label": "ambiguous" })),
    )
    .await;
    let (_, videos) = get_json(&app, "/api/videos?search=Machine").await;
    assert_eq!(videos["data"][0]["labeled_comments"], 321);

    let (_, dashboard) = get_json(&app, "/dashboard").await;
    assert_eq!(dashboard["kpis"]["labeled"], 3);
    assert_eq!(dashboard["activity"][0]["type"], "annotation");
}

#[tokio::test]
async fn test_label_unknown_comment_is_404() {
    let response = send(
        &app(),
        Method::PATCH,
        "/api/comments",
        Some(ANNOTATOR_ID),
        Some(json!({ "id": "999", "label": "bullying" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["message"], "Comment not found");
}

#[tokio::test]
async fn test_next_comment_scoped_to_video() {
    let app = app();

    let (status, body) = get_json(&app, "/api/comments/next?video_id=vid-2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "3");

    let (status, body) = get_json(&app, "/api/comments/next?video_id=vid-3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No more comments for this video");

    let (status, body) = get_json(&app, "/api/comments/next").await;
    assert_eq!(status, StatusCode::OK);
    assert!(["1", "2", "3"].contains(&body["data"]["id"].as_str().unwrap()));
}

// --- Predictions ---

#[tokio::test]
async fn test_predictions_pagination_and_filters() {
    let app = app();

    let (_, page_two) = get_json(&app, "/api/predictions?limit=2&page=2").await;
    assert_eq!(ids(&page_two), ["pred-3"]);
    assert_eq!(page_two["total"], 3);
    assert_eq!(page_two["page"], 2);
    assert_eq!(page_two["limit"], 2);

    let (_, bullying) = get_json(&app, "/api/predictions?label=bullying").await;
    assert_eq!(bullying["total"], 2);

    let (_, confident) = get_json(&app, "/api/predictions?min_confidence=0.9").await;
    assert_eq!(ids(&confident), ["pred-2", "pred-3"]);

    let (_, by_video) =
        get_json(&app, "/api/predictions?video_id=vid-1&max_confidence=0.9").await;
    assert_eq!(ids(&by_video), ["pred-1"]);
}

#[tokio::test]
async fn test_review_prediction() {
    let app = app();
    let response = send(
        &app,
        Method::PATCH,
        "/api/predictions",
        Some(ANNOTATOR_ID),
        Some(json!({ "id": "pred-1", "action": "approve" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Prediction approved successfully");

    let missing = send(
        &app,
        Method::PATCH,
        "/api/predictions",
        Some(ANNOTATOR_ID),
        Some(json!({ "id": "pred-404", "action": "reject" })),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_override_prediction_changes_effective_label() {
    let app = app();
    let response = send(
        &app,
        Method::POST,
        "/api/predictions/pred-1/override",
        Some(ADMIN_ID),
        Some(json!({ "label": "non_bullying" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["is_overridden"], true);
    assert_eq!(body["data"]["human_label"], "non_bullying");
    assert_eq!(body["data"]["label"], "bullying");
    assert_eq!(body["data"]["overridden_by"], "admin@example.com");

    let export = send(&app, Method::GET, "/api/dataset/export", Some(ADMIN_ID), None).await;
    let csv = text_body(export).await;
    let overridden_row =
        "\n2,\"Stupid video, waste of time. The creator is an idiot.\",non_bullying,0.89\n";
    assert!(csv.contains(overridden_row));
}

// --- Videos ---

#[tokio::test]
async fn test_video_search_matches_title_or_channel() {
    let app = app();

    let (_, python) = get_json(&app, "/api/videos?search=python").await;
    assert_eq!(ids(&python), ["vid-3"]);

    let (_, channel) = get_json(&app, "/api/videos?search=codemaster").await;
    assert_eq!(ids(&channel), ["vid-2"]);

    let (_, all) = get_json(&app, "/api/videos?search=%20%20").await;
    assert_eq!(all["total"], 3);
}

#[tokio::test]
async fn test_video_comments() {
    let app = app();

    let (status, body) = get_json(&app, "/api/videos/vid-1/comments").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), ["1", "2", "4"]);

    let (status, body) = get_json(&app, "/api/videos/vid-9/comments").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Video not found");
}

// --- Dataset export ---

#[tokio::test]
async fn test_export_csv() {
    let response = send(&app(), Method::GET, "/api/dataset/export", Some(ANNOTATOR_ID), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"dataset.csv\""
    );

    let csv = text_body(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,text,label,confidence");
    // Comment 3 has neither a human label nor a prediction.
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[2],
        "2,\"Stupid video, waste of time. The creator is an idiot.\",bullying,0.89"
    );
    assert!(lines[4].starts_with("5,\"Saya suka penjelasannya,"));
    assert!(lines[4].ends_with(",non_bullying,"));
}

#[tokio::test]
async fn test_export_jsonl() {
    let response = send(
        &app(),
        Method::GET,
        "/api/dataset/export?format=jsonl",
        Some(ANNOTATOR_ID),
        None,
    )
    .await;

    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/x-ndjson"
    );
    let body = text_body(response).await;
    let records: Vec<Value> = body
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(records.len(), 4);
    assert_eq!(records[2]["id"], "4");
    assert_eq!(records[2]["label"], "bullying");
    assert_eq!(records[3]["confidence"], Value::Null);
}

// --- Settings ---

#[tokio::test]
async fn test_update_settings_is_admin_only() {
    let payload = json!({
        "youtube_project_id": "yt-project",
        "labeling_order": "newest",
        "batch_size": 25,
        "auto_save": false
    });

    let forbidden = send(
        &app(),
        Method::PUT,
        "/api/settings",
        Some(ANNOTATOR_ID),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let app = app();
    let response = send(&app, Method::PUT, "/api/settings", Some(ADMIN_ID), Some(payload)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["batch_size"], 25);

    // Newest order makes the annotation queue deterministic.
    let (_, next) = get_json(&app, "/api/comments/next").await;
    assert_eq!(next["data"]["id"], "3");
}

#[tokio::test]
async fn test_update_settings_validates_batch_size() {
    for batch_size in [0, 101] {
        let response = send(
            &app(),
            Method::PUT,
            "/api/settings",
            Some(ADMIN_ID),
            Some(json!({
                "youtube_project_id": null,
                "labeling_order": "random",
                "batch_size": batch_size,
                "auto_save": true
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["success"], false);
    }
}

// --- Pages ---

#[tokio::test]
async fn test_member_pages_render() {
    let app = app();

    let (status, annotate) = get_json(&app, "/annotate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        annotate["video"]["id"],
        annotate["comment"]["video_id"],
        "the queue item carries its video"
    );

    let (_, moderation) = get_json(&app, "/moderation").await;
    assert_eq!(moderation["total"], 3);

    let (_, dataset) = get_json(&app, "/dataset").await;
    assert_eq!(dataset["total"], 5);
    assert_eq!(dataset["labeled"], 2);

    let (_, videos) = get_json(&app, "/videos").await;
    assert_eq!(videos["total"], 3);
}

#[tokio::test]
async fn test_analytics_page_for_admin() {
    let response = send(&app(), Method::GET, "/analytics", Some(ADMIN_ID), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["metrics"]["f1_score"], 0.83);
    assert_eq!(body["error_samples"].as_array().unwrap().len(), 2);
}
