use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Moderation Schemas ---

/// Label
///
/// The three-way classification applied to a comment, both by annotators and by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Label {
    Bullying,
    NonBullying,
    Ambiguous,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Bullying => "bullying",
            Label::NonBullying => "non_bullying",
            Label::Ambiguous => "ambiguous",
        }
    }
}

/// User
///
/// A dashboard operator. The role is the RBAC field: 'admin', 'annotator' or 'reviewer'.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    #[ts(type = "string")]
    pub last_active: DateTime<Utc>,
}

/// Comment
///
/// A YouTube comment imported for labeling. The `human_label` triple
/// (`human_label`, `labeled_by`, `labeled_at`) is set together when an annotator labels it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub text: String,
    pub author: String,
    #[ts(type = "string")]
    pub published_at: DateTime<Utc>,
    pub like_count: Option<u32>,
    // ISO 639-1 code, e.g. "en" or "id".
    pub language: Option<String>,
    pub human_label: Option<Label>,
    pub labeled_by: Option<String>,
    #[ts(type = "string | null")]
    pub labeled_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CategoryScores
///
/// Per-category model scores in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryScores {
    pub harassment: f64,
    pub hate: f64,
    pub toxicity: f64,
}

/// ReviewAction
///
/// A moderator's verdict on a model prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl ReviewAction {
    pub fn past_tense(&self) -> &'static str {
        match self {
            ReviewAction::Approve => "approved",
            ReviewAction::Reject => "rejected",
        }
    }
}

/// Prediction
///
/// A model output for a single comment, plus the moderation trail attached to it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Prediction {
    pub id: String,
    pub comment_id: String,
    pub label: Label,
    pub confidence: f64,
    pub model_version: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub categories: Option<CategoryScores>,

    // Override trail. `human_label` replaces the model label everywhere it is consumed.
    pub is_overridden: bool,
    pub human_label: Option<Label>,
    pub overridden_by: Option<String>,
    #[ts(type = "string | null")]
    pub overridden_at: Option<DateTime<Utc>>,

    // Review trail from the moderation queue.
    pub review: Option<ReviewAction>,
    pub reviewed_by: Option<String>,
}

/// Video
///
/// A source video whose comments are synced for labeling.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub total_comments: u32,
    pub labeled_comments: u32,
    #[ts(type = "string")]
    pub last_sync: DateTime<Utc>,
    pub channel_title: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub published_at: DateTime<Utc>,
}

/// ActivityKind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActivityKind {
    Annotation,
    Moderation,
    Import,
    Export,
}

/// ActivityLog
///
/// One line of the dashboard activity feed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ActivityLog {
    pub id: String,
    // Sent as "type" for the frontend, `kind` in Rust since `type` is reserved.
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    pub user: String,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}

/// --- Dashboard & Analytics Schemas (Output) ---

/// KpiData
///
/// Headline counters shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct KpiData {
    pub total: usize,
    pub labeled: usize,
    /// Predictions labeled bullying within the last 24 hours.
    pub bullying_24h: usize,
    pub last_model_f1: f64,
}

/// ConfusionMatrix
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ConfusionMatrix {
    pub true_bullying: u32,
    pub false_non_bullying: u32,
    pub false_ambiguous: u32,
    pub true_non_bullying: u32,
    pub false_bullying: u32,
    pub true_ambiguous: u32,
}

/// ModelMetrics
///
/// Evaluation results of the currently deployed model.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModelMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
}

/// ErrorSample
///
/// A misclassified comment surfaced for analysis.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorSample {
    pub id: String,
    pub comment: String,
    pub true_label: Label,
    pub predicted_label: Label,
    pub confidence: f64,
}

/// LabelingOrder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LabelingOrder {
    #[default]
    Random,
    Newest,
}

/// Settings
///
/// Labeling workflow settings, editable by admins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Settings {
    pub youtube_project_id: Option<String>,
    pub labeling_order: LabelingOrder,
    pub batch_size: u32,
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            youtube_project_id: None,
            labeling_order: LabelingOrder::Random,
            batch_size: 10,
            auto_save: true,
        }
    }
}

/// ExportFormat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ExportFormat {
    #[default]
    Csv,
    Jsonl,
}

/// ExportRecord
///
/// One row of a dataset export. `label` is the human label when present, otherwise
/// the model's label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExportRecord {
    pub id: String,
    pub text: String,
    pub label: Label,
    pub confidence: Option<f64>,
}

/// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Credentials for `POST /api/auth/login`. The password is compared and dropped, never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LabelCommentRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LabelCommentRequest {
    pub id: String,
    pub label: Label,
}

/// ReviewPredictionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ReviewPredictionRequest {
    pub id: String,
    pub action: ReviewAction,
}

/// OverridePredictionRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OverridePredictionRequest {
    pub label: Label,
}

/// --- Response Envelopes ---

/// UserProfile
///
/// The public view of a `User` returned after login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
        }
    }
}

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserProfile,
    pub token: String,
}

/// ApiMessage
///
/// Generic `{success, message}` body used for failures and action acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

impl ApiMessage {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// CommentListResponse
///
/// `total` is the number of rows returned, after the limit was applied.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentListResponse {
    pub success: bool,
    pub data: Vec<Comment>,
    pub total: usize,
}

/// CommentResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CommentResponse {
    pub success: bool,
    pub data: Comment,
}

/// PredictionListResponse
///
/// Paginated predictions. `total` counts every match, not just this page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PredictionListResponse {
    pub success: bool,
    pub data: Vec<Prediction>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

/// PredictionResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PredictionResponse {
    pub success: bool,
    pub data: Prediction,
}

/// VideoListResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct VideoListResponse {
    pub success: bool,
    pub data: Vec<Video>,
    pub total: usize,
}

/// --- Page Payloads ---

/// DashboardPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DashboardPage {
    pub kpis: KpiData,
    pub activity: Vec<ActivityLog>,
}

/// AnnotatePage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AnnotatePage {
    pub comment: Option<Comment>,
    pub video: Option<Video>,
}

/// AnalyticsPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AnalyticsPage {
    pub metrics: ModelMetrics,
    pub error_samples: Vec<ErrorSample>,
}

/// DatasetPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct DatasetPage {
    pub total: usize,
    pub labeled: usize,
    pub preview: Vec<Comment>,
}

/// SettingsPage
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SettingsPage {
    pub settings: Settings,
    pub users: Vec<User>,
}

/// AuthPage
///
/// State needed to render a logged-out form: where to go after success and any
/// error forwarded by the auth callback.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AuthPage {
    pub page: String,
    pub then: Option<String>,
    pub error: Option<String>,
}
