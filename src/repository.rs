use crate::fixtures::{self, FixtureData};
use crate::models::{
    ActivityKind, ActivityLog, Comment, ErrorSample, ExportRecord, KpiData, Label, LabelingOrder,
    ModelMetrics, Prediction, ReviewAction, Settings, User, Video,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Most activity entries kept; older ones are dropped as new ones arrive.
pub const ACTIVITY_CAPACITY: usize = 500;

/// CommentStatus
///
/// Labeling-state filter for comment listings. Unknown values behave as `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStatus {
    #[default]
    All,
    Labeled,
    Unlabeled,
}

impl CommentStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("labeled") => CommentStatus::Labeled,
            Some("unlabeled") => CommentStatus::Unlabeled,
            _ => CommentStatus::All,
        }
    }

    fn matches(&self, comment: &Comment) -> bool {
        match self {
            CommentStatus::All => true,
            CommentStatus::Labeled => comment.human_label.is_some(),
            CommentStatus::Unlabeled => comment.human_label.is_none(),
        }
    }
}

/// CommentQuery
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub video_id: Option<String>,
    pub status: CommentStatus,
    pub limit: usize,
}

/// PredictionQuery
///
/// Filters are combined with AND; `page` is 1-based.
#[derive(Debug, Clone, Default)]
pub struct PredictionQuery {
    pub label: Option<Label>,
    pub video_id: Option<String>,
    pub min_confidence: Option<f64>,
    pub max_confidence: Option<f64>,
    pub page: usize,
    pub limit: usize,
}

/// Repository Trait
///
/// The data contract the handlers and the session resolver depend on. Handlers never
/// see the concrete store, so tests can swap in their own implementation.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Returns the user only when the password matches the account.
    async fn find_user_by_credentials(&self, email: &str, password: &str) -> Option<User>;
    async fn get_users(&self) -> Vec<User>;

    // --- Comments ---
    async fn get_comments(&self, query: CommentQuery) -> Vec<Comment>;
    // Honors the configured labeling order.
    async fn next_unlabeled_comment(&self, video_id: Option<String>) -> Option<Comment>;
    async fn label_comment(&self, id: &str, label: Label, labeled_by: &str) -> Option<Comment>;

    // --- Predictions ---
    // Returns the requested page and the total number of matches.
    async fn get_predictions(&self, query: PredictionQuery) -> (Vec<Prediction>, usize);
    async fn review_prediction(
        &self,
        id: &str,
        action: ReviewAction,
        reviewer: &str,
    ) -> Option<Prediction>;
    async fn override_prediction(&self, id: &str, label: Label, by: &str) -> Option<Prediction>;

    // --- Videos ---
    async fn get_videos(&self, search: Option<String>, limit: usize) -> Vec<Video>;
    async fn get_video(&self, id: &str) -> Option<Video>;
    async fn get_video_comments(&self, video_id: &str, limit: usize) -> Vec<Comment>;

    // --- Dashboard & Analytics ---
    async fn get_kpis(&self, now: DateTime<Utc>) -> KpiData;
    // Newest first.
    async fn get_activity(&self, limit: usize) -> Vec<ActivityLog>;
    async fn record_activity(&self, kind: ActivityKind, message: String, user: &str);
    async fn get_model_metrics(&self) -> ModelMetrics;
    async fn get_error_samples(&self) -> Vec<ErrorSample>;
    async fn export_records(&self) -> Vec<ExportRecord>;

    // --- Settings ---
    async fn get_settings(&self) -> Settings;
    async fn update_settings(&self, settings: Settings) -> Settings;
}

/// RepositoryState
///
/// The type used to share the data layer through the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// FixtureRepository
///
/// In-memory implementation seeded from `fixtures::seed()`. Writes (labels, reviews,
/// overrides, settings, activity) live for the lifetime of the process.
pub struct FixtureRepository {
    data: RwLock<FixtureData>,
}

impl Default for FixtureRepository {
    fn default() -> Self {
        Self::new(fixtures::seed())
    }
}

impl FixtureRepository {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }
}

/// The label that counts for a prediction once moderators have touched it.
fn effective_label(prediction: &Prediction) -> Label {
    prediction.human_label.unwrap_or(prediction.label)
}

#[async_trait]
impl Repository for FixtureRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        let data = self.data.read().await;
        data.accounts
            .iter()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
    }

    async fn find_user_by_credentials(&self, email: &str, password: &str) -> Option<User> {
        let data = self.data.read().await;
        data.accounts
            .iter()
            .find(|a| a.user.email.eq_ignore_ascii_case(email) && a.password == password)
            .map(|a| a.user.clone())
    }

    async fn get_users(&self) -> Vec<User> {
        let data = self.data.read().await;
        data.accounts.iter().map(|a| a.user.clone()).collect()
    }

    async fn get_comments(&self, query: CommentQuery) -> Vec<Comment> {
        let data = self.data.read().await;
        data.comments
            .iter()
            .filter(|c| query.video_id.as_ref().is_none_or(|v| &c.video_id == v))
            .filter(|c| query.status.matches(c))
            .take(query.limit)
            .cloned()
            .collect()
    }

    async fn next_unlabeled_comment(&self, video_id: Option<String>) -> Option<Comment> {
        let data = self.data.read().await;
        let mut candidates: Vec<&Comment> = data
            .comments
            .iter()
            .filter(|c| c.human_label.is_none())
            .filter(|c| video_id.as_ref().is_none_or(|v| &c.video_id == v))
            .collect();

        match data.settings.labeling_order {
            LabelingOrder::Newest => {
                candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                candidates.first().map(|c| (*c).clone())
            }
            LabelingOrder::Random => candidates.choose(&mut rand::rng()).map(|c| (*c).clone()),
        }
    }

    async fn label_comment(&self, id: &str, label: Label, labeled_by: &str) -> Option<Comment> {
        let mut data = self.data.write().await;
        let comment = data.comments.iter_mut().find(|c| c.id == id)?;
        let first_label = comment.human_label.is_none();

        comment.human_label = Some(label);
        comment.labeled_by = Some(labeled_by.to_string());
        comment.labeled_at = Some(Utc::now());
        let updated = comment.clone();

        // Keep the per-video progress counter in step with newly labeled comments.
        if first_label {
            if let Some(video) = data.videos.iter_mut().find(|v| v.id == updated.video_id) {
                video.labeled_comments = video.labeled_comments.saturating_add(1);
            }
        }

        Some(updated)
    }

    async fn get_predictions(&self, query: PredictionQuery) -> (Vec<Prediction>, usize) {
        let data = self.data.read().await;

        let video_comment_ids: Option<Vec<&str>> = query.video_id.as_ref().map(|video_id| {
            data.comments
                .iter()
                .filter(|c| &c.video_id == video_id)
                .map(|c| c.id.as_str())
                .collect()
        });

        let matches: Vec<&Prediction> = data
            .predictions
            .iter()
            .filter(|p| query.label.is_none_or(|label| p.label == label))
            .filter(|p| query.min_confidence.is_none_or(|min| p.confidence >= min))
            .filter(|p| query.max_confidence.is_none_or(|max| p.confidence <= max))
            .filter(|p| {
                video_comment_ids
                    .as_ref()
                    .is_none_or(|ids| ids.contains(&p.comment_id.as_str()))
            })
            .collect();

        let total = matches.len();
        let start = query.page.max(1).saturating_sub(1).saturating_mul(query.limit);
        let page = matches
            .into_iter()
            .skip(start)
            .take(query.limit)
            .cloned()
            .collect();

        (page, total)
    }

    async fn review_prediction(
        &self,
        id: &str,
        action: ReviewAction,
        reviewer: &str,
    ) -> Option<Prediction> {
        let mut data = self.data.write().await;
        let prediction = data.predictions.iter_mut().find(|p| p.id == id)?;
        prediction.review = Some(action);
        prediction.reviewed_by = Some(reviewer.to_string());
        Some(prediction.clone())
    }

    async fn override_prediction(&self, id: &str, label: Label, by: &str) -> Option<Prediction> {
        let mut data = self.data.write().await;
        let prediction = data.predictions.iter_mut().find(|p| p.id == id)?;
        prediction.is_overridden = true;
        prediction.human_label = Some(label);
        prediction.overridden_by = Some(by.to_string());
        prediction.overridden_at = Some(Utc::now());
        Some(prediction.clone())
    }

    async fn get_videos(&self, search: Option<String>, limit: usize) -> Vec<Video> {
        let data = self.data.read().await;
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        data.videos
            .iter()
            .filter(|v| {
                needle.as_ref().is_none_or(|n| {
                    v.title.to_lowercase().contains(n) || v.channel_title.to_lowercase().contains(n)
                })
            })
            .take(limit)
            .cloned()
            .collect()
    }

    async fn get_video(&self, id: &str) -> Option<Video> {
        let data = self.data.read().await;
        data.videos.iter().find(|v| v.id == id).cloned()
    }

    async fn get_video_comments(&self, video_id: &str, limit: usize) -> Vec<Comment> {
        let data = self.data.read().await;
        data.comments
            .iter()
            .filter(|c| c.video_id == video_id)
            .take(limit)
            .cloned()
            .collect()
    }

    async fn get_kpis(&self, now: DateTime<Utc>) -> KpiData {
        let data = self.data.read().await;
        let since = now - Duration::hours(24);

        KpiData {
            total: data.comments.len(),
            labeled: data
                .comments
                .iter()
                .filter(|c| c.human_label.is_some())
                .count(),
            bullying_24h: data
                .predictions
                .iter()
                .filter(|p| p.created_at > since && p.created_at <= now)
                .filter(|p| effective_label(p) == Label::Bullying)
                .count(),
            last_model_f1: data.metrics.f1_score,
        }
    }

    async fn get_activity(&self, limit: usize) -> Vec<ActivityLog> {
        let data = self.data.read().await;
        data.activity.iter().rev().take(limit).cloned().collect()
    }

    async fn record_activity(&self, kind: ActivityKind, message: String, user: &str) {
        let mut data = self.data.write().await;
        data.activity_seq += 1;
        let id = format!("log-{}", data.activity_seq);
        data.activity.push_back(ActivityLog {
            id,
            kind,
            message,
            user: user.to_string(),
            timestamp: Utc::now(),
        });
        while data.activity.len() > ACTIVITY_CAPACITY {
            data.activity.pop_front();
        }
    }

    async fn get_model_metrics(&self) -> ModelMetrics {
        self.data.read().await.metrics.clone()
    }

    async fn get_error_samples(&self) -> Vec<ErrorSample> {
        self.data.read().await.error_samples.clone()
    }

    async fn export_records(&self) -> Vec<ExportRecord> {
        let data = self.data.read().await;
        data.comments
            .iter()
            .filter_map(|comment| {
                let prediction = data.predictions.iter().find(|p| p.comment_id == comment.id);
                let label = comment
                    .human_label
                    .or_else(|| prediction.map(effective_label))?;

                Some(ExportRecord {
                    id: comment.id.clone(),
                    text: comment.text.clone(),
                    label,
                    confidence: prediction.map(|p| p.confidence),
                })
            })
            .collect()
    }

    async fn get_settings(&self) -> Settings {
        self.data.read().await.settings.clone()
    }

    async fn update_settings(&self, settings: Settings) -> Settings {
        let mut data = self.data.write().await;
        data.settings = settings;
        data.settings.clone()
    }
}
