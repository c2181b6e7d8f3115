//! Seed data for the in-memory repository: the sample videos, comments and model
//! predictions the dashboard ships with, plus the development operator accounts.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::models::{
    ActivityKind, ActivityLog, CategoryScores, Comment, ConfusionMatrix, ErrorSample, Label,
    ModelMetrics, Prediction, Settings, User, Video,
};

pub const ADMIN_ID: Uuid = Uuid::from_u128(1);
pub const ANNOTATOR_ID: Uuid = Uuid::from_u128(2);
pub const REVIEWER_ID: Uuid = Uuid::from_u128(3);

/// An operator account together with its development password.
#[derive(Debug, Clone)]
pub struct Account {
    pub user: User,
    pub password: String,
}

/// FixtureData
///
/// Everything the `FixtureRepository` holds behind its lock.
#[derive(Debug, Clone)]
pub struct FixtureData {
    pub accounts: Vec<Account>,
    pub comments: Vec<Comment>,
    pub predictions: Vec<Prediction>,
    pub videos: Vec<Video>,
    /// Oldest first; appends go to the back.
    pub activity: VecDeque<ActivityLog>,
    /// Number of activity entries ever recorded, used to mint `log-N` ids.
    pub activity_seq: usize,
    pub metrics: ModelMetrics,
    pub error_samples: Vec<ErrorSample>,
    pub settings: Settings,
}

fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

fn account(id: Uuid, email: &str, name: &str, role: &str, password: &str, active: &str) -> Account {
    Account {
        user: User {
            id,
            email: email.to_string(),
            name: name.to_string(),
            role: role.to_string(),
            last_active: at(active),
        },
        password: password.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn comment(
    id: &str,
    video_id: &str,
    text: &str,
    author: &str,
    published: &str,
    likes: u32,
    language: &str,
    labeled: Option<(Label, &str)>,
) -> Comment {
    Comment {
        id: id.to_string(),
        video_id: video_id.to_string(),
        text: text.to_string(),
        author: author.to_string(),
        published_at: at(published),
        like_count: Some(likes),
        language: Some(language.to_string()),
        human_label: labeled.map(|(label, _)| label),
        labeled_by: labeled.map(|(_, by)| by.to_string()),
        labeled_at: labeled.map(|_| at(published)),
        created_at: at(published),
    }
}

fn prediction(
    id: &str,
    comment_id: &str,
    label: Label,
    confidence: f64,
    created: &str,
    scores: (f64, f64, f64),
) -> Prediction {
    Prediction {
        id: id.to_string(),
        comment_id: comment_id.to_string(),
        label,
        confidence,
        model_version: "v1.2.0".to_string(),
        created_at: at(created),
        categories: Some(CategoryScores {
            harassment: scores.0,
            hate: scores.1,
            toxicity: scores.2,
        }),
        is_overridden: false,
        human_label: None,
        overridden_by: None,
        overridden_at: None,
        review: None,
        reviewed_by: None,
    }
}

fn video(
    id: &str,
    title: &str,
    channel: &str,
    description: &str,
    counts: (u32, u32),
    last_sync: &str,
    published: &str,
) -> Video {
    Video {
        id: id.to_string(),
        title: title.to_string(),
        thumbnail: "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg".to_string(),
        total_comments: counts.0,
        labeled_comments: counts.1,
        last_sync: at(last_sync),
        channel_title: channel.to_string(),
        description: Some(description.to_string()),
        published_at: at(published),
    }
}

fn activity(id: &str, kind: ActivityKind, message: &str, user: &str, ts: &str) -> ActivityLog {
    ActivityLog {
        id: id.to_string(),
        kind,
        message: message.to_string(),
        user: user.to_string(),
        timestamp: at(ts),
    }
}

/// seed
///
/// Builds a fresh copy of the sample dataset. Every call returns independent data,
/// so each repository (and each test) starts from the same state.
#[rustfmt::skip]
pub fn seed() -> FixtureData {
    let accounts = vec![
        account(ADMIN_ID, "admin@example.com", "Admin User", "admin", "admin123", "2024-01-15T16:00:00Z"),
        account(ANNOTATOR_ID, "annotator@example.com", "Annotator One", "annotator", "annotator123", "2024-01-15T15:30:00Z"),
        account(REVIEWER_ID, "reviewer@example.com", "Reviewer User", "reviewer", "reviewer123", "2024-01-15T14:10:00Z"),
    ];

    let comments = vec![
        comment(
            "1",
            "vid-1",
            "Konten yang bagus! Terima kasih sudah berbagi informasi yang bermanfaat.",
            "ViewerPositif",
            "2024-01-15T10:30:00Z",
            15,
            "id",
            None,
        ),
        comment(
            "2",
            "vid-1",
            "Stupid video, waste of time. The creator is an idiot.",
            "AngryCritic",
            "2024-01-15T11:45:00Z",
            2,
            "en",
            None,
        ),
        comment(
            "3",
            "vid-2",
            "I think this approach might work but I'm not entirely sure about the implementation.",
            "ThoughtfulViewer",
            "2024-01-15T12:15:00Z",
            8,
            "en",
            None,
        ),
        comment(
            "4",
            "vid-1",
            "You're absolutely terrible at this. Everyone knows you're a fraud and your content is garbage.",
            "ToxicCommenter",
            "2024-01-15T13:20:00Z",
            0,
            "en",
            Some((Label::Bullying, "annotator@example.com")),
        ),
        comment(
            "5",
            "vid-3",
            "Saya suka penjelasannya, mudah dipahami untuk pemula seperti saya.",
            "PemulaBelajar",
            "2024-01-15T14:00:00Z",
            12,
            "id",
            Some((Label::NonBullying, "reviewer@example.com")),
        ),
    ];

    let mut reviewed = prediction("pred-3", "4", Label::Bullying, 0.96, "2024-01-15T13:21:00Z", (0.94, 0.78, 0.98));
    reviewed.human_label = Some(Label::Bullying);

    let predictions = vec![
        prediction("pred-1", "2", Label::Bullying, 0.89, "2024-01-15T11:46:00Z", (0.85, 0.65, 0.92)),
        prediction("pred-2", "1", Label::NonBullying, 0.95, "2024-01-15T10:31:00Z", (0.05, 0.02, 0.08)),
        reviewed,
    ];

    let videos = vec![
        video(
            "vid-1",
            "Tutorial Machine Learning untuk Pemula",
            "Tech Indonesia",
            "Belajar machine learning dari dasar dengan contoh praktis",
            (1250, 320),
            "2024-01-15T15:30:00Z",
            "2024-01-10T08:00:00Z",
        ),
        video(
            "vid-2",
            "Web Development Best Practices",
            "CodeMaster",
            "Tips and tricks for modern web development",
            (890, 180),
            "2024-01-15T14:20:00Z",
            "2024-01-12T10:00:00Z",
        ),
        video(
            "vid-3",
            "Data Science with Python",
            "DataViz Pro",
            "Complete guide to data science using Python",
            (2100, 650),
            "2024-01-15T16:00:00Z",
            "2024-01-08T12:00:00Z",
        ),
    ];

    let activity = VecDeque::from([
        activity("log-3", ActivityKind::Import, "Imported 500 new comments from dataset.csv", "admin@example.com", "2024-01-15T13:20:00Z"),
        activity("log-2", ActivityKind::Moderation, "Reviewed 5 high-confidence predictions", "admin@example.com", "2024-01-15T14:45:00Z"),
        activity("log-1", ActivityKind::Annotation, "Labeled 15 comments as non_bullying", "annotator@example.com", "2024-01-15T15:30:00Z"),
    ]);
    let activity_seq = activity.len();

    let metrics = ModelMetrics {
        accuracy: 0.87,
        precision: 0.85,
        recall: 0.82,
        f1_score: 0.83,
        confusion_matrix: ConfusionMatrix {
            true_bullying: 145,
            false_non_bullying: 23,
            false_ambiguous: 12,
            true_non_bullying: 320,
            false_bullying: 18,
            true_ambiguous: 45,
        },
    };

    let error_samples = vec![
        ErrorSample {
            id: "error-1".to_string(),
            comment: "This is kind of disappointing, I expected better".to_string(),
            true_label: Label::NonBullying,
            predicted_label: Label::Bullying,
            confidence: 0.72,
        },
        ErrorSample {
            id: "error-2".to_string(),
            comment: "You people are so annoying with your constant complaining".to_string(),
            true_label: Label::Bullying,
            predicted_label: Label::Ambiguous,
            confidence: 0.68,
        },
    ];

    FixtureData {
        accounts,
        comments,
        predictions,
        videos,
        activity,
        activity_seq,
        metrics,
        error_samples,
        settings: Settings::default(),
    }
}
