// src/models/result.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who took the quiz, as captured when the attempt completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub name: String,
    pub email: String,
}

/// Which quiz was taken, as captured when the attempt completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub id: String,
    pub name: String,
}

/// Persisted record of one completed quiz session. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ResultDocument")]
pub struct QuizResult {
    pub user: UserSnapshot,
    pub quiz: QuizSnapshot,

    /// Number of correctly answered questions.
    pub score: u32,

    pub total_questions: u32,

    /// Whole seconds between the timer start and the last answer.
    pub elapsed_time: u64,

    pub completed_at: Option<DateTime<Utc>>,

    /// Raw free-text answers keyed by question index (theory questions only).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub theory_answers: BTreeMap<usize, String>,
}

impl QuizResult {
    /// `score / total_questions`, with a zero total counted as one question.
    pub fn ratio(&self) -> f64 {
        self.score as f64 / self.total_questions.max(1) as f64
    }
}

/// Tolerant wire form of [`QuizResult`].
///
/// Older records flatten the quiz into `quizId`/`quizName`, use `timestamp`
/// instead of `completedAt`, or miss numeric fields entirely.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ResultDocument {
    user: Option<UserDocument>,
    quiz: Option<QuizSnapshotDocument>,
    quiz_id: Option<String>,
    quiz_name: Option<String>,
    score: Option<f64>,
    total_questions: Option<f64>,
    elapsed_time: Option<f64>,
    completed_at: Option<String>,
    timestamp: Option<String>,
    theory_answers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UserDocument {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuizSnapshotDocument {
    id: Option<String>,
    name: Option<String>,
}

fn non_negative(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<ResultDocument> for QuizResult {
    fn from(doc: ResultDocument) -> Self {
        let user = doc.user.unwrap_or_default();
        let quiz = doc.quiz.unwrap_or_default();

        QuizResult {
            user: UserSnapshot {
                name: user.name.unwrap_or_else(|| "Anonymous".to_string()),
                email: user.email.unwrap_or_else(|| "Unknown".to_string()),
            },
            quiz: QuizSnapshot {
                id: quiz.id.or(doc.quiz_id).unwrap_or_default(),
                name: quiz.name.or(doc.quiz_name).unwrap_or_default(),
            },
            score: non_negative(doc.score) as u32,
            total_questions: non_negative(doc.total_questions) as u32,
            elapsed_time: non_negative(doc.elapsed_time) as u64,
            completed_at: parse_timestamp(doc.completed_at.as_deref())
                .or_else(|| parse_timestamp(doc.timestamp.as_deref())),
            theory_answers: doc
                .theory_answers
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(k, v)| k.parse().ok().map(|k| (k, v)))
                .collect(),
        }
    }
}
