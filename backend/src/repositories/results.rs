// src/repositories/results.rs

use std::sync::Arc;

use super::{SyncStatus, settle};
use crate::{
    events::{DomainEvent, EventBus},
    models::result::QuizResult,
    store::{Collection, DocumentStore, encode},
};

/// Append-only access to the `quizResults` collection.
pub struct ResultRepository {
    store: Arc<dyn DocumentStore>,
    events: EventBus,
}

impl ResultRepository {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Stores a completed attempt. Best effort: failures are logged and reported, never raised.
    pub async fn record(&self, result: &QuizResult) -> SyncStatus {
        let sync = settle("save result", async {
            let body = encode(&result.quiz.id, result)?;
            self.store.insert(Collection::QuizResults, body).await.map(|_| ())
        })
        .await;

        if sync.is_confirmed() {
            tracing::info!(
                "Result saved for quiz {} ({}/{})",
                result.quiz.id,
                result.score,
                result.total_questions
            );
            self.events.publish(DomainEvent::ResultRecorded {
                quiz_id: result.quiz.id.clone(),
            });
        }
        sync
    }

    /// Every stored result. A failed fetch is logged and reads as empty.
    pub async fn all(&self) -> Vec<QuizResult> {
        let docs = match self.store.list(Collection::QuizResults).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("Failed to fetch results: {:?}", e);
                return Vec::new();
            }
        };

        docs.iter()
            .filter_map(|doc| match doc.decode::<QuizResult>() {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!("Skipping malformed result: {}", e);
                    None
                }
            })
            .collect()
    }

    pub async fn for_quiz(&self, quiz_id: &str) -> Vec<QuizResult> {
        self.all()
            .await
            .into_iter()
            .filter(|r| r.quiz.id == quiz_id)
            .collect()
    }

    pub async fn for_user(&self, email: &str) -> Vec<QuizResult> {
        self.all()
            .await
            .into_iter()
            .filter(|r| r.user.email == email)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::result::{QuizSnapshot, UserSnapshot};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn sample(quiz_id: &str, email: &str) -> QuizResult {
        QuizResult {
            user: UserSnapshot {
                name: "Ada".to_string(),
                email: email.to_string(),
            },
            quiz: QuizSnapshot {
                id: quiz_id.to_string(),
                name: "Quiz".to_string(),
            },
            score: 1,
            total_questions: 2,
            elapsed_time: 3,
            completed_at: None,
            theory_answers: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn filters_by_quiz_and_user() {
        let store = Arc::new(MemoryStore::new());
        let repo = ResultRepository::new(store.clone(), EventBus::new());

        assert!(repo.record(&sample("q1", "a@x.io")).await.is_confirmed());
        repo.record(&sample("q1", "b@x.io")).await;
        repo.record(&sample("q2", "a@x.io")).await;
        store
            .insert(
                Collection::QuizResults,
                json!({"quizId": "q1", "quizName": "Quiz", "user": {"email": "c@x.io"}, "score": 2, "totalQuestions": 2}),
            )
            .await
            .unwrap();

        assert_eq!(repo.for_quiz("q1").await.len(), 3);
        assert_eq!(repo.for_user("a@x.io").await.len(), 2);
        assert!(repo.for_quiz("missing").await.is_empty());
    }
}
