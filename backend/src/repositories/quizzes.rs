// src/repositories/quizzes.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{Persisted, SyncStatus, settle};
use crate::{
    error::AppError,
    events::{DomainEvent, EventBus},
    models::quiz::{AdminRef, Question, Quiz},
    services::validation::NewQuiz,
    store::{Collection, DocumentStore, StoreError},
};

/// Quiz collection with an in-memory mirror.
///
/// Every mutation is applied to the mirror first and then written to the
/// store. A failed write is logged and reported as [`SyncStatus::Diverged`];
/// the mirror keeps the change. Fetching replaces the mirror wholesale.
///
/// Changes to one quiz are serialised from the local mutation through the
/// remote write, so the store receives them in mirror order.
pub struct QuizRepository {
    store: Arc<dyn DocumentStore>,
    mirror: RwLock<Vec<Quiz>>,
    write_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    events: EventBus,
}

impl QuizRepository {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self {
            store,
            mirror: RwLock::new(Vec::new()),
            write_locks: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Reloads every quiz from the store, replacing the mirror.
    ///
    /// On failure the mirror is left untouched. Documents that cannot be
    /// decoded are skipped.
    pub async fn fetch_quizzes(&self) -> SyncStatus {
        let docs = match self.store.list(Collection::Quizzes).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("Failed to fetch quizzes: {:?}", e);
                return SyncStatus::Diverged(e.to_string());
            }
        };

        let quizzes: Vec<Quiz> = docs
            .iter()
            .filter_map(|doc| match Quiz::from_document(doc) {
                Ok(quiz) => Some(quiz),
                Err(e) => {
                    tracing::warn!("Skipping malformed quiz: {}", e);
                    None
                }
            })
            .collect();

        let count = quizzes.len();
        *self.mirror.write().await = quizzes;
        tracing::info!("Loaded {} quizzes", count);
        self.events.publish(DomainEvent::QuizzesReloaded { count });

        SyncStatus::Confirmed
    }

    pub async fn all(&self) -> Vec<Quiz> {
        self.mirror.read().await.clone()
    }

    pub async fn find(&self, quiz_id: &str) -> Option<Quiz> {
        self.mirror
            .read()
            .await
            .iter()
            .find(|q| q.id == quiz_id)
            .cloned()
    }

    /// Quizzes owned by one of `admin_ids` whose name contains `search` (case-insensitive).
    pub async fn visible_to(&self, admin_ids: &[String], search: Option<&str>) -> Vec<Quiz> {
        let needle = search.map(str::to_lowercase).unwrap_or_default();
        self.mirror
            .read()
            .await
            .iter()
            .filter(|q| admin_ids.contains(&q.admin.uid))
            .filter(|q| q.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub async fn owned_by(&self, admin_uid: &str) -> Vec<Quiz> {
        self.mirror
            .read()
            .await
            .iter()
            .filter(|q| q.admin.uid == admin_uid)
            .cloned()
            .collect()
    }

    pub async fn create_quiz(&self, new: NewQuiz, admin: AdminRef) -> Persisted<Quiz> {
        let quiz = Quiz {
            id: Uuid::new_v4().simple().to_string(),
            name: new.name,
            description: new.description,
            admin,
            auth_code: new.auth_code,
            questions: Vec::new(),
        };

        self.mirror.write().await.push(quiz.clone());
        self.events.publish(DomainEvent::QuizCreated {
            quiz_id: quiz.id.clone(),
        });

        let sync = settle("create quiz", async {
            let body = quiz.to_document()?;
            self.store.set(Collection::Quizzes, &quiz.id, body).await
        })
        .await;

        Persisted { value: quiz, sync }
    }

    pub async fn update_auth_code(
        &self,
        quiz_id: &str,
        auth_code: Option<String>,
    ) -> Result<Persisted<Quiz>, AppError> {
        let lock = self.write_lock(quiz_id).await;
        let _serial = lock.lock().await;

        let quiz = self
            .mutate(quiz_id, |quiz| {
                quiz.auth_code = auth_code.clone();
                Ok(())
            })
            .await?;

        let sync = settle(
            "update auth code",
            self.store
                .update(Collection::Quizzes, quiz_id, json!({ "authCode": auth_code })),
        )
        .await;

        Ok(Persisted { value: quiz, sync })
    }

    pub async fn delete_quiz(&self, quiz_id: &str) -> Result<Persisted<()>, AppError> {
        let lock = self.write_lock(quiz_id).await;
        let _serial = lock.lock().await;

        {
            let mut mirror = self.mirror.write().await;
            let index = mirror
                .iter()
                .position(|q| q.id == quiz_id)
                .ok_or_else(|| quiz_not_found(quiz_id))?;
            mirror.remove(index);
        }
        self.events.publish(DomainEvent::QuizDeleted {
            quiz_id: quiz_id.to_string(),
        });

        let sync = settle(
            "delete quiz",
            self.store.delete(Collection::Quizzes, quiz_id),
        )
        .await;
        self.write_locks.lock().await.remove(quiz_id);

        Ok(Persisted { value: (), sync })
    }

    pub async fn add_question(
        &self,
        quiz_id: &str,
        question: Question,
    ) -> Result<Persisted<Quiz>, AppError> {
        let lock = self.write_lock(quiz_id).await;
        let _serial = lock.lock().await;

        let quiz = self
            .mutate(quiz_id, |quiz| {
                quiz.questions.push(question);
                Ok(())
            })
            .await?;

        let sync = self.write_questions("add question", &quiz).await;
        Ok(Persisted { value: quiz, sync })
    }

    pub async fn update_question(
        &self,
        quiz_id: &str,
        index: usize,
        question: Question,
    ) -> Result<Persisted<Quiz>, AppError> {
        let lock = self.write_lock(quiz_id).await;
        let _serial = lock.lock().await;

        let quiz = self
            .mutate(quiz_id, |quiz| {
                let slot = quiz
                    .questions
                    .get_mut(index)
                    .ok_or_else(|| question_not_found(index))?;
                *slot = question;
                Ok(())
            })
            .await?;

        let sync = self.write_questions("update question", &quiz).await;
        Ok(Persisted { value: quiz, sync })
    }

    pub async fn delete_question(
        &self,
        quiz_id: &str,
        index: usize,
    ) -> Result<Persisted<Quiz>, AppError> {
        let lock = self.write_lock(quiz_id).await;
        let _serial = lock.lock().await;

        let quiz = self
            .mutate(quiz_id, |quiz| {
                if index >= quiz.questions.len() {
                    return Err(question_not_found(index));
                }
                quiz.questions.remove(index);
                Ok(())
            })
            .await?;

        let sync = self.write_questions("delete question", &quiz).await;
        Ok(Persisted { value: quiz, sync })
    }

    async fn write_lock(&self, quiz_id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .lock()
            .await
            .entry(quiz_id.to_string())
            .or_default()
            .clone()
    }

    /// Applies `change` to one mirrored quiz and returns the updated copy.
    async fn mutate<F>(&self, quiz_id: &str, change: F) -> Result<Quiz, AppError>
    where
        F: FnOnce(&mut Quiz) -> Result<(), AppError>,
    {
        let updated = {
            let mut mirror = self.mirror.write().await;
            let quiz = mirror
                .iter_mut()
                .find(|q| q.id == quiz_id)
                .ok_or_else(|| quiz_not_found(quiz_id))?;
            change(quiz)?;
            quiz.clone()
        };

        self.events.publish(DomainEvent::QuizUpdated {
            quiz_id: quiz_id.to_string(),
        });
        Ok(updated)
    }

    async fn write_questions(&self, action: &str, quiz: &Quiz) -> SyncStatus {
        settle(action, async {
            let questions = serde_json::to_value(&quiz.questions).map_err(|e| {
                StoreError::Decode {
                    id: quiz.id.clone(),
                    reason: e.to_string(),
                }
            })?;
            self.store
                .update(Collection::Quizzes, &quiz.id, json!({ "questions": questions }))
                .await
        })
        .await
    }
}

fn quiz_not_found(quiz_id: &str) -> AppError {
    AppError::NotFound(format!("Quiz {} not found", quiz_id))
}

fn question_not_found(index: usize) -> AppError {
    AppError::NotFound(format!("Question {} not found", index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz::QuizOption;
    use crate::store::{Document, MemoryStore};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Reads succeed from an inner store; every write fails.
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl DocumentStore for ReadOnlyStore {
        async fn list(&self, c: Collection) -> Result<Vec<Document>, StoreError> {
            self.0.list(c).await
        }
        async fn get(&self, c: Collection, id: &str) -> Result<Option<Document>, StoreError> {
            self.0.get(c, id).await
        }
        async fn insert(&self, _c: Collection, _data: Value) -> Result<String, StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }
        async fn set(&self, _c: Collection, _id: &str, _data: Value) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }
        async fn update(&self, _c: Collection, _id: &str, _patch: Value) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }
        async fn delete(&self, _c: Collection, _id: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("offline".to_string()))
        }
    }

    /// Delegates to a memory store, holding back the first `update`.
    #[derive(Default)]
    struct SlowFirstUpdate {
        inner: MemoryStore,
        delayed: AtomicBool,
    }

    #[async_trait]
    impl DocumentStore for SlowFirstUpdate {
        async fn list(&self, c: Collection) -> Result<Vec<Document>, StoreError> {
            self.inner.list(c).await
        }
        async fn get(&self, c: Collection, id: &str) -> Result<Option<Document>, StoreError> {
            self.inner.get(c, id).await
        }
        async fn insert(&self, c: Collection, data: Value) -> Result<String, StoreError> {
            self.inner.insert(c, data).await
        }
        async fn set(&self, c: Collection, id: &str, data: Value) -> Result<(), StoreError> {
            self.inner.set(c, id, data).await
        }
        async fn update(&self, c: Collection, id: &str, patch: Value) -> Result<(), StoreError> {
            if !self.delayed.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            self.inner.update(c, id, patch).await
        }
        async fn delete(&self, c: Collection, id: &str) -> Result<(), StoreError> {
            self.inner.delete(c, id).await
        }
    }

    fn admin() -> AdminRef {
        AdminRef {
            uid: "admin-1".to_string(),
            display_name: "Admin".to_string(),
            photo_url: String::new(),
        }
    }

    fn new_quiz(name: &str) -> NewQuiz {
        NewQuiz {
            name: name.to_string(),
            description: String::new(),
            auth_code: None,
        }
    }

    fn question(text: &str) -> Question {
        Question::MultipleChoice {
            question: text.to_string(),
            options: vec![QuizOption {
                text: "yes".to_string(),
                is_correct: true,
            }],
        }
    }

    #[tokio::test]
    async fn mutations_persist_and_survive_refetch() {
        let store = Arc::new(MemoryStore::new());
        let repo = QuizRepository::new(store.clone(), EventBus::new());

        let created = repo.create_quiz(new_quiz("Rust"), admin()).await;
        assert!(created.sync.is_confirmed());
        let id = created.value.id.clone();

        repo.add_question(&id, question("one")).await.unwrap();
        repo.add_question(&id, question("two")).await.unwrap();
        repo.update_question(&id, 0, question("uno")).await.unwrap();
        repo.delete_question(&id, 1).await.unwrap();
        repo.update_auth_code(&id, Some("1234".to_string()))
            .await
            .unwrap();

        let fresh = QuizRepository::new(store, EventBus::new());
        assert!(fresh.fetch_quizzes().await.is_confirmed());
        let quiz = fresh.find(&id).await.unwrap();
        assert_eq!(quiz.questions, vec![question("uno")]);
        assert_eq!(quiz.auth_code.as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn failed_write_keeps_local_change() {
        let repo = QuizRepository::new(Arc::new(ReadOnlyStore(MemoryStore::new())), EventBus::new());

        let created = repo.create_quiz(new_quiz("Offline"), admin()).await;
        assert!(matches!(created.sync, SyncStatus::Diverged(_)));
        let id = created.value.id;

        let added = repo.add_question(&id, question("kept")).await.unwrap();
        assert!(!added.sync.is_confirmed());
        assert_eq!(repo.find(&id).await.unwrap().questions.len(), 1);

        let deleted = repo.delete_quiz(&id).await.unwrap();
        assert!(!deleted.sync.is_confirmed());
        assert!(repo.find(&id).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_question_writes_reach_the_store_in_order() {
        let store = Arc::new(SlowFirstUpdate::default());
        let repo = Arc::new(QuizRepository::new(store.clone(), EventBus::new()));
        let id = repo.create_quiz(new_quiz("Rust"), admin()).await.value.id;

        let first = tokio::spawn({
            let repo = repo.clone();
            let id = id.clone();
            async move { repo.add_question(&id, question("a")).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = repo.add_question(&id, question("b")).await.unwrap();
        let first = first.await.unwrap().unwrap();

        assert!(first.sync.is_confirmed());
        assert!(second.sync.is_confirmed());

        let doc = store.get(Collection::Quizzes, &id).await.unwrap().unwrap();
        let stored = Quiz::from_document(&doc).unwrap();
        assert_eq!(stored.questions, vec![question("a"), question("b")]);
        assert_eq!(repo.find(&id).await.unwrap().questions, stored.questions);
    }

    #[tokio::test]
    async fn fetch_replaces_rather_than_merges() {
        let store = Arc::new(MemoryStore::new());
        let repo = QuizRepository::new(store.clone(), EventBus::new());

        let kept = repo.create_quiz(new_quiz("kept"), admin()).await.value;
        let dropped = repo.create_quiz(new_quiz("dropped"), admin()).await.value;
        store.delete(Collection::Quizzes, &dropped.id).await.unwrap();

        repo.fetch_quizzes().await;
        let ids: Vec<String> = repo.all().await.into_iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![kept.id]);
    }

    #[tokio::test]
    async fn unknown_targets_are_rejected_before_mutation() {
        let repo = QuizRepository::new(Arc::new(MemoryStore::new()), EventBus::new());
        let id = repo.create_quiz(new_quiz("Rust"), admin()).await.value.id;

        assert!(matches!(
            repo.add_question("missing", question("x")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_question(&id, 3, question("x")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_question(&id, 0).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.delete_quiz("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn visibility_follows_subscriptions_and_search() {
        let repo = QuizRepository::new(Arc::new(MemoryStore::new()), EventBus::new());
        repo.create_quiz(new_quiz("Rust Basics"), admin()).await;
        let other = AdminRef {
            uid: "admin-2".to_string(),
            ..admin()
        };
        repo.create_quiz(new_quiz("Go Basics"), other).await;

        let subscribed = vec!["admin-1".to_string()];
        assert_eq!(repo.visible_to(&subscribed, None).await.len(), 1);
        assert_eq!(repo.visible_to(&subscribed, Some("rust")).await.len(), 1);
        assert!(repo.visible_to(&subscribed, Some("go")).await.is_empty());
        assert!(repo.visible_to(&[], None).await.is_empty());
        assert_eq!(repo.owned_by("admin-2").await.len(), 1);
    }

    #[tokio::test]
    async fn legacy_questions_without_type_load_as_multiple_choice() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                Collection::Quizzes,
                "legacy",
                json!({
                    "name": "Old",
                    "admin": {"uid": "admin-1"},
                    "questions": [{"question": "Q", "options": [{"text": "A", "isCorrect": true}]}]
                }),
            )
            .await
            .unwrap();

        let repo = QuizRepository::new(store, EventBus::new());
        repo.fetch_quizzes().await;
        let quiz = repo.find("legacy").await.unwrap();
        assert!(matches!(quiz.questions[0], Question::MultipleChoice { .. }));
    }
}
