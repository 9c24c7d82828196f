// src/repositories/mod.rs

pub mod admins;
pub mod quizzes;
pub mod results;
pub mod subscriptions;
pub mod users;

use std::future::Future;

use serde::Serialize;

use crate::store::StoreError;

pub use admins::AdminRepository;
pub use quizzes::QuizRepository;
pub use results::ResultRepository;
pub use subscriptions::SubscriptionRepository;
pub use users::UserRepository;

/// Whether the remote write paired with a local change went through.
///
/// Local state is never rolled back: a `Diverged` write leaves the local
/// change in place and reports the store error instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SyncStatus {
    Confirmed,
    Diverged(String),
}

impl SyncStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SyncStatus::Confirmed)
    }
}

/// A locally applied change together with the outcome of its remote write.
#[derive(Debug, Clone, Serialize)]
pub struct Persisted<T> {
    pub value: T,
    pub sync: SyncStatus,
}

/// Awaits a remote write, logging a failure instead of propagating it.
pub(crate) async fn settle<F>(action: &str, write: F) -> SyncStatus
where
    F: Future<Output = Result<(), StoreError>>,
{
    match write.await {
        Ok(()) => SyncStatus::Confirmed,
        Err(e) => {
            tracing::error!("Failed to {}: {:?}", action, e);
            SyncStatus::Diverged(e.to_string())
        }
    }
}
