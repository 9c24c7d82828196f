// src/repositories/users.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::user::UserAccount,
    store::{Collection, DocumentStore, encode},
};

/// Accounts of the built-in authentication provider.
pub struct UserRepository {
    store: Arc<dyn DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates an account. Emails are unique, compared case-insensitively.
    pub async fn create(
        &self,
        email: &str,
        display_name: &str,
        photo_url: &str,
        password_hash: String,
    ) -> Result<UserAccount, AppError> {
        let email = email.trim().to_lowercase();
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let account = UserAccount {
            uid: Uuid::new_v4().simple().to_string(),
            email,
            display_name: display_name.trim().to_string(),
            photo_url: photo_url.to_string(),
            password_hash,
            created_at: Some(Utc::now()),
        };

        let body = encode(&account.uid, &account)?;
        self.store
            .set(Collection::Users, &account.uid, body)
            .await
            .map_err(|e| {
                tracing::error!("Failed to register user: {:?}", e);
                AppError::from(e)
            })?;

        Ok(account)
    }

    pub async fn find(&self, uid: &str) -> Result<Option<UserAccount>, AppError> {
        match self.store.get(Collection::Users, uid).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        let email = email.trim().to_lowercase();
        let docs = self.store.list(Collection::Users).await?;

        Ok(docs
            .iter()
            .filter_map(|doc| doc.decode::<UserAccount>().ok())
            .find(|account| account.email == email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let repo = UserRepository::new(Arc::new(MemoryStore::new()));

        let created = repo
            .create("Ada@Example.com", "Ada", "", "hash".to_string())
            .await
            .unwrap();
        assert_eq!(created.email, "ada@example.com");

        let err = repo
            .create("ada@example.com", "Imposter", "", "hash".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let found = repo.find_by_email("ADA@example.com").await.unwrap().unwrap();
        assert_eq!(found.uid, created.uid);
        assert!(repo.find(&created.uid).await.unwrap().is_some());
    }
}
