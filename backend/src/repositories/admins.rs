// src/repositories/admins.rs

use std::sync::Arc;

use chrono::Utc;

use super::{SyncStatus, settle};
use crate::{
    error::AppError,
    events::{DomainEvent, EventBus},
    models::user::{Admin, Identity},
    store::{Collection, DocumentStore, encode},
};

/// The `admins` collection, keyed by user id.
pub struct AdminRepository {
    store: Arc<dyn DocumentStore>,
    events: EventBus,
}

impl AdminRepository {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Registers the caller as an admin. Unlike most writes this one is
    /// not optimistic: the caller needs to know it failed.
    pub async fn register(&self, identity: &Identity) -> Result<Admin, AppError> {
        let admin = Admin {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            created_at: Some(Utc::now()),
        };

        let body = encode(&admin.uid, &admin)?;
        self.store
            .set(Collection::Admins, &admin.uid, body)
            .await
            .map_err(|e| {
                tracing::error!("Failed to register admin: {:?}", e);
                AppError::from(e)
            })?;

        tracing::info!("Registered admin {}", admin.uid);
        self.events.publish(DomainEvent::AdminsChanged {
            uid: admin.uid.clone(),
        });
        Ok(admin)
    }

    pub async fn find(&self, uid: &str) -> Result<Option<Admin>, AppError> {
        match self.store.get(Collection::Admins, uid).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// Admin check used by the authorization middleware. Store failures read as "not an admin".
    pub async fn is_admin(&self, uid: &str) -> bool {
        match self.find(uid).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::error!("Failed to check admin status: {:?}", e);
                false
            }
        }
    }

    /// All admins, optionally filtered by name or email.
    pub async fn list(&self, search: Option<&str>) -> Vec<Admin> {
        let docs = match self.store.list(Collection::Admins).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("Failed to fetch admins: {:?}", e);
                return Vec::new();
            }
        };

        docs.iter()
            .filter_map(|doc| {
                let mut admin: Admin = doc.decode().ok()?;
                admin.uid = doc.id.clone();
                Some(admin)
            })
            .filter(|admin| search.is_none_or(|s| admin.matches(s)))
            .collect()
    }

    pub async fn remove(&self, uid: &str) -> SyncStatus {
        self.events.publish(DomainEvent::AdminsChanged {
            uid: uid.to_string(),
        });
        settle("remove admin", self.store.delete(Collection::Admins, uid)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn identity(uid: &str, name: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            display_name: name.to_string(),
            photo_url: String::new(),
            email: format!("{}@school.org", uid),
        }
    }

    #[tokio::test]
    async fn register_list_and_remove() {
        let repo = AdminRepository::new(Arc::new(MemoryStore::new()), EventBus::new());

        repo.register(&identity("a1", "Grace")).await.unwrap();
        repo.register(&identity("a2", "Linus")).await.unwrap();

        assert!(repo.is_admin("a1").await);
        assert!(!repo.is_admin("nobody").await);
        assert_eq!(repo.list(None).await.len(), 2);
        assert_eq!(repo.list(Some("grace")).await.len(), 1);

        assert!(repo.remove("a1").await.is_confirmed());
        assert!(!repo.is_admin("a1").await);
    }
}
