// src/repositories/subscriptions.rs

use std::sync::Arc;

use super::{Persisted, settle};
use crate::{
    events::{DomainEvent, EventBus},
    models::subscription::SubscriptionDocument,
    store::{Collection, DocumentStore, encode},
};

/// User → admin subscriptions, one document per user holding the admin ids.
pub struct SubscriptionRepository {
    store: Arc<dyn DocumentStore>,
    events: EventBus,
}

impl SubscriptionRepository {
    pub fn new(store: Arc<dyn DocumentStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Admin ids the user follows. Failures are logged and read as none.
    pub async fn admin_ids(&self, uid: &str) -> Vec<String> {
        match self.store.get(Collection::Subscriptions, uid).await {
            Ok(Some(doc)) => doc
                .decode::<SubscriptionDocument>()
                .map(|s| s.admin_ids)
                .unwrap_or_else(|e| {
                    tracing::warn!("Malformed subscriptions for {}: {}", uid, e);
                    Vec::new()
                }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("Failed to fetch subscriptions: {:?}", e);
                Vec::new()
            }
        }
    }

    pub async fn subscribe(&self, uid: &str, admin_id: &str) -> Persisted<Vec<String>> {
        let mut admin_ids = self.admin_ids(uid).await;
        if !admin_ids.iter().any(|id| id == admin_id) {
            admin_ids.push(admin_id.to_string());
        }
        self.write(uid, admin_ids, "subscribe to admin").await
    }

    pub async fn unsubscribe(&self, uid: &str, admin_id: &str) -> Persisted<Vec<String>> {
        let mut admin_ids = self.admin_ids(uid).await;
        admin_ids.retain(|id| id != admin_id);
        self.write(uid, admin_ids, "unsubscribe from admin").await
    }

    async fn write(&self, uid: &str, admin_ids: Vec<String>, action: &str) -> Persisted<Vec<String>> {
        let doc = SubscriptionDocument {
            admin_ids: admin_ids.clone(),
        };
        let sync = settle(action, async {
            let body = encode(uid, &doc)?;
            self.store.set(Collection::Subscriptions, uid, body).await
        })
        .await;

        self.events.publish(DomainEvent::SubscriptionsChanged {
            uid: uid.to_string(),
        });
        Persisted {
            value: admin_ids,
            sync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn subscribe_is_idempotent_and_unsubscribe_removes() {
        let repo = SubscriptionRepository::new(Arc::new(MemoryStore::new()), EventBus::new());

        repo.subscribe("u1", "a1").await;
        let twice = repo.subscribe("u1", "a1").await;
        assert_eq!(twice.value, vec!["a1".to_string()]);

        repo.subscribe("u1", "a2").await;
        assert_eq!(repo.admin_ids("u1").await.len(), 2);

        let after = repo.unsubscribe("u1", "a1").await;
        assert!(after.sync.is_confirmed());
        assert_eq!(repo.admin_ids("u1").await, vec!["a2".to_string()]);
        assert!(repo.admin_ids("u2").await.is_empty());
    }
}
