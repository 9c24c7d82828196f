// src/models/subscription.rs

use serde::{Deserialize, Serialize};

/// Represents a document in the `subscriptions` collection, keyed by user id.
/// Lists the admins whose quizzes the user wants to see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDocument {
    #[serde(rename = "adminIds", default)]
    pub admin_ids: Vec<String>,
}
