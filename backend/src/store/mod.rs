// src/store/mod.rs

//! Document store seam.
//!
//! The quiz data lives in a schemaless document store: named collections of
//! JSON documents keyed by string ids. Repositories only talk to the
//! [`DocumentStore`] trait, so the same code runs against Postgres in
//! production and against [`MemoryStore`] in tests.

pub mod memory;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Collections consumed by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Quizzes,
    QuizResults,
    Admins,
    Subscriptions,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Quizzes => "quizzes",
            Collection::QuizResults => "quizResults",
            Collection::Admins => "admins",
            Collection::Subscriptions => "subscriptions",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: its id plus the raw JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decodes the body into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|e| StoreError::Decode {
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Errors raised by a document store backend.
#[derive(Debug)]
pub enum StoreError {
    /// The backend rejected or failed the call (network, database, ...).
    Backend(String),

    /// `update` targeted a document that does not exist.
    NotFound { collection: Collection, id: String },

    /// A document body could not be encoded or decoded.
    Decode { id: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "document store failure: {}", msg),
            StoreError::NotFound { collection, id } => {
                write!(f, "document {}/{} not found", collection, id)
            }
            StoreError::Decode { id, reason } => {
                write!(f, "malformed document {}: {}", id, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Asynchronous CRUD over named collections of JSON documents.
///
/// Every call is a suspension point; nothing else in the application blocks.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document of a collection.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Stores a new document under a generated id and returns that id.
    async fn insert(&self, collection: Collection, data: Value) -> Result<String, StoreError>;

    /// Creates or fully replaces the document stored under `id`.
    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<(), StoreError>;

    /// Merges the top-level fields of `patch` into an existing document.
    async fn update(&self, collection: Collection, id: &str, patch: Value)
    -> Result<(), StoreError>;

    /// Removes a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;
}

/// Serialises a record into a document body.
pub fn encode<T: Serialize>(id: &str, value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Decode {
        id: id.to_string(),
        reason: e.to_string(),
    })
}
