//! Abstract document store.
//!
//! Handlers only ever see the `DocumentStore` trait: filter-by-expression,
//! sort, skip/limit, count, and single-document CRUD. `PgStore` is the
//! production backend (JSONB rows); `MemoryStore` backs the test suite and
//! keeps the canonical filter/ordering semantics honest.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::query::filter::FilterExpression;
use crate::query::sort::SortSpec;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A stored document. Always an object carrying its own `id` (UUID string)
/// and RFC 3339 timestamps written by the models layer.
pub type Document = Value;

pub mod collections {
    pub const USERS: &str = "users";
    pub const SESSIONS: &str = "sessions";
    pub const JOBS: &str = "jobs";
    pub const PROFILES: &str = "profiles";
    pub const APPLICATIONS: &str = "applications";
    pub const SAVED_JOBS: &str = "saved_jobs";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document has no usable id")]
    MissingId,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Matching documents, sorted, after `skip`, at most `limit` when given.
    async fn find(
        &self,
        collection: &str,
        filter: &FilterExpression,
        sort: &SortSpec,
        skip: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Document>, StoreError>;

    /// Count of matching documents.
    async fn count(&self, collection: &str, filter: &FilterExpression) -> Result<u64, StoreError>;

    /// First matching document in unspecified order, if any.
    async fn find_one(
        &self,
        collection: &str,
        filter: &FilterExpression,
    ) -> Result<Option<Document>, StoreError>;

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Inserts a document. The document must already carry its `id`.
    async fn insert(&self, collection: &str, doc: Document) -> Result<Document, StoreError>;

    /// Replaces the document with the given id. Returns the new document,
    /// or `None` when the id does not exist.
    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;
}

/// Extracts the UUID a document carries in its `id` field.
pub fn document_id(doc: &Document) -> Result<Uuid, StoreError> {
    doc.get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Uuid>().ok())
        .ok_or(StoreError::MissingId)
}
