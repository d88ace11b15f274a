// Entity Store - generic document persistence boundary
// Document CRUD plus a dedicated follow-edge relation, mirroring the split
// between object storage and association storage in a social graph store

pub mod sqlite;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{Collection, EntityId};
use crate::error::{AppError, AppResult};

pub use sqlite::SqliteStore;

/// A stored document: JSON payload plus store-managed timestamps
#[derive(Debug, Clone)]
pub struct Document {
    pub id: EntityId,
    pub collection: Collection,
    pub data: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    pub fn encode<T: Serialize>(
        collection: Collection,
        id: EntityId,
        created_at: i64,
        value: &T,
    ) -> AppResult<Self> {
        let data = serde_json::to_string(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize document: {}", e)))?;
        Ok(Document {
            id,
            collection,
            data,
            created_at,
            updated_at: created_at,
        })
    }

    pub fn decode<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_str(&self.data).map_err(|e| {
            AppError::Internal(format!(
                "Failed to deserialize {} document {}: {}",
                self.collection.as_str(),
                self.id,
                e
            ))
        })
    }
}

/// Filter value for equality / membership clauses
#[derive(Debug, Clone)]
pub enum FieldValue {
    Id(EntityId),
    IdSet(Vec<EntityId>),
    Str(String),
    Bool(bool),
}

/// Sort order over the store-managed creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    None,
    CreatedAsc,
    CreatedDesc,
}

/// Filtered query: AND of equality/membership clauses over document fields,
/// with optional sort, skip and limit
#[derive(Debug, Clone)]
pub struct FindQuery {
    pub collection: Collection,
    pub filter: Vec<(&'static str, FieldValue)>,
    pub sort: Sort,
    pub skip: u64,
    pub limit: Option<u32>,
}

impl FindQuery {
    pub fn collection(collection: Collection) -> Self {
        FindQuery {
            collection,
            filter: Vec::new(),
            sort: Sort::None,
            skip: 0,
            limit: None,
        }
    }

    pub fn filter(mut self, field: &'static str, value: FieldValue) -> Self {
        self.filter.push((field, value));
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Directed follow edge, unique per (follower, following) pair.
/// This relation is authoritative; the per-account caches are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowEdge {
    pub follower: EntityId,
    pub following: EntityId,
    pub created_at: i64,
}

/// Entity store interface consumed by the services layer
#[async_trait]
pub trait EntityStore: Send + Sync {
    // Document operations
    async fn insert(&self, doc: Document) -> AppResult<()>;
    async fn get(&self, collection: Collection, id: EntityId) -> AppResult<Option<Document>>;
    async fn find_one(&self, query: FindQuery) -> AppResult<Option<Document>>;
    async fn find(&self, query: FindQuery) -> AppResult<Vec<Document>>;
    /// Replace a document's payload. Returns false when the document is absent.
    async fn update(&self, collection: Collection, id: EntityId, data: String)
        -> AppResult<bool>;
    /// Atomically add `delta` to a numeric field, optionally flooring the
    /// result at zero. Returns false when the document is absent.
    async fn increment(
        &self,
        collection: Collection,
        id: EntityId,
        field: &'static str,
        delta: i64,
        floor_at_zero: bool,
    ) -> AppResult<bool>;
    async fn delete(&self, collection: Collection, id: EntityId) -> AppResult<bool>;
    async fn delete_many(&self, query: FindQuery) -> AppResult<u64>;

    // Follow-edge operations
    /// Insert an edge. Returns false when the pair already exists
    /// (unique-constraint enforcement lives in the store).
    async fn add_edge(&self, edge: FollowEdge) -> AppResult<bool>;
    async fn remove_edge(&self, follower: EntityId, following: EntityId) -> AppResult<bool>;
    async fn edge_exists(&self, follower: EntityId, following: EntityId) -> AppResult<bool>;
    /// Edges where `follower` is the source, in insertion order
    async fn edges_from(&self, follower: EntityId) -> AppResult<Vec<FollowEdge>>;
    /// Edges where `following` is the target, in insertion order
    async fn edges_to(&self, following: EntityId) -> AppResult<Vec<FollowEdge>>;
}
