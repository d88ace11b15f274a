// SQLite implementation of the entity store
// Document payloads are stored as JSON text so filtered queries can use the
// json_extract function; follow edges get their own table with a composite
// primary key providing the unique-pair constraint

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row};
use std::str::FromStr;

use crate::core::{current_time_millis, Collection, EntityId};
use crate::error::{AppError, AppResult};

use super::{Document, EntityStore, FieldValue, FindQuery, FollowEdge, Sort};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) a file-backed store
    pub async fn new(url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Store(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to SQLite: {}", e)))?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps every query on
    /// the same in-memory database.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::Store(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create tables on first use
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id INTEGER NOT NULL,
                data TEXT NOT NULL,
                time_created INTEGER NOT NULL,
                time_updated INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to create documents table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS follow_edges (
                follower INTEGER NOT NULL,
                following INTEGER NOT NULL,
                time_created INTEGER NOT NULL,
                PRIMARY KEY (follower, following)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to create follow_edges table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_created \
             ON documents(collection, time_created)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to create documents index: {}", e)))?;

        // Account identity must be unique at the store level; the
        // service-side existence check alone loses races
        for sql in [
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_username \
             ON documents(json_extract(data, '$.username')) WHERE collection = 'accounts'",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_accounts_email \
             ON documents(json_extract(data, '$.email')) WHERE collection = 'accounts'",
        ] {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Store(format!("Failed to create identity index: {}", e)))?;
        }

        Ok(())
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, query: &FindQuery) {
        qb.push_bind(query.collection.as_str());
        for (field, value) in &query.filter {
            // Field names come from code, not from request input
            qb.push(format!(" AND json_extract(data, '$.{}') ", field));
            match value {
                FieldValue::Id(id) => {
                    qb.push("= ");
                    qb.push_bind(*id);
                }
                FieldValue::IdSet(ids) => {
                    qb.push("IN (");
                    let mut separated = qb.separated(",");
                    for id in ids {
                        separated.push_bind(*id);
                    }
                    qb.push(")");
                }
                FieldValue::Str(s) => {
                    qb.push("= ");
                    qb.push_bind(s.clone());
                }
                FieldValue::Bool(b) => {
                    // JSON booleans surface as 0/1 through json_extract
                    qb.push("= ");
                    qb.push_bind(*b as i64);
                }
            }
        }
    }

    fn push_sort_and_page(qb: &mut QueryBuilder<'_, Sqlite>, query: &FindQuery) {
        match query.sort {
            Sort::None => {}
            Sort::CreatedAsc => {
                qb.push(" ORDER BY time_created ASC, id ASC");
            }
            Sort::CreatedDesc => {
                qb.push(" ORDER BY time_created DESC, id DESC");
            }
        }
        if query.limit.is_some() || query.skip > 0 {
            // SQLite requires a LIMIT clause before OFFSET; -1 means unbounded
            qb.push(" LIMIT ");
            qb.push_bind(query.limit.map(|l| l as i64).unwrap_or(-1));
            if query.skip > 0 {
                qb.push(" OFFSET ");
                qb.push_bind(query.skip as i64);
            }
        }
    }

    fn row_to_document(collection: Collection, row: &sqlx::sqlite::SqliteRow) -> Document {
        Document {
            id: row.get("id"),
            collection,
            data: row.get("data"),
            created_at: row.get("time_created"),
            updated_at: row.get("time_updated"),
        }
    }

    fn row_to_edge(row: &sqlx::sqlite::SqliteRow) -> FollowEdge {
        FollowEdge {
            follower: row.get("follower"),
            following: row.get("following"),
            created_at: row.get("time_created"),
        }
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn insert(&self, doc: Document) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO documents (collection, id, data, time_created, time_updated) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(doc.collection.as_str())
        .bind(doc.id)
        .bind(doc.data)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                AppError::DuplicateAccount(
                    "User with this email or username already exists".to_string(),
                )
            } else {
                AppError::Store(format!(
                    "Failed to insert {} document {}: {}",
                    doc.collection.as_str(),
                    doc.id,
                    e
                ))
            }
        })?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: EntityId) -> AppResult<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, data, time_created, time_updated FROM documents \
             WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::Store(format!(
                "Failed to get {} document {}: {}",
                collection.as_str(),
                id,
                e
            ))
        })?;

        Ok(row.map(|r| Self::row_to_document(collection, &r)))
    }

    async fn find_one(&self, query: FindQuery) -> AppResult<Option<Document>> {
        let mut results = self.find(FindQuery { limit: Some(1), ..query }).await?;
        Ok(if results.is_empty() {
            None
        } else {
            Some(results.remove(0))
        })
    }

    async fn find(&self, query: FindQuery) -> AppResult<Vec<Document>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, data, time_created, time_updated FROM documents WHERE collection = ",
        );
        Self::push_filter(&mut qb, &query);
        Self::push_sort_and_page(&mut qb, &query);

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Failed to query documents: {}", e)))?;

        Ok(rows
            .iter()
            .map(|row| Self::row_to_document(query.collection, row))
            .collect())
    }

    async fn update(
        &self,
        collection: Collection,
        id: EntityId,
        data: String,
    ) -> AppResult<bool> {
        let now = current_time_millis();
        let result = sqlx::query(
            "UPDATE documents SET data = ?, time_updated = ? WHERE collection = ? AND id = ?",
        )
        .bind(data)
        .bind(now)
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Store(format!(
                "Failed to update {} document {}: {}",
                collection.as_str(),
                id,
                e
            ))
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment(
        &self,
        collection: Collection,
        id: EntityId,
        field: &'static str,
        delta: i64,
        floor_at_zero: bool,
    ) -> AppResult<bool> {
        let sql = if floor_at_zero {
            "UPDATE documents SET \
             data = json_set(data, ?1, MAX(0, COALESCE(json_extract(data, ?1), 0) + ?2)), \
             time_updated = ?3 WHERE collection = ?4 AND id = ?5"
        } else {
            "UPDATE documents SET \
             data = json_set(data, ?1, COALESCE(json_extract(data, ?1), 0) + ?2), \
             time_updated = ?3 WHERE collection = ?4 AND id = ?5"
        };

        let result = sqlx::query(sql)
            .bind(format!("$.{}", field))
            .bind(delta)
            .bind(current_time_millis())
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Store(format!(
                    "Failed to increment {}.{} on document {}: {}",
                    collection.as_str(),
                    field,
                    id,
                    e
                ))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, collection: Collection, id: EntityId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::Store(format!(
                    "Failed to delete {} document {}: {}",
                    collection.as_str(),
                    id,
                    e
                ))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_many(&self, query: FindQuery) -> AppResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM documents WHERE collection = ");
        Self::push_filter(&mut qb, &query);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("Failed to delete documents: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn add_edge(&self, edge: FollowEdge) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO follow_edges (follower, following, time_created) \
             VALUES (?, ?, ?)",
        )
        .bind(edge.follower)
        .bind(edge.following)
        .bind(edge.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::Store(format!(
                "Failed to add edge {} -> {}: {}",
                edge.follower, edge.following, e
            ))
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_edge(&self, follower: EntityId, following: EntityId) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM follow_edges WHERE follower = ? AND following = ?")
                .bind(follower)
                .bind(following)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::Store(format!(
                        "Failed to remove edge {} -> {}: {}",
                        follower, following, e
                    ))
                })?;
        Ok(result.rows_affected() > 0)
    }

    async fn edge_exists(&self, follower: EntityId, following: EntityId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM follow_edges WHERE follower = ? AND following = ?")
            .bind(follower)
            .bind(following)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::Store(format!(
                    "Failed to check edge {} -> {}: {}",
                    follower, following, e
                ))
            })?;
        Ok(row.is_some())
    }

    async fn edges_from(&self, follower: EntityId) -> AppResult<Vec<FollowEdge>> {
        let rows = sqlx::query(
            "SELECT follower, following, time_created FROM follow_edges \
             WHERE follower = ? ORDER BY time_created ASC",
        )
        .bind(follower)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to list edges from {}: {}", follower, e)))?;
        Ok(rows.iter().map(Self::row_to_edge).collect())
    }

    async fn edges_to(&self, following: EntityId) -> AppResult<Vec<FollowEdge>> {
        let rows = sqlx::query(
            "SELECT follower, following, time_created FROM follow_edges \
             WHERE following = ? ORDER BY time_created ASC",
        )
        .bind(following)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Store(format!("Failed to list edges to {}: {}", following, e)))?;
        Ok(rows.iter().map(Self::row_to_edge).collect())
    }
}
