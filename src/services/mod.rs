// Service layer: the operations the HTTP surface is mapped onto.
// Each service holds a handle to the entity store and performs a small
// number of sequential store calls; multi-step write sequences are
// deliberately uncoordinated (no transactions), matching the system's
// eventual, best-effort consistency model.

pub mod accounts;
pub mod engagement;
pub mod feed;
pub mod follow_graph;
pub mod posts;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Account, AccountSummary, Collection, Comment, EntityId, Post};
use crate::error::{AppError, AppResult};
use crate::store::EntityStore;

pub use accounts::{AccountService, NewAccount, ProfileUpdate};
pub use engagement::{EngagementLedger, LikeOutcome};
pub use feed::FeedComposer;
pub use follow_graph::FollowGraph;
pub use posts::{NewPost, PostService};

/// Shared store handle
pub type Store = Arc<dyn EntityStore>;

/// Post enriched with its author's summary, the feed/post response shape
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedPost {
    pub post: Post,
    pub author: AccountSummary,
}

/// Comment enriched with its author's summary
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedComment {
    pub comment: Comment,
    pub author: AccountSummary,
}

pub(crate) async fn load_account(
    store: &dyn EntityStore,
    id: EntityId,
) -> AppResult<Option<Account>> {
    match store.get(Collection::Accounts, id).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}

pub(crate) async fn require_account(store: &dyn EntityStore, id: EntityId) -> AppResult<Account> {
    load_account(store, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))
}

/// Resolve a set of account ids to summaries in one concurrent pass.
/// Ids that no longer resolve are silently absent from the result.
pub(crate) async fn summaries_for(
    store: &dyn EntityStore,
    ids: &[EntityId],
) -> AppResult<HashMap<EntityId, AccountSummary>> {
    let mut unique: Vec<EntityId> = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();

    let lookups = unique.iter().map(|id| load_account(store, *id));
    let accounts = futures::future::try_join_all(lookups).await?;

    Ok(accounts
        .into_iter()
        .flatten()
        .map(|account| (account.id, AccountSummary::from(&account)))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use once_cell::sync::Lazy;

    use super::*;
    use crate::core::{current_time_millis, AccountKind, IdGenerator, Post, PostKind};
    use crate::store::{Document, SqliteStore};

    static IDS: Lazy<IdGenerator> = Lazy::new(IdGenerator::new);

    pub(crate) async fn test_store() -> Store {
        Arc::new(SqliteStore::new_in_memory().await.unwrap())
    }

    pub(crate) async fn register_account(store: &Store, username: &str) -> EntityId {
        let id = IDS.next_id();
        let account = Account {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "x".to_string(),
            kind: AccountKind::Musician,
            display_name: username.to_string(),
            bio: None,
            avatar_url: String::new(),
            cover_url: String::new(),
            verified: false,
            genres: Vec::new(),
            instruments: Vec::new(),
            band_members: Vec::new(),
            spotify_link: None,
            apple_music_link: None,
            soundcloud_link: None,
            website_link: None,
            followers: Vec::new(),
            following: Vec::new(),
            posts_count: 0,
            created_at: current_time_millis(),
        };
        let doc = Document::encode(Collection::Accounts, id, account.created_at, &account).unwrap();
        store.insert(doc).await.unwrap();
        id
    }

    pub(crate) async fn publish_post(
        store: &Store,
        author: EntityId,
        created_at: i64,
        is_public: bool,
    ) -> EntityId {
        let id = IDS.next_id();
        let post = Post {
            id,
            author,
            kind: PostKind::Text,
            caption: Some(format!("post {}", id)),
            media_url: None,
            thumbnail_url: None,
            duration: None,
            track_title: None,
            album: None,
            genre: None,
            lyrics: None,
            likes: Vec::new(),
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
            plays_count: 0,
            is_public,
            created_at,
        };
        let doc = Document::encode(Collection::Posts, id, created_at, &post).unwrap();
        store.insert(doc).await.unwrap();
        id
    }
}
