// Engagement Ledger
//
// Likes and comments on posts. The like set inside the post document is the
// source of truth; likes_count is denormalized from it and floored at zero.
// Comment creation and post deletion update counters through the store's
// atomic increment, but the steps themselves stay uncoordinated.

use serde::Serialize;
use tracing::info;

use crate::core::{current_time_millis, Collection, Comment, EntityId, IdGenerator, Post};
use crate::error::{AppError, AppResult};
use crate::store::{Document, FieldValue, FindQuery, Sort};

use super::{require_account, summaries_for, EnrichedComment, Store};
use crate::core::AccountSummary;
use std::sync::Arc;

pub const MAX_COMMENT_LENGTH: usize = 500;

/// Result of a like toggle
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes_count: i64,
}

#[derive(Clone)]
pub struct EngagementLedger {
    store: Store,
    ids: Arc<IdGenerator>,
}

impl EngagementLedger {
    pub fn new(store: Store, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Flip the caller's like on a post. Every call changes state: like if
    /// absent, unlike if present. The counter never goes below zero.
    pub async fn toggle_like(
        &self,
        post_id: EntityId,
        account_id: EntityId,
    ) -> AppResult<LikeOutcome> {
        let doc = self
            .store
            .get(Collection::Posts, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let mut post: Post = doc.decode()?;

        let already_liked = post.likes.contains(&account_id);
        if already_liked {
            post.likes.retain(|id| *id != account_id);
            post.likes_count = (post.likes_count - 1).max(0);
        } else {
            post.likes.push(account_id);
            post.likes_count += 1;
        }

        let data = serde_json::to_string(&post)
            .map_err(|e| AppError::Internal(format!("Failed to serialize post: {}", e)))?;
        self.store.update(Collection::Posts, post_id, data).await?;

        Ok(LikeOutcome {
            liked: !already_liked,
            likes_count: post.likes_count,
        })
    }

    /// Append a comment and bump the post's comment counter
    pub async fn add_comment(
        &self,
        post_id: EntityId,
        author_id: EntityId,
        content: &str,
    ) -> AppResult<EnrichedComment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("Comment content required".to_string()));
        }
        if content.chars().count() > MAX_COMMENT_LENGTH {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                MAX_COMMENT_LENGTH
            )));
        }

        if self.store.get(Collection::Posts, post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let author = require_account(self.store.as_ref(), author_id).await?;

        let comment = Comment {
            id: self.ids.next_id(),
            post: post_id,
            author: author_id,
            content: content.to_string(),
            likes: Vec::new(),
            likes_count: 0,
            parent_comment: None,
            created_at: current_time_millis(),
        };
        let doc = Document::encode(Collection::Comments, comment.id, comment.created_at, &comment)?;
        self.store.insert(doc).await?;

        self.store
            .increment(Collection::Posts, post_id, "comments_count", 1, false)
            .await?;

        info!("Account {} commented on post {}", author_id, post_id);
        Ok(EnrichedComment {
            comment,
            author: AccountSummary::from(&author),
        })
    }

    /// All comments on a post, newest first, author-enriched
    pub async fn list_comments(&self, post_id: EntityId) -> AppResult<Vec<EnrichedComment>> {
        let query = FindQuery::collection(Collection::Comments)
            .filter("post", FieldValue::Id(post_id))
            .sort(Sort::CreatedDesc);
        let docs = self.store.find(query).await?;

        let comments: Vec<Comment> = docs
            .iter()
            .map(|doc| doc.decode())
            .collect::<AppResult<_>>()?;

        let author_ids: Vec<EntityId> = comments.iter().map(|c| c.author).collect();
        let authors = summaries_for(self.store.as_ref(), &author_ids).await?;

        Ok(comments
            .into_iter()
            .filter_map(|comment| {
                authors
                    .get(&comment.author)
                    .cloned()
                    .map(|author| EnrichedComment { comment, author })
            })
            .collect())
    }

    /// Delete a post (author only), cascade-delete its comments, decrement
    /// the author's post counter
    pub async fn delete_post(&self, post_id: EntityId, requester_id: EntityId) -> AppResult<()> {
        let doc = self
            .store
            .get(Collection::Posts, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let post: Post = doc.decode()?;

        if post.author != requester_id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this post".to_string(),
            ));
        }

        self.store.delete(Collection::Posts, post_id).await?;
        self.store
            .delete_many(
                FindQuery::collection(Collection::Comments)
                    .filter("post", FieldValue::Id(post_id)),
            )
            .await?;
        self.store
            .increment(Collection::Accounts, post.author, "posts_count", -1, true)
            .await?;

        info!("Account {} deleted post {}", requester_id, post_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::{publish_post, register_account, test_store};
    use crate::services::load_account;

    fn ledger(store: &Store) -> EngagementLedger {
        EngagementLedger::new(store.clone(), Arc::new(IdGenerator::new()))
    }

    async fn fetch_post(store: &Store, id: EntityId) -> Post {
        store
            .get(Collection::Posts, id)
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap()
    }

    #[tokio::test]
    async fn test_like_toggle_symmetry() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let author = register_account(&store, "author").await;
        let fan = register_account(&store, "fan").await;
        let post = publish_post(&store, author, 1_000, true).await;

        let outcome = ledger.toggle_like(post, fan).await.unwrap();
        assert!(outcome.liked);
        assert_eq!(outcome.likes_count, 1);

        let outcome = ledger.toggle_like(post, fan).await.unwrap();
        assert!(!outcome.liked);
        assert_eq!(outcome.likes_count, 0);

        let stored = fetch_post(&store, post).await;
        assert!(stored.likes.is_empty());
        assert_eq!(stored.likes_count, 0);
    }

    #[tokio::test]
    async fn test_like_count_never_negative() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let author = register_account(&store, "author").await;
        let fan = register_account(&store, "fan").await;
        let post = publish_post(&store, author, 1_000, true).await;

        // Counter drifted below the set size; unliking must clamp at zero
        let mut post_doc: Post = fetch_post(&store, post).await;
        post_doc.likes.push(fan);
        post_doc.likes_count = 0;
        let data = serde_json::to_string(&post_doc).unwrap();
        store.update(Collection::Posts, post, data).await.unwrap();

        let outcome = ledger.toggle_like(post, fan).await.unwrap();
        assert!(!outcome.liked);
        assert_eq!(outcome.likes_count, 0);
    }

    #[tokio::test]
    async fn test_like_missing_post() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let fan = register_account(&store, "fan").await;

        assert!(matches!(
            ledger.toggle_like(12345, fan).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_comment_increments_count_and_lists_newest_first() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let author = register_account(&store, "author").await;
        let fan = register_account(&store, "fan").await;
        let post = publish_post(&store, author, 1_000, true).await;

        let first = ledger.add_comment(post, fan, "first!").await.unwrap();
        let second = ledger.add_comment(post, fan, "second!").await.unwrap();
        assert_eq!(first.author.username, "fan");

        let stored = fetch_post(&store, post).await;
        assert_eq!(stored.comments_count, 2);

        let comments = ledger.list_comments(post).await.unwrap();
        assert_eq!(
            comments.iter().map(|c| c.comment.id).collect::<Vec<_>>(),
            vec![second.comment.id, first.comment.id]
        );
    }

    #[tokio::test]
    async fn test_comment_validation() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let author = register_account(&store, "author").await;
        let post = publish_post(&store, author, 1_000, true).await;

        assert!(matches!(
            ledger.add_comment(post, author, "   ").await,
            Err(AppError::Validation(_))
        ));
        let long = "x".repeat(MAX_COMMENT_LENGTH + 1);
        assert!(matches!(
            ledger.add_comment(post, author, &long).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ledger.add_comment(9999, author, "hello").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let author = register_account(&store, "author").await;
        let fan = register_account(&store, "fan").await;
        let post = publish_post(&store, author, 1_000, true).await;

        store
            .increment(Collection::Accounts, author, "posts_count", 1, false)
            .await
            .unwrap();
        for i in 0..3 {
            ledger
                .add_comment(post, fan, &format!("comment {}", i))
                .await
                .unwrap();
        }

        ledger.delete_post(post, author).await.unwrap();

        assert!(store.get(Collection::Posts, post).await.unwrap().is_none());
        assert!(ledger.list_comments(post).await.unwrap().is_empty());
        let account = load_account(store.as_ref(), author).await.unwrap().unwrap();
        assert_eq!(account.posts_count, 0);

        assert!(matches!(
            ledger.delete_post(post, author).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_post_requires_author() {
        let store = test_store().await;
        let ledger = ledger(&store);
        let author = register_account(&store, "author").await;
        let other = register_account(&store, "other").await;
        let post = publish_post(&store, author, 1_000, true).await;

        assert!(matches!(
            ledger.delete_post(post, other).await,
            Err(AppError::Forbidden(_))
        ));
        // Post remains intact
        assert!(store.get(Collection::Posts, post).await.unwrap().is_some());
    }
}
