// Feed Composer
//
// The home feed is the caller's own posts plus posts by followed authors,
// public only, newest first. The visibility set comes from the caller's
// denormalized following-cache, exactly as the follow graph maintains it.

use crate::core::{Collection, EntityId, Post};
use crate::error::{AppError, AppResult};
use crate::store::{FieldValue, FindQuery, Sort};

use super::{load_account, summaries_for, EnrichedPost, Store};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct FeedComposer {
    store: Store,
}

impl FeedComposer {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Compose one page of the caller's home feed. `page` is 1-based;
    /// both arguments must be positive.
    pub async fn compose_feed(
        &self,
        caller_id: EntityId,
        page: u32,
        page_size: u32,
    ) -> AppResult<Vec<EnrichedPost>> {
        if page < 1 {
            return Err(AppError::InvalidPagination(
                "page must be a positive integer".to_string(),
            ));
        }
        if page_size < 1 {
            return Err(AppError::InvalidPagination(
                "page size must be a positive integer".to_string(),
            ));
        }

        // An unknown caller simply has nothing to follow
        let following = match load_account(self.store.as_ref(), caller_id).await? {
            Some(account) => account.following,
            None => Vec::new(),
        };

        let mut visible_authors = following;
        visible_authors.push(caller_id);

        let skip = u64::from(page - 1) * u64::from(page_size);
        let query = FindQuery::collection(Collection::Posts)
            .filter("author", FieldValue::IdSet(visible_authors))
            .filter("is_public", FieldValue::Bool(true))
            .sort(Sort::CreatedDesc)
            .skip(skip)
            .limit(page_size);

        let docs = self.store.find(query).await?;
        let posts: Vec<Post> = docs
            .iter()
            .map(|doc| doc.decode())
            .collect::<AppResult<_>>()?;

        let author_ids: Vec<EntityId> = posts.iter().map(|p| p.author).collect();
        let authors = summaries_for(self.store.as_ref(), &author_ids).await?;

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                authors
                    .get(&post.author)
                    .cloned()
                    .map(|author| EnrichedPost { post, author })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::follow_graph::FollowGraph;
    use crate::services::tests::{publish_post, register_account, test_store};

    #[tokio::test]
    async fn test_feed_orders_newest_first() {
        let store = test_store().await;
        let graph = FollowGraph::new(store.clone());
        let feed = FeedComposer::new(store.clone());

        let caller = register_account(&store, "caller").await;
        let author = register_account(&store, "author").await;
        graph.follow(caller, author).await.unwrap();

        let p1 = publish_post(&store, author, 1_000, true).await;
        let p2 = publish_post(&store, author, 2_000, true).await;
        let p3 = publish_post(&store, author, 3_000, true).await;

        let page = feed.compose_feed(caller, 1, 20).await.unwrap();
        assert_eq!(
            page.iter().map(|e| e.post.id).collect::<Vec<_>>(),
            vec![p3, p2, p1]
        );
        assert_eq!(page[0].author.username, "author");
    }

    #[tokio::test]
    async fn test_feed_visibility_rules() {
        let store = test_store().await;
        let graph = FollowGraph::new(store.clone());
        let feed = FeedComposer::new(store.clone());

        let caller = register_account(&store, "caller").await;
        let followed = register_account(&store, "followed").await;
        let stranger = register_account(&store, "stranger").await;
        graph.follow(caller, followed).await.unwrap();

        let own = publish_post(&store, caller, 1_000, true).await;
        let visible = publish_post(&store, followed, 2_000, true).await;
        // A followed author's private post never appears
        publish_post(&store, followed, 3_000, false).await;
        // A public post by a non-followed author never appears
        publish_post(&store, stranger, 4_000, true).await;

        let page = feed.compose_feed(caller, 1, 20).await.unwrap();
        assert_eq!(
            page.iter().map(|e| e.post.id).collect::<Vec<_>>(),
            vec![visible, own]
        );
    }

    #[tokio::test]
    async fn test_feed_pagination() {
        let store = test_store().await;
        let feed = FeedComposer::new(store.clone());
        let caller = register_account(&store, "caller").await;

        for t in 1..=5 {
            publish_post(&store, caller, t * 1_000, true).await;
        }

        let first = feed.compose_feed(caller, 1, 2).await.unwrap();
        let second = feed.compose_feed(caller, 2, 2).await.unwrap();
        let third = feed.compose_feed(caller, 3, 2).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert_eq!(third.len(), 1);
        assert!(first[0].post.created_at > first[1].post.created_at);
        assert!(first[1].post.created_at > second[0].post.created_at);
    }

    #[tokio::test]
    async fn test_empty_feed_is_not_an_error() {
        let store = test_store().await;
        let feed = FeedComposer::new(store.clone());
        let loner = register_account(&store, "loner").await;

        let page = feed.compose_feed(loner, 1, 20).await.unwrap();
        assert!(page.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_pagination_rejected() {
        let store = test_store().await;
        let feed = FeedComposer::new(store.clone());
        let caller = register_account(&store, "caller").await;

        assert!(matches!(
            feed.compose_feed(caller, 0, 20).await,
            Err(AppError::InvalidPagination(_))
        ));
        assert!(matches!(
            feed.compose_feed(caller, 1, 0).await,
            Err(AppError::InvalidPagination(_))
        ));
    }
}
