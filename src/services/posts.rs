// Post creation and retrieval

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::core::{
    current_time_millis, AccountSummary, Collection, EntityId, IdGenerator, Post, PostKind,
};
use crate::error::{AppError, AppResult};
use crate::store::{Document, FieldValue, FindQuery, Sort};

use super::{require_account, summaries_for, EnrichedPost, Store};

pub const MAX_CAPTION_LENGTH: usize = 2200;
pub const MAX_TRACK_TITLE_LENGTH: usize = 100;
pub const MAX_ALBUM_LENGTH: usize = 100;
pub const MAX_LYRICS_LENGTH: usize = 5000;

/// New-post input as accepted from the API
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub kind: PostKind,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub track_title: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    /// Defaults to public when omitted
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Clone)]
pub struct PostService {
    store: Store,
    ids: Arc<IdGenerator>,
}

impl PostService {
    pub fn new(store: Store, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Create a post and bump the author's post counter
    pub async fn create_post(&self, author_id: EntityId, input: NewPost) -> AppResult<EnrichedPost> {
        validate_length("caption", &input.caption, MAX_CAPTION_LENGTH)?;
        validate_length("track title", &input.track_title, MAX_TRACK_TITLE_LENGTH)?;
        validate_length("album", &input.album, MAX_ALBUM_LENGTH)?;
        validate_length("lyrics", &input.lyrics, MAX_LYRICS_LENGTH)?;

        let author = require_account(self.store.as_ref(), author_id).await?;

        let post = Post {
            id: self.ids.next_id(),
            author: author_id,
            kind: input.kind,
            caption: input.caption,
            media_url: input.media_url,
            thumbnail_url: input.thumbnail_url,
            duration: input.duration,
            track_title: input.track_title,
            album: input.album,
            genre: input.genre,
            lyrics: input.lyrics,
            likes: Vec::new(),
            likes_count: 0,
            comments_count: 0,
            shares_count: 0,
            plays_count: 0,
            is_public: input.is_public.unwrap_or(true),
            created_at: current_time_millis(),
        };

        let doc = Document::encode(Collection::Posts, post.id, post.created_at, &post)?;
        self.store.insert(doc).await?;
        self.store
            .increment(Collection::Accounts, author_id, "posts_count", 1, false)
            .await?;

        info!("Account {} created post {}", author_id, post.id);
        Ok(EnrichedPost {
            post,
            author: AccountSummary::from(&author),
        })
    }

    /// Fetch a single post, author-enriched
    pub async fn get_post(&self, post_id: EntityId) -> AppResult<EnrichedPost> {
        let doc = self
            .store
            .get(Collection::Posts, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        let post: Post = doc.decode()?;
        let author = require_account(self.store.as_ref(), post.author).await?;
        Ok(EnrichedPost {
            post,
            author: AccountSummary::from(&author),
        })
    }

    /// Public posts of one account, newest first
    pub async fn posts_by_username(&self, username: &str) -> AppResult<Vec<EnrichedPost>> {
        let account_doc = self
            .store
            .find_one(
                FindQuery::collection(Collection::Accounts)
                    .filter("username", FieldValue::Str(username.to_lowercase())),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let account: crate::core::Account = account_doc.decode()?;

        let query = FindQuery::collection(Collection::Posts)
            .filter("author", FieldValue::Id(account.id))
            .filter("is_public", FieldValue::Bool(true))
            .sort(Sort::CreatedDesc);
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

fn validate_length(name: &str, value: &Option<String>, max: usize) -> AppResult<()> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                name, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::load_account;
    use crate::services::tests::{publish_post, register_account, test_store};

    fn service(store: &Store) -> PostService {
        PostService::new(store.clone(), Arc::new(IdGenerator::new()))
    }

    fn text_post() -> NewPost {
        NewPost {
            kind: PostKind::Text,
            caption: Some("hello".to_string()),
            media_url: None,
            thumbnail_url: None,
            duration: None,
            track_title: None,
            album: None,
            genre: None,
            lyrics: None,
            is_public: None,
        }
    }

    #[tokio::test]
    async fn test_create_post_increments_posts_count() {
        let store = test_store().await;
        let posts = service(&store);
        let author = register_account(&store, "author").await;

        let created = posts.create_post(author, text_post()).await.unwrap();
        assert!(created.post.is_public);
        assert_eq!(created.author.username, "author");

        let account = load_account(store.as_ref(), author).await.unwrap().unwrap();
        assert_eq!(account.posts_count, 1);

        let fetched = posts.get_post(created.post.id).await.unwrap();
        assert_eq!(fetched.post.caption.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_caption_length_limit() {
        let store = test_store().await;
        let posts = service(&store);
        let author = register_account(&store, "author").await;

        let mut input = text_post();
        input.caption = Some("x".repeat(MAX_CAPTION_LENGTH + 1));
        assert!(matches!(
            posts.create_post(author, input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_posts_by_username_excludes_private() {
        let store = test_store().await;
        let posts = service(&store);
        let author = register_account(&store, "author").await;

        let public_new = publish_post(&store, author, 2_000, true).await;
        let public_old = publish_post(&store, author, 1_000, true).await;
        publish_post(&store, author, 3_000, false).await;

        let listed = posts.posts_by_username("author").await.unwrap();
        assert_eq!(
            listed.iter().map(|e| e.post.id).collect::<Vec<_>>(),
            vec![public_new, public_old]
        );

        assert!(matches!(
            posts.posts_by_username("nobody").await,
            Err(AppError::NotFound(_))
        ));
    }
}
