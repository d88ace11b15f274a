use std::sync::Arc;

use crate::auth::{HasTokenVerifier, TokenService};
use crate::config::Config;
use crate::core::IdGenerator;
use crate::media::MediaStorage;
use crate::services::{
    AccountService, EngagementLedger, FeedComposer, FollowGraph, PostService, Store,
};
use crate::store::SqliteStore;

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub follow_graph: FollowGraph,
    pub feed: FeedComposer,
    pub engagement: EngagementLedger,
    pub posts: PostService,
    pub media: MediaStorage,
    pub tokens: Arc<TokenService>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Store = Arc::new(SqliteStore::new(&config.database.url).await?);
        Ok(Self::with_store(store, config).await?)
    }

    /// Assemble the service graph on top of an existing store
    pub async fn with_store(store: Store, config: Config) -> anyhow::Result<Self> {
        let ids = Arc::new(IdGenerator::new());
        let tokens = Arc::new(TokenService::new(
            &config.auth.jwt_secret,
            config.auth.token_ttl_secs,
        ));

        let media = MediaStorage::new(&config.media.upload_dir);
        media.ensure_upload_dir().await?;

        Ok(Self {
            accounts: AccountService::new(store.clone(), ids.clone(), tokens.clone()),
            follow_graph: FollowGraph::new(store.clone()),
            feed: FeedComposer::new(store.clone()),
            engagement: EngagementLedger::new(store.clone(), ids.clone()),
            posts: PostService::new(store, ids),
            media,
            tokens,
            config,
        })
    }
}

impl HasTokenVerifier for AppState {
    fn token_service(&self) -> &TokenService {
        &self.tokens
    }
}
