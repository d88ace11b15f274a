// Follow Graph Manager
//
// The follow_edges relation is authoritative; every account also carries
// denormalized `followers`/`following` id caches that must stay in lockstep
// with it. A follow is one edge insert followed by two cache writes with no
// transaction around them; a store failure between steps leaves the caches
// behind the relation.

use tracing::info;

use crate::core::{current_time_millis, AccountSummary, Collection, EntityId};
use crate::error::{AppError, AppResult};
use crate::store::FollowEdge;

use super::{load_account, summaries_for, Store};

#[derive(Clone)]
pub struct FollowGraph {
    store: Store,
}

impl FollowGraph {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a follow edge. Fails on self-follows and duplicate edges;
    /// otherwise inserts the edge and appends both cache entries.
    pub async fn follow(&self, follower: EntityId, target: EntityId) -> AppResult<()> {
        if follower == target {
            return Err(AppError::SelfFollow);
        }

        if self.store.edge_exists(follower, target).await? {
            return Err(AppError::AlreadyFollowing);
        }

        let added = self
            .store
            .add_edge(FollowEdge {
                follower,
                following: target,
                created_at: current_time_millis(),
            })
            .await?;
        if !added {
            // Lost a race against an identical follow
            return Err(AppError::AlreadyFollowing);
        }

        self.cache_add(follower, CacheSide::Following, target).await?;
        self.cache_add(target, CacheSide::Followers, follower).await?;

        info!("Account {} now follows {}", follower, target);
        Ok(())
    }

    /// Remove a follow edge. Idempotent: succeeds whether or not the edge
    /// existed, and always scrubs both caches.
    pub async fn unfollow(&self, follower: EntityId, target: EntityId) -> AppResult<()> {
        self.store.remove_edge(follower, target).await?;

        self.cache_remove(follower, CacheSide::Following, target)
            .await?;
        self.cache_remove(target, CacheSide::Followers, follower)
            .await?;

        info!("Account {} unfollowed {}", follower, target);
        Ok(())
    }

    /// Accounts following `account_id`, as summaries in edge insertion order
    pub async fn list_followers(&self, account_id: EntityId) -> AppResult<Vec<AccountSummary>> {
        let edges = self.store.edges_to(account_id).await?;
        let ids: Vec<EntityId> = edges.iter().map(|e| e.follower).collect();
        let summaries = summaries_for(self.store.as_ref(), &ids).await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| summaries.get(&id).cloned())
            .collect())
    }

    /// Accounts that `account_id` follows, as summaries in edge insertion order
    pub async fn list_following(&self, account_id: EntityId) -> AppResult<Vec<AccountSummary>> {
        let edges = self.store.edges_from(account_id).await?;
        let ids: Vec<EntityId> = edges.iter().map(|e| e.following).collect();
        let summaries = summaries_for(self.store.as_ref(), &ids).await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| summaries.get(&id).cloned())
            .collect())
    }

    // Set-based cache membership: a replayed write cannot insert a
    // duplicate id, and removing an absent id is a no-op.
    async fn cache_add(
        &self,
        account_id: EntityId,
        side: CacheSide,
        member: EntityId,
    ) -> AppResult<()> {
        let Some(mut account) = load_account(self.store.as_ref(), account_id).await? else {
            return Ok(());
        };
        let cache = side.of(&mut account);
        if !cache.contains(&member) {
            cache.push(member);
            let data = serde_json::to_string(&account)
                .map_err(|e| AppError::Internal(format!("Failed to serialize account: {}", e)))?;
            self.store.update(Collection::Accounts, account_id, data).await?;
        }
        Ok(())
    }

    async fn cache_remove(
        &self,
        account_id: EntityId,
        side: CacheSide,
        member: EntityId,
    ) -> AppResult<()> {
        let Some(mut account) = load_account(self.store.as_ref(), account_id).await? else {
            return Ok(());
        };
        let cache = side.of(&mut account);
        if cache.contains(&member) {
            cache.retain(|id| *id != member);
            let data = serde_json::to_string(&account)
                .map_err(|e| AppError::Internal(format!("Failed to serialize account: {}", e)))?;
            self.store.update(Collection::Accounts, account_id, data).await?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum CacheSide {
    Followers,
    Following,
}

impl CacheSide {
    fn of(self, account: &mut crate::core::Account) -> &mut Vec<EntityId> {
        match self {
            CacheSide::Followers => &mut account.followers,
            CacheSide::Following => &mut account.following,
        }
    }
}
