use serde::{Deserialize, Serialize};

use super::EntityId;

/// Account kind: musicians get the extended profile fields, fans do not
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Musician,
    Fan,
}

/// Full account document as persisted in the entity store.
///
/// `followers` and `following` are denormalized caches of the follow-edge
/// relation; the edge table is authoritative and the follow graph manager
/// keeps both sides in lockstep. Never serialize this struct into an API
/// response directly: it carries the password hash. Use [`AccountProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub kind: AccountKind,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub verified: bool,

    // Musician-only attributes, empty/None for fans
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub instruments: Vec<String>,
    #[serde(default)]
    pub band_members: Vec<String>,
    #[serde(default)]
    pub spotify_link: Option<String>,
    #[serde(default)]
    pub apple_music_link: Option<String>,
    #[serde(default)]
    pub soundcloud_link: Option<String>,
    #[serde(default)]
    pub website_link: Option<String>,

    // Denormalized relation caches and counters
    #[serde(default)]
    pub followers: Vec<EntityId>,
    #[serde(default)]
    pub following: Vec<EntityId>,
    #[serde(default)]
    pub posts_count: i64,

    pub created_at: i64,
}

/// Public projection of an account, safe to return from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub kind: AccountKind,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: String,
    pub cover_url: String,
    pub verified: bool,
    pub genres: Vec<String>,
    pub instruments: Vec<String>,
    pub band_members: Vec<String>,
    pub spotify_link: Option<String>,
    pub apple_music_link: Option<String>,
    pub soundcloud_link: Option<String>,
    pub website_link: Option<String>,
    pub followers_count: usize,
    pub following_count: usize,
    pub posts_count: i64,
    pub created_at: i64,
}

impl From<Account> for AccountProfile {
    fn from(account: Account) -> Self {
        AccountProfile {
            id: account.id,
            username: account.username,
            email: account.email,
            kind: account.kind,
            display_name: account.display_name,
            bio: account.bio,
            avatar_url: account.avatar_url,
            cover_url: account.cover_url,
            verified: account.verified,
            genres: account.genres,
            instruments: account.instruments,
            band_members: account.band_members,
            spotify_link: account.spotify_link,
            apple_music_link: account.apple_music_link,
            soundcloud_link: account.soundcloud_link,
            website_link: account.website_link,
            followers_count: account.followers.len(),
            following_count: account.following.len(),
            posts_count: account.posts_count,
            created_at: account.created_at,
        }
    }
}

/// Lightweight account summary used to enrich follow lists, feed posts
/// and comments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: EntityId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub verified: bool,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        AccountSummary {
            id: account.id,
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            avatar_url: account.avatar_url.clone(),
            verified: account.verified,
        }
    }
}
