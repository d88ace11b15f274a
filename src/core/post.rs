use serde::{Deserialize, Serialize};

use super::EntityId;

/// Post kind determines which media and metadata fields are meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Audio,
    Video,
    Image,
    Text,
}

/// Post document.
///
/// `likes` is the source of truth for "did X like this post"; `likes_count`
/// is denormalized from it and floored at zero on decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: EntityId,
    pub author: EntityId,
    pub kind: PostKind,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Seconds, for audio and video
    #[serde(default)]
    pub duration: Option<i64>,

    // Audio-specific metadata
    #[serde(default)]
    pub track_title: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,

    // Engagement
    #[serde(default)]
    pub likes: Vec<EntityId>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    #[serde(default)]
    pub shares_count: i64,
    #[serde(default)]
    pub plays_count: i64,

    pub is_public: bool,
    pub created_at: i64,
}
