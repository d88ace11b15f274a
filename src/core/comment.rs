use serde::{Deserialize, Serialize};

use super::EntityId;

/// Comment document. `parent_comment` enables reply threading; the attribute
/// is stored but threading is not otherwise implemented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub post: EntityId,
    pub author: EntityId,
    pub content: String,
    #[serde(default)]
    pub likes: Vec<EntityId>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub parent_comment: Option<EntityId>,
    pub created_at: i64,
}
