// Core domain types for the STAGEDOOR social graph

pub mod account;
pub mod comment;
pub mod id;
pub mod post;

pub use account::{Account, AccountKind, AccountProfile, AccountSummary};
pub use comment::Comment;
pub use id::IdGenerator;
pub use post::{Post, PostKind};

/// Entity id type for accounts, posts and comments
pub type EntityId = i64;

/// Current time in milliseconds since Unix epoch
pub fn current_time_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Document collections known to the entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Accounts,
    Posts,
    Comments,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
        }
    }
}
