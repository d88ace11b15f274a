// Identity & credential check: argon2 password hashing, signed bearer
// tokens, and the extractor that turns a token into a caller identity

pub mod middleware;
pub mod passwords;
pub mod tokens;

use serde::{Deserialize, Serialize};

use crate::core::{AccountKind, EntityId};

pub use middleware::HasTokenVerifier;
pub use passwords::{hash_password, verify_password};
pub use tokens::{Claims, TokenService};

/// Verified caller identity, extracted from the bearer token on each
/// request and passed explicitly into every service call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account_id: EntityId,
    pub email: String,
    pub kind: AccountKind,
}
