// Account registration, login and profile management

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::auth::{hash_password, verify_password, TokenService};
use crate::core::{
    current_time_millis, Account, AccountKind, AccountProfile, Collection, EntityId, IdGenerator,
};
use crate::error::{AppError, AppResult};
use crate::store::{Document, FieldValue, FindQuery};

use super::{require_account, Store};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_DISPLAY_NAME_LENGTH: usize = 50;
pub const MAX_BIO_LENGTH: usize = 500;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Registration input
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub instruments: Option<Vec<String>>,
}

/// Profile update input; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub instruments: Option<Vec<String>>,
    #[serde(default)]
    pub band_members: Option<Vec<String>>,
    #[serde(default)]
    pub spotify_link: Option<String>,
    #[serde(default)]
    pub apple_music_link: Option<String>,
    #[serde(default)]
    pub soundcloud_link: Option<String>,
    #[serde(default)]
    pub website_link: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
}

#[derive(Clone)]
pub struct AccountService {
    store: Store,
    ids: Arc<IdGenerator>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(store: Store, ids: Arc<IdGenerator>, tokens: Arc<TokenService>) -> Self {
        Self { store, ids, tokens }
    }

    /// Register a new account and issue its first bearer token
    pub async fn register(&self, input: NewAccount) -> AppResult<(AccountProfile, String)> {
        let username = input.username.trim().to_lowercase();
        let email = input.email.trim().to_lowercase();
        let display_name = input.display_name.trim().to_string();

        if !USERNAME_RE.is_match(&username) {
            return Err(AppError::Validation(
                "Username must be 3-30 characters and contain only letters, numbers, and underscores"
                    .to_string(),
            ));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(AppError::Validation("Valid email required".to_string()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if display_name.is_empty() {
            return Err(AppError::Validation("Display name required".to_string()));
        }
        if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "Display name must be at most {} characters",
                MAX_DISPLAY_NAME_LENGTH
            )));
        }
        if let Some(bio) = &input.bio {
            if bio.chars().count() > MAX_BIO_LENGTH {
                return Err(AppError::Validation(format!(
                    "Bio must be at most {} characters",
                    MAX_BIO_LENGTH
                )));
            }
        }

        if self.username_taken(&username).await? || self.email_taken(&email).await? {
            return Err(AppError::DuplicateAccount(
                "User with this email or username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let is_musician = input.kind == AccountKind::Musician;

        let account = Account {
            id: self.ids.next_id(),
            username,
            email,
            password_hash,
            kind: input.kind,
            display_name,
            bio: input.bio,
            avatar_url: String::new(),
            cover_url: String::new(),
            verified: false,
            // Musician-only attributes are dropped for fans
            genres: if is_musician {
                input.genres.unwrap_or_default()
            } else {
                Vec::new()
            },
            instruments: if is_musician {
                input.instruments.unwrap_or_default()
            } else {
                Vec::new()
            },
            band_members: Vec::new(),
            spotify_link: None,
            apple_music_link: None,
            soundcloud_link: None,
            website_link: None,
            followers: Vec::new(),
            following: Vec::new(),
            posts_count: 0,
            created_at: current_time_millis(),
        };

        let doc = Document::encode(Collection::Accounts, account.id, account.created_at, &account)?;
        self.store.insert(doc).await?;

        let token = self
            .tokens
            .issue(account.id, &account.email, account.kind)?;

        info!("Registered account {} ({})", account.username, account.id);
        Ok((AccountProfile::from(account), token))
    }

    /// Authenticate by email and password. Unknown email and wrong password
    /// are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(AccountProfile, String)> {
        let email = email.trim().to_lowercase();

        let doc = self
            .store
            .find_one(
                FindQuery::collection(Collection::Accounts)
                    .filter("email", FieldValue::Str(email)),
            )
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;
        let account: Account = doc.decode()?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self
            .tokens
            .issue(account.id, &account.email, account.kind)?;

        info!("Account {} logged in", account.id);
        Ok((AccountProfile::from(account), token))
    }

    /// The authenticated caller's own profile
    pub async fn current_account(&self, account_id: EntityId) -> AppResult<AccountProfile> {
        let account = require_account(self.store.as_ref(), account_id).await?;
        Ok(AccountProfile::from(account))
    }

    /// Public profile lookup by username
    pub async fn profile(&self, username: &str) -> AppResult<AccountProfile> {
        let doc = self
            .store
            .find_one(
                FindQuery::collection(Collection::Accounts)
                    .filter("username", FieldValue::Str(username.to_lowercase())),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let account: Account = doc.decode()?;
        Ok(AccountProfile::from(account))
    }

    /// Apply a partial profile update to the caller's account
    pub async fn update_profile(
        &self,
        account_id: EntityId,
        update: ProfileUpdate,
    ) -> AppResult<AccountProfile> {
        let mut account = require_account(self.store.as_ref(), account_id).await?;

        if let Some(display_name) = update.display_name {
            let display_name = display_name.trim().to_string();
            if display_name.is_empty() {
                return Err(AppError::Validation("Display name required".to_string()));
            }
            if display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
                return Err(AppError::Validation(format!(
                    "Display name must be at most {} characters",
                    MAX_DISPLAY_NAME_LENGTH
                )));
            }
            account.display_name = display_name;
        }
        if let Some(bio) = update.bio {
            if bio.chars().count() > MAX_BIO_LENGTH {
                return Err(AppError::Validation(format!(
                    "Bio must be at most {} characters",
                    MAX_BIO_LENGTH
                )));
            }
            account.bio = Some(bio);
        }
        if let Some(genres) = update.genres {
            account.genres = genres;
        }
        if let Some(instruments) = update.instruments {
            account.instruments = instruments;
        }
        if let Some(band_members) = update.band_members {
            account.band_members = band_members;
        }
        if let Some(link) = update.spotify_link {
            account.spotify_link = Some(link);
        }
        if let Some(link) = update.apple_music_link {
            account.apple_music_link = Some(link);
        }
        if let Some(link) = update.soundcloud_link {
            account.soundcloud_link = Some(link);
        }
        if let Some(link) = update.website_link {
            account.website_link = Some(link);
        }
        if let Some(url) = update.avatar_url {
            account.avatar_url = url;
        }
        if let Some(url) = update.cover_url {
            account.cover_url = url;
        }

        let data = serde_json::to_string(&account)
            .map_err(|e| AppError::Internal(format!("Failed to serialize account: {}", e)))?;
        self.store
            .update(Collection::Accounts, account_id, data)
            .await?;

        Ok(AccountProfile::from(account))
    }

    async fn username_taken(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .store
            .find_one(
                FindQuery::collection(Collection::Accounts)
                    .filter("username", FieldValue::Str(username.to_string())),
            )
            .await?
            .is_some())
    }

    async fn email_taken(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .store
            .find_one(
                FindQuery::collection(Collection::Accounts)
                    .filter("email", FieldValue::Str(email.to_string())),
            )
            .await?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::test_store;

    fn service(store: &Store) -> AccountService {
        AccountService::new(
            store.clone(),
            Arc::new(IdGenerator::new()),
            Arc::new(TokenService::new("test-secret", 3600)),
        )
    }

    fn musician(username: &str) -> NewAccount {
        NewAccount {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "hunter42".to_string(),
            display_name: username.to_string(),
            kind: AccountKind::Musician,
            bio: None,
            genres: Some(vec!["jazz".to_string()]),
            instruments: Some(vec!["guitar".to_string()]),
        }
    }

    #[tokio::test]
    async fn test_register_and_login_roundtrip() {
        let store = test_store().await;
        let accounts = service(&store);

        let (profile, token) = accounts.register(musician("Ada_Lovelace")).await.unwrap();
        assert_eq!(profile.username, "ada_lovelace");
        assert_eq!(profile.genres, vec!["jazz"]);
        assert!(!token.is_empty());

        let (logged_in, _) = accounts
            .login("ada_lovelace@example.com", "hunter42")
            .await
            .unwrap();
        assert_eq!(logged_in.id, profile.id);

        assert!(matches!(
            accounts.login("ada_lovelace@example.com", "wrong").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            accounts.login("ghost@example.com", "hunter42").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let store = test_store().await;
        let accounts = service(&store);

        accounts.register(musician("ada")).await.unwrap();
        assert!(matches!(
            accounts.register(musician("ada")).await,
            Err(AppError::DuplicateAccount(_))
        ));

        // Same email under a different username is still a duplicate
        let mut input = musician("ada2");
        input.email = "ada@example.com".to_string();
        assert!(matches!(
            accounts.register(input).await,
            Err(AppError::DuplicateAccount(_))
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = test_store().await;
        let accounts = service(&store);

        let mut input = musician("ab");
        assert!(matches!(
            accounts.register(input).await,
            Err(AppError::Validation(_))
        ));

        input = musician("ada");
        input.email = "not-an-email".to_string();
        assert!(matches!(
            accounts.register(input).await,
            Err(AppError::Validation(_))
        ));

        input = musician("ada");
        input.password = "short".to_string();
        assert!(matches!(
            accounts.register(input).await,
            Err(AppError::Validation(_))
        ));

        input = musician("ada");
        input.display_name = "  ".to_string();
        assert!(matches!(
            accounts.register(input).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fan_registration_drops_musician_fields() {
        let store = test_store().await;
        let accounts = service(&store);

        let mut input = musician("fanatic");
        input.kind = AccountKind::Fan;
        let (profile, _) = accounts.register(input).await.unwrap();
        assert!(profile.genres.is_empty());
        assert!(profile.instruments.is_empty());
    }

    #[tokio::test]
    async fn test_profile_update() {
        let store = test_store().await;
        let accounts = service(&store);
        let (profile, _) = accounts.register(musician("ada")).await.unwrap();

        let updated = accounts
            .update_profile(
                profile.id,
                ProfileUpdate {
                    display_name: Some("Ada L.".to_string()),
                    bio: Some("Analytical engine enthusiast".to_string()),
                    spotify_link: Some("https://spotify.example/ada".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Ada L.");
        assert_eq!(updated.bio.as_deref(), Some("Analytical engine enthusiast"));
        assert_eq!(
            updated.spotify_link.as_deref(),
            Some("https://spotify.example/ada")
        );
        // Untouched fields survive
        assert_eq!(updated.genres, vec!["jazz"]);

        let fetched = accounts.profile("ada").await.unwrap();
        assert_eq!(fetched.display_name, "Ada L.");
    }
}
