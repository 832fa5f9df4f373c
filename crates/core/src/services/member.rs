//! Member service.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use fabula_common::{id::IdGenerator, AppError, AppResult};
use fabula_db::entities::member;
use fabula_db::repositories::MemberRepository;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::settings::SettingsService;

/// Input for registering a member.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 32))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(max = 256))]
    pub display_name: Option<String>,
}

/// Input for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Input for updating the caller's own profile.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(max = 256))]
    pub display_name: Option<Option<String>>,

    #[validate(length(max = 2048))]
    pub bio: Option<Option<String>>,

    #[validate(length(max = 2048))]
    pub avatar_url: Option<Option<String>>,
}

/// Member data safe to expose. Never carries credentials.
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<member::Model> for MemberProfile {
    fn from(member: member::Model) -> Self {
        Self {
            id: member.id,
            username: member.username,
            display_name: member.display_name,
            bio: member.bio,
            avatar_url: member.avatar_url,
            is_admin: member.is_admin,
            created_at: member.created_at,
        }
    }
}

/// Payload returned by registration and login.
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub member: MemberProfile,
}

/// Service for registration, login, and member profiles.
#[derive(Clone)]
pub struct MemberService {
    member_repo: MemberRepository,
    settings: SettingsService,
    id_gen: IdGenerator,
}

impl MemberService {
    /// Create a new member service.
    #[must_use]
    pub const fn new(member_repo: MemberRepository, settings: SettingsService) -> Self {
        Self {
            member_repo,
            settings,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new member and open a session.
    ///
    /// The very first member becomes an admin so a fresh install has a
    /// working admin account without manual database edits.
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthSession> {
        input.validate()?;

        if !is_valid_username(&input.username) {
            return Err(AppError::Validation(
                "username may contain only letters, digits, and underscores".to_string(),
            ));
        }

        let settings = self.settings.get().await?;
        if !settings.registration_enabled {
            return Err(AppError::Forbidden("registration is disabled".to_string()));
        }

        if self
            .member_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "username {} is already taken",
                input.username
            )));
        }
        if self.member_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("email is already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let is_admin = self.member_repo.count().await? == 0;
        let token = self.id_gen.generate_token();
        let now = Utc::now();

        let model = member::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(password_hash),
            display_name: Set(input.display_name),
            bio: Set(None),
            avatar_url: Set(None),
            is_admin: Set(is_admin),
            token: Set(Some(token.clone())),
            created_at: Set(now),
            updated_at: Set(None),
        };

        let member = self.member_repo.create(model).await?;
        info!(member_id = %member.id, username = %member.username, "Registered member");

        Ok(AuthSession {
            token,
            member: member.into(),
        })
    }

    /// Log a member in with username and password.
    ///
    /// Returns the member's standing token; one token covers all sessions
    /// until it is explicitly regenerated.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        let member = self
            .member_repo
            .find_by_username(&input.username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &member.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let (token, member) = if let Some(token) = member.token.clone() {
            (token, member)
        } else {
            let token = self.id_gen.generate_token();
            let mut active: member::ActiveModel = member.into();
            active.token = Set(Some(token.clone()));
            active.updated_at = Set(Some(Utc::now()));
            (token, self.member_repo.update(active).await?)
        };

        info!(member_id = %member.id, "Member logged in");
        Ok(AuthSession {
            token,
            member: member.into(),
        })
    }

    /// Authenticate a member by bearer token.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<member::Model> {
        self.member_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Replace the member's token, ending every existing session.
    pub async fn regenerate_token(&self, member_id: &str) -> AppResult<String> {
        let member = self
            .member_repo
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(member_id.to_string()))?;

        let new_token = self.id_gen.generate_token();
        let mut active: member::ActiveModel = member.into();
        active.token = Set(Some(new_token.clone()));
        active.updated_at = Set(Some(Utc::now()));
        self.member_repo.update(active).await?;

        Ok(new_token)
    }

    /// Fetch a member profile.
    pub async fn get_profile(&self, member_id: &str) -> AppResult<MemberProfile> {
        let member = self
            .member_repo
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(member_id.to_string()))?;
        Ok(member.into())
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        member_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<MemberProfile> {
        input.validate()?;

        let member = self
            .member_repo
            .find_by_id(member_id)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(member_id.to_string()))?;

        let mut active: member::ActiveModel = member.into();
        if let Some(display_name) = input.display_name {
            active.display_name = Set(display_name);
        }
        if let Some(bio) = input.bio {
            active.bio = Set(bio);
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(avatar_url);
        }
        active.updated_at = Set(Some(Utc::now()));

        let member = self.member_repo.update(active).await?;
        Ok(member.into())
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use fabula_common::config::PublishingConfig;
    use fabula_db::entities::app_settings;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn settings_row(registration_enabled: bool) -> app_settings::Model {
        app_settings::Model {
            id: app_settings::APP_SETTINGS_ID.to_string(),
            story_cache_ttl_seconds: 300,
            dashboard_cache_ttl_seconds: 600,
            default_active_days: 30,
            expiring_soon_window_hours: 48,
            registration_enabled,
            ratings_enabled: true,
            bookmarks_enabled: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn member_row(id: &str, username: &str, password_hash: &str) -> member::Model {
        member::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: password_hash.to_string(),
            display_name: None,
            bio: None,
            avatar_url: None,
            is_admin: false,
            token: Some("standing-token".to_string()),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> MemberService {
        MemberService::new(
            MemberRepository::new(db.clone()),
            SettingsService::new(db, &PublishingConfig::default()),
        )
    }

    fn register_input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "a sturdy passphrase".to_string(),
            display_name: None,
        }
    }

    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("test_password_123").unwrap();

        assert!(verify_password("test_password_123", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("test", "not a phc string").is_err());
    }

    #[test]
    fn test_hash_password_salted_per_call() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_username_charset() {
        assert!(is_valid_username("alice_42"));
        assert!(!is_valid_username("alice-42"));
        assert!(!is_valid_username("alice b"));
    }

    #[tokio::test]
    async fn test_register_rejects_when_registration_disabled() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[settings_row(false)]])
                .into_connection(),
        );
        let service = service(db);

        let result = service.register(register_input("alice")).await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[settings_row(true)]])
                .append_query_results([[member_row("m1", "alice", "hash")]])
                .into_connection(),
        );
        let service = service(db);

        let result = service.register(register_input("alice")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_opens_session() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[settings_row(true)]])
                .append_query_results([Vec::<member::Model>::new()])
                .append_query_results([Vec::<member::Model>::new()])
                .append_query_results([[btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0)),
                }]])
                .append_query_results([[member_row("m1", "alice", "hash")]])
                .into_connection(),
        );
        let service = service(db);

        let session = service.register(register_input("alice")).await.unwrap();

        assert!(!session.token.is_empty());
        assert_eq!(session.member.username, "alice");
    }

    #[tokio::test]
    async fn test_login_returns_standing_token() {
        let hash = hash_password("correct horse").unwrap();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member_row("m1", "alice", &hash)]])
                .into_connection(),
        );
        let service = service(db);

        let session = service
            .login(LoginInput {
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(session.token, "standing-token");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let hash = hash_password("correct horse").unwrap();
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member_row("m1", "alice", &hash)]])
                .into_connection(),
        );
        let service = service(db);

        let result = service
            .login(LoginInput {
                username: "alice".to_string(),
                password: "battery staple".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_by_token_unknown_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member::Model>::new()])
                .into_connection(),
        );
        let service = service(db);

        let result = service.authenticate_by_token("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_get_profile_strips_credentials() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member_row("m1", "alice", "hash")]])
                .into_connection(),
        );
        let service = service(db);

        let profile = service.get_profile("m1").await.unwrap();

        assert_eq!(profile.username, "alice");
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("token").is_none());
    }
}
