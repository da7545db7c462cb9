//! User service: registration, credential login and token auth.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use worklog_common::{AppError, AppResult, IdGenerator};
use worklog_db::{
    entities::user::{self, Role},
    repositories::UserRepository,
};

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub name: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 128))]
    pub department: String,

    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,

    #[validate(email)]
    pub supervisor_email: Option<String>,
}

/// Input for updating the caller's own profile. Absent fields stay
/// unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub username: Option<String>,

    #[validate(email)]
    pub supervisor_email: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

/// A user together with its freshly issued API token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: user::Model,
    pub token: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user. Emails and usernames are stored lowercased
    /// and must be unique.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        let email = input.email.to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();

        let model = user::ActiveModel {
            id: Set(user_id),
            name: Set(input.name),
            email: Set(email),
            username: Set(input.username.map(|u| u.to_lowercase())),
            department: Set(input.department),
            // Self-registration never grants privileges; promotion to
            // admin happens out of band.
            role: Set(Role::Employee),
            supervisor_email: Set(input.supervisor_email.map(|e| e.to_lowercase())),
            password_hash: Set(password_hash),
            token: Set(None),
            created_at: Set(Utc::now().into()),
        };

        self.user_repo.create(model).await
    }

    /// Authenticate by email and password, issuing a fresh token.
    ///
    /// A new token is generated on every login; any previously issued
    /// token stops working.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthenticatedUser> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = user.into();
        active.token = Set(Some(token.clone()));
        let user = self.user_repo.update(active).await?;

        Ok(AuthenticatedUser { user, token })
    }

    /// Revoke the caller's token.
    pub async fn logout(&self, user: user::Model) -> AppResult<()> {
        let mut active: user::ActiveModel = user.into();
        active.token = Set(None);
        self.user_repo.update(active).await?;
        Ok(())
    }

    /// Update the caller's own profile. Role, email and department are
    /// deliberately not editable here.
    pub async fn update_profile(
        &self,
        user: user::Model,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let mut active: user::ActiveModel = user.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(username) = input.username {
            active.username = Set(Some(username.to_lowercase()));
        }
        if let Some(email) = input.supervisor_email {
            active.supervisor_email = Set(Some(email.to_lowercase()));
        }
        if let Some(password) = input.password {
            active.password_hash = Set(hash_password(&password)?);
        }

        self.user_repo.update(active).await
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// List all users (admin roster views).
    pub async fn list(&self) -> AppResult<Vec<user::Model>> {
        self.user_repo.find_all().await
    }
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
