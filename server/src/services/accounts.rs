use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::session::Session;
use crate::models::user::{NewUser, PublicUser, Role, User};
use crate::services::password::{hash_password, verify_password};
use crate::store::{AccountStore, SessionStore};
use crate::utils::error::AppError;

/// Registration, login and bearer sessions.
pub struct AccountService {
    users: Arc<dyn AccountStore>,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
    // Stands in for the stored hash when the username is unknown.
    dummy_hash: OnceCell<String>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Self-service sign-up. The role is always `user`.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<PublicUser, AppError> {
        let user = self.create_account(username, password, name, Role::User).await?;
        info!(user_id = user.id, username = %user.username, "User registered");
        Ok(PublicUser::from(user))
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<PublicUser, AppError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let Some(user) = self.users.find_user_by_username(username).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_blocking(Uuid::new_v4().to_string()))
                .await?;
            check_password(password, dummy).await?;
            warn!(username = %username, "Login for unknown username");
            return Err(AppError::InvalidCredentials);
        };

        if !check_password(password, &user.password_hash).await? {
            warn!(user_id = user.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        info!(user_id = user.id, role = %user.role, "User logged in");
        Ok(PublicUser::from(user))
    }

    pub async fn issue_session(&self, user: &PublicUser) -> Result<Session, AppError> {
        let session = Session::new(user.id, self.session_ttl)?;
        self.sessions.insert_session(&session).await?;
        Ok(session)
    }

    /// Resolves a bearer token to its account. Expired sessions are removed.
    pub async fn authenticate(&self, token: Uuid) -> Result<PublicUser, AppError> {
        let session = self
            .sessions
            .find_session(token)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid or expired session".to_string()))?;

        if session.is_expired(Utc::now()) {
            self.sessions.delete_session(token).await?;
            return Err(AppError::AuthError("Invalid or expired session".to_string()));
        }

        let user = self
            .users
            .find_user_by_id(session.user_id)
            .await?
            .ok_or_else(|| AppError::AuthError("Session user no longer exists".to_string()))?;

        Ok(PublicUser::from(user))
    }

    pub async fn logout(&self, token: Uuid) -> Result<(), AppError> {
        self.sessions.delete_session(token).await
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        self.sessions.purge_expired_sessions(Utc::now()).await
    }

    /// Creates the admin account if the username is free. Existing accounts
    /// are left untouched.
    pub async fn seed_admin(
        &self,
        username: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Option<PublicUser>, AppError> {
        match self.create_account(username, password, name, Role::Admin).await {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "Admin account seeded");
                Ok(Some(PublicUser::from(user)))
            }
            Err(AppError::DuplicateUsername(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        name: Option<&str>,
        role: Role,
    ) -> Result<User, AppError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Username and password are required".to_string(),
            ));
        }

        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => username.to_string(),
        };

        let password_hash = hash_blocking(password.to_string()).await?;

        self.users
            .insert_user(NewUser {
                username: username.to_string(),
                password_hash,
                name,
                role,
            })
            .await
    }
}

async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::InternalServerError(format!("hashing task failed: {e}")))?
}

async fn check_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::InternalServerError(format!("verification task failed: {e}")))?
}
