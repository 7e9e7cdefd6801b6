//! Request identity. Handlers never trust a role or user id sent by the
//! client; they take one of these extractors instead.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::models::user::PublicUser;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Any caller holding a valid session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: PublicUser,
    pub token: Uuid,
}

/// A caller whose session belongs to an admin account.
#[derive(Debug, Clone)]
pub struct AdminUser(pub PublicUser);

pub fn bearer_token(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing bearer token".to_string()))?
        .to_str()
        .map_err(|_| AppError::AuthError("Malformed Authorization header".to_string()))?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or_else(|| AppError::AuthError("Authorization must use the Bearer scheme".to_string()))?;

    Uuid::parse_str(token.trim())
        .map_err(|_| AppError::AuthError("Invalid or expired session".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let user = state.accounts.authenticate(token).await?;
        Ok(AuthUser { user, token })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = user.id, "Non-admin attempted an admin operation");
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}
