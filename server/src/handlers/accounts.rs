use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::auth::AuthUser;
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::JsonBody;
use crate::utils::response::{ack, user};

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<Response, AppError> {
    let account = state
        .accounts
        .register(
            body.username.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
            body.name.as_deref(),
        )
        .await?;
    let session = state.accounts.issue_session(&account).await?;

    Ok(user(account, Some(session.token.to_string())).into_response())
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<Response, AppError> {
    let account = state
        .accounts
        .login(
            body.username.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;
    let session = state.accounts.issue_session(&account).await?;

    Ok(user(account, Some(session.token.to_string())).into_response())
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Response, AppError> {
    state.accounts.logout(auth.token).await?;
    Ok(ack().into_response())
}

/// GET /me
pub async fn me(auth: AuthUser) -> Response {
    user(auth.user, None).into_response()
}
