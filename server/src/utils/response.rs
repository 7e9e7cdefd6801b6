use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::models::user::PublicUser;

#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
}

/// `{ "success": true }`
#[derive(Serialize)]
pub struct Ack {
    pub success: bool,
}

/// `{ "success": true, "id": ... }` returned by create endpoints.
#[derive(Serialize)]
pub struct Created {
    pub success: bool,
    pub id: i64,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: PublicUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

pub fn success<T>(data: T, message: impl Into<String>) -> impl IntoResponse
where
    T: Serialize,
{
    let body = ApiResponse {
        success: true,
        data: Some(data),
        message: Some(message.into()),
    };
    (StatusCode::OK, Json(body))
}

pub fn ack() -> Json<Ack> {
    Json(Ack { success: true })
}

pub fn created(id: i64) -> Json<Created> {
    Json(Created { success: true, id })
}

pub fn user(user: PublicUser, token: Option<String>) -> Json<UserResponse> {
    Json(UserResponse {
        success: true,
        user,
        token,
    })
}

pub fn error(code: &str, message: impl Into<String>, status: StatusCode) -> Response {
    let body = ApiErrorResponse {
        success: false,
        message: message.into(),
        code: code.to_string(),
    };

    (status, Json(body)).into_response()
}
