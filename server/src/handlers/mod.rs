use axum::http::Uri;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;
use crate::utils::response::success;

pub mod accounts;
pub mod bookings;
pub mod stats;
pub mod tickets;

/// `?id=` as used by the update and delete endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<i64>,
}

impl IdQuery {
    pub fn require(&self, what: &str) -> Result<i64, AppError> {
        match self.id {
            Some(id) if id > 0 => Ok(id),
            _ => Err(AppError::ValidationError(format!("{what} id is required"))),
        }
    }
}

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "padel-api",
    };

    success(payload, "Health check successful").into_response()
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}
