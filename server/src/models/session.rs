use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::utils::error::AppError;

/// Server-issued bearer credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: i64, ttl: Duration) -> Result<Self, AppError> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AppError::InternalServerError(format!("session ttl of {ttl} overflows"))
        })?;

        Ok(Self {
            token: Uuid::new_v4(),
            user_id,
            created_at: now,
            expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
