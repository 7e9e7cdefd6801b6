use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A purchasable court-session package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TicketType {
    pub id: i64,
    pub name: String,
    pub price: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TicketTypeRequest {
    pub name: Option<String>,
    pub price: Option<i64>,
}
