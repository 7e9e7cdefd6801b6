use axum::extract::State;
use axum::Json;

use crate::auth::AdminUser;
use crate::services::DashboardStats;
use crate::state::AppState;
use crate::utils::error::AppError;

/// GET /stats
pub async fn dashboard_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.bookings.stats().await?))
}
