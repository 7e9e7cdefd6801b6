use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::auth::{AdminUser, AuthUser};
use crate::handlers::IdQuery;
use crate::models::booking::{BookingQuery, CreateBookingRequest, UpdateBookingRequest};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{JsonBody, QueryParams};
use crate::utils::response::{ack, created};

/// GET /bookings[?user_id=]
pub async fn list_bookings(
    State(state): State<AppState>,
    auth: AuthUser,
    QueryParams(query): QueryParams<BookingQuery>,
) -> Result<Response, AppError> {
    let bookings = state.bookings.list_visible(&auth.user, query.user_id).await?;
    Ok(Json(bookings).into_response())
}

/// POST /bookings
pub async fn create_booking(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<CreateBookingRequest>,
) -> Result<Response, AppError> {
    let booking = state.bookings.create_for(&auth.user, &body).await?;
    Ok(created(booking.id).into_response())
}

/// PUT /bookings with `{id, status}`
pub async fn update_booking_status(
    State(state): State<AppState>,
    auth: AuthUser,
    JsonBody(body): JsonBody<UpdateBookingRequest>,
) -> Result<Response, AppError> {
    let (Some(id), Some(status)) = (body.id, body.status.as_deref()) else {
        return Err(AppError::ValidationError(
            "Booking id and status are required".to_string(),
        ));
    };

    state.bookings.update_status(&auth.user, id, status).await?;
    Ok(ack().into_response())
}

/// DELETE /bookings?id=
pub async fn delete_booking(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    QueryParams(query): QueryParams<IdQuery>,
) -> Result<Response, AppError> {
    let id = query.require("Booking")?;
    state.bookings.delete(id).await?;
    Ok(ack().into_response())
}
