use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::models::booking::{
    Booking, BookingStatus, BookingView, CreateBookingRequest, NewBooking, Transition,
};
use crate::models::user::PublicUser;
use crate::services::stats::DashboardStats;
use crate::store::BookingStore;
use crate::utils::error::AppError;

pub const DEFAULT_PAYMENT_METHOD: &str = "QRIS";

/// Booking engine: creation with price snapshot, the status state machine,
/// and ownership/role checks for every caller-facing operation.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    max_players: i32,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, max_players: i32) -> Self {
        Self { store, max_players }
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<BookingView>, AppError> {
        self.store.list_bookings(Some(user_id)).await
    }

    pub async fn list_all(&self) -> Result<Vec<BookingView>, AppError> {
        self.store.list_bookings(None).await
    }

    /// Users see only their own bookings; admins see everything, optionally
    /// narrowed to one owner.
    pub async fn list_visible(
        &self,
        caller: &PublicUser,
        user_id: Option<i64>,
    ) -> Result<Vec<BookingView>, AppError> {
        if caller.is_admin() {
            return match user_id {
                Some(user_id) => self.list_for_user(user_id).await,
                None => self.list_all().await,
            };
        }

        match user_id {
            Some(user_id) if user_id != caller.id => Err(AppError::Forbidden(
                "You can only view your own bookings".to_string(),
            )),
            _ => self.list_for_user(caller.id).await,
        }
    }

    /// Creates a booking on behalf of the caller. Admins may name another
    /// owner through `user_id`.
    pub async fn create_for(
        &self,
        caller: &PublicUser,
        request: &CreateBookingRequest,
    ) -> Result<Booking, AppError> {
        let owner = match request.user_id {
            Some(user_id) if user_id != caller.id && !caller.is_admin() => {
                return Err(AppError::Forbidden(
                    "You can only create bookings for yourself".to_string(),
                ));
            }
            Some(user_id) => user_id,
            None => caller.id,
        };

        self.create(owner, request).await
    }

    pub async fn create(
        &self,
        user_id: i64,
        request: &CreateBookingRequest,
    ) -> Result<Booking, AppError> {
        let booking = self.validate(user_id, request)?;
        let booking = self.store.insert_booking(booking).await?;

        info!(
            booking_id = booking.id,
            user_id = booking.user_id,
            ticket_type_id = booking.ticket_type_id,
            players = booking.players,
            total = booking.total,
            "Booking created"
        );
        Ok(booking)
    }

    /// Applies a status change requested by name.
    pub async fn update_status(
        &self,
        caller: &PublicUser,
        id: i64,
        status: &str,
    ) -> Result<BookingStatus, AppError> {
        let next: BookingStatus = status.trim().parse()?;
        self.transition(caller, id, next).await
    }

    pub async fn pay(&self, caller: &PublicUser, id: i64) -> Result<BookingStatus, AppError> {
        self.transition(caller, id, BookingStatus::MenungguKonfirmasi).await
    }

    pub async fn confirm(&self, caller: &PublicUser, id: i64) -> Result<BookingStatus, AppError> {
        self.transition(caller, id, BookingStatus::Lunas).await
    }

    pub async fn reject(&self, caller: &PublicUser, id: i64) -> Result<BookingStatus, AppError> {
        self.transition(caller, id, BookingStatus::BelumBayar).await
    }

    /// Removes a booking whatever its status. Unknown ids are ignored.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id <= 0 {
            return Err(AppError::ValidationError("Booking id is required".to_string()));
        }
        self.store.delete_booking(id).await?;
        info!(booking_id = id, "Booking deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<DashboardStats, AppError> {
        Ok(DashboardStats::from_bookings(&self.list_all().await?))
    }

    async fn transition(
        &self,
        caller: &PublicUser,
        id: i64,
        next: BookingStatus,
    ) -> Result<BookingStatus, AppError> {
        if id <= 0 {
            return Err(AppError::ValidationError("Booking id is required".to_string()));
        }

        let booking = self
            .store
            .find_booking(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {id} not found")))?;

        let is_owner = booking.user_id == caller.id;
        if !is_owner && !caller.is_admin() {
            return Err(AppError::Forbidden(
                "You can only update your own bookings".to_string(),
            ));
        }

        let from = booking.status;
        let transition = from
            .transition_to(next)
            .ok_or(AppError::InvalidTransition { from, to: next })?;

        match transition {
            Transition::Pay if !is_owner => {
                return Err(AppError::Forbidden(
                    "Only the booking owner can report payment".to_string(),
                ));
            }
            t if t.requires_admin() && !caller.is_admin() => {
                return Err(AppError::Forbidden(
                    "Only an admin can confirm or reject payments".to_string(),
                ));
            }
            _ => {}
        }

        if !self.store.update_booking_status(id, from, next).await? {
            warn!(booking_id = id, from = %from, to = %next, "Booking status changed concurrently");
            return Err(AppError::InvalidTransition { from, to: next });
        }

        info!(
            booking_id = id,
            caller_id = caller.id,
            from = %from,
            to = %next,
            "Booking status updated"
        );
        Ok(next)
    }

    fn validate(
        &self,
        user_id: i64,
        request: &CreateBookingRequest,
    ) -> Result<NewBooking, AppError> {
        let ticket_type_id = request.ticket_type_id.unwrap_or(0);
        let date = request.date.as_deref().map(str::trim).unwrap_or("");
        let time = request.time.as_deref().map(str::trim).unwrap_or("");

        if user_id <= 0 || ticket_type_id <= 0 || date.is_empty() || time.is_empty() {
            return Err(AppError::ValidationError(
                "Booking data is incomplete".to_string(),
            ));
        }

        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
            AppError::ValidationError(format!("Invalid date '{date}', expected YYYY-MM-DD"))
        })?;
        let time = parse_time(time)?;

        let players = match request.players {
            Some(n) if n >= 1 => n,
            _ => 1,
        };
        if players > i64::from(self.max_players) {
            return Err(AppError::ValidationError(format!(
                "A booking allows at most {} players",
                self.max_players
            )));
        }

        let payment_method = match request.payment_method.as_deref().map(str::trim) {
            Some(method) if !method.is_empty() => method.to_string(),
            _ => DEFAULT_PAYMENT_METHOD.to_string(),
        };

        Ok(NewBooking {
            user_id,
            ticket_type_id,
            date,
            time,
            // bounded by max_players above
            players: players as i32,
            payment_method,
        })
    }
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| AppError::ValidationError(format!("Invalid time '{raw}', expected HH:MM")))
}
