//! Persistence seams. Services depend on these traits only; `PgStore` backs
//! them with PostgreSQL and `MemoryStore` keeps everything in process.
//!
//! Every mutating method is a single atomic unit of work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, BookingView, NewBooking};
use crate::models::session::Session;
use crate::models::ticket::TicketType;
use crate::models::user::{NewUser, User};
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `DuplicateUsername` when the username is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError>;

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>, AppError>;

    async fn delete_session(&self, token: Uuid) -> Result<(), AppError>;

    /// Removes sessions that expired before `now`, returning how many.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Newest first, by descending id.
    async fn list_ticket_types(&self) -> Result<Vec<TicketType>, AppError>;

    async fn find_ticket_type(&self, id: i64) -> Result<Option<TicketType>, AppError>;

    async fn insert_ticket_type(&self, name: &str, price: i64) -> Result<TicketType, AppError>;

    /// Returns `false` when no ticket type has this id.
    async fn update_ticket_type(&self, id: i64, name: &str, price: i64)
        -> Result<bool, AppError>;

    /// Fails with `TicketTypeInUse` while bookings reference the type.
    /// Deleting an unknown id succeeds.
    async fn delete_ticket_type(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Reads the ticket price and inserts the booking in one transaction,
    /// with status `Belum Bayar` and the snapshot total.
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, AppError>;

    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, AppError>;

    /// Newest first. `user_id` restricts the listing to that owner.
    async fn list_bookings(&self, user_id: Option<i64>) -> Result<Vec<BookingView>, AppError>;

    /// Sets `next` only if the booking is still in `expected`. Returns whether
    /// a row changed.
    async fn update_booking_status(
        &self,
        id: i64,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<bool, AppError>;

    async fn delete_booking(&self, id: i64) -> Result<(), AppError>;
}
