use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

/// Booking lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    #[serde(rename = "Belum Bayar")]
    BelumBayar,
    #[serde(rename = "Menunggu Konfirmasi")]
    MenungguKonfirmasi,
    #[serde(rename = "Lunas")]
    Lunas,
}

/// A legal move between two statuses, named after who performs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The owner reports payment.
    Pay,
    /// An admin confirms a reported payment.
    Confirm,
    /// An admin rejects a reported payment, sending the booking back to unpaid.
    Reject,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::BelumBayar,
        BookingStatus::MenungguKonfirmasi,
        BookingStatus::Lunas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::BelumBayar => "Belum Bayar",
            BookingStatus::MenungguKonfirmasi => "Menunggu Konfirmasi",
            BookingStatus::Lunas => "Lunas",
        }
    }

    /// Transition table. `None` means the move is illegal, including
    /// staying on the same status.
    pub fn transition_to(self, next: BookingStatus) -> Option<Transition> {
        use BookingStatus::*;

        match (self, next) {
            (BelumBayar, MenungguKonfirmasi) => Some(Transition::Pay),
            (MenungguKonfirmasi, Lunas) => Some(Transition::Confirm),
            (MenungguKonfirmasi, BelumBayar) => Some(Transition::Reject),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.transition_to(next).is_some()
    }
}

impl Transition {
    pub fn target(self) -> BookingStatus {
        match self {
            Transition::Pay => BookingStatus::MenungguKonfirmasi,
            Transition::Confirm => BookingStatus::Lunas,
            Transition::Reject => BookingStatus::BelumBayar,
        }
    }

    pub fn requires_admin(self) -> bool {
        !matches!(self, Transition::Pay)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown booking status '{s}'")))
    }
}

#[derive(Debug, Clone)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub ticket_type_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub players: i32,
    pub payment_method: String,
    pub status: BookingStatus,
    pub total: i64,
    pub created_at: DateTime<Utc>,
}

/// Booking joined with its owner's username and ticket name, as listed to
/// clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: i64,
    pub username: String,
    pub ticket_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub players: i32,
    pub payment_method: String,
    pub status: BookingStatus,
    pub total: i64,
}

/// Validated booking input handed to the store. The total is computed by
/// the store from the ticket price it reads in the same transaction.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub ticket_type_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub players: i32,
    pub payment_method: String,
}

/// Price snapshot taken at creation: unit price times players.
pub fn booking_total(unit_price: i64, players: i32) -> Result<i64, AppError> {
    unit_price
        .checked_mul(i64::from(players))
        .ok_or_else(|| AppError::ValidationError("Booking total is too large".to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBookingRequest {
    pub user_id: Option<i64>,
    pub ticket_type_id: Option<i64>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub players: Option<i64>,
    pub payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookingRequest {
    pub id: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingQuery {
    pub user_id: Option<i64>,
}
