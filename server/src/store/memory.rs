//! In-process store used by tests and by `STORAGE=memory` development runs.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AccountStore, BookingStore, CatalogStore, SessionStore};
use crate::models::booking::{booking_total, Booking, BookingStatus, BookingView, NewBooking};
use crate::models::session::Session;
use crate::models::ticket::TicketType;
use crate::models::user::{NewUser, User};
use crate::utils::error::AppError;

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    ticket_types: BTreeMap<i64, TicketType>,
    bookings: BTreeMap<i64, Booking>,
    sessions: HashMap<Uuid, Session>,
    user_seq: i64,
    ticket_type_seq: i64,
    booking_seq: i64,
}

fn next_id(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

/// All tables sit behind one lock, so each trait method is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalServerError("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut tables = self.lock()?;

        if tables.users.values().any(|u| u.username == user.username) {
            return Err(AppError::DuplicateUsername(user.username));
        }

        let id = next_id(&mut tables.user_seq);
        let stored = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        self.lock()?.sessions.insert(session.token, session.clone());
        Ok(())
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>, AppError> {
        Ok(self.lock()?.sessions.get(&token).cloned())
    }

    async fn delete_session(&self, token: Uuid) -> Result<(), AppError> {
        self.lock()?.sessions.remove(&token);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.lock()?;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_ticket_types(&self) -> Result<Vec<TicketType>, AppError> {
        let tables = self.lock()?;
        Ok(tables.ticket_types.values().rev().cloned().collect())
    }

    async fn find_ticket_type(&self, id: i64) -> Result<Option<TicketType>, AppError> {
        Ok(self.lock()?.ticket_types.get(&id).cloned())
    }

    async fn insert_ticket_type(&self, name: &str, price: i64) -> Result<TicketType, AppError> {
        let mut tables = self.lock()?;
        let id = next_id(&mut tables.ticket_type_seq);
        let ticket_type = TicketType {
            id,
            name: name.to_string(),
            price,
        };
        tables.ticket_types.insert(id, ticket_type.clone());
        Ok(ticket_type)
    }

    async fn update_ticket_type(
        &self,
        id: i64,
        name: &str,
        price: i64,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        match tables.ticket_types.get_mut(&id) {
            Some(ticket_type) => {
                ticket_type.name = name.to_string();
                ticket_type.price = price;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_ticket_type(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        if tables.bookings.values().any(|b| b.ticket_type_id == id) {
            return Err(AppError::TicketTypeInUse(id));
        }
        tables.ticket_types.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, AppError> {
        let mut tables = self.lock()?;

        if !tables.users.contains_key(&booking.user_id) {
            return Err(AppError::NotFound(format!(
                "User {} not found",
                booking.user_id
            )));
        }
        let price = tables
            .ticket_types
            .get(&booking.ticket_type_id)
            .map(|t| t.price)
            .ok_or(AppError::TicketTypeNotFound(booking.ticket_type_id))?;
        let total = booking_total(price, booking.players)?;

        let id = next_id(&mut tables.booking_seq);
        let stored = Booking {
            id,
            user_id: booking.user_id,
            ticket_type_id: booking.ticket_type_id,
            date: booking.date,
            time: booking.time,
            players: booking.players,
            payment_method: booking.payment_method,
            status: BookingStatus::BelumBayar,
            total,
            created_at: Utc::now(),
        };
        tables.bookings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, AppError> {
        Ok(self.lock()?.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self, user_id: Option<i64>) -> Result<Vec<BookingView>, AppError> {
        let tables = self.lock()?;

        let mut rows: Vec<&Booking> = tables
            .bookings
            .values()
            .filter(|b| user_id.map_or(true, |uid| b.user_id == uid))
            .collect();
        rows.sort_by_key(|b| Reverse((b.created_at, b.id)));

        // Inner join: rows whose user or ticket type is gone are not listed.
        let views = rows
            .into_iter()
            .filter_map(|b| {
                let user = tables.users.get(&b.user_id)?;
                let ticket_type = tables.ticket_types.get(&b.ticket_type_id)?;
                Some(BookingView {
                    id: b.id,
                    username: user.username.clone(),
                    ticket_name: ticket_type.name.clone(),
                    date: b.date,
                    time: b.time,
                    players: b.players,
                    payment_method: b.payment_method.clone(),
                    status: b.status,
                    total: b.total,
                })
            })
            .collect();

        Ok(views)
    }

    async fn update_booking_status(
        &self,
        id: i64,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock()?;
        match tables.bookings.get_mut(&id) {
            Some(booking) if booking.status == expected => {
                booking.status = next;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_booking(&self, id: i64) -> Result<(), AppError> {
        self.lock()?.bookings.remove(&id);
        Ok(())
    }
}
