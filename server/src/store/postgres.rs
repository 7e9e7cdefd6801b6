use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AccountStore, BookingStore, CatalogStore, SessionStore};
use crate::models::booking::{booking_total, Booking, BookingStatus, BookingView, NewBooking};
use crate::models::session::Session;
use crate::models::ticket::TicketType;
use crate::models::user::{NewUser, User};
use crate::utils::error::AppError;

const BOOKING_VIEW_SELECT: &str = r#"
    SELECT b.id, u.username, t.name AS ticket_name,
           b.booking_date, b.booking_time, b.players,
           b.payment_method, b.status, b.total
    FROM bookings b
    JOIN users u ON b.user_id = u.id
    JOIN ticket_types t ON b.ticket_type_id = t.id
"#;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            name: row.name,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BookingRow {
    id: i64,
    user_id: i64,
    ticket_type_id: i64,
    booking_date: NaiveDate,
    booking_time: NaiveTime,
    players: i32,
    payment_method: String,
    status: String,
    total: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            ticket_type_id: row.ticket_type_id,
            date: row.booking_date,
            time: row.booking_time,
            players: row.players,
            payment_method: row.payment_method,
            status: parse_stored_status(&row.status)?,
            total: row.total,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct BookingViewRow {
    id: i64,
    username: String,
    ticket_name: String,
    booking_date: NaiveDate,
    booking_time: NaiveTime,
    players: i32,
    payment_method: String,
    status: String,
    total: i64,
}

impl TryFrom<BookingViewRow> for BookingView {
    type Error = AppError;

    fn try_from(row: BookingViewRow) -> Result<Self, Self::Error> {
        Ok(BookingView {
            id: row.id,
            username: row.username,
            ticket_name: row.ticket_name,
            date: row.booking_date,
            time: row.booking_time,
            players: row.players,
            payment_method: row.payment_method,
            status: parse_stored_status(&row.status)?,
            total: row.total,
        })
    }
}

#[derive(FromRow)]
struct SessionRow {
    token: Uuid,
    user_id: i64,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            token: row.token,
            user_id: row.user_id,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

// A bad status in the table is an infrastructure fault, not client input.
fn parse_stored_status(raw: &str) -> Result<BookingStatus, AppError> {
    raw.parse().map_err(|_| {
        AppError::InternalServerError(format!("unknown booking status '{raw}' in store"))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!(max_connections, "Successfully connected to database");
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!()
            .run(&self.pool)
            .await
            .map_err(|e| AppError::InternalServerError(format!("migration failed: {e}")))?;

        info!("Migrations run successfully");
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"INSERT INTO users (username, password_hash, name, role)
               VALUES ($1, $2, $3, $4)
               RETURNING id, username, password_hash, name, role, created_at"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateUsername(user.username.clone())
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        row.try_into()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, name, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, name, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn insert_session(&self, session: &Session) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(session.token)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: Uuid) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn delete_session(&self, token: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_ticket_types(&self) -> Result<Vec<TicketType>, AppError> {
        let rows = sqlx::query_as::<_, TicketType>(
            "SELECT id, name, price FROM ticket_types ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_ticket_type(&self, id: i64) -> Result<Option<TicketType>, AppError> {
        let row = sqlx::query_as::<_, TicketType>(
            "SELECT id, name, price FROM ticket_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_ticket_type(&self, name: &str, price: i64) -> Result<TicketType, AppError> {
        let row = sqlx::query_as::<_, TicketType>(
            "INSERT INTO ticket_types (name, price) VALUES ($1, $2) RETURNING id, name, price",
        )
        .bind(name)
        .bind(price)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_ticket_type(
        &self,
        id: i64,
        name: &str,
        price: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE ticket_types SET name = $1, price = $2 WHERE id = $3")
            .bind(name)
            .bind(price)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_ticket_type(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bookings WHERE ticket_type_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            return Err(AppError::TicketTypeInUse(id));
        }

        sqlx::query("DELETE FROM ticket_types WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::TicketTypeInUse(id)
                } else {
                    AppError::DatabaseError(e)
                }
            })?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, booking: NewBooking) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE keeps the ticket type from being deleted before the insert lands.
        let price = sqlx::query_scalar::<_, i64>(
            "SELECT price FROM ticket_types WHERE id = $1 FOR SHARE",
        )
        .bind(booking.ticket_type_id)
        .fetch_optional(&mut *tx)
        .await?;
        let price = price.ok_or(AppError::TicketTypeNotFound(booking.ticket_type_id))?;
        let total = booking_total(price, booking.players)?;

        let row = sqlx::query_as::<_, BookingRow>(
            r#"INSERT INTO bookings
                   (user_id, ticket_type_id, booking_date, booking_time,
                    players, payment_method, status, total)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, user_id, ticket_type_id, booking_date, booking_time,
                         players, payment_method, status, total, created_at"#,
        )
        .bind(booking.user_id)
        .bind(booking.ticket_type_id)
        .bind(booking.date)
        .bind(booking.time)
        .bind(booking.players)
        .bind(&booking.payment_method)
        .bind(BookingStatus::BelumBayar.as_str())
        .bind(total)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound(format!("User {} not found", booking.user_id))
            } else {
                AppError::DatabaseError(e)
            }
        })?;

        tx.commit().await?;
        debug!(booking_id = row.id, total, "Booking row inserted");
        row.try_into()
    }

    async fn find_booking(&self, id: i64) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, BookingRow>(
            r#"SELECT id, user_id, ticket_type_id, booking_date, booking_time,
                      players, payment_method, status, total, created_at
               FROM bookings WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Booking::try_from)
        .transpose()
    }

    async fn list_bookings(&self, user_id: Option<i64>) -> Result<Vec<BookingView>, AppError> {
        let rows = match user_id {
            Some(user_id) => {
                let sql = format!(
                    "{BOOKING_VIEW_SELECT} WHERE b.user_id = $1 ORDER BY b.created_at DESC, b.id DESC"
                );
                sqlx::query_as::<_, BookingViewRow>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{BOOKING_VIEW_SELECT} ORDER BY b.created_at DESC, b.id DESC");
                sqlx::query_as::<_, BookingViewRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(BookingView::try_from).collect()
    }

    async fn update_booking_status(
        &self,
        id: i64,
        expected: BookingStatus,
        next: BookingStatus,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE bookings SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next.as_str())
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_booking(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
