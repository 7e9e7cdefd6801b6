use serde::{Deserialize, Serialize};

use crate::models::booking::{BookingStatus, BookingView};

/// Admin dashboard figures. Revenue only counts confirmed (Lunas) bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_bookings: usize,
    pub paid_bookings: usize,
    pub awaiting_confirmation: usize,
    pub revenue: i64,
}

impl DashboardStats {
    pub fn from_bookings(bookings: &[BookingView]) -> Self {
        bookings
            .iter()
            .fold(Self::default(), |mut stats, booking| {
                stats.total_bookings += 1;
                match booking.status {
                    BookingStatus::Lunas => {
                        stats.paid_bookings += 1;
                        stats.revenue = stats.revenue.saturating_add(booking.total);
                    }
                    BookingStatus::MenungguKonfirmasi => stats.awaiting_confirmation += 1,
                    BookingStatus::BelumBayar => {}
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn view(id: i64, status: BookingStatus, total: i64) -> BookingView {
        BookingView {
            id,
            username: "alice".into(),
            ticket_name: "Standard".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            players: 1,
            payment_method: "Cash".into(),
            status,
            total,
        }
    }

    #[test]
    fn test_revenue_counts_only_lunas() {
        let stats = DashboardStats::from_bookings(&[
            view(1, BookingStatus::Lunas, 300_000),
            view(2, BookingStatus::MenungguKonfirmasi, 100_000),
            view(3, BookingStatus::BelumBayar, 50_000),
            view(4, BookingStatus::Lunas, 200_000),
        ]);

        assert_eq!(
            stats,
            DashboardStats {
                total_bookings: 4,
                paid_bookings: 2,
                awaiting_confirmation: 1,
                revenue: 500_000,
            }
        );
    }

    #[test]
    fn test_empty_dashboard() {
        assert_eq!(DashboardStats::from_bookings(&[]), DashboardStats::default());
    }
}
