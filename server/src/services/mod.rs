pub mod accounts;
pub mod bookings;
pub mod catalog;
pub mod password;
pub mod stats;

pub use accounts::AccountService;
pub use bookings::BookingService;
pub use catalog::CatalogService;
pub use stats::DashboardStats;
