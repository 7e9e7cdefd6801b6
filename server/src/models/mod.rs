pub mod booking;
pub mod session;
pub mod ticket;
pub mod user;
