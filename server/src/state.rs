use std::sync::Arc;

use chrono::Duration;

use crate::config::Config;
use crate::services::{AccountService, BookingService, CatalogService};
use crate::store::{AccountStore, BookingStore, CatalogStore, SessionStore};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub bookings: Arc<BookingService>,
}

impl AppState {
    /// Wires every service to the same backing store.
    pub fn new<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: AccountStore + SessionStore + CatalogStore + BookingStore + 'static,
    {
        Self {
            accounts: Arc::new(AccountService::new(
                store.clone(),
                store.clone(),
                Duration::seconds(config.session_ttl_secs),
            )),
            catalog: Arc::new(CatalogService::new(store.clone())),
            bookings: Arc::new(BookingService::new(store, config.max_players)),
        }
    }
}
