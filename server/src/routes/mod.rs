use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, with_security_headers, Config};
use crate::handlers::{
    accounts, bookings, health_check, method_not_allowed, not_found, stats, tickets,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/health", get(health_check).fallback(method_not_allowed))
        .route("/register", post(accounts::register).fallback(method_not_allowed))
        .route("/login", post(accounts::login).fallback(method_not_allowed))
        .route("/logout", post(accounts::logout).fallback(method_not_allowed))
        .route("/me", get(accounts::me).fallback(method_not_allowed))
        .route(
            "/tickets",
            get(tickets::list_tickets)
                .post(tickets::create_ticket)
                .put(tickets::update_ticket)
                .delete(tickets::delete_ticket)
                .fallback(method_not_allowed),
        )
        .route(
            "/bookings",
            get(bookings::list_bookings)
                .post(bookings::create_booking)
                .put(bookings::update_booking_status)
                .delete(bookings::delete_booking)
                .fallback(method_not_allowed),
        )
        .route("/stats", get(stats::dashboard_stats).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(state);

    with_security_headers(api, config.production).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&config.cors_allowed_origins)),
    )
}
