use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use tokio::net::TcpListener;

use padel_server::config::{Config, Storage};
use padel_server::logging::init_tracing;
use padel_server::routes::create_routes;
use padel_server::state::AppState;
use padel_server::store::{MemoryStore, PgStore};
use padel_server::utils::error::AppError;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    dotenv().ok();
    let config = Config::from_env();
    init_tracing(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!(error = ?e, "Server failed");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let state = match &config.storage {
        Storage::Postgres {
            url,
            max_connections,
        } => {
            let store = PgStore::connect(url, *max_connections).await?;
            store.migrate().await?;
            AppState::new(Arc::new(store), &config)
        }
        Storage::Memory => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on exit)");
            AppState::new(Arc::new(MemoryStore::new()), &config)
        }
    };

    if let Some(admin) = &config.admin {
        state
            .accounts
            .seed_admin(&admin.username, &admin.password, admin.name.as_deref())
            .await?;
    }

    let accounts = state.accounts.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match accounts.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Expired sessions purged"),
                Err(e) => tracing::warn!(error = %e, "Session purge failed"),
            }
        }
    });

    let app = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| AppError::InternalServerError(format!("failed to bind {}: {e}", config.bind_addr)))?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(format!("server error: {e}")))
}
