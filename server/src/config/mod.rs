use std::env;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;
// Ten years.
const MAX_SESSION_TTL_SECS: i64 = 315_360_000;
const DEFAULT_MAX_PLAYERS: i32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    Postgres { url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage: Storage,
    pub bind_addr: SocketAddr,
    pub session_ttl_secs: i64,
    pub max_players: i32,
    pub cors_allowed_origins: String,
    pub production: bool,
    pub logging: LoggingConfig,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let memory_requested = get("STORAGE")
            .map(|v| v.eq_ignore_ascii_case("memory"))
            .unwrap_or(false);
        let storage = match get("DATABASE_URL") {
            Some(url) if !memory_requested => Storage::Postgres {
                url,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_MAX_DB_CONNECTIONS,
                ),
            },
            _ => Storage::Memory,
        };

        let admin = match (get("ADMIN_USERNAME"), get("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed {
                username,
                password,
                name: get("ADMIN_NAME"),
            }),
            _ => None,
        };

        Self {
            storage,
            bind_addr: parse_or(
                "BIND_ADDR",
                get("BIND_ADDR").or_else(|| Some(DEFAULT_BIND_ADDR.to_string())),
                SocketAddr::from(([0, 0, 0, 0], 3001)),
            ),
            session_ttl_secs: in_range_or(
                "SESSION_TTL_SECS",
                parse_or(
                    "SESSION_TTL_SECS",
                    get("SESSION_TTL_SECS"),
                    DEFAULT_SESSION_TTL_SECS,
                ),
                1..=MAX_SESSION_TTL_SECS,
                DEFAULT_SESSION_TTL_SECS,
            ),
            max_players: parse_or("MAX_PLAYERS", get("MAX_PLAYERS"), DEFAULT_MAX_PLAYERS).max(1),
            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| cors::DEFAULT_ALLOWED_ORIGINS.to_string()),
            production: get("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            logging: LoggingConfig {
                level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                json: get("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
            admin,
        }
    }
}

// Runs before the subscriber is installed, so warnings go to stderr.
fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            eprintln!("warning: invalid value '{raw}' for {key}, using default");
            default
        }),
        None => default,
    }
}

fn in_range_or(key: &str, value: i64, range: RangeInclusive<i64>, default: i64) -> i64 {
    if range.contains(&value) {
        value
    } else {
        eprintln!(
            "warning: {key}={value} is outside {}..={}, using default",
            range.start(),
            range.end()
        );
        default
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
