use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// HS256 shared secret of the bearer-token auth provider.
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub idempotency_ttl: Duration,
    pub idempotency_max_entries: usize,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = env_or("DONMOA_LISTEN_ADDR", "0.0.0.0:8080")
            .parse()
            .context("Invalid DONMOA_LISTEN_ADDR")?;
        let db_path = env_or("DONMOA_DB_PATH", "./db/donmoa.db");

        let jwt_secret = std::env::var("DONMOA_JWT_SECRET")
            .context("DONMOA_JWT_SECRET must be set")?
            .trim()
            .to_string();
        if jwt_secret.is_empty() {
            anyhow::bail!("DONMOA_JWT_SECRET cannot be empty");
        }
        let jwt_audience = std::env::var("DONMOA_JWT_AUDIENCE")
            .ok()
            .map(|aud| aud.trim().to_string())
            .filter(|aud| !aud.is_empty());

        let cors_allow = env_or("DONMOA_CORS_ALLOW_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            listen_addr,
            db_path,
            jwt_secret,
            jwt_audience,
            cors_allow,
            request_timeout: Duration::from_millis(env_number("DONMOA_REQUEST_TIMEOUT_MS", 30_000)),
            idempotency_ttl: Duration::from_secs(env_number("DONMOA_IDEMPOTENCY_TTL_SECS", 86_400)),
            idempotency_max_entries: env_number("DONMOA_IDEMPOTENCY_MAX_ENTRIES", 10_000),
        })
    }
}
