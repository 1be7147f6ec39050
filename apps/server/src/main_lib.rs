use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::auth::{AuthProvider, JwtAuthProvider};
use crate::config::Config;
use crate::idempotency::IdempotencyCache;
use donmoa_core::portfolio::{PortfolioService, PortfolioServiceTrait};
use donmoa_core::snapshots::{SnapshotCommitResult, SnapshotService, SnapshotServiceTrait};
use donmoa_storage_sqlite::{
    db, AccountRepository, IngestLogRepository, InstrumentRepository, SnapshotRepository,
};

pub struct AppState {
    pub snapshot_service: Arc<dyn SnapshotServiceTrait>,
    pub portfolio_service: Arc<dyn PortfolioServiceTrait>,
    pub auth: Arc<dyn AuthProvider>,
    pub idempotency: Arc<IdempotencyCache<SnapshotCommitResult>>,
    pub db_path: String,
}

/// Installs the global subscriber. `log` records from the library crates are
/// forwarded into it.
pub fn init_tracing() {
    let log_format = std::env::var("DONMOA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer((*pool).clone());

    let account_repo = Arc::new(AccountRepository::new(pool.clone(), writer.clone()));
    let instrument_repo = Arc::new(InstrumentRepository::new(pool.clone(), writer.clone()));
    let snapshot_repo = Arc::new(SnapshotRepository::new(pool.clone(), writer.clone()));
    let ingest_log_repo = Arc::new(IngestLogRepository::new(writer.clone()));

    let snapshot_service = Arc::new(SnapshotService::new(
        account_repo.clone(),
        instrument_repo.clone(),
        snapshot_repo.clone(),
        ingest_log_repo,
    ));
    let portfolio_service = Arc::new(PortfolioService::new(
        account_repo,
        instrument_repo,
        snapshot_repo.clone(),
        snapshot_repo,
    ));

    let auth = Arc::new(JwtAuthProvider::new(
        config.jwt_secret.as_bytes(),
        config.jwt_audience.as_deref(),
    ));
    let idempotency = Arc::new(IdempotencyCache::new(
        config.idempotency_ttl,
        config.idempotency_max_entries,
    ));

    Ok(Arc::new(AppState {
        snapshot_service,
        portfolio_service,
        auth,
        idempotency,
        db_path,
    }))
}
