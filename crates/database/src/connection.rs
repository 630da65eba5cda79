use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Establishes a connection pool to the PostgreSQL database.
///
/// At least one connection is opened before returning, so an unreachable or
/// misconfigured database surfaces here rather than on the first request.
/// The returned pool is meant to be shared by every handler for the lifetime
/// of the process.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let options = connect_options(settings)?;
    tracing::info!(target_db = %settings.redacted_url(), "Connecting to PostgreSQL.");

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options)
        .await
        .map_err(DbError::ConnectionError)?;

    tracing::info!("Successfully connected to PostgreSQL.");
    Ok(pool)
}

/// Applies the migrations under `migrations/`.
///
/// The serving path never runs this; schema changes are an explicit step.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied.");
    Ok(())
}

/// A full URL wins; otherwise the options are assembled from the individual
/// components with TLS disabled. Empty components are left to libpq-style
/// defaults.
pub fn connect_options(settings: &DatabaseSettings) -> Result<PgConnectOptions, DbError> {
    if let Some(url) = &settings.url {
        return PgConnectOptions::from_str(url)
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()));
    }

    let mut options = PgConnectOptions::new()
        .host(&settings.host)
        .port(settings.port)
        .ssl_mode(PgSslMode::Disable);
    if !settings.user.is_empty() {
        options = options.username(&settings.user);
    }
    if !settings.password.is_empty() {
        options = options.password(&settings.password);
    }
    if !settings.name.is_empty() {
        options = options.database(&settings.name);
    }
    Ok(options)
}
