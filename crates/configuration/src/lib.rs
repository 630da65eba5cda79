use crate::error::ConfigError;
use crate::settings::EnvSettings;
use std::collections::HashMap;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{DatabaseSettings, ServerSettings, Settings};

/// Loads the service settings from the process environment.
///
/// Recognized variables are `DB_USER`, `DB_PASSWORD`, `DB_NAME`, `DB_HOST`,
/// `DB_PORT`, `DB_CONN_URL`, `GOPOS_HOST` and `GOPOS_PORT`. Anything unset falls
/// back to its default. Loading `.env` is left to the binary.
pub fn load_settings() -> Result<Settings, ConfigError> {
    build(config::Environment::default())
}

/// Same as [`load_settings`], but reads from an explicit variable map instead
/// of the process environment.
pub fn load_settings_from(vars: HashMap<String, String>) -> Result<Settings, ConfigError> {
    build(config::Environment::default().source(Some(vars.into_iter().collect())))
}

fn build(env: config::Environment) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .set_default("db_host", settings::DEFAULT_DB_HOST)?
        .set_default("db_port", i64::from(settings::DEFAULT_DB_PORT))?
        .set_default("gopos_port", i64::from(settings::DEFAULT_SERVICE_PORT))?
        .add_source(env)
        .build()?;

    let raw = builder.try_deserialize::<EnvSettings>()?;
    let settings = Settings::try_from(raw)?;

    tracing::debug!(
        db_target = %settings.database.redacted_url(),
        service_port = settings.server.port,
        "Settings loaded."
    );
    Ok(settings)
}
