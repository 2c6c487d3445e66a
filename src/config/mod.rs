//! The `config` module loads and validates server configuration.
//!
//! Values come from an optional `config/default` file merged with
//! environment variables; anything absent falls back to defaults,
//! except the server port, which must be supplied explicitly.

mod settings;

use config::{Config, ConfigError, Environment, File};

use crate::config::settings::PartialSettings;

pub use settings::{LoggerSettings, ServerSettings, Settings};

/// Loads the configuration from the default file and environment
/// variables and merges it with default values.
///
/// Fails with a `ConfigError` if no source supplies `server.port`.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("_"));

    let config = builder.build()?;

    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    let port = partial
        .server
        .as_ref()
        .and_then(|s| s.port)
        .ok_or_else(|| ConfigError::Message("server port is required".to_string()))?;

    Ok(Settings {
        logger: LoggerSettings {
            level: partial
                .logger
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logger.level),
            format: partial
                .logger
                .as_ref()
                .and_then(|l| l.format.clone())
                .unwrap_or(default.logger.format),
        },
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port,
        },
        graceful_shutdown_timeout_secs: partial
            .graceful_shutdown_timeout_secs
            .unwrap_or(default.graceful_shutdown_timeout_secs),
    })
}

#[cfg(test)]
mod tests;
