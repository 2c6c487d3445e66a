use serde::Deserialize;

/// Top-level configuration for the application.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub logger: LoggerSettings,
    pub server: ServerSettings,
    pub graceful_shutdown_timeout_secs: u64,
}

/// Logger output configuration.
///
/// `format` is either `"json"` or `"plain"`.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggerSettings {
    pub level: String,
    pub format: String,
}

/// Listening address for the WebSocket server.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Partial configuration as loaded from files or environment.
///
/// Every field is optional; missing values are filled from defaults,
/// except the server port, which loading requires explicitly.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub logger: Option<PartialLoggerSettings>,
    pub server: Option<PartialServerSettings>,
    pub graceful_shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggerSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logger: LoggerSettings {
                level: "info".to_string(),
                format: "json".to_string(),
            },
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            graceful_shutdown_timeout_secs: 5,
        }
    }
}
