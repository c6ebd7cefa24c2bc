use std::{env, path::PathBuf};

use comms::ClientConfig;

const DEFAULT_BASE_URL: &str = "http://localhost:8008";
const DEFAULT_USER_ID: &str = "@example:localhost";
const DEFAULT_ACCESS_TOKEN: &str = "QGV4YW1wbGU6bG9jYWxob3N0.qPEvLuYfNBjxikiCjP";
const DEFAULT_DEVICE_ID: &str = "ROOMCLI";

/// Startup settings, fixed for the lifetime of the process
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub client: ClientConfig,
    /// File receiving the logs, none means logs are only written when `RUST_LOG` asks for them
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Reads the `ROOMCLI_*` environment variables, falling back to the local demo account
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            client: ClientConfig {
                base_url: value("ROOMCLI_BASE_URL", DEFAULT_BASE_URL),
                user_id: value("ROOMCLI_USER_ID", DEFAULT_USER_ID),
                access_token: value("ROOMCLI_ACCESS_TOKEN", DEFAULT_ACCESS_TOKEN),
                device_id: value("ROOMCLI_DEVICE_ID", DEFAULT_DEVICE_ID),
            },
            log_file: lookup("ROOMCLI_LOG")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
