use std::{
    env,
    fs::{File, OpenOptions},
    path::Path,
    sync::Mutex,
};

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// With a `log_file` logs are appended to it, filtered by `RUST_LOG` or `info`. Without one they
/// go to standard error, and only when `RUST_LOG` is set.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    match log_file {
        Some(path) => {
            let file = open(path)?;
            let env_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .context("could not install the log subscriber")
        }
        None if env::var_os(EnvFilter::DEFAULT_ENV).is_some() => tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .context("could not install the log subscriber"),
        None => Ok(()),
    }
}

fn open(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("could not open the log file {}", path.display()))
}
