use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};

/// Filter directives, same syntax as `RUST_LOG`.
pub(crate) const LOG_ENV: &str = "SPENDCAST_LOG";
const DEFAULT_FILTER: &str = "spendcast=info";

static TRACING_INIT: Once = Once::new();

/// Send `tracing` output to `log_path`. The terminal belongs to the TUI, so
/// nothing is written to stdout or stderr. Only the first call has any effect.
pub(crate) fn init(log_path: &Path) -> Result<()> {
    let mut result = Ok(());
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let file = match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(f) => f,
            Err(e) => {
                result = Err(e)
                    .with_context(|| format!("Failed to open log file: {}", log_path.display()));
                return;
            }
        };

        if let Err(e) = fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
        {
            result = Err(anyhow::anyhow!(e)).context("Failed to install the log subscriber");
        }
    });
    result
}
