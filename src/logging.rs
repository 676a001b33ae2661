// src/logging.rs
//
// Subscriber setup for the binary. Library code logs through the `log`
// facade; the subscriber's log bridge forwards those records.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Install a stderr fmt subscriber.
///
/// `RUST_LOG` wins over `default_level` when set. Stdout stays free for the
/// report output.
pub fn init_logging(default_level: &str) -> AppResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("homepage_curator={}", default_level)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| AppError::Other(format!("Failed to initialize logging: {}", e)))
}
