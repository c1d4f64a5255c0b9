//! Centralised tracing initialisation for stowage binaries.
//!
//! Call [`init_tracing`] once at program start to configure the global
//! subscriber with an `EnvFilter` and optional JSON formatting. Safe to call
//! more than once; only the first call takes effect, since the global
//! subscriber can be set once per process.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json`: when `true`, emit newline-delimited JSON log lines for log
///   aggregation pipelines.
/// * `level`: default verbosity when `RUST_LOG` is not set.
///
/// `RUST_LOG` still wins for fine-grained filtering when present.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let base = tracing_subscriber::registry().with(filter);

    if json {
        base.with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        base.with(fmt::layer().with_target(false)).try_init().ok();
    }
}
