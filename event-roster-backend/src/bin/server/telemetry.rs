use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use event_roster_backend::ServerError;

const DEFAULT_LOG_LEVEL: &str = "info,event_roster_backend=debug,event_roster_database=debug,\
                                 tower_http=debug";

/// Installs the global subscriber. `RUST_LOG` takes precedence over the configured filter.
pub fn setup_tracing(configured: Option<&str>) -> Result<(), ServerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_LEVEL))?,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .try_init()?;
    Ok(())
}
