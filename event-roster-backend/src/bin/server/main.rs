mod telemetry;

use event_roster_backend::{run_server, ServerError};
use event_roster_config::get_config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let config = get_config()?;
    telemetry::setup_tracing(config.log_filter.as_deref())?;

    info!(database = %config.store.database, "starting up server...");
    let store = event_roster_database::connect(
        &config.store.url,
        &config.store.database,
        config.store.timeout(),
    )
    .await?;

    run_server(&config, store).await
}
