use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use upkeep_gateway::AuthResources;
use upkeep_gateway::api::start_webserver;
use upkeep_gateway::config::load_config_or_panic;

fn initialize_tracing() {
    let default_directives = "upkeep_gateway=info,tower_http=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install().expect("Failed to install `color_eyre::install`");

    // Local development reads AUTH_* values from .env; absent file is fine.
    dotenvy::dotenv().ok();

    initialize_tracing();

    // Misconfiguration fails here, before the listener ever opens.
    let config = load_config_or_panic();
    let resources = AuthResources::from_config(config)?;

    start_webserver(resources).await?;
    Ok(())
}
