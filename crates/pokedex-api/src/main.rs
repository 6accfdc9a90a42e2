use clap::Parser;

use pokedex_api::config::Config;
use pokedex_api::server;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::parse();
    tracing::info!(?config, "starting pokedex-api");

    if let Err(e) = server::run(config).await {
        tracing::error!(error = %e, "pokedex-api failed");
        std::process::exit(1);
    }
}
