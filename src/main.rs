use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reelgate::gateway;
use reelgate::tmdb::{Catalog, TmdbClient};
use reelgate::{Config, Server};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "reelgate stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    tracing::info!(?config, "starting");

    let client = TmdbClient::builder(config.tmdb_token.as_str())
        .base_url(config.tmdb_base_url.as_str())
        .build()?;
    let catalog = Arc::new(Catalog::new(client));
    let pipeline = Arc::new(gateway::pipeline(catalog, &config.allowed_origin));

    let server = Server::bind(config.listen_addr()).await?;
    server
        .run(move |req| {
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.handle(req).await }
        })
        .await?;
    Ok(())
}
