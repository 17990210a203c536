//! Authentication core process
//!
//! Loads configuration, connects the configured token store, rebuilds the
//! revocation cache and runs blacklist cleanup until interrupted.
//!
//! Configuration: `BLOG_CONFIG` names a config file (defaults to the file for
//! the current environment); `BLOG__`-prefixed variables override it.

use anyhow::Context;
use tracing::info;

use blog_infra::config::AppConfig;
use blog_infra::telemetry::init_tracing;
use blog_infra::AuthRuntime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = match std::env::var("BLOG_CONFIG") {
        Ok(path) => AppConfig::load(Some(&path)),
        Err(_) => AppConfig::from_env(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config.logging).context("failed to initialise logging")?;
    info!(environment = %config.environment, "Starting blog-auth");

    let runtime = AuthRuntime::start(&config)
        .await
        .context("failed to start authentication core")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    info!("Shutdown signal received");
    runtime.shutdown().await;
    Ok(())
}
