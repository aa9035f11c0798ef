//! Entry point for the personnel service binary.
//!
//! Running this binary starts an HTTP server that gates every request
//! through the route policy and serves report exports.  Sessions and
//! records are read from the JSON fixtures named by
//! `PERSONNEL_DATA_FILE`; the bind address comes from
//! `PERSONNEL_BIND_ADDR`.

use personnel_core::config::ServerConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    if let Err(err) = personnel_core::api::serve(&config).await {
        tracing::error!(error = %format!("{err:#}"), "server failed");
        std::process::exit(1);
    }
}
