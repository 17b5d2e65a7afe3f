//! tBTC cross-chain relayer daemon.
//!
//! Watches deposits and redemptions across the configured destination
//! chains, drives them through their lifecycles, and serves the ingress
//! API. Concrete chain SDK integrations plug in behind the handler trait;
//! this binary ships with the simulated backend for local runs.

mod args;
mod bootstrap;
mod config;
mod http;
mod sim;

use tbtc_relayer_common::logging;
use tracing::error;

#[tokio::main]
async fn main() {
    logging::init(logging::LoggerConfig::new("tbtc-relayer".to_string()));

    let cli_args: args::Cli = argh::from_env();

    if let Err(e) = bootstrap::run(cli_args).await {
        error!(err = %e, "relayer exited with error");
        std::process::exit(1);
    }

    logging::finalize();
}
