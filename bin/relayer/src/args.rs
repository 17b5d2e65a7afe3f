//! Command-line arguments for the relayer daemon.

use argh::FromArgs;

#[derive(Debug, FromArgs)]
#[argh(description = "cross-chain tBTC relayer")]
pub(crate) struct Cli {
    /// Path to the TOML configuration file.
    #[argh(option, description = "path to the TOML config file")]
    pub config: String,

    /// Overrides the store directory from the config file.
    #[argh(
        option,
        description = "path to the directory where the record store lives (overrides config)"
    )]
    pub datadir: Option<String>,

    /// Overrides the HTTP listen port from the config file.
    #[argh(option, description = "port for the HTTP API (overrides config)")]
    pub http_port: Option<u16>,
}
