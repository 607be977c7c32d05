//! Command-line interface of `mawar-deploy`.
use std::path::PathBuf;

use clap::Parser;

use crate::logging::LogFormat;

/// Deploys and wires the Mawar Finance contracts.
///
/// Values given here override `mawar.toml`.
#[derive(Parser, Debug)]
#[command(name = "mawar-deploy", version)]
pub(crate) struct Cli {
    /// Configuration file (TOML). Defaults to `mawar.toml` when present.
    #[arg(long, short = 'c', env = "MAWAR_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// JSON-RPC endpoint.
    #[arg(long, env = "RPC_URL")]
    pub(crate) rpc_url: Option<String>,

    /// Hex-encoded private key of the deployer.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub(crate) private_key: Option<String>,

    /// Directory the deployment record is written to.
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,

    /// Validate and print the plan without sending transactions.
    #[arg(long)]
    pub(crate) dry_run: bool,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub(crate) log_format: LogFormat,
}
