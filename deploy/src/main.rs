//! `mawar-deploy`: deploys the Mawar Finance contracts and records their
//! addresses.
mod cli;
mod logging;

use std::{collections::BTreeMap, path::PathBuf};

use alloy::{providers::Provider, transports::http::reqwest::Url};
use clap::Parser;
use e2e::Account;
use eyre::{ContextCompat, WrapErr};
use mawar_deploy::{
    config::DEFAULT_OUT_DIR, DeployConfig, Deployment, Plan, Workspace,
};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);

    let config = DeployConfig::load(cli.config.as_deref())?;
    let parameters = config.parameters()?;
    let plan = Plan::mawar(&parameters);
    plan.validate()?;

    if cli.dry_run {
        print!("{plan}");
        return Ok(());
    }

    let rpc_url = cli
        .rpc_url
        .or(config.rpc_url)
        .unwrap_or_else(|| e2e::DEFAULT_RPC_URL.to_string());
    let rpc_url: Url =
        rpc_url.parse().wrap_err(format!("invalid RPC url {rpc_url}"))?;
    let private_key = cli
        .private_key
        .context("a deployer key is required: pass --private-key or set PRIVATE_KEY")?;

    let account = Account::from_private_key(&private_key, rpc_url)?;
    let workspace = Workspace::locate(config.contracts_dir.as_deref())?;
    tracing::info!(
        deployer = %account.address(),
        rpc_url = %account.url(),
        module = plan.module(),
        "starting deployment"
    );

    let contracts = Deployment::execute(&plan, &account, &workspace).await?;

    let chain_id = account
        .wallet
        .get_chain_id()
        .await
        .wrap_err("failed to query chain id")?;
    let out = cli
        .out
        .or(config.out_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
    let path = contracts.write(&out, chain_id, plan.module())?;
    tracing::info!(path = %path.display(), chain_id, "deployment recorded");

    let record: BTreeMap<_, _> = contracts
        .addresses(plan.module())
        .into_iter()
        .map(|(key, address)| (key, address.to_checksum(None)))
        .collect();
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
