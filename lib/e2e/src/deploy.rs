use std::{
    path::{Path, PathBuf},
    process::{Command, Output},
    str::FromStr,
};

use alloy::{
    consensus::Transaction,
    hex::{self, ToHexExt},
    primitives::{Address, TxHash},
    providers::Provider,
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
    sol,
    sol_types::SolError,
    transports::http::reqwest::Url,
};
use eyre::{bail, ContextCompat, WrapErr};
use regex::Regex;

use crate::{
    constructor::Constructor,
    environment::package_name,
    system::{self, DEPLOYER_ADDRESS_ENV_VAR_NAME},
};

sol! {
    #[allow(missing_docs)]
    error ContractInitializationError(address);
    #[allow(missing_docs)]
    error ProgramUpToDate();
}

/// Prefix of the error a deployment fails with when it reverts with data
/// other than [`StylusDeployerError`]'s.
pub(crate) const DEPLOYMENT_REVERTED: &str = "deployment reverted with 0x";

/// StylusDeployer error.
///
/// Currently only supports `error ContractInitializationError(address)`,
/// raised when the constructor of the contract being deployed reverts.
#[derive(Debug)]
pub struct StylusDeployerError {
    /// Deployed contract address.
    pub contract_address: Address,
    /// Hex encoded revert data.
    pub revert_data: String,
}

impl StylusDeployerError {
    /// Convert [`eyre::Report`] into [`StylusDeployerError`].
    #[must_use]
    pub fn from_report(report: &eyre::Report) -> Option<&Self> {
        report.downcast_ref::<StylusDeployerError>()
    }
}

impl std::fmt::Display for StylusDeployerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "constructor of {} reverted with 0x{}",
            self.contract_address, self.revert_data
        )
    }
}

impl std::error::Error for StylusDeployerError {}

/// Outcome of a successful deployment.
#[derive(Debug, Clone)]
pub struct Deployed {
    /// Receipt of the deployment (or activation) transaction.
    pub receipt: TransactionReceipt,
    /// Address of the new contract.
    pub contract_address: Address,
}

/// A basic smart contract deployer.
#[derive(Debug, Clone)]
pub struct Deployer {
    rpc_url: String,
    private_key: String,
    package_dir: Option<PathBuf>,
    constructor: Option<Constructor>,
}

impl Deployer {
    /// Deployer submitting transactions to `rpc_url` signed with
    /// `private_key`.
    #[must_use]
    pub fn new(rpc_url: String, private_key: String) -> Self {
        Self { rpc_url, private_key, package_dir: None, constructor: None }
    }

    /// Add solidity constructor to the deployer.
    #[must_use]
    pub fn with_constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Deploy the contract crate in `package_dir` instead of the crate in
    /// the current directory.
    #[must_use]
    pub fn in_package(mut self, package_dir: impl Into<PathBuf>) -> Self {
        self.package_dir = Some(package_dir.into());
        self
    }

    /// The package directory, if one was set with [`Self::in_package`].
    #[must_use]
    pub fn package_dir(&self) -> Option<&Path> {
        self.package_dir.as_deref()
    }

    /// Deploy and activate the contract implemented as `#[entrypoint]` in the
    /// configured package, running its constructor if one was set.
    /// Consumes currently configured deployer.
    ///
    /// # Errors
    ///
    /// May error if:
    ///
    /// - The package directory can't be determined or has no manifest.
    /// - A constructor is set but `DEPLOYER_ADDRESS` is not.
    /// - `cargo stylus deploy` fails; a constructor revert is returned as
    ///   [`StylusDeployerError`].
    pub async fn deploy(self) -> eyre::Result<Deployed> {
        let package_dir = match &self.package_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let package = package_name(&package_dir)?;

        let mut command = Command::new("cargo");
        command
            .current_dir(&package_dir)
            .args(["stylus", "deploy"])
            .args(["-e", &self.rpc_url])
            .args(["--private-key", &self.private_key])
            .args(["--no-verify"]);

        if let Some(constructor) = &self.constructor {
            let deployer_address = std::env::var(DEPLOYER_ADDRESS_ENV_VAR_NAME)
                .wrap_err(format!(
                    "{DEPLOYER_ADDRESS_ENV_VAR_NAME} should be set to deploy \
                     contracts with a constructor"
                ))?;

            command
                .args(["--experimental-deployer-address", &deployer_address])
                .arg("--experimental-constructor-args")
                .args(&constructor.args);
        }

        tracing::debug!(
            package = %package,
            constructor = ?self.constructor.as_ref().map(|c| &c.signature),
            "running cargo stylus deploy"
        );

        let output = command
            .output()
            .wrap_err("failed to execute `cargo stylus deploy` command")?;

        let deployed = if output.status.success() {
            self.get_receipt(&output).await
        } else {
            self.parse_deployment_error(&output).await
        }
        .wrap_err(format!("failed to deploy {package}"))?;

        tracing::debug!(
            package = %package,
            address = %deployed.contract_address,
            "contract deployed"
        );
        Ok(deployed)
    }

    fn provider(&self) -> eyre::Result<system::Wallet> {
        let signer = PrivateKeySigner::from_str(&self.private_key)?;
        let url = Url::from_str(&self.rpc_url)?;
        Ok(system::wallet(signer, url))
    }

    /// Workarounds for peculiar nitro dev node behavior around constructor
    /// reverts and programs that are already activated.
    async fn parse_deployment_error(
        &self,
        output: &Output,
    ) -> eyre::Result<Deployed> {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Look for the error pattern with hex data.
        let revert_data_regex =
            Regex::new(r#"data: Some\(String\("0x([a-fA-F0-9]+)"\)\)"#)
                .wrap_err("failed to create revert data regex")?;

        if let Some(hex_str) =
            revert_data_regex.captures(&stderr).and_then(|c| c.get(1))
        {
            let hex_str = hex_str.as_str();
            let data = hex::decode(hex_str)
                .wrap_err(format!("failed to decode hex: {hex_str}"))?;

            if data.starts_with(&ContractInitializationError::SELECTOR) {
                let error = ContractInitializationError::abi_decode(&data)
                    .wrap_err("failed to decode ContractInitializationError")?;

                return Err(eyre::Report::new(StylusDeployerError {
                    contract_address: error._0,
                    revert_data: hex_str.to_string(),
                }));
            }

            if data.starts_with(&ProgramUpToDate::SELECTOR) {
                // The dev node reports this on the activation estimate even
                // though the deployment itself went through, and stdout
                // looks like a successful run.
                return self.get_receipt(output).await;
            }

            bail!("{DEPLOYMENT_REVERTED}{hex_str}");
        }

        let activation_error_regex = Regex::new(
            r"activate tx reverted (?:\x1B\[[0-9;]*[a-zA-Z])*(0x[a-fA-F0-9]+)",
        )
        .wrap_err("failed to create activation error regex")?;

        if let Some(tx_hash) =
            activation_error_regex.captures(&stderr).and_then(|c| c.get(1))
        {
            return self.recover_from_activation_error(tx_hash.as_str()).await;
        }

        bail!("deployment failed: {stderr}")
    }

    /// The activation transaction carries the address of the program it
    /// activates in its calldata.
    async fn recover_from_activation_error(
        &self,
        tx_hash: &str,
    ) -> eyre::Result<Deployed> {
        let tx_hash = TxHash::from_str(tx_hash)
            .wrap_err("failed to parse transaction hash")?;
        let provider = self.provider()?;

        let tx = provider
            .get_transaction_by_hash(tx_hash)
            .await?
            .context("activation transaction not found")?;
        let input = tx.input().encode_hex();

        let contract_addr_regex =
            Regex::new(r"[a-fA-F0-9]{8}0+([a-fA-F0-9]{40})$")
                .wrap_err("failed to create contract addr regex")?;
        let contract_addr = contract_addr_regex
            .captures(&input)
            .and_then(|cap| cap.get(1))
            .context(format!("no contract address found in input {input}"))?
            .as_str();
        let contract_address = Address::from_str(contract_addr)
            .wrap_err(format!("failed to parse address {contract_addr}"))?;

        let receipt = provider
            .get_transaction_receipt(tx_hash)
            .await?
            .context("activation receipt not found")?;

        Ok(Deployed { receipt, contract_address })
    }

    async fn get_receipt(&self, output: &Output) -> eyre::Result<Deployed> {
        let stdout = String::from_utf8_lossy(&output.stdout);

        // A 0x followed by 64 hex characters.
        let tx_hash_regex = Regex::new(r"0x[a-fA-F0-9]{64}")
            .wrap_err("failed to create tx hash regex")?;

        // `cargo stylus deploy` colors its output, so the address may be
        // preceded by ANSI escape codes.
        let contract_addr_regex = Regex::new(
            r"deployed code at address:\s*(?:\x1B\[[0-9;]*[a-zA-Z])*(0x[a-fA-F0-9]{40})",
        )
        .wrap_err("failed to create contract addr regex")?;

        let tx_hash = tx_hash_regex
            .find(&stdout)
            .context(format!("no transaction hash found in output {stdout}"))?
            .as_str();
        let tx_hash = TxHash::from_str(tx_hash)
            .wrap_err("failed to parse transaction hash")?;

        let contract_addr = contract_addr_regex
            .captures(&stdout)
            .and_then(|cap| cap.get(1))
            .context(format!("no contract address found in output {stdout}"))?
            .as_str();
        let contract_address = Address::from_str(contract_addr)
            .wrap_err(format!("failed to parse address {contract_addr}"))?;

        let receipt = self
            .provider()?
            .get_transaction_receipt(tx_hash)
            .await?
            .context("deployment receipt not found")?;

        Ok(Deployed { receipt, contract_address })
    }
}
