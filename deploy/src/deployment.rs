//! Executes a [`Plan`] against a live chain and records the result.
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use alloy::primitives::Address;
use e2e::{Account, Constructor};
use eyre::{ContextCompat, WrapErr};

use crate::{
    abi::{Mfi, SavingsNft},
    config::DEFAULT_CONTRACTS_DIR,
    plan::{Arg, Call, ContractId, Plan, Step},
};

/// Name of the file deployment records are written to.
pub const ADDRESSES_FILE: &str = "deployed_addresses.json";

/// Where the contract crates live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    contracts_dir: PathBuf,
}

impl Workspace {
    /// A workspace whose contract crates live under `contracts_dir`.
    #[must_use]
    pub fn new(contracts_dir: impl Into<PathBuf>) -> Self {
        Self { contracts_dir: contracts_dir.into() }
    }

    /// The enclosing cargo workspace, with contracts under `contracts_dir`
    /// (relative to its root) or [`DEFAULT_CONTRACTS_DIR`].
    ///
    /// # Errors
    ///
    /// If the workspace root can't be located.
    pub fn locate(contracts_dir: Option<&Path>) -> eyre::Result<Self> {
        let root = e2e::workspace_root()?;
        let dir = contracts_dir.unwrap_or(Path::new(DEFAULT_CONTRACTS_DIR));
        Ok(Self::new(root.join(dir)))
    }

    /// Crate directory of `contract`.
    #[must_use]
    pub fn package_dir(&self, contract: ContractId) -> PathBuf {
        self.contracts_dir.join(contract.package())
    }
}

/// Addresses of a complete Mawar Finance deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployedContracts {
    /// The MFI token.
    pub mfi: Address,
    /// The receipt NFT.
    pub nft: Address,
    /// The savings vault.
    pub vault: Address,
    /// The exchange.
    pub exchange: Address,
}

impl DeployedContracts {
    fn from_addresses(
        addresses: &BTreeMap<ContractId, Address>,
    ) -> eyre::Result<Self> {
        let get = |id: ContractId| {
            addresses
                .get(&id)
                .copied()
                .context(format!("plan does not deploy {id}"))
        };
        Ok(Self {
            mfi: get(ContractId::Mfi)?,
            nft: get(ContractId::SavingsNft)?,
            vault: get(ContractId::SavingsVault)?,
            exchange: get(ContractId::Exchange)?,
        })
    }

    /// Address of `contract`.
    #[must_use]
    pub fn get(&self, contract: ContractId) -> Address {
        match contract {
            ContractId::Mfi => self.mfi,
            ContractId::SavingsNft => self.nft,
            ContractId::SavingsVault => self.vault,
            ContractId::Exchange => self.exchange,
        }
    }

    /// Addresses keyed as `<module>#<artifact>`.
    #[must_use]
    pub fn addresses(&self, module: &str) -> BTreeMap<String, Address> {
        ContractId::ALL
            .into_iter()
            .map(|id| (format!("{module}#{}", id.artifact()), self.get(id)))
            .collect()
    }

    /// Writes [`Self::addresses`] to `<dir>/chain-<chain_id>/`
    /// [`ADDRESSES_FILE`] and returns the file path.
    ///
    /// # Errors
    ///
    /// If the directory can't be created or the file can't be written.
    pub fn write(
        &self,
        dir: &Path,
        chain_id: u64,
        module: &str,
    ) -> eyre::Result<PathBuf> {
        let dir = dir.join(format!("chain-{chain_id}"));
        std::fs::create_dir_all(&dir)
            .wrap_err(format!("failed to create {}", dir.display()))?;

        let record: BTreeMap<String, String> = self
            .addresses(module)
            .into_iter()
            .map(|(key, address)| (key, address.to_checksum(None)))
            .collect();
        let json = serde_json::to_string_pretty(&record)?;

        let path = dir.join(ADDRESSES_FILE);
        std::fs::write(&path, json + "\n")
            .wrap_err(format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

/// A run of a [`Plan`] by one account.
pub struct Deployment<'a> {
    account: &'a Account,
    workspace: &'a Workspace,
    addresses: BTreeMap<ContractId, Address>,
}

impl<'a> Deployment<'a> {
    /// Validates `plan` and executes its steps in order as `account`.
    ///
    /// Deployments go through `cargo stylus deploy` in the contract's crate
    /// directory; calls are sent through typed bindings and awaited until
    /// mined. The first failure aborts the run. Contracts deployed before it
    /// are left in place and listed in the error.
    ///
    /// # Errors
    ///
    /// If the plan is invalid, a deployment fails, a call reverts, or the
    /// plan doesn't deploy all four contracts.
    pub async fn execute(
        plan: &Plan,
        account: &'a Account,
        workspace: &'a Workspace,
    ) -> eyre::Result<DeployedContracts> {
        plan.validate()?;

        let mut deployment =
            Deployment { account, workspace, addresses: BTreeMap::new() };
        for (index, step) in plan.steps().iter().enumerate() {
            let number = index + 1;
            deployment.run(step).await.wrap_err_with(|| {
                format!(
                    "step {number} ({step}) failed; {}",
                    progress(&deployment.addresses)
                )
            })?;
        }

        tracing::info!(module = plan.module(), "deployment complete");
        DeployedContracts::from_addresses(&deployment.addresses)
    }

    fn lookup(&self, id: ContractId) -> Option<Address> {
        self.addresses.get(&id).copied()
    }

    async fn run(&mut self, step: &Step) -> eyre::Result<()> {
        match step {
            Step::Deploy { contract, args } => {
                let address = self.deploy(*contract, args).await?;
                self.addresses.insert(*contract, address);
            }
            Step::Invoke { target, call } => {
                let target = Arg::Contract(*target).address(|id| self.lookup(id))?;
                self.invoke(target, call).await?;
            }
        }
        Ok(())
    }

    async fn deploy(
        &self,
        contract: ContractId,
        args: &[Arg],
    ) -> eyre::Result<Address> {
        let parts = args
            .iter()
            .map(|arg| Ok((arg.abi_type(), arg.encode(|id| self.lookup(id))?)))
            .collect::<eyre::Result<Vec<_>>>()?;
        let constructor = Constructor::from_parts(parts);
        tracing::debug!(%contract, signature = %constructor.signature, "deploying");

        let deployed = self
            .account
            .as_deployer()
            .in_package(self.workspace.package_dir(contract))
            .with_constructor(constructor)
            .deploy()
            .await?;

        tracing::info!(
            %contract,
            address = %deployed.contract_address,
            tx = %deployed.receipt.transaction_hash,
            "deployed"
        );
        Ok(deployed.contract_address)
    }

    async fn invoke(&self, target: Address, call: &Call) -> eyre::Result<()> {
        let wallet = &self.account.wallet;
        let lookup = |id| self.lookup(id);

        let receipt = match call {
            Call::SetVaultOnce { vault } => {
                let nft = SavingsNft::new(target, wallet);
                let vault = vault.address(lookup)?;
                e2e::receipt!(nft.setVaultOnce(vault))?
            }
            Call::Transfer { to, amount } => {
                let mfi = Mfi::new(target, wallet);
                let to = to.address(lookup)?;
                let amount = amount.uint()?;
                e2e::receipt!(mfi.transfer(to, amount))?
            }
        };

        tracing::info!(
            call = call.name(),
            %target,
            tx = %receipt.transaction_hash,
            "call mined"
        );
        Ok(())
    }
}

/// Lists the contracts a run has deployed so far.
fn progress(addresses: &BTreeMap<ContractId, Address>) -> String {
    if addresses.is_empty() {
        return "nothing deployed".to_string();
    }
    let deployed = addresses
        .iter()
        .map(|(id, address)| format!("{id}={address}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("deployed: {deployed}")
}
