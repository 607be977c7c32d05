use std::str::FromStr;

use alloy::{
    network::TransactionBuilder,
    primitives::{uint, Address, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::WrapErr;
use once_cell::sync::Lazy;
use tokio::sync::{Mutex, MutexGuard};

use crate::{
    deploy::Deployer,
    system::{self, Wallet},
};

/// Pre-funded key of the Nitro dev node.
const MASTER_PRIVATE_KEY: &str =
    "0xb6b15c8cb491557369f3c7d2c287b053eb229daa9c22138887752191c9520659";
/// One ether.
const DEFAULT_FUNDING_ETH: U256 = uint!(1_000_000_000_000_000_000_U256);

/// An externally owned account with a signing provider.
#[derive(Clone)]
pub struct Account {
    /// The account's local private key wrapper.
    pub signer: PrivateKeySigner,
    /// The account's wallet -- an `alloy` provider that signs with `signer`.
    pub wallet: Wallet,
    rpc_url: Url,
}

impl Account {
    /// Create a new random account funded with [`DEFAULT_FUNDING_ETH`] by the
    /// dev node's master account.
    ///
    /// # Errors
    ///
    /// May fail if the RPC url is invalid or funding the account fails.
    pub async fn new() -> eyre::Result<Self> {
        AccountFactory::create().await
    }

    /// Wrap an existing key, e.g. the one a deployment runs under.
    #[must_use]
    pub fn from_signer(signer: PrivateKeySigner, rpc_url: Url) -> Self {
        let wallet = system::wallet(signer.clone(), rpc_url.clone());
        Self { signer, wallet, rpc_url }
    }

    /// Parse a hex-encoded private key and wrap it.
    ///
    /// # Errors
    ///
    /// May fail if `private_key` is not a valid secp256k1 key.
    pub fn from_private_key(
        private_key: &str,
        rpc_url: Url,
    ) -> eyre::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key)
            .wrap_err("failed to parse private key")?;
        Ok(Self::from_signer(signer, rpc_url))
    }

    /// Get a hex-encoded String representing this account's private key.
    #[must_use]
    pub fn pk(&self) -> String {
        alloy::hex::encode(self.signer.to_bytes())
    }

    /// Retrieve this account's address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// The rpc endpoint this account's provider is connected to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.rpc_url
    }

    /// Create a configurable smart contract deployer on behalf of this account.
    #[must_use]
    pub fn as_deployer(&self) -> Deployer {
        Deployer::new(self.rpc_url.to_string(), self.pk())
    }

    /// Get gas token balance.
    ///
    /// # Errors
    ///
    /// May fail if the RPC request fails.
    pub async fn balance(&self) -> eyre::Result<U256> {
        Ok(self.wallet.get_balance(self.address()).await?)
    }

    /// Send `value` of gas token to `to` and wait for the receipt.
    ///
    /// # Errors
    ///
    /// May fail if the transaction cannot be sent or is not mined.
    pub async fn send_value(
        &self,
        to: Address,
        value: U256,
    ) -> eyre::Result<()> {
        let tx = TransactionRequest::default()
            .with_from(self.address())
            .with_to(to)
            .with_value(value);

        self.wallet
            .send_transaction(tx)
            .await?
            .watch()
            .await
            .wrap_err(format!("failed to send {value} wei to {to}"))?;

        Ok(())
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address())
            .field("rpc_url", &self.rpc_url.as_str())
            .finish_non_exhaustive()
    }
}

/// A unit struct used as a synchronization mechanism in
/// [`AccountFactory::lock`].
struct AccountFactory;

impl AccountFactory {
    /// Get access to the factory in a synchronized manner.
    async fn lock() -> MutexGuard<'static, Self> {
        /// Fresh accounts are funded from a single master key, so creation
        /// must be serialized or the master nonce collides.
        static SYNC_ACCOUNT_FACTORY: Lazy<Mutex<AccountFactory>> =
            Lazy::new(|| Mutex::new(AccountFactory));

        SYNC_ACCOUNT_FACTORY.lock().await
    }

    /// Create a new account and fund it from the master account.
    async fn create() -> eyre::Result<Account> {
        let _lock = AccountFactory::lock().await;

        let rpc_url = system::rpc_url()?;
        let master =
            Account::from_private_key(MASTER_PRIVATE_KEY, rpc_url.clone())
                .wrap_err("failed to create master account")?;

        let account =
            Account::from_signer(PrivateKeySigner::random(), rpc_url);
        master
            .send_value(account.address(), DEFAULT_FUNDING_ETH)
            .await
            .wrap_err("account's wallet wasn't funded")?;

        tracing::debug!(address = %account.address(), "funded test account");
        Ok(account)
    }
}
