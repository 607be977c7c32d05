use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use eyre::WrapErr;

/// Environment variable holding the JSON-RPC endpoint.
pub const RPC_URL_ENV_VAR_NAME: &str = "RPC_URL";

/// Environment variable holding the address of the `StylusDeployer`
/// contract, required to deploy contracts that take constructor arguments.
pub const DEPLOYER_ADDRESS_ENV_VAR_NAME: &str = "DEPLOYER_ADDRESS";

/// Endpoint of a local Nitro dev node.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8547";

/// An `alloy` provider that signs transactions with a local key.
///
/// Type-erased so that contract bindings can be built from `&Wallet`
/// regardless of the filler stack.
pub type Wallet = DynProvider;

/// Builds a signing provider for `signer` connected to `rpc_url`.
pub(crate) fn wallet(signer: PrivateKeySigner, rpc_url: Url) -> Wallet {
    ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(rpc_url)
        .erased()
}

/// Loads the RPC endpoint from [`RPC_URL_ENV_VAR_NAME`], falling back to
/// [`DEFAULT_RPC_URL`].
pub(crate) fn rpc_url() -> eyre::Result<Url> {
    let raw = std::env::var(RPC_URL_ENV_VAR_NAME)
        .unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
    raw.parse().wrap_err(format!("failed to parse RPC url {raw}"))
}
