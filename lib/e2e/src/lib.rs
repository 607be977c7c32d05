//! End-to-end harness for Mawar Finance contracts.
//!
//! Provides funded test [`Account`]s, a [`Deployer`] driving
//! `cargo stylus deploy`, and assertion helpers for transaction receipts and
//! reverts. The `deploy` binary reuses the same [`Account`] and [`Deployer`]
//! against real networks.
mod account;
mod constructor;
mod deploy;
mod environment;
mod error;
mod event;
mod receipt;
mod system;

pub use account::Account;
pub use constructor::{Constructor, ConstructorArg};
pub use deploy::{Deployed, Deployer, StylusDeployerError};
pub use e2e_proc::test;
pub use environment::{package_name, workspace_root};
pub use error::Revert;
pub use event::EventExt;
pub use receipt::ensure_success;
pub use system::{
    Wallet, DEFAULT_RPC_URL, DEPLOYER_ADDRESS_ENV_VAR_NAME,
    RPC_URL_ENV_VAR_NAME,
};
