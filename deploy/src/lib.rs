//! Deployment of the Mawar Finance contracts.
//!
//! The wiring between contracts is declared as a [`plan::Plan`]: an ordered
//! list of deployments and follow-up calls whose dependencies are checked
//! before any transaction is sent. [`deployment::Deployment`] executes a plan
//! with an [`e2e::Account`] and returns the addresses it produced, which can
//! be persisted per chain.
//!
//! ```rust,ignore
//! let parameters = DeployConfig::load(None)?.parameters()?;
//! let plan = Plan::mawar(&parameters);
//! let contracts = Deployment::execute(&plan, &account, &workspace).await?;
//! contracts.write(Path::new("deployments"), chain_id, plan.module())?;
//! ```
pub mod abi;
pub mod config;
pub mod deployment;
pub mod plan;

pub use config::{DeployConfig, ParameterError, Parameters};
pub use deployment::{DeployedContracts, Deployment, Workspace};
pub use plan::{Arg, Call, ContractId, Plan, PlanError, Step};
