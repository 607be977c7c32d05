//! Declarative deployment plan.
//!
//! A [`Plan`] is an ordered list of [`Step`]s: contract deployments and the
//! follow-up calls that wire the contracts together. Arguments may refer to
//! other contracts of the plan, so the order of steps is a dependency order
//! that [`Plan::validate`] checks before anything is sent to the network.
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use alloy::primitives::{Address, U256};

use crate::config::Parameters;

/// Name of the deployment module, used to key persisted addresses.
pub const MODULE: &str = "MawarFinanceModule";

/// A contract of the Mawar Finance system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContractId {
    /// The MFI token.
    Mfi,
    /// Receipt NFTs for vault positions.
    SavingsNft,
    /// The savings vault.
    SavingsVault,
    /// The fixed-rate exchange.
    Exchange,
}

impl ContractId {
    /// Every contract, in canonical deployment order.
    pub const ALL: [ContractId; 4] = [
        ContractId::Mfi,
        ContractId::SavingsNft,
        ContractId::SavingsVault,
        ContractId::Exchange,
    ];

    /// Artifact name, as used in persisted deployment records.
    #[must_use]
    pub fn artifact(self) -> &'static str {
        match self {
            ContractId::Mfi => "MFI",
            ContractId::SavingsNft => "SavingsNFT",
            ContractId::SavingsVault => "SavingsVault",
            ContractId::Exchange => "Exchange",
        }
    }

    /// Directory of the contract's crate, relative to the contracts root.
    #[must_use]
    pub fn package(self) -> &'static str {
        match self {
            ContractId::Mfi => "mfi",
            ContractId::SavingsNft => "savings-nft",
            ContractId::SavingsVault => "savings-vault",
            ContractId::Exchange => "exchange",
        }
    }

    /// Solidity types of the constructor parameters, in order.
    #[must_use]
    pub fn constructor_types(self) -> &'static [&'static str] {
        match self {
            ContractId::Mfi => &["uint256"],
            ContractId::SavingsNft => &[],
            ContractId::SavingsVault => {
                &["address", "address", "address", "uint16"]
            }
            ContractId::Exchange => &["address", "uint256"],
        }
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.artifact())
    }
}

/// A constructor or call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// The address of a contract deployed by an earlier step.
    Contract(ContractId),
    /// A literal address.
    Address(Address),
    /// A `uint256`.
    Uint(U256),
    /// A `uint16`.
    Uint16(u16),
}

impl Arg {
    /// Solidity type of the argument.
    #[must_use]
    pub fn abi_type(&self) -> &'static str {
        match self {
            Arg::Contract(_) | Arg::Address(_) => "address",
            Arg::Uint(_) => "uint256",
            Arg::Uint16(_) => "uint16",
        }
    }

    /// The contract this argument refers to, if any.
    #[must_use]
    pub fn contract(&self) -> Option<ContractId> {
        match self {
            Arg::Contract(id) => Some(*id),
            _ => None,
        }
    }

    /// Resolves an address-typed argument against already deployed
    /// contracts.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::NotDeployed`] - If the referenced contract has no
    ///   address yet.
    /// * [`ResolveError::NotAnAddress`] - If the argument is a number.
    pub fn address(
        &self,
        lookup: impl Fn(ContractId) -> Option<Address>,
    ) -> Result<Address, ResolveError> {
        match self {
            Arg::Contract(id) => {
                lookup(*id).ok_or(ResolveError::NotDeployed(*id))
            }
            Arg::Address(address) => Ok(*address),
            Arg::Uint(_) | Arg::Uint16(_) => Err(ResolveError::NotAnAddress),
        }
    }

    /// The numeric value of the argument.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::NotANumber`] - If the argument is an address.
    pub fn uint(&self) -> Result<U256, ResolveError> {
        match self {
            Arg::Uint(value) => Ok(*value),
            Arg::Uint16(value) => Ok(U256::from(*value)),
            Arg::Contract(_) | Arg::Address(_) => Err(ResolveError::NotANumber),
        }
    }

    /// Stringifies the argument the way `cargo stylus` parses constructor
    /// arguments.
    ///
    /// # Errors
    ///
    /// * [`ResolveError::NotDeployed`] - If the referenced contract has no
    ///   address yet.
    pub fn encode(
        &self,
        lookup: impl Fn(ContractId) -> Option<Address>,
    ) -> Result<String, ResolveError> {
        Ok(match self {
            Arg::Contract(_) | Arg::Address(_) => {
                self.address(lookup)?.to_string()
            }
            Arg::Uint(value) => value.to_string(),
            Arg::Uint16(value) => value.to_string(),
        })
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Contract(id) => write!(f, "{id}"),
            Arg::Address(address) => write!(f, "{address}"),
            Arg::Uint(value) => write!(f, "{value}"),
            Arg::Uint16(value) => write!(f, "{value}"),
        }
    }
}

/// Failure to turn an [`Arg`] into a concrete value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The referenced contract has not been deployed.
    #[error("{0} is not deployed yet")]
    NotDeployed(ContractId),
    /// An address was expected.
    #[error("expected an address")]
    NotAnAddress,
    /// A number was expected.
    #[error("expected a number")]
    NotANumber,
}

/// A post-deployment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `SavingsNFT.setVaultOnce(vault)`.
    SetVaultOnce {
        /// The vault allowed to mint and burn receipts.
        vault: Arg,
    },
    /// `MFI.transfer(to, amount)`.
    Transfer {
        /// Recipient.
        to: Arg,
        /// Amount in base units.
        amount: Arg,
    },
}

impl Call {
    /// Solidity function name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Call::SetVaultOnce { .. } => "setVaultOnce",
            Call::Transfer { .. } => "transfer",
        }
    }

    /// The only contract exposing this call.
    #[must_use]
    pub fn target(&self) -> ContractId {
        match self {
            Call::SetVaultOnce { .. } => ContractId::SavingsNft,
            Call::Transfer { .. } => ContractId::Mfi,
        }
    }

    /// Arguments in call order.
    #[must_use]
    pub fn args(&self) -> Vec<&Arg> {
        match self {
            Call::SetVaultOnce { vault } => vec![vault],
            Call::Transfer { to, amount } => vec![to, amount],
        }
    }

    fn check_types(&self) -> Result<(), ResolveError> {
        let any_address = |_: ContractId| Some(Address::ZERO);
        match self {
            Call::SetVaultOnce { vault } => vault.address(any_address).map(drop),
            Call::Transfer { to, amount } => {
                to.address(any_address)?;
                amount.uint().map(drop)
            }
        }
    }
}

/// One step of a [`Plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deploy `contract` with constructor `args`.
    Deploy {
        /// The contract to deploy.
        contract: ContractId,
        /// Constructor arguments.
        args: Vec<Arg>,
    },
    /// Send `call` to the already deployed `target`.
    Invoke {
        /// The contract receiving the call.
        target: ContractId,
        /// The call.
        call: Call,
    },
}

impl Step {
    /// Every contract that must already be deployed for this step to run:
    /// those referenced by its arguments and, for calls, the target.
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<ContractId> {
        match self {
            Step::Deploy { args, .. } => {
                args.iter().filter_map(Arg::contract).collect()
            }
            Step::Invoke { target, call } => call
                .args()
                .into_iter()
                .filter_map(Arg::contract)
                .chain([*target])
                .collect(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (head, args) = match self {
            Step::Deploy { contract, args } => {
                (format!("deploy {contract}"), args.iter().collect())
            }
            Step::Invoke { target, call } => {
                (format!("{target}.{}", call.name()), call.args())
            }
        };
        let args =
            args.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        write!(f, "{head}({args})")
    }
}

/// A plan that can't be executed. Steps are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// A contract is deployed by more than one step.
    #[error("step {step}: {contract} is already deployed by step {first}")]
    DuplicateDeployment {
        /// The offending step.
        step: usize,
        /// The step that first deployed the contract.
        first: usize,
        /// The contract.
        contract: ContractId,
    },
    /// A deployment passes its own address to its constructor.
    #[error("step {step}: {contract} can't reference itself")]
    SelfReference {
        /// The offending step.
        step: usize,
        /// The contract.
        contract: ContractId,
    },
    /// A step needs a contract that no earlier step deploys.
    #[error("step {step}: {missing} is not deployed by an earlier step")]
    OutOfOrder {
        /// The offending step.
        step: usize,
        /// The contract that is missing at this point.
        missing: ContractId,
    },
    /// A call is sent to a contract that doesn't expose it.
    #[error("step {step}: {target} has no `{call}` function")]
    UnsupportedCall {
        /// The offending step.
        step: usize,
        /// The contract receiving the call.
        target: ContractId,
        /// The call name.
        call: &'static str,
    },
    /// Constructor arguments don't match the contract's constructor.
    #[error(
        "step {step}: {contract} expects constructor({}), got ({})",
        .expected.join(","),
        .got.join(",")
    )]
    InvalidConstructor {
        /// The offending step.
        step: usize,
        /// The contract being deployed.
        contract: ContractId,
        /// Parameter types of the constructor.
        expected: &'static [&'static str],
        /// Types of the given arguments.
        got: Vec<&'static str>,
    },
    /// A call argument has the wrong type.
    #[error("step {step}: invalid argument to `{call}`: {source}")]
    InvalidArgument {
        /// The offending step.
        step: usize,
        /// The call name.
        call: &'static str,
        /// What is wrong with the argument.
        source: ResolveError,
    },
}

/// An ordered list of deployment steps under a module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    module: String,
    steps: Vec<Step>,
}

impl Plan {
    /// A plan of `steps` under `module`. Not validated.
    #[must_use]
    pub fn new(module: impl Into<String>, steps: Vec<Step>) -> Self {
        Self { module: module.into(), steps }
    }

    /// The Mawar Finance deployment:
    ///
    /// 1. MFI with the initial supply;
    /// 2. SavingsNFT;
    /// 3. SavingsVault bound to MFI, SavingsNFT, the treasury and the fee;
    /// 4. `SavingsNFT.setVaultOnce(SavingsVault)`;
    /// 5. Exchange bound to MFI at the exchange rate;
    /// 6. `MFI.transfer(Exchange, seed)`.
    #[must_use]
    pub fn mawar(parameters: &Parameters) -> Self {
        use ContractId::{Exchange, Mfi, SavingsNft, SavingsVault};

        Self::new(
            MODULE,
            vec![
                Step::Deploy {
                    contract: Mfi,
                    args: vec![Arg::Uint(parameters.initial_supply)],
                },
                Step::Deploy { contract: SavingsNft, args: vec![] },
                Step::Deploy {
                    contract: SavingsVault,
                    args: vec![
                        Arg::Contract(Mfi),
                        Arg::Contract(SavingsNft),
                        Arg::Address(parameters.treasury),
                        Arg::Uint16(parameters.fee_bps),
                    ],
                },
                Step::Invoke {
                    target: SavingsNft,
                    call: Call::SetVaultOnce {
                        vault: Arg::Contract(SavingsVault),
                    },
                },
                Step::Deploy {
                    contract: Exchange,
                    args: vec![
                        Arg::Contract(Mfi),
                        Arg::Uint(parameters.rate),
                    ],
                },
                Step::Invoke {
                    target: Mfi,
                    call: Call::Transfer {
                        to: Arg::Contract(Exchange),
                        amount: Arg::Uint(parameters.seed),
                    },
                },
            ],
        )
    }

    /// Module name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Checks that every step only depends on contracts deployed by earlier
    /// steps, that no contract is deployed twice, that constructor arguments
    /// match each contract's constructor, and that calls target the contract
    /// exposing them with well-typed arguments.
    ///
    /// # Errors
    ///
    /// The first [`PlanError`] found, walking the steps in order.
    pub fn validate(&self) -> Result<(), PlanError> {
        // contract -> number of the step deploying it
        let mut deployed = BTreeMap::new();

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;

            if let Step::Invoke { target, call } = step {
                if call.target() != *target {
                    return Err(PlanError::UnsupportedCall {
                        step: number,
                        target: *target,
                        call: call.name(),
                    });
                }
                call.check_types().map_err(|source| {
                    PlanError::InvalidArgument {
                        step: number,
                        call: call.name(),
                        source,
                    }
                })?;
            }

            for dependency in step.dependencies() {
                if let Step::Deploy { contract, .. } = step {
                    if *contract == dependency {
                        return Err(PlanError::SelfReference {
                            step: number,
                            contract: dependency,
                        });
                    }
                }
                if !deployed.contains_key(&dependency) {
                    return Err(PlanError::OutOfOrder {
                        step: number,
                        missing: dependency,
                    });
                }
            }

            if let Step::Deploy { contract, args } = step {
                let expected = contract.constructor_types();
                let got: Vec<_> = args.iter().map(Arg::abi_type).collect();
                if got != expected {
                    return Err(PlanError::InvalidConstructor {
                        step: number,
                        contract: *contract,
                        expected,
                        got,
                    });
                }

                if let Some(first) = deployed.insert(*contract, number) {
                    return Err(PlanError::DuplicateDeployment {
                        step: number,
                        first,
                        contract: *contract,
                    });
                }
            }
        }

        Ok(())
    }

    /// Contracts deployed by the plan, in deployment order.
    #[must_use]
    pub fn deployed(&self) -> Vec<ContractId> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Deploy { contract, .. } => Some(*contract),
                Step::Invoke { .. } => None,
            })
            .collect()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.module)?;
        for (index, step) in self.steps.iter().enumerate() {
            writeln!(f, "  {}. {step}", index + 1)?;
        }
        Ok(())
    }
}
