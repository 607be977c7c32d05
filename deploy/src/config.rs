//! Deployment parameters and the `mawar.toml` file they are loaded from.
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use alloy::primitives::{address, uint, Address, U256};
use eyre::WrapErr;
use mawar_economics::{whole_tokens, BPS_DENOMINATOR};
use serde::Deserialize;

/// Default fee recipient of the vault.
pub const TREASURY: Address =
    address!("542bf9e46f15f534c8eaf58885663059359a8817");
/// Default vault fee, in basis points.
pub const FEE_BPS: u16 = 250;
/// Default MFI supply, `1_000_000e18`.
pub const INITIAL_SUPPLY: U256 =
    uint!(1_000_000_000_000_000_000_000_000_U256);
/// Default exchange rate, `300_000_000e18` MFI per ether.
pub const RATE: U256 = uint!(300_000_000_000_000_000_000_000_000_U256);
/// Default exchange inventory, `100_000e18`.
pub const SEED: U256 = uint!(100_000_000_000_000_000_000_000_U256);

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "mawar.toml";
/// Default directory deployment records are written to.
pub const DEFAULT_OUT_DIR: &str = "deployments";
/// Default directory holding the contract crates, relative to the workspace
/// root.
pub const DEFAULT_CONTRACTS_DIR: &str = "contracts";

/// Values the deployment plan is parameterized over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameters {
    /// Recipient of vault fees.
    pub treasury: Address,
    /// Vault fee rate, in basis points.
    pub fee_bps: u16,
    /// MFI minted to the deployer, in base units.
    pub initial_supply: U256,
    /// MFI base units per ether, scaled by `10^18`.
    pub rate: U256,
    /// MFI transferred to the exchange, in base units.
    pub seed: U256,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            treasury: TREASURY,
            fee_bps: FEE_BPS,
            initial_supply: INITIAL_SUPPLY,
            rate: RATE,
            seed: SEED,
        }
    }
}

impl Parameters {
    /// Rejects parameters the contracts would refuse at construction time,
    /// and a seed the deployer can't afford.
    ///
    /// # Errors
    ///
    /// The first [`ParameterError`] found.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.fee_bps > BPS_DENOMINATOR {
            return Err(ParameterError::InvalidFee { fee_bps: self.fee_bps });
        }
        if self.rate.is_zero() {
            return Err(ParameterError::ZeroRate);
        }
        if self.treasury.is_zero() {
            return Err(ParameterError::ZeroTreasury);
        }
        if self.seed > self.initial_supply {
            return Err(ParameterError::SeedExceedsSupply {
                seed: self.seed,
                supply: self.initial_supply,
            });
        }
        Ok(())
    }
}

/// Invalid deployment parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    /// Fee above 100%.
    #[error("fee of {fee_bps} bps exceeds {BPS_DENOMINATOR} bps")]
    InvalidFee {
        /// The rejected fee.
        fee_bps: u16,
    },
    /// The exchange would quote zero for every purchase.
    #[error("exchange rate must be positive")]
    ZeroRate,
    /// Fees would be sent to the zero address.
    #[error("treasury must not be the zero address")]
    ZeroTreasury,
    /// The exchange can't be seeded with more than the deployer holds.
    #[error("seed of {seed} exceeds the initial supply of {supply}")]
    SeedExceedsSupply {
        /// Requested seed.
        seed: U256,
        /// Initial supply.
        supply: U256,
    },
    /// A token amount that is not a whole number or overflows once scaled.
    #[error("`{field}` is not a valid token amount: {value}")]
    InvalidAmount {
        /// Configuration key.
        field: &'static str,
        /// Raw value.
        value: String,
    },
    /// A malformed address.
    #[error("`{field}` is not a valid address: {value}")]
    InvalidAddress {
        /// Configuration key.
        field: &'static str,
        /// Raw value.
        value: String,
    },
}

/// `[parameters]` table of `mawar.toml`.
///
/// Token amounts are whole tokens written as decimal strings, so that values
/// beyond `u64` survive TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawParameters {
    /// Fee recipient.
    pub treasury: Option<String>,
    /// Fee rate in basis points.
    pub fee_bps: Option<u16>,
    /// Whole MFI minted to the deployer.
    pub initial_supply: Option<String>,
    /// Whole MFI per ether.
    pub rate: Option<String>,
    /// Whole MFI transferred to the exchange.
    pub seed: Option<String>,
}

impl RawParameters {
    /// Applies the values present in the file on top of the defaults.
    ///
    /// # Errors
    ///
    /// * [`ParameterError::InvalidAddress`] - If `treasury` doesn't parse.
    /// * [`ParameterError::InvalidAmount`] - If an amount doesn't parse or
    ///   overflows once scaled to base units.
    pub fn resolve(&self) -> Result<Parameters, ParameterError> {
        let mut parameters = Parameters::default();

        if let Some(treasury) = &self.treasury {
            parameters.treasury = Address::from_str(treasury).map_err(|_| {
                ParameterError::InvalidAddress {
                    field: "treasury",
                    value: treasury.clone(),
                }
            })?;
        }
        if let Some(fee_bps) = self.fee_bps {
            parameters.fee_bps = fee_bps;
        }
        if let Some(supply) = &self.initial_supply {
            parameters.initial_supply = tokens("initial_supply", supply)?;
        }
        if let Some(rate) = &self.rate {
            parameters.rate = tokens("rate", rate)?;
        }
        if let Some(seed) = &self.seed {
            parameters.seed = tokens("seed", seed)?;
        }

        Ok(parameters)
    }
}

fn tokens(field: &'static str, value: &str) -> Result<U256, ParameterError> {
    let invalid =
        || ParameterError::InvalidAmount { field, value: value.to_owned() };
    let whole = U256::from_str_radix(value.trim().replace('_', "").as_str(), 10)
        .map_err(|_| invalid())?;
    whole_tokens(whole).ok_or_else(invalid)
}

/// Contents of `mawar.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Option<String>,
    /// Directory holding the contract crates.
    pub contracts_dir: Option<PathBuf>,
    /// Directory deployment records are written to.
    pub out_dir: Option<PathBuf>,
    /// Plan parameters.
    #[serde(default)]
    pub parameters: RawParameters,
}

impl DeployConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// If the document is not valid TOML or has unknown keys.
    pub fn from_toml(document: &str) -> eyre::Result<Self> {
        toml::from_str(document).wrap_err("failed to parse deployment config")
    }

    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if it exists when no path is
    /// given. Without a file every value takes its default.
    ///
    /// # Errors
    ///
    /// If an explicitly requested file can't be read, or the file can't be
    /// parsed.
    pub fn load(path: Option<&Path>) -> eyre::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    tracing::debug!("no config file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let document = std::fs::read_to_string(&path).wrap_err(format!(
            "failed to read config file {}",
            path.display()
        ))?;
        let config = Self::from_toml(&document)
            .wrap_err(format!("invalid config file {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Resolved and validated plan parameters.
    ///
    /// # Errors
    ///
    /// See [`RawParameters::resolve`] and [`Parameters::validate`].
    pub fn parameters(&self) -> Result<Parameters, ParameterError> {
        let parameters = self.parameters.resolve()?;
        parameters.validate()?;
        Ok(parameters)
    }
}
