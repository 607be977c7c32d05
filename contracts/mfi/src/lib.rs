//! MFI, the Mawar Finance token.
//!
//! A plain ERC-20 with 18 decimals. The whole supply is minted once, to the
//! account that deploys the contract; from there it is seeded into the
//! exchange and circulates through purchases and vault deposits.
#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]

extern crate alloc;

use alloc::string::String;

use alloy_primitives::{aliases::B32, Address, U256, U8};
use openzeppelin_stylus::{
    token::erc20::{
        self,
        extensions::{Erc20Metadata, IErc20Metadata},
        Erc20, IErc20,
    },
    utils::introspection::erc165::IErc165,
};
use stylus_sdk::{prelude::*, tx};

/// Token name.
pub const NAME: &str = "Mawar Finance";
/// Token symbol.
pub const SYMBOL: &str = "MFI";

/// State of the MFI token.
#[entrypoint]
#[storage]
pub struct Mfi {
    erc20: Erc20,
    metadata: Erc20Metadata,
}

#[public]
#[implements(IErc20<Error = erc20::Error>, IErc20Metadata, IErc165)]
impl Mfi {
    /// Sets the metadata and mints `initial_supply` to the deploying account.
    ///
    /// # Errors
    ///
    /// * [`erc20::Error::InvalidReceiver`] - If the deployer can't be
    ///   resolved.
    #[constructor]
    #[allow(deprecated)]
    pub fn constructor(
        &mut self,
        initial_supply: U256,
    ) -> Result<(), erc20::Error> {
        // Constructors run inside the StylusDeployer call, so the sender is
        // the deployer contract and not the deploying account.
        self.init(tx::origin(), initial_supply)
    }
}

impl Mfi {
    /// Writes the token metadata and mints the genesis supply to `holder`.
    fn init(
        &mut self,
        holder: Address,
        initial_supply: U256,
    ) -> Result<(), erc20::Error> {
        self.metadata.constructor(NAME.into(), SYMBOL.into());
        self.erc20._mint(holder, initial_supply)
    }
}

#[public]
impl IErc20 for Mfi {
    type Error = erc20::Error;

    fn total_supply(&self) -> U256 {
        self.erc20.total_supply()
    }

    fn balance_of(&self, account: Address) -> U256 {
        self.erc20.balance_of(account)
    }

    fn transfer(
        &mut self,
        to: Address,
        value: U256,
    ) -> Result<bool, Self::Error> {
        self.erc20.transfer(to, value)
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.erc20.allowance(owner, spender)
    }

    fn approve(
        &mut self,
        spender: Address,
        value: U256,
    ) -> Result<bool, Self::Error> {
        self.erc20.approve(spender, value)
    }

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<bool, Self::Error> {
        self.erc20.transfer_from(from, to, value)
    }
}

#[public]
impl IErc20Metadata for Mfi {
    fn name(&self) -> String {
        self.metadata.name()
    }

    fn symbol(&self) -> String {
        self.metadata.symbol()
    }

    fn decimals(&self) -> U8 {
        self.metadata.decimals()
    }
}

#[public]
impl IErc165 for Mfi {
    fn supports_interface(&self, interface_id: B32) -> bool {
        self.erc20.supports_interface(interface_id)
            || self.metadata.supports_interface(interface_id)
    }
}
