//! Fixed-rate sale of MFI for the chain's native currency.
//!
//! The exchange sells from its own MFI inventory, seeded right after
//! deployment. A purchase of `value` wei yields
//! `floor(value * rate / 10^18)` MFI base units. Collected native currency
//! stays in the contract until the owner withdraws it.
#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]

extern crate alloc;

use alloy_primitives::{Address, U256};
use mawar_economics as economics;
use openzeppelin_stylus::{
    access::ownable::{self, IOwnable, Ownable},
    token::erc20::utils::safe_erc20::{self, ISafeErc20, SafeErc20},
};
pub use sol::*;
use stylus_sdk::{
    call::{call, Call},
    contract, evm, msg,
    prelude::*,
    storage::{StorageAddress, StorageU256},
    tx,
};

use crate::token::MfiInterface;

mod token {
    #![allow(missing_docs)]

    use stylus_sdk::prelude::sol_interface;

    sol_interface! {
        interface MfiInterface {
            function balanceOf(address account) external view returns (uint256);
        }
    }
}

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when `buyer` pays `value` wei for `amount` MFI delivered
        /// to `recipient`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event Purchased(
            address indexed buyer,
            address indexed recipient,
            uint256 value,
            uint256 amount
        );

        /// Emitted when the owner withdraws `amount` wei to `to`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event Withdrawn(address indexed to, uint256 amount);
    }

    sol! {
        /// The token address is not valid (eg. `Address::ZERO`).
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeInvalidToken(address token);

        /// The exchange rate must be non-zero.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeInvalidRate(uint256 rate);

        /// The recipient is not valid (eg. `Address::ZERO`).
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeInvalidRecipient(address recipient);

        /// A purchase must pay a non-zero amount.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeZeroValue();

        /// The payment is too small to buy a single base unit, or too large
        /// to be quoted.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeInvalidQuote(uint256 value);

        /// The exchange holds fewer tokens than the purchase requires.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeInsufficientInventory(uint256 requested, uint256 available);

        /// A call to the token contract failed.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeTokenCallFailed(address token);

        /// Sending native currency failed.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error ExchangeWithdrawFailed(address to, uint256 amount);
    }
}

/// An error that occurred in the [`Exchange`] contract.
#[derive(SolidityError, Debug)]
pub enum Error {
    /// The token address is not valid.
    InvalidToken(ExchangeInvalidToken),
    /// The exchange rate must be non-zero.
    InvalidRate(ExchangeInvalidRate),
    /// The recipient is not valid.
    InvalidRecipient(ExchangeInvalidRecipient),
    /// A purchase must pay a non-zero amount.
    ZeroValue(ExchangeZeroValue),
    /// The payment can't be converted into a positive token amount.
    InvalidQuote(ExchangeInvalidQuote),
    /// Not enough inventory to fill the purchase.
    InsufficientInventory(ExchangeInsufficientInventory),
    /// A call to the token contract failed.
    TokenCallFailed(ExchangeTokenCallFailed),
    /// Sending native currency failed.
    WithdrawFailed(ExchangeWithdrawFailed),
    /// Transferring MFI to the buyer failed.
    SafeErc20(safe_erc20::Error),
    /// Error from the ownership module.
    Ownable(ownable::Error),
}

/// State of the exchange.
#[entrypoint]
#[storage]
pub struct Exchange {
    token: StorageAddress,
    rate: StorageU256,
    ownable: Ownable,
    safe_erc20: SafeErc20,
}

#[public]
#[implements(IOwnable<Error = ownable::Error>)]
impl Exchange {
    /// Binds the exchange to `token` at a fixed `rate`, making the deploying
    /// account the owner.
    ///
    /// `rate` is the number of token base units per whole native unit,
    /// scaled by `10^18`.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidToken`] - If `token` is `Address::ZERO`.
    /// * [`Error::InvalidRate`] - If `rate` is zero.
    #[constructor]
    #[allow(deprecated)]
    pub fn constructor(
        &mut self,
        token: Address,
        rate: U256,
    ) -> Result<(), Error> {
        // Constructors run inside the StylusDeployer call, so the sender is
        // the deployer contract and not the deploying account.
        self.init(tx::origin(), token, rate)
    }

    /// Sells MFI for the attached native currency and delivers it to
    /// `recipient`. Returns the amount delivered.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidRecipient`] - If `recipient` is `Address::ZERO`.
    /// * [`Error::ZeroValue`] - If no native currency is attached.
    /// * [`Error::InvalidQuote`] - If the quote is zero or overflows.
    /// * [`Error::InsufficientInventory`] - If the exchange holds less than
    ///   the quote.
    /// * [`Error::TokenCallFailed`] - If the inventory can't be read.
    /// * [`Error::SafeErc20`] - If the token transfer fails.
    ///
    /// # Events
    ///
    /// * [`Purchased`].
    #[payable]
    #[selector(name = "buyMFI")]
    pub fn buy_mfi(&mut self, recipient: Address) -> Result<U256, Error> {
        if recipient.is_zero() {
            return Err(Error::InvalidRecipient(ExchangeInvalidRecipient {
                recipient,
            }));
        }

        let value = msg::value();
        if value.is_zero() {
            return Err(Error::ZeroValue(ExchangeZeroValue {}));
        }

        let amount = self.quote(value)?;

        let token = self.token.get();
        let available = MfiInterface::new(token)
            .balance_of(Call::new_in(self), contract::address())
            .map_err(|_| ExchangeTokenCallFailed { token })?;
        if amount > available {
            return Err(Error::InsufficientInventory(
                ExchangeInsufficientInventory { requested: amount, available },
            ));
        }

        self.safe_erc20.safe_transfer(token, recipient, amount)?;

        evm::log(Purchased { buyer: msg::sender(), recipient, value, amount });
        Ok(amount)
    }

    /// MFI base units bought by paying `value` wei.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidQuote`] - If the quote is zero or overflows.
    pub fn quote(&self, value: U256) -> Result<U256, Error> {
        economics::quote(value, self.rate.get())
            .filter(|amount| !amount.is_zero())
            .ok_or(Error::InvalidQuote(ExchangeInvalidQuote { value }))
    }

    /// Sends the collected native currency to `to`. Owner only.
    ///
    /// # Errors
    ///
    /// * [`Error::Ownable`] - If the caller is not the owner.
    /// * [`Error::InvalidRecipient`] - If `to` is `Address::ZERO`.
    /// * [`Error::WithdrawFailed`] - If the transfer fails.
    ///
    /// # Events
    ///
    /// * [`Withdrawn`].
    pub fn withdraw(&mut self, to: Address) -> Result<(), Error> {
        self.ownable.only_owner()?;

        if to.is_zero() {
            return Err(Error::InvalidRecipient(ExchangeInvalidRecipient {
                recipient: to,
            }));
        }

        let amount = contract::balance();
        call(Call::new_in(self).value(amount), to, &[])
            .map_err(|_| ExchangeWithdrawFailed { to, amount })?;

        evm::log(Withdrawn { to, amount });
        Ok(())
    }

    /// The token sold by the exchange.
    pub fn token(&self) -> Address {
        self.token.get()
    }

    /// Token base units per whole native unit, scaled by `10^18`.
    pub fn rate(&self) -> U256 {
        self.rate.get()
    }
}

impl Exchange {
    fn init(
        &mut self,
        owner: Address,
        token: Address,
        rate: U256,
    ) -> Result<(), Error> {
        if token.is_zero() {
            return Err(Error::InvalidToken(ExchangeInvalidToken { token }));
        }
        if rate.is_zero() {
            return Err(Error::InvalidRate(ExchangeInvalidRate { rate }));
        }

        self.ownable.constructor(owner)?;
        self.token.set(token);
        self.rate.set(rate);
        Ok(())
    }
}

#[public]
impl IOwnable for Exchange {
    type Error = ownable::Error;

    fn owner(&self) -> Address {
        self.ownable.owner()
    }

    fn transfer_ownership(
        &mut self,
        new_owner: Address,
    ) -> Result<(), Self::Error> {
        self.ownable.transfer_ownership(new_owner)
    }

    fn renounce_ownership(&mut self) -> Result<(), Self::Error> {
        self.ownable.renounce_ownership()
    }
}
