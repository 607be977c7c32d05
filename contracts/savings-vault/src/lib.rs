//! Savings vault for MFI.
//!
//! A deposit pulls MFI from the caller and mints a receipt NFT that
//! represents the position. Redeeming the receipt burns it and returns the
//! principal minus a fixed fee, which goes to the treasury:
//!
//! ```text
//! fee    = floor(principal * fee_bps / 10000)
//! payout = principal - fee
//! ```
//!
//! The vault must be bound on the receipt collection (`setVaultOnce`) before
//! the first deposit.
#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]

extern crate alloc;

use alloy_primitives::{Address, U16, U256};
use mawar_economics::{ensure_fee_rate, FeeSplit};
use openzeppelin_stylus::token::erc20::utils::safe_erc20::{
    self, ISafeErc20, SafeErc20,
};
pub use sol::*;
use stylus_sdk::{
    call::Call,
    contract, evm, msg,
    prelude::*,
    storage::{StorageAddress, StorageMap, StorageU16, StorageU256},
};

use crate::receipt::SavingsNftInterface;

mod receipt {
    #![allow(missing_docs)]

    use stylus_sdk::prelude::sol_interface;

    sol_interface! {
        interface SavingsNftInterface {
            function mint(address to) external returns (uint256);
            function burn(uint256 tokenId) external;
            function ownerOf(uint256 tokenId) external view returns (address);
        }
    }
}

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when `owner` opens the position `token_id` with `amount`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event Deposited(
            address indexed owner,
            uint256 indexed token_id,
            uint256 amount
        );

        /// Emitted when `owner` closes the position `token_id`.
        ///
        /// * `principal` - Amount originally deposited.
        /// * `fee` - Amount sent to the treasury.
        /// * `payout` - Amount returned to `owner`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event Redeemed(
            address indexed owner,
            uint256 indexed token_id,
            uint256 principal,
            uint256 fee,
            uint256 payout
        );
    }

    sol! {
        /// The fee rate exceeds 10000 basis points.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultInvalidFee(uint16 fee_bps);

        /// A configured address is not valid (eg. `Address::ZERO`).
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultInvalidAddress(address account);

        /// Deposits must be non-zero.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultZeroAmount();

        /// No open position exists for `token_id`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultNonexistentPosition(uint256 token_id);

        /// `caller` does not own the receipt `token_id`.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultNotPositionOwner(address caller, uint256 token_id);

        /// A call to the receipt collection failed.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultReceiptCallFailed(address nft);
    }
}

/// An error that occurred in the [`SavingsVault`] contract.
#[derive(SolidityError, Debug)]
pub enum Error {
    /// The fee rate exceeds 10000 basis points.
    InvalidFee(VaultInvalidFee),
    /// A configured address is not valid.
    InvalidAddress(VaultInvalidAddress),
    /// Deposits must be non-zero.
    ZeroAmount(VaultZeroAmount),
    /// No open position exists for the id.
    NonexistentPosition(VaultNonexistentPosition),
    /// The caller does not own the receipt.
    NotPositionOwner(VaultNotPositionOwner),
    /// A call to the receipt collection failed.
    ReceiptCallFailed(VaultReceiptCallFailed),
    /// Moving MFI in or out of the vault failed.
    SafeErc20(safe_erc20::Error),
}

/// State of the savings vault.
#[entrypoint]
#[storage]
pub struct SavingsVault {
    token: StorageAddress,
    nft: StorageAddress,
    treasury: StorageAddress,
    fee_bps: StorageU16,
    principals: StorageMap<U256, StorageU256>,
    safe_erc20: SafeErc20,
}

#[public]
impl SavingsVault {
    /// Binds the vault to its token, receipt collection, treasury and fee.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidAddress`] - If any address is `Address::ZERO`.
    /// * [`Error::InvalidFee`] - If `fee_bps` exceeds 10000.
    #[constructor]
    pub fn constructor(
        &mut self,
        token: Address,
        nft: Address,
        treasury: Address,
        fee_bps: u16,
    ) -> Result<(), Error> {
        for account in [token, nft, treasury] {
            if account.is_zero() {
                return Err(Error::InvalidAddress(VaultInvalidAddress {
                    account,
                }));
            }
        }
        ensure_fee_rate(fee_bps)
            .map_err(|e| VaultInvalidFee { fee_bps: e.fee_bps })?;

        self.token.set(token);
        self.nft.set(nft);
        self.treasury.set(treasury);
        self.fee_bps.set(U16::from(fee_bps));
        Ok(())
    }

    /// Opens a position of `amount` MFI for the caller and returns the id of
    /// the receipt minted for it.
    ///
    /// The caller must have approved the vault for `amount` beforehand.
    ///
    /// # Errors
    ///
    /// * [`Error::ZeroAmount`] - If `amount` is zero.
    /// * [`Error::SafeErc20`] - If the token transfer fails.
    /// * [`Error::ReceiptCallFailed`] - If minting the receipt fails. The
    ///   NFT's own revert reason is not forwarded, so an unbound vault
    ///   (`CallerNotVault` on the NFT) surfaces as this error too.
    ///
    /// # Events
    ///
    /// * [`Deposited`].
    pub fn deposit(&mut self, amount: U256) -> Result<U256, Error> {
        if amount.is_zero() {
            return Err(Error::ZeroAmount(VaultZeroAmount {}));
        }

        let owner = msg::sender();
        let token = self.token.get();
        self.safe_erc20.safe_transfer_from(
            token,
            owner,
            contract::address(),
            amount,
        )?;

        let nft = self.nft.get();
        let token_id = SavingsNftInterface::new(nft)
            .mint(Call::new_in(self), owner)
            .map_err(|_| receipt_call_failed(nft))?;

        self.principals.setter(token_id).set(amount);

        evm::log(Deposited { owner, token_id, amount });
        Ok(token_id)
    }

    /// Returns `(principal, fee, payout)` for the open position `token_id`.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentPosition`] - If no position is open for
    ///   `token_id`.
    #[selector(name = "previewRedeem")]
    pub fn preview_redeem(
        &self,
        token_id: U256,
    ) -> Result<(U256, U256, U256), Error> {
        let split = self.split(token_id)?;
        Ok((split.principal, split.fee, split.payout))
    }

    /// Closes the position `token_id`: burns its receipt, pays the payout to
    /// the caller and the fee to the treasury.
    ///
    /// # Errors
    ///
    /// * [`Error::NonexistentPosition`] - If no position is open for
    ///   `token_id`.
    /// * [`Error::NotPositionOwner`] - If the caller does not hold the
    ///   receipt.
    /// * [`Error::ReceiptCallFailed`] - If reading or burning the receipt
    ///   fails. The NFT's own revert reason is not forwarded.
    /// * [`Error::SafeErc20`] - If a token transfer fails.
    ///
    /// # Events
    ///
    /// * [`Redeemed`].
    pub fn redeem(&mut self, token_id: U256) -> Result<(), Error> {
        let split = self.split(token_id)?;

        let caller = msg::sender();
        let nft = self.nft.get();
        let receipts = SavingsNftInterface::new(nft);
        let owner = receipts
            .owner_of(Call::new_in(self), token_id)
            .map_err(|_| receipt_call_failed(nft))?;
        if owner != caller {
            return Err(Error::NotPositionOwner(VaultNotPositionOwner {
                caller,
                token_id,
            }));
        }

        self.principals.delete(token_id);
        receipts
            .burn(Call::new_in(self), token_id)
            .map_err(|_| receipt_call_failed(nft))?;

        let token = self.token.get();
        self.safe_erc20.safe_transfer(token, owner, split.payout)?;
        if !split.fee.is_zero() {
            let treasury = self.treasury.get();
            self.safe_erc20.safe_transfer(token, treasury, split.fee)?;
        }

        evm::log(Redeemed {
            owner,
            token_id,
            principal: split.principal,
            fee: split.fee,
            payout: split.payout,
        });
        Ok(())
    }

    /// The MFI token held by the vault.
    pub fn token(&self) -> Address {
        self.token.get()
    }

    /// The receipt collection.
    pub fn nft(&self) -> Address {
        self.nft.get()
    }

    /// The account receiving redemption fees.
    pub fn treasury(&self) -> Address {
        self.treasury.get()
    }

    /// Redemption fee in basis points.
    #[selector(name = "feeBps")]
    pub fn fee_bps(&self) -> u16 {
        self.fee_bps.get().to::<u16>()
    }

    /// Principal of the position `token_id`, zero when none is open.
    #[selector(name = "principalOf")]
    pub fn principal_of(&self, token_id: U256) -> U256 {
        self.principals.get(token_id)
    }
}

impl SavingsVault {
    fn split(&self, token_id: U256) -> Result<FeeSplit, Error> {
        let principal = self.principals.get(token_id);
        if principal.is_zero() {
            return Err(Error::NonexistentPosition(VaultNonexistentPosition {
                token_id,
            }));
        }

        let fee_bps = self.fee_bps();
        Ok(FeeSplit::new(principal, fee_bps)
            .map_err(|e| VaultInvalidFee { fee_bps: e.fee_bps })?)
    }
}

fn receipt_call_failed(nft: Address) -> Error {
    Error::ReceiptCallFailed(VaultReceiptCallFailed { nft })
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{uint, Address, U256};
    use motsu::prelude::*;
    use openzeppelin_stylus::token::{
        erc20::{Erc20, IErc20},
        erc721::{self, Erc721, IErc721},
    };
    use stylus_sdk::storage::StorageU256;

    use super::*;

    const FEE_BPS: u16 = 250;
    const PRINCIPAL: U256 = uint!(30_000_000_000_000_000_000_U256);
    const BALANCE: U256 = uint!(100_000_000_000_000_000_000_U256);

    /// Receipt collection without the vault binding.
    #[storage]
    struct ReceiptMock {
        erc721: Erc721,
        total_minted: StorageU256,
    }

    unsafe impl TopLevelStorage for ReceiptMock {}

    #[public]
    impl ReceiptMock {
        fn mint(&mut self, to: Address) -> Result<U256, erc721::Error> {
            let token_id = self.total_minted.get() + U256::ONE;
            self.total_minted.set(token_id);
            self.erc721._mint(to, token_id)?;
            Ok(token_id)
        }

        fn burn(&mut self, token_id: U256) -> Result<(), erc721::Error> {
            self.erc721._burn(token_id)
        }

        #[selector(name = "ownerOf")]
        fn owner_of(&self, token_id: U256) -> Result<Address, erc721::Error> {
            self.erc721.owner_of(token_id)
        }
    }

    fn setup(
        vault: &Contract<SavingsVault>,
        token: &Contract<Erc20>,
        nft: &Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        vault
            .sender(alice)
            .constructor(token.address(), nft.address(), treasury, FEE_BPS)
            .motsu_expect("should construct");
        token
            .sender(alice)
            ._mint(alice, BALANCE)
            .motsu_expect("should mint tokens");
        token
            .sender(alice)
            .approve(vault.address(), PRINCIPAL)
            .motsu_expect("should approve vault");
    }

    #[motsu::test]
    fn constructs(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        vault
            .sender(alice)
            .constructor(token.address(), nft.address(), treasury, FEE_BPS)
            .motsu_expect("should construct");

        assert_eq!(token.address(), vault.sender(alice).token());
        assert_eq!(nft.address(), vault.sender(alice).nft());
        assert_eq!(treasury, vault.sender(alice).treasury());
        assert_eq!(FEE_BPS, vault.sender(alice).fee_bps());
    }

    #[motsu::test]
    fn constructor_reverts_when_fee_exceeds_denominator(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        let err = vault
            .sender(alice)
            .constructor(token.address(), nft.address(), treasury, 10_001)
            .motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidFee(VaultInvalidFee { fee_bps }) if fee_bps == 10_001
        ));
    }

    #[motsu::test]
    fn constructor_reverts_when_treasury_is_zero(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        alice: Address,
    ) {
        let err = vault
            .sender(alice)
            .constructor(token.address(), nft.address(), Address::ZERO, FEE_BPS)
            .motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidAddress(VaultInvalidAddress { account })
                if account.is_zero()
        ));
    }

    #[motsu::test]
    fn deposits(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);

        let token_id =
            vault.sender(alice).deposit(PRINCIPAL).motsu_expect("should deposit");

        assert_eq!(U256::ONE, token_id);
        assert_eq!(PRINCIPAL, vault.sender(alice).principal_of(token_id));
        assert_eq!(PRINCIPAL, token.sender(alice).balance_of(vault.address()));
        assert_eq!(BALANCE - PRINCIPAL, token.sender(alice).balance_of(alice));
        assert_eq!(alice, nft.sender(alice).owner_of(token_id).motsu_unwrap());

        vault.assert_emitted(&Deposited {
            owner: alice,
            token_id,
            amount: PRINCIPAL,
        });
    }

    #[motsu::test]
    fn deposit_reverts_when_amount_is_zero(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);

        let err = vault.sender(alice).deposit(U256::ZERO).motsu_unwrap_err();

        assert!(matches!(err, Error::ZeroAmount(_)));
        assert_eq!(BALANCE, token.sender(alice).balance_of(alice));
    }

    #[motsu::test]
    fn deposit_reverts_without_allowance(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);

        let err = vault
            .sender(alice)
            .deposit(PRINCIPAL + U256::ONE)
            .motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::SafeErc20(safe_erc20::Error::SafeErc20FailedOperation(
                safe_erc20::SafeErc20FailedOperation { token: failed }
            )) if failed == token.address()
        ));
    }

    #[motsu::test]
    fn previews_fee_split(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);
        let token_id = vault.sender(alice).deposit(PRINCIPAL).motsu_unwrap();

        let (principal, fee, payout) =
            vault.sender(alice).preview_redeem(token_id).motsu_unwrap();

        assert_eq!(PRINCIPAL, principal);
        assert_eq!(principal * U256::from(FEE_BPS) / uint!(10_000_U256), fee);
        assert_eq!(principal - fee, payout);
    }

    #[motsu::test]
    fn preview_reverts_when_position_does_not_exist(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);

        let err = vault.sender(alice).preview_redeem(U256::ONE).motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::NonexistentPosition(VaultNonexistentPosition { token_id })
                if token_id == U256::ONE
        ));
    }

    #[motsu::test]
    fn redeems(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);
        let token_id = vault.sender(alice).deposit(PRINCIPAL).motsu_unwrap();
        let (principal, fee, payout) =
            vault.sender(alice).preview_redeem(token_id).motsu_unwrap();

        vault.sender(alice).redeem(token_id).motsu_expect("should redeem");

        assert_eq!(
            BALANCE - principal + payout,
            token.sender(alice).balance_of(alice)
        );
        assert_eq!(fee, token.sender(alice).balance_of(treasury));
        assert_eq!(U256::ZERO, token.sender(alice).balance_of(vault.address()));
        assert_eq!(U256::ZERO, vault.sender(alice).principal_of(token_id));

        let err = nft.sender(alice).owner_of(token_id).motsu_unwrap_err();
        assert!(matches!(err, erc721::Error::NonexistentToken(_)));

        vault.assert_emitted(&Redeemed {
            owner: alice,
            token_id,
            principal,
            fee,
            payout,
        });
    }

    #[motsu::test]
    fn redeem_reverts_when_already_redeemed(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);
        let token_id = vault.sender(alice).deposit(PRINCIPAL).motsu_unwrap();
        vault.sender(alice).redeem(token_id).motsu_expect("should redeem");

        let err = vault.sender(alice).redeem(token_id).motsu_unwrap_err();

        assert!(matches!(err, Error::NonexistentPosition(_)));
    }

    #[motsu::test]
    fn redeem_reverts_when_caller_does_not_own_receipt(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
        bob: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);
        let token_id = vault.sender(alice).deposit(PRINCIPAL).motsu_unwrap();

        let err = vault.sender(bob).redeem(token_id).motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::NotPositionOwner(VaultNotPositionOwner { caller, token_id: id })
                if caller == bob && id == token_id
        ));
        assert_eq!(PRINCIPAL, vault.sender(alice).principal_of(token_id));
        assert_eq!(U256::ZERO, token.sender(alice).balance_of(bob));
    }

    #[motsu::test]
    fn redeem_reports_receipt_failure_without_nft_reason(
        vault: Contract<SavingsVault>,
        token: Contract<Erc20>,
        nft: Contract<ReceiptMock>,
        treasury: Address,
        alice: Address,
    ) {
        setup(&vault, &token, &nft, treasury, alice);
        let token_id = vault.sender(alice).deposit(PRINCIPAL).motsu_unwrap();
        nft.sender(alice).burn(token_id).motsu_expect("should burn receipt");

        let err = vault.sender(alice).redeem(token_id).motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::ReceiptCallFailed(VaultReceiptCallFailed { nft: failed })
                if failed == nft.address()
        ));
        assert_eq!(PRINCIPAL, vault.sender(alice).principal_of(token_id));
    }
}
