//! Receipt NFTs for savings positions.
//!
//! Every deposit into the savings vault is represented by one token of this
//! collection. Only the vault may mint or burn, and the vault is bound exactly
//! once, by the owner, right after deployment.
#![cfg_attr(not(any(test, feature = "export-abi")), no_main)]
#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]

extern crate alloc;

use alloy_primitives::{aliases::B32, Address, U256};
use openzeppelin_stylus::{
    access::ownable::{self, IOwnable, Ownable},
    token::erc721::{self, Erc721, IErc721},
    utils::introspection::erc165::IErc165,
};
pub use sol::*;
use stylus_sdk::{
    abi::Bytes,
    evm, msg,
    prelude::*,
    storage::{StorageAddress, StorageU256},
    tx,
};

mod sol {
    use alloy_sol_macro::sol;

    sol! {
        /// Emitted when the vault allowed to mint and burn receipts is bound.
        #[derive(Debug)]
        #[allow(missing_docs)]
        event VaultSet(address indexed vault);
    }

    sol! {
        /// The vault has already been bound.
        ///
        /// * `vault` - The vault currently bound.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error VaultAlreadySet(address vault);

        /// The vault address is not valid (eg. `Address::ZERO`).
        #[derive(Debug)]
        #[allow(missing_docs)]
        error InvalidVault(address vault);

        /// Minting and burning is restricted to the vault.
        ///
        /// * `caller` - Account that attempted the operation.
        #[derive(Debug)]
        #[allow(missing_docs)]
        error CallerNotVault(address caller);
    }
}

/// An error that occurred in the [`SavingsNft`] contract.
#[derive(SolidityError, Debug)]
pub enum Error {
    /// The vault has already been bound.
    VaultAlreadySet(VaultAlreadySet),
    /// The vault address is not valid.
    InvalidVault(InvalidVault),
    /// Minting and burning is restricted to the vault.
    CallerNotVault(CallerNotVault),
    /// Error from the underlying ERC-721 implementation.
    Erc721(erc721::Error),
    /// Error from the ownership module.
    Ownable(ownable::Error),
}

/// State of the receipt collection.
#[entrypoint]
#[storage]
pub struct SavingsNft {
    erc721: Erc721,
    ownable: Ownable,
    vault: StorageAddress,
    total_minted: StorageU256,
}

#[public]
#[implements(IErc721<Error = erc721::Error>, IOwnable<Error = ownable::Error>, IErc165)]
impl SavingsNft {
    /// Makes the deploying account the owner.
    ///
    /// # Errors
    ///
    /// * [`ownable::Error::InvalidOwner`] - If the deployer can't be resolved.
    #[constructor]
    #[allow(deprecated)]
    pub fn constructor(&mut self) -> Result<(), Error> {
        // Constructors run inside the StylusDeployer call, so the sender is
        // the deployer contract and not the deploying account.
        self.init(tx::origin())
    }

    /// Binds the vault that may mint and burn receipts. Can only be called
    /// once, by the owner.
    ///
    /// # Errors
    ///
    /// * [`Error::Ownable`] - If the caller is not the owner.
    /// * [`Error::InvalidVault`] - If `vault` is `Address::ZERO`.
    /// * [`Error::VaultAlreadySet`] - If a vault is already bound.
    ///
    /// # Events
    ///
    /// * [`VaultSet`].
    pub fn set_vault_once(&mut self, vault: Address) -> Result<(), Error> {
        self.ownable.only_owner()?;

        if vault.is_zero() {
            return Err(Error::InvalidVault(InvalidVault { vault }));
        }

        let current = self.vault.get();
        if !current.is_zero() {
            return Err(Error::VaultAlreadySet(VaultAlreadySet {
                vault: current,
            }));
        }

        self.vault.set(vault);
        evm::log(VaultSet { vault });
        Ok(())
    }

    /// The bound vault, or `Address::ZERO` before [`Self::set_vault_once`].
    pub fn vault(&self) -> Address {
        self.vault.get()
    }

    /// Mints the next receipt to `to` and returns its id. Ids start at 1.
    ///
    /// # Errors
    ///
    /// * [`Error::CallerNotVault`] - If the caller is not the vault.
    /// * [`Error::Erc721`] - If `to` is `Address::ZERO`.
    ///
    /// # Panics
    ///
    /// * If the number of minted receipts exceeds `U256::MAX`.
    pub fn mint(&mut self, to: Address) -> Result<U256, Error> {
        self.only_vault()?;

        let token_id = self
            .total_minted
            .get()
            .checked_add(U256::ONE)
            .expect("minted receipts should not exceed `U256::MAX`");
        self.total_minted.set(token_id);

        self.erc721._mint(to, token_id)?;
        Ok(token_id)
    }

    /// Burns the receipt `token_id`.
    ///
    /// # Errors
    ///
    /// * [`Error::CallerNotVault`] - If the caller is not the vault.
    /// * [`Error::Erc721`] - If `token_id` does not exist.
    pub fn burn(&mut self, token_id: U256) -> Result<(), Error> {
        self.only_vault()?;
        Ok(self.erc721._burn(token_id)?)
    }

    /// Number of receipts minted so far, including burned ones.
    pub fn total_minted(&self) -> U256 {
        self.total_minted.get()
    }
}

impl SavingsNft {
    fn init(&mut self, owner: Address) -> Result<(), Error> {
        Ok(self.ownable.constructor(owner)?)
    }

    fn only_vault(&self) -> Result<(), Error> {
        let caller = msg::sender();
        if caller != self.vault.get() {
            return Err(Error::CallerNotVault(CallerNotVault { caller }));
        }
        Ok(())
    }
}

#[public]
impl IErc721 for SavingsNft {
    type Error = erc721::Error;

    fn balance_of(&self, owner: Address) -> Result<U256, Self::Error> {
        self.erc721.balance_of(owner)
    }

    fn owner_of(&self, token_id: U256) -> Result<Address, Self::Error> {
        self.erc721.owner_of(token_id)
    }

    fn safe_transfer_from(
        &mut self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), Self::Error> {
        self.erc721.safe_transfer_from(from, to, token_id)
    }

    #[selector(name = "safeTransferFrom")]
    fn safe_transfer_from_with_data(
        &mut self,
        from: Address,
        to: Address,
        token_id: U256,
        data: Bytes,
    ) -> Result<(), Self::Error> {
        self.erc721.safe_transfer_from_with_data(from, to, token_id, data)
    }

    fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), Self::Error> {
        self.erc721.transfer_from(from, to, token_id)
    }

    fn approve(
        &mut self,
        to: Address,
        token_id: U256,
    ) -> Result<(), Self::Error> {
        self.erc721.approve(to, token_id)
    }

    fn set_approval_for_all(
        &mut self,
        operator: Address,
        approved: bool,
    ) -> Result<(), Self::Error> {
        self.erc721.set_approval_for_all(operator, approved)
    }

    fn get_approved(&self, token_id: U256) -> Result<Address, Self::Error> {
        self.erc721.get_approved(token_id)
    }

    fn is_approved_for_all(&self, owner: Address, operator: Address) -> bool {
        self.erc721.is_approved_for_all(owner, operator)
    }
}

#[public]
impl IOwnable for SavingsNft {
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

#[public]
impl IErc165 for SavingsNft {
    fn supports_interface(&self, interface_id: B32) -> bool {
        self.erc721.supports_interface(interface_id)
            || self.ownable.supports_interface(interface_id)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{uint, Address, U256};
    use motsu::prelude::*;
    use openzeppelin_stylus::{access::ownable, token::erc721};

    use super::*;

    fn with_vault(contract: &Contract<SavingsNft>, owner: Address, vault: Address) {
        contract.sender(owner).init(owner).motsu_expect("should initialize");
        contract
            .sender(owner)
            .set_vault_once(vault)
            .motsu_expect("should bind vault");
    }

    #[motsu::test]
    fn binds_vault_once(
        contract: Contract<SavingsNft>,
        alice: Address,
        vault: Address,
    ) {
        assert_eq!(Address::ZERO, contract.sender(alice).vault());

        with_vault(&contract, alice, vault);

        assert_eq!(vault, contract.sender(alice).vault());
        assert_eq!(alice, contract.sender(alice).owner());
        contract.assert_emitted(&VaultSet { vault });
    }

    #[motsu::test]
    fn set_vault_once_reverts_when_called_twice(
        contract: Contract<SavingsNft>,
        alice: Address,
        vault: Address,
        other: Address,
    ) {
        with_vault(&contract, alice, vault);

        let err =
            contract.sender(alice).set_vault_once(other).motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::VaultAlreadySet(VaultAlreadySet { vault: current })
                if current == vault
        ));
        assert_eq!(vault, contract.sender(alice).vault());
    }

    #[motsu::test]
    fn set_vault_once_reverts_when_vault_is_zero(
        contract: Contract<SavingsNft>,
        alice: Address,
    ) {
        contract.sender(alice).init(alice).motsu_expect("should initialize");

        let err = contract
            .sender(alice)
            .set_vault_once(Address::ZERO)
            .motsu_unwrap_err();

        assert!(matches!(err, Error::InvalidVault(_)));
    }

    #[motsu::test]
    fn set_vault_once_reverts_when_not_owner(
        contract: Contract<SavingsNft>,
        alice: Address,
        bob: Address,
        vault: Address,
    ) {
        contract.sender(alice).init(alice).motsu_expect("should initialize");

        let err = contract.sender(bob).set_vault_once(vault).motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::Ownable(ownable::Error::UnauthorizedAccount(
                ownable::OwnableUnauthorizedAccount { account }
            )) if account == bob
        ));
        assert_eq!(Address::ZERO, contract.sender(alice).vault());
    }

    #[motsu::test]
    fn vault_mints_sequential_ids(
        contract: Contract<SavingsNft>,
        alice: Address,
        bob: Address,
        vault: Address,
    ) {
        with_vault(&contract, alice, vault);

        let first = contract.sender(vault).mint(bob).motsu_unwrap();
        let second = contract.sender(vault).mint(alice).motsu_unwrap();

        assert_eq!(U256::ONE, first);
        assert_eq!(uint!(2_U256), second);
        assert_eq!(uint!(2_U256), contract.sender(alice).total_minted());
        assert_eq!(bob, contract.sender(alice).owner_of(first).motsu_unwrap());
        assert_eq!(
            alice,
            contract.sender(alice).owner_of(second).motsu_unwrap()
        );
        contract.assert_emitted(&erc721::Transfer {
            from: Address::ZERO,
            to: bob,
            token_id: first,
        });
    }

    #[motsu::test]
    fn mint_reverts_when_caller_is_not_vault(
        contract: Contract<SavingsNft>,
        alice: Address,
        vault: Address,
    ) {
        with_vault(&contract, alice, vault);

        let err = contract.sender(alice).mint(alice).motsu_unwrap_err();

        assert!(matches!(
            err,
            Error::CallerNotVault(CallerNotVault { caller }) if caller == alice
        ));
        assert_eq!(U256::ZERO, contract.sender(alice).total_minted());
    }

    #[motsu::test]
    fn mint_reverts_before_vault_is_bound(
        contract: Contract<SavingsNft>,
        alice: Address,
    ) {
        contract.sender(alice).init(alice).motsu_expect("should initialize");

        let err = contract.sender(alice).mint(alice).motsu_unwrap_err();

        assert!(matches!(err, Error::CallerNotVault(_)));
    }

    #[motsu::test]
    fn vault_burns_receipts(
        contract: Contract<SavingsNft>,
        alice: Address,
        bob: Address,
        vault: Address,
    ) {
        with_vault(&contract, alice, vault);
        let token_id = contract.sender(vault).mint(bob).motsu_unwrap();

        contract.sender(vault).burn(token_id).motsu_expect("should burn");

        let err = contract.sender(alice).owner_of(token_id).motsu_unwrap_err();
        assert!(matches!(
            err,
            erc721::Error::NonexistentToken(erc721::ERC721NonexistentToken {
                token_id: id
            }) if id == token_id
        ));
        // Burned ids are never reused.
        assert_eq!(U256::ONE, contract.sender(alice).total_minted());
    }

    #[motsu::test]
    fn burn_reverts_when_caller_is_not_vault(
        contract: Contract<SavingsNft>,
        alice: Address,
        bob: Address,
        vault: Address,
    ) {
        with_vault(&contract, alice, vault);
        let token_id = contract.sender(vault).mint(bob).motsu_unwrap();

        let err = contract.sender(bob).burn(token_id).motsu_unwrap_err();

        assert!(matches!(err, Error::CallerNotVault(_)));
        assert_eq!(bob, contract.sender(alice).owner_of(token_id).motsu_unwrap());
    }
}
