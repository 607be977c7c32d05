#![cfg(feature = "e2e")]
#![allow(clippy::unreadable_literal)]

use alloy::primitives::{uint, Address, U256};
use e2e::{constructor, receipt, Account, EventExt, Revert};
use eyre::Result;
use mawar_deploy::{
    abi::{Exchange, Mfi, SavingsNft, SavingsVault},
    ContractId, Deployment, Parameters, Plan, Workspace,
};
use mawar_economics::FeeSplit;

const SUPPLY: U256 = uint!(1_000_000_000000000000000000_U256);
const RATE: U256 = uint!(10_000_000_000000000000000000_U256);
const SEED: U256 = uint!(200_000_000000000000000000_U256);
const FEE_BPS: u16 = 250;
const PURCHASE: U256 = uint!(10000000000000000_U256);
const BOUGHT: U256 = uint!(100_000_000000000000000000_U256);
const DEPOSIT: U256 = uint!(30_000000000000000000_U256);

async fn deploy(
    deployer: &Account,
    contract: ContractId,
    ctr: e2e::Constructor,
) -> Result<Address> {
    let workspace = Workspace::locate(None)?;
    Ok(deployer
        .as_deployer()
        .in_package(workspace.package_dir(contract))
        .with_constructor(ctr)
        .deploy()
        .await?
        .contract_address)
}

#[e2e::test]
async fn deposit_and_redeem_with_fee(
    deployer: Account,
    user: Account,
) -> Result<()> {
    let treasury = deployer.address();
    let user_addr = user.address();

    // 1-3. Token, receipt NFT and vault.
    let mfi_addr = deploy(&deployer, ContractId::Mfi, constructor!(SUPPLY)).await?;
    let nft_addr =
        deploy(&deployer, ContractId::SavingsNft, constructor!()).await?;
    let vault_addr = deploy(
        &deployer,
        ContractId::SavingsVault,
        constructor!(mfi_addr, nft_addr, treasury, FEE_BPS),
    )
    .await?;

    // 4. Authorize the vault on the NFT.
    let nft = SavingsNft::new(nft_addr, &deployer.wallet);
    let receipt = receipt!(nft.setVaultOnce(vault_addr))?;
    assert!(receipt.emits(SavingsNft::VaultSet { vault: vault_addr }));

    // 5-6. Exchange, seeded with inventory.
    let exchange_addr = deploy(
        &deployer,
        ContractId::Exchange,
        constructor!(mfi_addr, RATE),
    )
    .await?;
    let mfi = Mfi::new(mfi_addr, &deployer.wallet);
    receipt!(mfi.transfer(exchange_addr, SEED))?;
    assert_eq!(mfi.balanceOf(exchange_addr).call().await?, SEED);

    // 7. The user buys MFI for 0.01 ether.
    let exchange = Exchange::new(exchange_addr, &user.wallet);
    let receipt = receipt!(exchange.buyMFI(user_addr).value(PURCHASE))?;
    assert!(receipt.emits(Exchange::Purchased {
        buyer: user_addr,
        recipient: user_addr,
        value: PURCHASE,
        amount: BOUGHT,
    }));
    let user_mfi = Mfi::new(mfi_addr, &user.wallet);
    assert_eq!(user_mfi.balanceOf(user_addr).call().await?, BOUGHT);

    // 8-9. Approve and deposit; the first receipt has id 1.
    receipt!(user_mfi.approve(vault_addr, DEPOSIT))?;
    let vault = SavingsVault::new(vault_addr, &user.wallet);
    let receipt = receipt!(vault.deposit(DEPOSIT))?;
    let token_id = U256::ONE;
    assert!(receipt.emits(SavingsVault::Deposited {
        owner: user_addr,
        token_id,
        amount: DEPOSIT,
    }));
    assert_eq!(nft.ownerOf(token_id).call().await?, user_addr);
    assert_eq!(user_mfi.balanceOf(vault_addr).call().await?, DEPOSIT);

    // 10. Preview.
    let SavingsVault::previewRedeemReturn { principal, fee, payout } =
        vault.previewRedeem(token_id).call().await?;
    assert_eq!(principal, DEPOSIT);
    assert_eq!(fee, principal * U256::from(FEE_BPS) / U256::from(10_000));
    assert_eq!(payout, principal - fee);

    // 11. Redeem.
    let treasury_before = mfi.balanceOf(treasury).call().await?;
    let user_before = user_mfi.balanceOf(user_addr).call().await?;

    let receipt = receipt!(vault.redeem(token_id))?;
    assert!(receipt.emits(SavingsVault::Redeemed {
        owner: user_addr,
        token_id,
        principal,
        fee,
        payout,
    }));

    assert_eq!(user_mfi.balanceOf(user_addr).call().await?, user_before + payout);
    assert_eq!(mfi.balanceOf(treasury).call().await?, treasury_before + fee);
    assert_eq!(user_mfi.balanceOf(vault_addr).call().await?, U256::ZERO);
    assert_eq!(vault.principalOf(token_id).call().await?, U256::ZERO);

    let err = nft
        .ownerOf(token_id)
        .call()
        .await
        .expect_err("receipt should be burned");
    assert!(err.reverted_with(SavingsNft::ERC721NonexistentToken {
        tokenId: token_id
    }));

    Ok(())
}

#[e2e::test]
async fn plan_wires_contracts_as_declared(deployer: Account) -> Result<()> {
    let parameters = Parameters {
        treasury: deployer.address(),
        fee_bps: FEE_BPS,
        initial_supply: SUPPLY,
        rate: RATE,
        seed: SEED,
    };
    let plan = Plan::mawar(&parameters);
    let workspace = Workspace::locate(None)?;

    let contracts = Deployment::execute(&plan, &deployer, &workspace).await?;

    let nft = SavingsNft::new(contracts.nft, &deployer.wallet);
    assert_eq!(nft.vault().call().await?, contracts.vault);
    assert_eq!(nft.owner().call().await?, deployer.address());

    let vault = SavingsVault::new(contracts.vault, &deployer.wallet);
    assert_eq!(vault.token().call().await?, contracts.mfi);
    assert_eq!(vault.nft().call().await?, contracts.nft);
    assert_eq!(vault.treasury().call().await?, parameters.treasury);
    assert_eq!(vault.feeBps().call().await?, FEE_BPS);

    let exchange = Exchange::new(contracts.exchange, &deployer.wallet);
    assert_eq!(exchange.token().call().await?, contracts.mfi);
    assert_eq!(exchange.rate().call().await?, RATE);
    assert_eq!(exchange.owner().call().await?, deployer.address());

    let mfi = Mfi::new(contracts.mfi, &deployer.wallet);
    assert_eq!(mfi.totalSupply().call().await?, SUPPLY);
    assert_eq!(mfi.balanceOf(contracts.exchange).call().await?, SEED);
    assert_eq!(mfi.balanceOf(deployer.address()).call().await?, SUPPLY - SEED);

    Ok(())
}

#[e2e::test]
async fn preview_matches_shared_fee_arithmetic(
    deployer: Account,
) -> Result<()> {
    let parameters = Parameters {
        treasury: deployer.address(),
        fee_bps: 333,
        initial_supply: SUPPLY,
        rate: RATE,
        seed: SEED,
    };
    let plan = Plan::mawar(&parameters);
    let contracts =
        Deployment::execute(&plan, &deployer, &Workspace::locate(None)?)
            .await?;

    let principal = uint!(12_345_678_901_234_567_891_U256);
    let mfi = Mfi::new(contracts.mfi, &deployer.wallet);
    receipt!(mfi.approve(contracts.vault, principal))?;
    let vault = SavingsVault::new(contracts.vault, &deployer.wallet);
    receipt!(vault.deposit(principal))?;

    let expected =
        FeeSplit::new(principal, 333).expect("333 bps is a valid rate");
    let SavingsVault::previewRedeemReturn { principal: got, fee, payout } =
        vault.previewRedeem(U256::ONE).call().await?;
    assert_eq!(got, expected.principal);
    assert_eq!(fee, expected.fee);
    assert_eq!(payout, expected.payout);

    Ok(())
}
