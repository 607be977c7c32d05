//! Arithmetic behind Mawar Finance savings and token sales.
//!
//! Both the contracts and the off-chain tooling link this crate, so a fee
//! computed by the vault and a fee expected by a test are the same function.
//!
//! All division is integer division rounding toward zero. Intermediate
//! products are widened to 512 bits, so none of the functions here can
//! overflow on valid input.
#![cfg_attr(not(test), no_std)]

use core::fmt;

use ruint::{
    aliases::{U256, U512},
    uint,
};

/// Denominator of a fee rate expressed in basis points (`1 bps = 0.01%`).
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Fixed-point scale of an exchange rate and of an 18-decimal token.
pub const WAD: U256 = uint!(1_000_000_000_000_000_000_U256);

/// Number of decimals used by the MFI token.
pub const DECIMALS: u8 = 18;

/// Fee rate above [`BPS_DENOMINATOR`], i.e. more than 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidFeeRate {
    /// The rejected rate, in basis points.
    pub fee_bps: u16,
}

impl fmt::Display for InvalidFeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fee rate of {} bps exceeds {BPS_DENOMINATOR} bps",
            self.fee_bps
        )
    }
}

/// How a redeemed principal is divided between depositor and treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Amount originally deposited.
    pub principal: U256,
    /// `floor(principal * fee_bps / 10000)`, sent to the treasury.
    pub fee: U256,
    /// `principal - fee`, returned to the depositor.
    pub payout: U256,
}

impl FeeSplit {
    /// Splits `principal` at a rate of `fee_bps` basis points.
    ///
    /// # Arguments
    ///
    /// * `principal` - Deposited amount, in token base units.
    /// * `fee_bps` - Fee rate in basis points.
    ///
    /// # Errors
    ///
    /// * [`InvalidFeeRate`] - If `fee_bps` is greater than
    ///   [`BPS_DENOMINATOR`].
    pub fn new(principal: U256, fee_bps: u16) -> Result<Self, InvalidFeeRate> {
        ensure_fee_rate(fee_bps)?;

        let fee = mul_div(
            principal,
            U256::from(fee_bps),
            U256::from(BPS_DENOMINATOR),
        )
        // `fee_bps <= BPS_DENOMINATOR`, so the quotient is at most
        // `principal`.
        .unwrap_or(principal);

        Ok(Self { principal, fee, payout: principal - fee })
    }
}

/// Checks that `fee_bps` is a valid fee rate.
///
/// # Errors
///
/// * [`InvalidFeeRate`] - If `fee_bps` is greater than [`BPS_DENOMINATOR`].
pub fn ensure_fee_rate(fee_bps: u16) -> Result<(), InvalidFeeRate> {
    if fee_bps > BPS_DENOMINATOR {
        return Err(InvalidFeeRate { fee_bps });
    }
    Ok(())
}

/// Token base units bought by paying `value` wei at `rate`.
///
/// `rate` is the number of token base units per whole native unit, scaled
/// by [`WAD`]; `10_000_000 * WAD` sells ten million tokens per ether.
///
/// Returns `None` when the quote does not fit into a [`U256`].
#[must_use]
pub fn quote(value: U256, rate: U256) -> Option<U256> {
    mul_div(value, rate, WAD)
}

/// Scales a whole-token amount to base units with [`DECIMALS`] decimals.
///
/// Returns `None` on overflow.
#[must_use]
pub fn whole_tokens(amount: U256) -> Option<U256> {
    amount.checked_mul(WAD)
}

/// `floor(x * y / denominator)` with a 512-bit intermediate product.
///
/// Returns `None` when `denominator` is zero or the result does not fit into
/// a [`U256`].
#[must_use]
pub fn mul_div(x: U256, y: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = U512::from(x) * U512::from(y);
    U256::checked_from_uint(product / U512::from(denominator))
}
