//! AMM pricing and quote math.
//!
//! Pure functions over an item's liquidity pools; the engine applies
//! the resulting deltas while holding the item lock.
//!
//! The buy quote intentionally grants more shares to the outcome that
//! already holds more liquidity. That is the inverse of a classical
//! constant-product curve, but it is the pricing rule the historical
//! payout math was built on, so it is preserved bit-for-bit. See
//! DESIGN.md before changing it.

use rust_decimal::Decimal;

/// Shares granted for investing `invest` into an outcome backed by
/// `outcome_liquidity` out of `total_liquidity`:
///
/// `shares = invest * outcome_liquidity / (total_liquidity + invest)`
///
/// Callers guarantee `invest > 0` and `total_liquidity > 0`.
pub fn buy_shares(invest: Decimal, outcome_liquidity: Decimal, total_liquidity: Decimal) -> Decimal {
    invest * outcome_liquidity / (total_liquidity + invest)
}

/// Payout for selling `sell_shares` of an outcome:
///
/// `payout = sell_shares * total_liquidity / (outcome_liquidity + sell_shares)`
///
/// Returns zero when either pool is empty; no fee is charged on sell.
pub fn sell_payout(
    sell_shares: Decimal,
    outcome_liquidity: Decimal,
    total_liquidity: Decimal,
) -> Decimal {
    if total_liquidity <= Decimal::ZERO || outcome_liquidity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    sell_shares * total_liquidity / (outcome_liquidity + sell_shares)
}

/// Market payout of a winning position at resolution:
///
/// `(owned_shares / winning_outcome_shares) * total_liquidity`
///
/// Zero when no shares were ever issued for the winning outcome.
pub fn resolution_payout(
    owned_shares: Decimal,
    winning_outcome_shares: Decimal,
    total_liquidity: Decimal,
) -> Decimal {
    if winning_outcome_shares <= Decimal::ZERO || owned_shares <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    owned_shares / winning_outcome_shares * total_liquidity
}
