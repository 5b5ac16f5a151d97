//! The per-item market aggregate.
//!
//! A `MarketItem` owns every piece of mutable market state for one
//! tradable event: the per-outcome liquidity and share pools, the
//! lifecycle status, the one-way resolution flag and the pooled boost
//! stakes. All mutation goes through the engine while holding the
//! item's lock, so methods here assume exclusive access.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use punt_common::{ItemId, ItemStatus, MarketVariant, Outcome};

/// Mutable market state for one match or poll.
#[derive(Debug, Clone)]
pub struct MarketItem {
    pub id: ItemId,
    pub variant: MarketVariant,
    pub status: ItemStatus,
    pub is_resolved: bool,
    pub result: Option<Outcome>,
    pub market_initialized: bool,
    pub boost_pool: Decimal,
    liquidity: BTreeMap<Outcome, Decimal>,
    shares: BTreeMap<Outcome, Decimal>,
    pub created_at: DateTime<Utc>,
}

impl MarketItem {
    /// Create a three-way match market.
    pub fn new_match(team_a: impl Into<String>, team_b: impl Into<String>) -> Self {
        Self::new(MarketVariant::Match {
            team_a: team_a.into(),
            team_b: team_b.into(),
        })
    }

    /// Create a binary poll market.
    pub fn new_poll(question: impl Into<String>) -> Self {
        Self::new(MarketVariant::Poll {
            question: question.into(),
        })
    }

    pub fn new(variant: MarketVariant) -> Self {
        let mut liquidity = BTreeMap::new();
        let mut shares = BTreeMap::new();
        for &outcome in variant.outcomes() {
            liquidity.insert(outcome, Decimal::ZERO);
            shares.insert(outcome, Decimal::ZERO);
        }
        Self {
            id: ItemId::new(),
            variant,
            status: ItemStatus::Upcoming,
            is_resolved: false,
            result: None,
            market_initialized: false,
            boost_pool: Decimal::ZERO,
            liquidity,
            shares,
            created_at: Utc::now(),
        }
    }

    /// Liquidity backing `outcome`. Zero for outcomes never traded.
    pub fn liquidity(&self, outcome: Outcome) -> Decimal {
        self.liquidity.get(&outcome).copied().unwrap_or(Decimal::ZERO)
    }

    /// Total shares issued for `outcome`.
    pub fn shares(&self, outcome: Outcome) -> Decimal {
        self.shares.get(&outcome).copied().unwrap_or(Decimal::ZERO)
    }

    /// Sum of liquidity across all outcomes.
    pub fn total_liquidity(&self) -> Decimal {
        self.liquidity.values().copied().sum()
    }

    /// Sum of issued shares across all outcomes.
    pub fn total_shares(&self) -> Decimal {
        self.shares.values().copied().sum()
    }

    /// Current price of `outcome`: its liquidity share of the total,
    /// or the uniform 1/N default while the pools are empty.
    pub fn price(&self, outcome: Outcome) -> Decimal {
        let total = self.total_liquidity();
        if total.is_zero() {
            return self.variant.default_price();
        }
        self.liquidity(outcome) / total
    }

    /// Whether AMM trading is currently rejected for this item.
    pub fn trading_blocked(&self) -> bool {
        self.status.blocks_trading() || self.is_resolved
    }

    /// Whether predictions may still be created or changed.
    pub fn is_open(&self) -> bool {
        self.status.is_open() && !self.is_resolved
    }

    /// Apply a buy: the investment joins the outcome's liquidity pool
    /// and the granted shares join its issued total.
    pub fn apply_buy(&mut self, outcome: Outcome, invest: Decimal, granted_shares: Decimal) {
        *self.liquidity.entry(outcome).or_default() += invest;
        *self.shares.entry(outcome).or_default() += granted_shares;
    }

    /// Apply a sell: the payout leaves the outcome's liquidity pool and
    /// the sold shares leave its issued total, both clamped at zero.
    pub fn apply_sell(&mut self, outcome: Outcome, payout: Decimal, sold_shares: Decimal) {
        let liquidity = self.liquidity.entry(outcome).or_default();
        *liquidity = (*liquidity - payout).max(Decimal::ZERO);
        let shares = self.shares.entry(outcome).or_default();
        *shares = (*shares - sold_shares).max(Decimal::ZERO);
    }

    /// Seed admin liquidity and open the market for trading.
    pub fn seed_liquidity(&mut self, amounts: &[(Outcome, Decimal)]) {
        for &(outcome, amount) in amounts {
            *self.liquidity.entry(outcome).or_default() += amount;
        }
        self.market_initialized = true;
    }

    /// Add a boost stake to the pooled accumulator.
    pub fn credit_boost(&mut self, amount: Decimal) {
        self.boost_pool += amount;
    }

    /// Withdraw from the pooled accumulator, clamped at zero.
    pub fn debit_boost(&mut self, amount: Decimal) {
        self.boost_pool = (self.boost_pool - amount).max(Decimal::ZERO);
    }

    /// Commit the resolution result. One-way; the caller has already
    /// verified `is_resolved == false`.
    pub fn commit_result(&mut self, result: Outcome) {
        self.result = Some(result);
        self.status = ItemStatus::Completed;
        self.is_resolved = true;
    }

    /// Read-only view for callers outside the engine.
    pub fn snapshot(&self) -> MarketSnapshot {
        let prices = self
            .variant
            .outcomes()
            .iter()
            .map(|&o| (o, self.price(o)))
            .collect();
        MarketSnapshot {
            id: self.id,
            variant: self.variant.clone(),
            status: self.status,
            is_resolved: self.is_resolved,
            result: self.result,
            market_initialized: self.market_initialized,
            total_liquidity: self.total_liquidity(),
            boost_pool: self.boost_pool,
            prices,
        }
    }
}

/// Point-in-time view of an item's market state.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub id: ItemId,
    pub variant: MarketVariant,
    pub status: ItemStatus,
    pub is_resolved: bool,
    pub result: Option<Outcome>,
    pub market_initialized: bool,
    pub total_liquidity: Decimal,
    pub boost_pool: Decimal,
    pub prices: Vec<(Outcome, Decimal)>,
}
