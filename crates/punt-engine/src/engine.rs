//! The engine facade.
//!
//! `MarketEngine` implements every external operation and owns the
//! per-item lock discipline: each trading or settlement call acquires
//! the target item's lock for its whole read-compute-write span, so
//! operations on the same item serialize while different items proceed
//! in parallel. Raw outcome and result strings are normalized here, at
//! the ingress boundary, and nowhere else.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use punt_common::{ItemId, ItemStatus, Outcome, PredictionKind, UserId};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::item::{MarketItem, MarketSnapshot};
use crate::ledger::{Prediction, PredictionLedger};
use crate::metrics::EngineMetrics;
use crate::resolution::{self, SettlementSummary};
use crate::store::{lock_item, MarketStore};
use crate::tickets::TicketAllocator;
use crate::users::UserRegistry;

/// How many shares a sell request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellAmount {
    /// Close the whole position.
    All,
    /// Sell exactly this many shares.
    Exact(Decimal),
}

/// Direction of a boost stake adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeAction {
    Add,
    Withdraw,
}

/// Result of a successful buy.
#[derive(Debug, Clone)]
pub struct BuyReceipt {
    pub position: Prediction,
    /// Outcome liquidity after the buy.
    pub new_liquidity: Decimal,
    /// Outcome share total after the buy.
    pub new_shares: Decimal,
}

/// Result of a successful sell.
#[derive(Debug, Clone)]
pub struct SellReceipt {
    pub payout: Decimal,
    pub shares_sold: Decimal,
    pub position: Prediction,
}

/// Result of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolveReceipt {
    pub item: MarketSnapshot,
    pub summary: SettlementSummary,
}

/// Market-making and settlement engine.
pub struct MarketEngine {
    config: EngineConfig,
    store: MarketStore,
    ledger: PredictionLedger,
    users: UserRegistry,
    tickets: TicketAllocator,
    metrics: EngineMetrics,
}

impl MarketEngine {
    pub fn new(config: EngineConfig) -> Self {
        let tickets = TicketAllocator::new(config.tickets.daily_free_limit);
        Self {
            config,
            store: MarketStore::new(),
            ledger: PredictionLedger::new(),
            users: UserRegistry::new(),
            tickets,
            metrics: EngineMetrics::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn ledger(&self) -> &PredictionLedger {
        &self.ledger
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    // =========================================================================
    // Administration
    // =========================================================================

    /// Create a match, optionally seeding per-outcome liquidity.
    pub fn create_match(
        &self,
        team_a: &str,
        team_b: &str,
        seed: &[(Outcome, Decimal)],
    ) -> Result<ItemId> {
        let mut item = MarketItem::new_match(team_a, team_b);
        Self::seed_item(&mut item, seed)?;
        Ok(self.store.insert(item))
    }

    /// Create a poll, optionally seeding per-outcome liquidity.
    pub fn create_poll(&self, question: &str, seed: &[(Outcome, Decimal)]) -> Result<ItemId> {
        let mut item = MarketItem::new_poll(question);
        Self::seed_item(&mut item, seed)?;
        Ok(self.store.insert(item))
    }

    fn seed_item(item: &mut MarketItem, seed: &[(Outcome, Decimal)]) -> Result<()> {
        if seed.is_empty() {
            return Ok(());
        }
        Self::validate_seed(item, seed)?;
        item.seed_liquidity(seed);
        Ok(())
    }

    fn validate_seed(item: &MarketItem, amounts: &[(Outcome, Decimal)]) -> Result<()> {
        for &(outcome, amount) in amounts {
            if !item.variant.contains(outcome) {
                return Err(EngineError::InvalidOutcome(outcome.to_string()));
            }
            if amount < Decimal::ZERO {
                return Err(EngineError::InvalidAmount(amount));
            }
        }
        Ok(())
    }

    /// Add liquidity to an existing item's pools and open the market.
    /// Admin-only; the only constraint is that the item exists.
    pub fn add_liquidity(
        &self,
        item_id: &ItemId,
        amounts: &[(Outcome, Decimal)],
    ) -> Result<MarketSnapshot> {
        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;
        Self::validate_seed(&item, amounts)?;
        item.seed_liquidity(amounts);
        debug!(item = %item_id, "added liquidity");
        Ok(item.snapshot())
    }

    /// Move an item through its lifecycle (upcoming, live, locked).
    /// Resolution owns the transition to completed.
    pub fn set_status(&self, item_id: &ItemId, status: ItemStatus) -> Result<MarketSnapshot> {
        if status == ItemStatus::Completed {
            return Err(EngineError::ReservedStatus(status));
        }
        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;
        if item.is_resolved {
            return Err(EngineError::AlreadyResolved);
        }
        item.status = status;
        Ok(item.snapshot())
    }

    /// Register a user profile with the engine.
    pub fn register_user(&self) -> UserId {
        self.users.register()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current price of one outcome, in [0, 1].
    pub fn price(&self, item_id: &ItemId, outcome: &str) -> Result<Decimal> {
        let handle = self.store.get(item_id)?;
        let item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;
        let outcome = item
            .variant
            .parse_outcome(outcome)
            .ok_or_else(|| EngineError::InvalidOutcome(outcome.to_string()))?;
        Ok(item.price(outcome))
    }

    /// Consistent point-in-time view of an item's market state.
    pub fn market_snapshot(&self, item_id: &ItemId) -> Result<MarketSnapshot> {
        let handle = self.store.get(item_id)?;
        let item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;
        Ok(item.snapshot())
    }

    /// A user's position of one kind on an item, if any.
    pub fn position(
        &self,
        user: &UserId,
        item_id: &ItemId,
        kind: PredictionKind,
    ) -> Option<Prediction> {
        self.ledger.get(&(*user, *item_id, kind))
    }

    /// All of a user's predictions.
    pub fn predictions_for_user(&self, user: &UserId) -> Vec<Prediction> {
        self.ledger.for_user(user)
    }

    // =========================================================================
    // AMM trading
    // =========================================================================

    /// Buy outcome shares with `amount`.
    pub fn buy(
        &self,
        item_id: &ItemId,
        user: &UserId,
        outcome: &str,
        amount: Decimal,
    ) -> Result<BuyReceipt> {
        self.buy_inner(item_id, user, outcome, amount)
            .inspect_err(|_| self.metrics.inc_rejected())
    }

    fn buy_inner(
        &self,
        item_id: &ItemId,
        user: &UserId,
        outcome: &str,
        amount: Decimal,
    ) -> Result<BuyReceipt> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }

        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;

        let outcome = item
            .variant
            .parse_outcome(outcome)
            .ok_or_else(|| EngineError::InvalidOutcome(outcome.to_string()))?;
        if item.trading_blocked() {
            return Err(EngineError::ItemLocked);
        }
        let total_liquidity = item.total_liquidity();
        if !item.market_initialized || total_liquidity.is_zero() {
            return Err(EngineError::MarketNotInitialized);
        }

        // Verify the user exists before mutating the item.
        self.users.get(user)?;

        let granted = crate::amm::buy_shares(amount, item.liquidity(outcome), total_liquidity);
        item.apply_buy(outcome, amount, granted);

        let key = (*user, *item_id, PredictionKind::Market);
        let position = match self.ledger.update(&key, |p| {
            p.shares += granted;
            p.total_invested += amount;
            // A user holds one outcome per item; additional buys move
            // the whole position to the newly chosen outcome.
            p.outcome = outcome;
        }) {
            Some(updated) => updated,
            None => {
                let mut fresh = Prediction::new(*user, *item_id, PredictionKind::Market, outcome);
                fresh.shares = granted;
                fresh.total_invested = amount;
                self.ledger.insert(fresh.clone());
                fresh
            }
        };

        self.metrics.inc_buys();
        debug!(
            item = %item_id,
            user = %user,
            outcome = %outcome,
            amount = %amount,
            shares = %granted,
            "executed buy"
        );

        Ok(BuyReceipt {
            new_liquidity: item.liquidity(outcome),
            new_shares: item.shares(outcome),
            position,
        })
    }

    /// Sell shares back to the market at the current price.
    pub fn sell(
        &self,
        item_id: &ItemId,
        user: &UserId,
        amount: SellAmount,
    ) -> Result<SellReceipt> {
        self.sell_inner(item_id, user, amount)
            .inspect_err(|_| self.metrics.inc_rejected())
    }

    fn sell_inner(
        &self,
        item_id: &ItemId,
        user: &UserId,
        amount: SellAmount,
    ) -> Result<SellReceipt> {
        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;

        self.users.get(user)?;
        let key = (*user, *item_id, PredictionKind::Market);
        let position = self.ledger.get(&key).ok_or(EngineError::NoPosition)?;
        if item.trading_blocked() {
            return Err(EngineError::ItemLocked);
        }

        let owned = position.shares;
        let selling = match amount {
            SellAmount::All => owned,
            SellAmount::Exact(shares) => shares,
        };
        if selling <= Decimal::ZERO || selling > owned {
            return Err(EngineError::InvalidShares {
                requested: selling,
                owned,
            });
        }

        let outcome = position.outcome;
        let payout =
            crate::amm::sell_payout(selling, item.liquidity(outcome), item.total_liquidity());
        item.apply_sell(outcome, payout, selling);

        let position = self
            .ledger
            .update(&key, |p| {
                p.shares = (p.shares - selling).max(Decimal::ZERO);
            })
            .ok_or(EngineError::NoPosition)?;

        self.metrics.inc_sells();
        debug!(
            item = %item_id,
            user = %user,
            outcome = %outcome,
            shares = %selling,
            payout = %payout,
            "executed sell"
        );

        Ok(SellReceipt {
            payout,
            shares_sold: selling,
            position,
        })
    }

    // =========================================================================
    // Free predictions
    // =========================================================================

    /// Spend a daily free ticket on a prediction (or update an existing
    /// one without spending, while the item stays open).
    pub fn consume_free_ticket(
        &self,
        user: &UserId,
        item_id: &ItemId,
        outcome: &str,
    ) -> Result<Prediction> {
        self.consume_free_ticket_at(user, item_id, outcome, Utc::now().date_naive())
    }

    /// Test seam: same as [`consume_free_ticket`] with an explicit day.
    pub fn consume_free_ticket_at(
        &self,
        user: &UserId,
        item_id: &ItemId,
        outcome: &str,
        today: NaiveDate,
    ) -> Result<Prediction> {
        let handle = self.store.get(item_id)?;
        let item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;

        let outcome = item
            .variant
            .parse_outcome(outcome)
            .ok_or_else(|| EngineError::InvalidOutcome(outcome.to_string()))?;

        let key = (*user, *item_id, PredictionKind::Free);
        if self.ledger.get(&key).is_some() {
            if !item.is_open() {
                return Err(EngineError::AlreadyPredicted);
            }
            // Update, not create: no ticket is consumed.
            return self
                .ledger
                .update(&key, |p| p.outcome = outcome)
                .ok_or(EngineError::NoPosition);
        }

        if !item.is_open() {
            return Err(EngineError::ItemLocked);
        }

        self.tickets.consume(&self.users, user, today)?;
        let prediction = Prediction::new(*user, *item_id, PredictionKind::Free, outcome);
        self.ledger.insert(prediction.clone());
        self.metrics.inc_tickets();
        debug!(item = %item_id, user = %user, outcome = %outcome, "placed free prediction");
        Ok(prediction)
    }

    // =========================================================================
    // Boost stakes
    // =========================================================================

    /// Place a boost stake (or switch the outcome of an existing one
    /// while the item stays open; the stake is preserved).
    pub fn place_boost(
        &self,
        user: &UserId,
        item_id: &ItemId,
        outcome: &str,
        amount: Decimal,
    ) -> Result<Prediction> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }

        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;

        let outcome = item
            .variant
            .parse_outcome(outcome)
            .ok_or_else(|| EngineError::InvalidOutcome(outcome.to_string()))?;
        if item.trading_blocked() {
            return Err(EngineError::ItemLocked);
        }

        let key = (*user, *item_id, PredictionKind::Boost);
        if self.ledger.get(&key).is_some() {
            if !item.is_open() {
                return Err(EngineError::AlreadyPredicted);
            }
            // Outcome switch only; the staked amount and the pool are
            // untouched.
            return self
                .ledger
                .update(&key, |p| p.outcome = outcome)
                .ok_or(EngineError::NoPosition);
        }

        // Verify the user exists before mutating the item.
        self.users.get(user)?;

        let mut prediction = Prediction::new(*user, *item_id, PredictionKind::Boost, outcome);
        prediction.total_stake = amount;
        prediction.amount = amount;
        item.credit_boost(amount);
        self.ledger.insert(prediction.clone());
        self.users
            .with_user(user, |profile| profile.total_predictions += 1)?;

        self.metrics.inc_boost_stakes();
        debug!(
            item = %item_id,
            user = %user,
            outcome = %outcome,
            amount = %amount,
            "placed boost stake"
        );
        Ok(prediction)
    }

    /// Add to or withdraw from an existing boost stake.
    pub fn adjust_boost_stake(
        &self,
        user: &UserId,
        item_id: &ItemId,
        action: StakeAction,
        amount: Decimal,
    ) -> Result<Prediction> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }

        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;

        let key = (*user, *item_id, PredictionKind::Boost);
        let position = self.ledger.get(&key).ok_or(EngineError::NoPosition)?;
        if !item.is_open() {
            return Err(EngineError::ItemLocked);
        }

        match action {
            StakeAction::Add => {
                item.credit_boost(amount);
                self.metrics.inc_boost_stakes();
                self.ledger
                    .update(&key, |p| {
                        p.total_stake = p.effective_stake() + amount;
                        p.amount = p.total_stake;
                    })
                    .ok_or(EngineError::NoPosition)
            }
            StakeAction::Withdraw => {
                let current = position.effective_stake();
                if amount > current {
                    return Err(EngineError::StakeExceeded {
                        requested: amount,
                        available: current,
                    });
                }
                item.debit_boost(amount);
                self.ledger
                    .update(&key, |p| {
                        p.total_stake = current - amount;
                        p.amount = p.total_stake;
                    })
                    .ok_or(EngineError::NoPosition)
            }
        }
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Resolve an item and settle every prediction referencing it.
    pub fn resolve(&self, item_id: &ItemId, raw_result: &str) -> Result<ResolveReceipt> {
        let handle = self.store.get(item_id)?;
        let mut item = lock_item(&handle, *item_id, self.config.lock.item_wait())?;

        let summary =
            resolution::resolve_item(&mut item, &self.ledger, raw_result, &self.config.fees)?;
        self.metrics
            .record_resolution(summary.predictions_settled as u64);

        Ok(ResolveReceipt {
            item: item.snapshot(),
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn engine() -> MarketEngine {
        MarketEngine::new(EngineConfig::default())
    }

    fn seeded_poll(engine: &MarketEngine) -> ItemId {
        engine
            .create_poll(
                "q",
                &[(Outcome::Yes, dec!(5)), (Outcome::No, dec!(5))],
            )
            .unwrap()
    }

    #[test]
    fn test_buy_requires_initialized_market() {
        let engine = engine();
        let user = engine.register_user();
        let item = engine.create_poll("q", &[]).unwrap();
        assert_eq!(
            engine.buy(&item, &user, "yes", dec!(2)).unwrap_err(),
            EngineError::MarketNotInitialized
        );
    }

    #[test]
    fn test_buy_happy_path_counts_metric() {
        let engine = engine();
        let user = engine.register_user();
        let item = seeded_poll(&engine);

        let receipt = engine.buy(&item, &user, "YES", dec!(2)).unwrap();
        assert_eq!(receipt.new_liquidity, dec!(7));
        assert!((receipt.position.shares - dec!(0.8333)).abs() < dec!(0.0001));
        assert_eq!(engine.metrics().snapshot().buys_executed, 1);
    }

    #[test]
    fn test_rejections_count_metric() {
        let engine = engine();
        let user = engine.register_user();
        let item = seeded_poll(&engine);

        let _ = engine.buy(&item, &user, "maybe", dec!(2));
        let _ = engine.buy(&item, &user, "yes", dec!(0));
        assert_eq!(engine.metrics().snapshot().trades_rejected, 2);
    }

    #[test]
    fn test_outcome_switch_moves_whole_position() {
        let engine = engine();
        let user = engine.register_user();
        let item = seeded_poll(&engine);

        engine.buy(&item, &user, "yes", dec!(2)).unwrap();
        let receipt = engine.buy(&item, &user, "no", dec!(1)).unwrap();
        // Shares accumulate across outcomes but the position tracks
        // only the latest one.
        assert_eq!(receipt.position.outcome, Outcome::No);
        assert_eq!(receipt.position.total_invested, dec!(3));
    }

    #[test]
    fn test_set_status_rejected_after_resolution() {
        let engine = engine();
        let item = seeded_poll(&engine);
        engine.resolve(&item, "yes").unwrap();
        assert_eq!(
            engine.set_status(&item, ItemStatus::Live).unwrap_err(),
            EngineError::AlreadyResolved
        );
    }

    #[test]
    fn test_price_reads() {
        let engine = engine();
        let item = engine
            .create_poll("q", &[(Outcome::Yes, dec!(6)), (Outcome::No, dec!(2))])
            .unwrap();
        assert_eq!(engine.price(&item, "yes").unwrap(), dec!(0.75));
        assert_eq!(
            engine.price(&item, "draw").unwrap_err(),
            EngineError::InvalidOutcome("draw".to_string())
        );
    }
}
