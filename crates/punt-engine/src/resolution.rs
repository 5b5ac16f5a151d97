//! Resolution: the one-way transition that fixes an item's result and
//! settles every prediction referencing it.
//!
//! The caller holds the item lock for the whole pass, so the pool
//! totals read here are exactly the totals at the commit point and no
//! trade can interleave. All validation happens before the first
//! mutation; once the result is committed the remaining steps are
//! infallible arithmetic, which is what makes the pass all-or-nothing.

use rust_decimal::Decimal;
use tracing::{info, warn};

use punt_common::{Outcome, PredictionKind, PredictionStatus};

use crate::amm;
use crate::boost::{self, BoostDistribution};
use crate::config::FeeConfig;
use crate::error::{EngineError, Result};
use crate::item::MarketItem;
use crate::ledger::PredictionLedger;

/// Summary of one item's settlement pass.
#[derive(Debug, Clone)]
pub struct SettlementSummary {
    pub result: Outcome,
    /// Predictions classified (won or lost) in this pass.
    pub predictions_settled: usize,
    /// Market positions that received a resolution payout.
    pub market_winners: usize,
    pub boost: BoostDistribution,
}

/// Resolve `item` with the operator-supplied raw result string.
///
/// Rejections (`AlreadyResolved`, `InvalidResult`) leave the item and
/// every prediction untouched and still tradable.
pub fn resolve_item(
    item: &mut MarketItem,
    ledger: &PredictionLedger,
    raw_result: &str,
    fees: &FeeConfig,
) -> Result<SettlementSummary> {
    if item.is_resolved {
        return Err(EngineError::AlreadyResolved);
    }
    let result = item
        .variant
        .normalize_result(raw_result)
        .ok_or_else(|| {
            warn!(item = %item.id, raw = raw_result, "rejected unrecognized result");
            EngineError::InvalidResult(raw_result.to_string())
        })?;

    // Commit point: after this write, trading is permanently rejected.
    item.commit_result(result);

    // Pool totals at the moment of resolution drive every market payout.
    let total_liquidity = item.total_liquidity();
    let winning_shares = item.shares(result);

    let mut market_winners = 0;
    let predictions_settled = ledger.for_item_mut(&item.id, |prediction| {
        prediction.status = if prediction.outcome == result {
            PredictionStatus::Won
        } else {
            PredictionStatus::Lost
        };

        if prediction.kind == PredictionKind::Market
            && prediction.status == PredictionStatus::Won
        {
            let payout =
                amm::resolution_payout(prediction.shares, winning_shares, total_liquidity);
            if payout > Decimal::ZERO {
                prediction.payout = payout;
                market_winners += 1;
            }
            // Market payouts realize immediately; only the transfer of
            // funds happens elsewhere.
            prediction.status = PredictionStatus::Settled;
        }
    });

    let boost = boost::distribute(ledger, &item.id, item.boost_pool, fees);

    info!(
        item = %item.id,
        result = %result,
        predictions = predictions_settled,
        market_winners,
        boost_paid = %boost.total_paid,
        "resolved item"
    );

    Ok(SettlementSummary {
        result,
        predictions_settled,
        market_winners,
        boost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use punt_common::{ItemStatus, UserId};

    use crate::ledger::Prediction;

    fn market_row(item: &MarketItem, outcome: Outcome, shares: Decimal) -> Prediction {
        let mut p = Prediction::new(UserId::new(), item.id, PredictionKind::Market, outcome);
        p.shares = shares;
        p
    }

    #[test]
    fn test_resolve_classifies_and_settles_market() {
        let mut item = MarketItem::new_poll("q");
        item.seed_liquidity(&[(Outcome::Yes, dec!(7)), (Outcome::No, dec!(5))]);
        item.apply_buy(Outcome::Yes, Decimal::ZERO, dec!(1.0));

        let ledger = PredictionLedger::new();
        let winner = market_row(&item, Outcome::Yes, dec!(0.5));
        let loser = market_row(&item, Outcome::No, dec!(0.3));
        let wkey = (winner.user, item.id, PredictionKind::Market);
        let lkey = (loser.user, item.id, PredictionKind::Market);
        ledger.insert(winner);
        ledger.insert(loser);

        let summary =
            resolve_item(&mut item, &ledger, "YES", &FeeConfig::default()).unwrap();
        assert_eq!(summary.result, Outcome::Yes);
        assert_eq!(summary.predictions_settled, 2);
        assert_eq!(summary.market_winners, 1);

        // 0.5 of 1.0 winning shares on a 12.0 pot.
        let won = ledger.get(&wkey).unwrap();
        assert_eq!(won.status, PredictionStatus::Settled);
        assert!((won.payout - dec!(6)).abs() < dec!(0.0001));

        let lost = ledger.get(&lkey).unwrap();
        assert_eq!(lost.status, PredictionStatus::Lost);
        assert_eq!(lost.payout, Decimal::ZERO);

        assert!(item.is_resolved);
        assert_eq!(item.status, ItemStatus::Completed);
    }

    #[test]
    fn test_second_resolve_rejected() {
        let mut item = MarketItem::new_poll("q");
        let ledger = PredictionLedger::new();
        resolve_item(&mut item, &ledger, "yes", &FeeConfig::default()).unwrap();

        let before = item.clone();
        let err = resolve_item(&mut item, &ledger, "no", &FeeConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::AlreadyResolved);
        assert_eq!(item.result, before.result);
        assert_eq!(item.status, before.status);
    }

    #[test]
    fn test_invalid_result_leaves_item_untouched() {
        let mut item = MarketItem::new_match("Brazil", "Argentina");
        let ledger = PredictionLedger::new();
        ledger.insert(market_row(&item, Outcome::TeamA, dec!(1)));

        let err =
            resolve_item(&mut item, &ledger, "germany", &FeeConfig::default()).unwrap_err();
        assert_eq!(err, EngineError::InvalidResult("germany".to_string()));
        assert!(!item.is_resolved);
        assert_eq!(item.status, ItemStatus::Upcoming);
        assert!(item.result.is_none());
        for row in ledger.for_item(&item.id) {
            assert_eq!(row.status, PredictionStatus::Pending);
        }
    }

    #[test]
    fn test_team_name_result_accepted() {
        let mut item = MarketItem::new_match("Brazil", "Argentina");
        let ledger = PredictionLedger::new();
        let summary =
            resolve_item(&mut item, &ledger, "Argentina", &FeeConfig::default()).unwrap();
        assert_eq!(summary.result, Outcome::TeamB);
    }

    #[test]
    fn test_zero_winning_shares_pays_nothing() {
        let mut item = MarketItem::new_poll("q");
        item.seed_liquidity(&[(Outcome::Yes, dec!(5)), (Outcome::No, dec!(5))]);

        let ledger = PredictionLedger::new();
        // Winner on outcome that never had shares issued at item level.
        let row = market_row(&item, Outcome::Yes, dec!(2));
        let key = (row.user, item.id, PredictionKind::Market);
        ledger.insert(row);

        resolve_item(&mut item, &ledger, "yes", &FeeConfig::default()).unwrap();
        let settled = ledger.get(&key).unwrap();
        assert_eq!(settled.payout, Decimal::ZERO);
        assert_eq!(settled.status, PredictionStatus::Settled);
    }

    #[test]
    fn test_free_predictions_only_won_lost() {
        let mut item = MarketItem::new_poll("q");
        let ledger = PredictionLedger::new();
        let free = Prediction::new(UserId::new(), item.id, PredictionKind::Free, Outcome::Yes);
        let key = (free.user, item.id, PredictionKind::Free);
        ledger.insert(free);

        resolve_item(&mut item, &ledger, "yes", &FeeConfig::default()).unwrap();
        let row = ledger.get(&key).unwrap();
        assert_eq!(row.status, PredictionStatus::Won);
        assert_eq!(row.payout, Decimal::ZERO);
    }
}
