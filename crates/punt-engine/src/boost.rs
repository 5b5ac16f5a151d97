//! Boost pool distribution.
//!
//! Invoked once per item from the resolution pass, after every
//! prediction has been classified won/lost. Winners split 80% of the
//! pool (10% platform fee, 10% jackpot fee at default rates) in
//! proportion to their stakes.

use rust_decimal::Decimal;
use tracing::info;

use punt_common::{ItemId, PredictionKind, PredictionStatus};

use crate::config::FeeConfig;
use crate::ledger::PredictionLedger;

/// Summary of one item's boost distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoostDistribution {
    pub platform_fee: Decimal,
    pub jackpot_fee: Decimal,
    pub distributable: Decimal,
    pub total_winning_stake: Decimal,
    pub winners_paid: usize,
    pub total_paid: Decimal,
}

impl BoostDistribution {
    fn noop() -> Self {
        Self {
            platform_fee: Decimal::ZERO,
            jackpot_fee: Decimal::ZERO,
            distributable: Decimal::ZERO,
            total_winning_stake: Decimal::ZERO,
            winners_paid: 0,
            total_paid: Decimal::ZERO,
        }
    }
}

/// Distribute `boost_pool` across the winning boost predictions of
/// `item`. No-op when the pool is empty or nobody won.
///
/// Caller holds the item lock; losing rows were already marked `lost`
/// and are not touched here.
pub fn distribute(
    ledger: &PredictionLedger,
    item: &ItemId,
    boost_pool: Decimal,
    fees: &FeeConfig,
) -> BoostDistribution {
    let winners: Vec<_> = ledger
        .for_item(item)
        .into_iter()
        .filter(|p| p.kind == PredictionKind::Boost && p.status == PredictionStatus::Won)
        .collect();

    let total_winning_stake: Decimal = winners.iter().map(|p| p.effective_stake()).sum();
    if boost_pool.is_zero() || total_winning_stake.is_zero() {
        return BoostDistribution::noop();
    }

    let platform_fee = boost_pool * fees.platform_rate;
    let jackpot_fee = boost_pool * fees.jackpot_rate;
    let distributable = boost_pool - platform_fee - jackpot_fee;

    let mut winners_paid = 0;
    let mut total_paid = Decimal::ZERO;
    for winner in &winners {
        let stake = winner.effective_stake();
        if stake.is_zero() {
            continue;
        }
        let payout = distributable * stake / total_winning_stake;
        let key = (winner.user, winner.item, winner.kind);
        ledger.update(&key, |p| {
            p.payout = payout;
            p.status = PredictionStatus::Settled;
        });
        winners_paid += 1;
        total_paid += payout;
    }

    info!(
        item = %item,
        pool = %boost_pool,
        distributable = %distributable,
        winners = winners_paid,
        paid = %total_paid,
        "distributed boost pool"
    );

    BoostDistribution {
        platform_fee,
        jackpot_fee,
        distributable,
        total_winning_stake,
        winners_paid,
        total_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use punt_common::{Outcome, UserId};

    use crate::ledger::Prediction;

    fn boost_row(item: ItemId, stake: Decimal, status: PredictionStatus) -> Prediction {
        let mut p = Prediction::new(UserId::new(), item, PredictionKind::Boost, Outcome::Yes);
        p.total_stake = stake;
        p.amount = stake;
        p.status = status;
        p
    }

    #[test]
    fn test_proportional_split_after_fees() {
        // stakes [1 won, 3 won, 2 lost], pool 10 -> payouts 2 and 6.
        let ledger = PredictionLedger::new();
        let item = ItemId::new();
        let w1 = boost_row(item, dec!(1), PredictionStatus::Won);
        let w2 = boost_row(item, dec!(3), PredictionStatus::Won);
        let l1 = boost_row(item, dec!(2), PredictionStatus::Lost);
        let (k1, k2, k3) = (
            (w1.user, item, PredictionKind::Boost),
            (w2.user, item, PredictionKind::Boost),
            (l1.user, item, PredictionKind::Boost),
        );
        ledger.insert(w1);
        ledger.insert(w2);
        ledger.insert(l1);

        let dist = distribute(&ledger, &item, dec!(10), &FeeConfig::default());
        assert_eq!(dist.platform_fee, dec!(1.0));
        assert_eq!(dist.jackpot_fee, dec!(1.0));
        assert_eq!(dist.distributable, dec!(8.0));
        assert_eq!(dist.winners_paid, 2);

        assert_eq!(ledger.get(&k1).unwrap().payout, dec!(2.0));
        assert_eq!(ledger.get(&k2).unwrap().payout, dec!(6.0));
        assert_eq!(ledger.get(&k1).unwrap().status, PredictionStatus::Settled);
        assert_eq!(ledger.get(&k3).unwrap().payout, Decimal::ZERO);
        assert_eq!(ledger.get(&k3).unwrap().status, PredictionStatus::Lost);
    }

    #[test]
    fn test_noop_on_empty_pool() {
        let ledger = PredictionLedger::new();
        let item = ItemId::new();
        let w = boost_row(item, dec!(1), PredictionStatus::Won);
        let key = (w.user, item, PredictionKind::Boost);
        ledger.insert(w);

        let dist = distribute(&ledger, &item, Decimal::ZERO, &FeeConfig::default());
        assert_eq!(dist.winners_paid, 0);
        // Winner keeps its won status; nothing was assigned.
        assert_eq!(ledger.get(&key).unwrap().status, PredictionStatus::Won);
    }

    #[test]
    fn test_noop_when_nobody_won() {
        let ledger = PredictionLedger::new();
        let item = ItemId::new();
        ledger.insert(boost_row(item, dec!(5), PredictionStatus::Lost));

        let dist = distribute(&ledger, &item, dec!(10), &FeeConfig::default());
        assert_eq!(dist.winners_paid, 0);
        assert_eq!(dist.total_paid, Decimal::ZERO);
    }

    #[test]
    fn test_conservation_bound() {
        let ledger = PredictionLedger::new();
        let item = ItemId::new();
        for stake in [dec!(0.7), dec!(1.3), dec!(2.9), dec!(4.1)] {
            ledger.insert(boost_row(item, stake, PredictionStatus::Won));
        }

        let pool = dec!(33.33);
        let dist = distribute(&ledger, &item, pool, &FeeConfig::default());
        let cap = pool * dec!(0.8);
        assert!(dist.total_paid <= cap + dec!(0.0001));
        assert!((dist.total_paid - cap).abs() < dec!(0.0001));
    }

    #[test]
    fn test_amount_fallback_used() {
        let ledger = PredictionLedger::new();
        let item = ItemId::new();
        let mut legacy = Prediction::new(
            UserId::new(),
            item,
            PredictionKind::Boost,
            Outcome::Yes,
        );
        legacy.amount = dec!(5); // pre-total_stake row shape
        legacy.status = PredictionStatus::Won;
        let key = (legacy.user, item, PredictionKind::Boost);
        ledger.insert(legacy);

        let dist = distribute(&ledger, &item, dec!(10), &FeeConfig::default());
        assert_eq!(dist.total_winning_stake, dec!(5));
        assert_eq!(ledger.get(&key).unwrap().payout, dec!(8.0));
    }
}
