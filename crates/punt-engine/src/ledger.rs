//! The prediction ledger: one row per (user, item, kind) position.
//!
//! The ledger itself is a concurrent map; consistency of the rows for a
//! given item comes from the engine's per-item lock, which is held
//! around every mutation that touches an item's predictions.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;

use punt_common::{ItemId, Outcome, PredictionId, PredictionKind, PredictionStatus, UserId};

/// Key identifying a user's position of a given kind on an item.
pub type PositionKey = (UserId, ItemId, PredictionKind);

/// One prediction row.
///
/// The financial fields are kind-specific: free rows carry none, boost
/// rows use `amount`/`total_stake`, market rows use `shares` and
/// `total_invested`. Unused fields stay zero.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub id: PredictionId,
    pub user: UserId,
    pub item: ItemId,
    pub kind: PredictionKind,
    pub outcome: Outcome,
    /// Mirror of `total_stake` for boost rows (legacy field shape).
    pub amount: Decimal,
    /// Cumulative boost stake, reduced only by explicit withdrawals.
    pub total_stake: Decimal,
    /// Market shares owned for the current outcome.
    pub shares: Decimal,
    /// Cumulative market investment; never reduced on sell.
    pub total_invested: Decimal,
    pub status: PredictionStatus,
    pub payout: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(user: UserId, item: ItemId, kind: PredictionKind, outcome: Outcome) -> Self {
        let now = Utc::now();
        Self {
            id: PredictionId::new(),
            user,
            item,
            kind,
            outcome,
            amount: Decimal::ZERO,
            total_stake: Decimal::ZERO,
            shares: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            status: PredictionStatus::Pending,
            payout: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Boost stake used for payout math: `total_stake`, falling back to
    /// `amount` for rows written before `total_stake` existed.
    pub fn effective_stake(&self) -> Decimal {
        if self.total_stake > Decimal::ZERO {
            self.total_stake
        } else {
            self.amount
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Concurrent map of all prediction rows.
#[derive(Debug, Default)]
pub struct PredictionLedger {
    rows: DashMap<PositionKey, Prediction>,
}

impl PredictionLedger {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Fetch a copy of one position.
    pub fn get(&self, key: &PositionKey) -> Option<Prediction> {
        self.rows.get(key).map(|r| r.value().clone())
    }

    /// Insert a freshly created row. At most one row may exist per key;
    /// the engine checks for an existing position first.
    pub fn insert(&self, prediction: Prediction) {
        let key = (prediction.user, prediction.item, prediction.kind);
        self.rows.insert(key, prediction);
    }

    /// Mutate one position in place, returning a copy of the updated
    /// row. Returns `None` if the position does not exist.
    pub fn update<F>(&self, key: &PositionKey, f: F) -> Option<Prediction>
    where
        F: FnOnce(&mut Prediction),
    {
        self.rows.get_mut(key).map(|mut row| {
            f(row.value_mut());
            row.touch();
            row.value().clone()
        })
    }

    /// Copies of every row referencing `item`.
    pub fn for_item(&self, item: &ItemId) -> Vec<Prediction> {
        self.rows
            .iter()
            .filter(|row| row.value().item == *item)
            .map(|row| row.value().clone())
            .collect()
    }

    /// Mutate every row referencing `item`. Used by resolution while
    /// the item lock is held.
    pub fn for_item_mut<F>(&self, item: &ItemId, mut f: F) -> usize
    where
        F: FnMut(&mut Prediction),
    {
        let mut touched = 0;
        for mut row in self.rows.iter_mut() {
            if row.value().item == *item {
                f(row.value_mut());
                row.value_mut().touch();
                touched += 1;
            }
        }
        touched
    }

    /// Copies of every row belonging to `user`.
    pub fn for_user(&self, user: &UserId) -> Vec<Prediction> {
        self.rows
            .iter()
            .filter(|row| row.value().user == *user)
            .map(|row| row.value().clone())
            .collect()
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
