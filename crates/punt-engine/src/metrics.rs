//! Engine operation counters.
//!
//! Relaxed ordering throughout; the counts feed logs and dashboards,
//! not settlement math.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters tracking engine activity.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Successful AMM buys.
    pub buys_executed: AtomicU64,

    /// Successful AMM sells.
    pub sells_executed: AtomicU64,

    /// Rejected trading operations (any error category).
    pub trades_rejected: AtomicU64,

    /// Boost stakes placed or increased.
    pub boost_stakes_placed: AtomicU64,

    /// Free tickets consumed.
    pub tickets_consumed: AtomicU64,

    /// Items resolved.
    pub items_resolved: AtomicU64,

    /// Predictions classified during resolution passes.
    pub predictions_settled: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_buys(&self) {
        self.buys_executed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_sells(&self) {
        self.sells_executed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_rejected(&self) {
        self.trades_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_boost_stakes(&self) {
        self.boost_stakes_placed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_tickets(&self) {
        self.tickets_consumed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_resolution(&self, predictions: u64) {
        self.items_resolved.fetch_add(1, Ordering::Relaxed);
        self.predictions_settled
            .fetch_add(predictions, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buys_executed: self.buys_executed.load(Ordering::Relaxed),
            sells_executed: self.sells_executed.load(Ordering::Relaxed),
            trades_rejected: self.trades_rejected.load(Ordering::Relaxed),
            boost_stakes_placed: self.boost_stakes_placed.load(Ordering::Relaxed),
            tickets_consumed: self.tickets_consumed.load(Ordering::Relaxed),
            items_resolved: self.items_resolved.load(Ordering::Relaxed),
            predictions_settled: self.predictions_settled.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub buys_executed: u64,
    pub sells_executed: u64,
    pub trades_rejected: u64,
    pub boost_stakes_placed: u64,
    pub tickets_consumed: u64,
    pub items_resolved: u64,
    pub predictions_settled: u64,
}
