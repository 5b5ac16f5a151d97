//! In-memory market item store with per-item exclusion.
//!
//! Each item sits behind its own `parking_lot::Mutex`. Every trading
//! and settlement operation acquires that mutex for its whole
//! read-compute-write span, so two concurrent buys can never price off
//! the same stale liquidity snapshot, and resolution is the last writer
//! once it commits. Lock waits are bounded: a caller that cannot get
//! the lock within the configured budget receives a retryable
//! `LockTimeout` and nothing is applied.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use punt_common::ItemId;

use crate::error::{EngineError, Result};
use crate::item::MarketItem;

/// Shared handle to one item's lock-protected state.
pub type ItemHandle = Arc<Mutex<MarketItem>>;

/// Owner of all market items.
#[derive(Debug, Default)]
pub struct MarketStore {
    items: DashMap<ItemId, ItemHandle>,
}

impl MarketStore {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Register a new item, returning its id.
    pub fn insert(&self, item: MarketItem) -> ItemId {
        let id = item.id;
        self.items.insert(id, Arc::new(Mutex::new(item)));
        id
    }

    /// Fetch the handle for an item.
    pub fn get(&self, id: &ItemId) -> Result<ItemHandle> {
        self.items
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(EngineError::ItemNotFound(*id))
    }

    /// Whether an item exists.
    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.contains_key(id)
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ids of all registered items.
    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|entry| *entry.key()).collect()
    }
}

/// Acquire an item's lock within `wait`, or fail with a retryable
/// conflict. The guard borrows from `handle`, so callers keep the
/// handle alive for the guard's lifetime.
pub fn lock_item(
    handle: &ItemHandle,
    id: ItemId,
    wait: Duration,
) -> Result<parking_lot::MutexGuard<'_, MarketItem>> {
    handle
        .try_lock_for(wait)
        .ok_or(EngineError::LockTimeout(id))
}
