//! Market-making and settlement engine for the punt prediction game.
//!
//! Users stake free daily tickets, pooled real-value "boost" stakes, or
//! AMM positions on the outcome of matches and polls; the engine prices
//! trades against per-outcome liquidity pools and settles every
//! position exactly once when an item resolves.
//!
//! ## Architecture
//!
//! - **Per-item exclusion**: every trade and the resolution pass hold
//!   the item's lock for their whole read-compute-write span, so
//!   concurrent buys serialize and resolution is the last writer.
//! - **Ingress normalization**: outcome and result strings become
//!   closed enum values at the facade boundary; nothing downstream
//!   compares strings.
//! - **Fail-closed**: every rejection happens before any mutation.
//!
//! ## Modules
//!
//! - `engine`: the `MarketEngine` facade implementing every operation
//! - `item` / `store`: per-item market state and its lock discipline
//! - `ledger`: one prediction row per (user, item, kind)
//! - `amm`: pricing and quote math
//! - `boost`: proportional boost pool distribution
//! - `resolution`: the one-way settlement pass
//! - `tickets`: daily free-ticket allocation
//! - `config`: TOML configuration with env overrides

pub mod amm;
pub mod boost;
pub mod config;
pub mod engine;
pub mod error;
pub mod item;
pub mod ledger;
pub mod metrics;
pub mod resolution;
pub mod store;
pub mod tickets;
pub mod users;

pub use config::{EngineConfig, FeeConfig, LockConfig, TicketConfig};
pub use engine::{
    BuyReceipt, MarketEngine, ResolveReceipt, SellAmount, SellReceipt, StakeAction,
};
pub use error::{EngineError, ErrorCategory, Result};
pub use item::{MarketItem, MarketSnapshot};
pub use ledger::{Prediction, PredictionLedger};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use resolution::SettlementSummary;
pub use store::MarketStore;
pub use tickets::{TicketAllocator, TicketReceipt};
pub use users::{UserProfile, UserRegistry};
