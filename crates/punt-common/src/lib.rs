//! Shared types for the punt prediction-game engine.
//!
//! CRITICAL: All stakes, shares, prices and payouts use
//! `rust_decimal::Decimal`. NEVER use f64 for financial math.
//!
//! This crate contains:
//! - Typed identifiers (ItemId, UserId, PredictionId)
//! - Market vocabulary (MarketVariant, Outcome)
//! - Lifecycle enums (ItemStatus, PredictionKind, PredictionStatus)

pub mod types;

pub use types::*;
