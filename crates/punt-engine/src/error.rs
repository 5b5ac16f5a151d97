//! Engine error taxonomy.
//!
//! Every rejection happens before any shared state is mutated. There is
//! no error path that partially applies an operation: callers always see
//! either the full effect or none of it, plus the precondition that
//! failed.

use rust_decimal::Decimal;
use thiserror::Error;

use punt_common::{ItemId, ItemStatus, UserId};

/// Errors produced by engine operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid outcome '{0}' for this market")]
    InvalidOutcome(String),

    #[error("invalid amount: {0} (must be positive)")]
    InvalidAmount(Decimal),

    #[error("invalid shares: requested {requested}, owned {owned}")]
    InvalidShares { requested: Decimal, owned: Decimal },

    #[error("invalid result '{0}' for this market")]
    InvalidResult(String),

    #[error("status '{0}' can only be set by resolution")]
    ReservedStatus(ItemStatus),

    #[error("market not initialized")]
    MarketNotInitialized,

    #[error("item is locked or resolved")]
    ItemLocked,

    #[error("item already resolved")]
    AlreadyResolved,

    #[error("prediction already exists and the item is no longer open")]
    AlreadyPredicted,

    #[error("withdrawal {requested} exceeds current stake {available}")]
    StakeExceeded {
        requested: Decimal,
        available: Decimal,
    },

    #[error("no tickets available")]
    NoTicketsAvailable,

    #[error("no market position for this item")]
    NoPosition,

    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("timed out waiting for exclusive access to item {0}")]
    LockTimeout(ItemId),
}

/// Coarse classification used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input; retry with corrected input.
    Validation,
    /// Current item/prediction state forbids the operation.
    StateConflict,
    /// Referenced entity does not exist.
    NotFound,
    /// Lost the per-item exclusion race; retry the whole operation.
    ConcurrencyConflict,
}

impl EngineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::InvalidOutcome(_)
            | EngineError::InvalidAmount(_)
            | EngineError::InvalidShares { .. }
            | EngineError::InvalidResult(_)
            | EngineError::ReservedStatus(_) => ErrorCategory::Validation,
            EngineError::MarketNotInitialized
            | EngineError::ItemLocked
            | EngineError::AlreadyResolved
            | EngineError::AlreadyPredicted
            | EngineError::StakeExceeded { .. }
            | EngineError::NoTicketsAvailable => ErrorCategory::StateConflict,
            EngineError::NoPosition
            | EngineError::ItemNotFound(_)
            | EngineError::UserNotFound(_) => ErrorCategory::NotFound,
            EngineError::LockTimeout(_) => ErrorCategory::ConcurrencyConflict,
        }
    }

    /// Whether the caller should retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::ConcurrencyConflict
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_categories() {
        assert_eq!(
            EngineError::InvalidAmount(dec!(-1)).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            EngineError::ItemLocked.category(),
            ErrorCategory::StateConflict
        );
        assert_eq!(
            EngineError::NoPosition.category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            EngineError::LockTimeout(ItemId::new()).category(),
            ErrorCategory::ConcurrencyConflict
        );
    }

    #[test]
    fn test_only_lock_timeout_retryable() {
        assert!(EngineError::LockTimeout(ItemId::new()).is_retryable());
        assert!(!EngineError::AlreadyResolved.is_retryable());
        assert!(!EngineError::NoTicketsAvailable.is_retryable());
    }

    #[test]
    fn test_display_names_precondition() {
        let err = EngineError::InvalidShares {
            requested: dec!(5),
            owned: dec!(2),
        };
        let msg = err.to_string();
        assert!(msg.contains("5"));
        assert!(msg.contains("2"));
    }
}
