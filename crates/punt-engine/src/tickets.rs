//! Daily free-ticket allocation.
//!
//! Tickets replenish at the start of each calendar day: the first
//! consume attempt on a new day resets the balance to the configured
//! limit before spending. The day boundary is passed in by the caller
//! so tests can cross it without a clock.

use chrono::NaiveDate;
use tracing::debug;

use punt_common::UserId;

use crate::error::{EngineError, Result};
use crate::users::UserRegistry;

/// Outcome of a successful ticket consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketReceipt {
    /// Tickets left after this consumption.
    pub remaining: u32,
    /// Whether the daily reset fired on this call.
    pub replenished: bool,
}

/// Grants and consumes free daily prediction tickets.
#[derive(Debug)]
pub struct TicketAllocator {
    daily_limit: u32,
}

impl TicketAllocator {
    pub fn new(daily_limit: u32) -> Self {
        Self { daily_limit }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Consume one ticket for `user`, replenishing first if their last
    /// grant predates `today`. Also counts the prediction on the user's
    /// lifetime total.
    pub fn consume(
        &self,
        users: &UserRegistry,
        user: &UserId,
        today: NaiveDate,
    ) -> Result<TicketReceipt> {
        users.with_user(user, |profile| {
            let replenished = match profile.last_ticket_date {
                Some(last) if last >= today => false,
                _ => {
                    profile.tickets = self.daily_limit;
                    profile.last_ticket_date = Some(today);
                    true
                }
            };

            if profile.tickets < 1 {
                return Err(EngineError::NoTicketsAvailable);
            }

            profile.tickets -= 1;
            profile.total_predictions += 1;
            debug!(
                user = %profile.id,
                remaining = profile.tickets,
                replenished,
                "consumed free ticket"
            );
            Ok(TicketReceipt {
                remaining: profile.tickets,
                replenished,
            })
        })?
    }
}
