//! User profile registry.
//!
//! Account management lives outside the engine; this registry carries
//! only the fields the engine itself reads and writes: the daily ticket
//! allowance and the aggregate prediction counters.

use chrono::NaiveDate;
use dashmap::DashMap;
use serde::Serialize;

use punt_common::UserId;

use crate::error::{EngineError, Result};

/// Engine-visible slice of a user account.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub tickets: u32,
    pub last_ticket_date: Option<NaiveDate>,
    pub streak: u32,
    pub total_predictions: u64,
    pub correct_predictions: u64,
    pub points: i64,
}

impl UserProfile {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            tickets: 1,
            last_ticket_date: None,
            streak: 0,
            total_predictions: 0,
            correct_predictions: 0,
            points: 0,
        }
    }
}

/// Concurrent map of user profiles.
#[derive(Debug, Default)]
pub struct UserRegistry {
    users: DashMap<UserId, UserProfile>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    /// Register a fresh profile, returning its id.
    pub fn register(&self) -> UserId {
        let id = UserId::new();
        self.users.insert(id, UserProfile::new(id));
        id
    }

    /// Insert a pre-built profile (tests, imports).
    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.id, profile);
    }

    /// Fetch a copy of a profile.
    pub fn get(&self, id: &UserId) -> Result<UserProfile> {
        self.users
            .get(id)
            .map(|r| r.value().clone())
            .ok_or(EngineError::UserNotFound(*id))
    }

    /// Mutate a profile in place, returning a copy of the result of `f`.
    pub fn with_user<F, T>(&self, id: &UserId, f: F) -> Result<T>
    where
        F: FnOnce(&mut UserProfile) -> T,
    {
        self.users
            .get_mut(id)
            .map(|mut r| f(r.value_mut()))
            .ok_or(EngineError::UserNotFound(*id))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = UserRegistry::new();
        let id = registry.register();
        let profile = registry.get(&id).unwrap();
        assert_eq!(profile.tickets, 1);
        assert_eq!(profile.total_predictions, 0);
        assert!(profile.last_ticket_date.is_none());
    }

    #[test]
    fn test_unknown_user() {
        let registry = UserRegistry::new();
        let missing = UserId::new();
        assert_eq!(
            registry.get(&missing).unwrap_err(),
            EngineError::UserNotFound(missing)
        );
    }

    #[test]
    fn test_with_user_mutates() {
        let registry = UserRegistry::new();
        let id = registry.register();
        let tickets = registry
            .with_user(&id, |u| {
                u.tickets = 3;
                u.tickets
            })
            .unwrap();
        assert_eq!(tickets, 3);
        assert_eq!(registry.get(&id).unwrap().tickets, 3);
    }
}
