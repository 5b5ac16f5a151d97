//! Domain vocabulary shared by every engine component.
//!
//! Outcomes are a closed enumeration. Raw strings from callers are
//! converted exactly once, at the ingress boundary, via
//! [`MarketVariant::normalize_result`] / [`MarketVariant::parse_outcome`];
//! everything past that boundary compares enum values, never strings.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a tradable item (match or poll).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a prediction row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionId(Uuid);

impl PredictionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PredictionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PredictionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of a tradable item.
///
/// The first three variants belong to matches, the last two to polls.
/// [`MarketVariant::outcomes`] defines which subset is legal for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    TeamA,
    TeamB,
    Draw,
    Yes,
    No,
}

impl Outcome {
    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::TeamA => "TEAMA",
            Outcome::TeamB => "TEAMB",
            Outcome::Draw => "DRAW",
            Outcome::Yes => "YES",
            Outcome::No => "NO",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two kinds of tradable items and their variant-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MarketVariant {
    /// A sporting match between two named teams; three-way outcome.
    Match { team_a: String, team_b: String },
    /// A binary question; two-way outcome.
    Poll { question: String },
}

impl MarketVariant {
    /// The legal outcome set for this variant, in canonical order.
    pub fn outcomes(&self) -> &'static [Outcome] {
        match self {
            MarketVariant::Match { .. } => &[Outcome::TeamA, Outcome::TeamB, Outcome::Draw],
            MarketVariant::Poll { .. } => &[Outcome::Yes, Outcome::No],
        }
    }

    /// Number of outcomes (3 for matches, 2 for polls).
    pub fn outcome_count(&self) -> usize {
        self.outcomes().len()
    }

    /// Uniform fallback price (1/N) used while no liquidity exists.
    pub fn default_price(&self) -> Decimal {
        Decimal::ONE / Decimal::from(self.outcome_count() as u32)
    }

    /// Whether `outcome` is legal for this variant.
    pub fn contains(&self, outcome: Outcome) -> bool {
        self.outcomes().contains(&outcome)
    }

    /// Parse a caller-supplied outcome string for this variant.
    ///
    /// Case-insensitive against the canonical names; anything that does
    /// not map cleanly is rejected with `None`.
    pub fn parse_outcome(&self, raw: &str) -> Option<Outcome> {
        let lowered = raw.trim().to_lowercase();
        let outcome = match (self, lowered.as_str()) {
            (MarketVariant::Match { .. }, "teama") => Outcome::TeamA,
            (MarketVariant::Match { .. }, "teamb") => Outcome::TeamB,
            (MarketVariant::Match { .. }, "draw") => Outcome::Draw,
            (MarketVariant::Poll { .. }, "yes") => Outcome::Yes,
            (MarketVariant::Poll { .. }, "no") => Outcome::No,
            _ => return None,
        };
        Some(outcome)
    }

    /// Normalize a raw resolution result into this variant's vocabulary.
    ///
    /// Matches additionally accept the literal team name (exact,
    /// case-sensitive equality, as entered by the operator who created
    /// the match).
    pub fn normalize_result(&self, raw: &str) -> Option<Outcome> {
        if let MarketVariant::Match { team_a, team_b } = self {
            if raw == team_a.as_str() {
                return Some(Outcome::TeamA);
            }
            if raw == team_b.as_str() {
                return Some(Outcome::TeamB);
            }
        }
        self.parse_outcome(raw)
    }

    /// Short tag for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketVariant::Match { .. } => "match",
            MarketVariant::Poll { .. } => "poll",
        }
    }
}

impl fmt::Display for MarketVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a tradable item.
///
/// Matches historically use `live`/`completed`, polls `active`/`settled`;
/// both spellings deserialize to the same state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Upcoming,
    #[serde(alias = "active")]
    Live,
    #[serde(alias = "settled")]
    Completed,
    Locked,
}

impl ItemStatus {
    /// Whether predictions may still be created or changed.
    pub fn is_open(&self) -> bool {
        matches!(self, ItemStatus::Upcoming | ItemStatus::Live)
    }

    /// Whether AMM trading is blocked by status alone.
    pub fn blocks_trading(&self) -> bool {
        matches!(self, ItemStatus::Locked | ItemStatus::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Upcoming => "upcoming",
            ItemStatus::Live => "live",
            ItemStatus::Completed => "completed",
            ItemStatus::Locked => "locked",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of prediction a user holds on an item.
///
/// A user holds at most one prediction per (item, kind); the kind is
/// immutable once the row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionKind {
    /// Daily-ticket prediction, no financial fields.
    Free,
    /// Pooled real-value stake, settled proportionally.
    Boost,
    /// AMM position holding outcome shares.
    Market,
}

impl PredictionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionKind::Free => "free",
            PredictionKind::Boost => "boost",
            PredictionKind::Market => "market",
        }
    }
}

impl fmt::Display for PredictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement status of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    #[default]
    Pending,
    Won,
    Lost,
    Settled,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Pending => "pending",
            PredictionStatus::Won => "won",
            PredictionStatus::Lost => "lost",
            PredictionStatus::Settled => "settled",
        }
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
