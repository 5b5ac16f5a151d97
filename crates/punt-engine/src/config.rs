//! Configuration for the punt engine.
//!
//! Supports loading from a TOML file with environment variable
//! overrides. Fee rates are written as plain fractions in the file
//! (e.g. `platform_fee_rate = 0.10`) and converted to `Decimal` on load.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Top-level engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Free-ticket parameters.
    pub tickets: TicketConfig,

    /// Boost pool fee parameters.
    pub fees: FeeConfig,

    /// Per-item lock parameters.
    pub lock: LockConfig,
}

/// Free-ticket allocation parameters.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Tickets granted per user per calendar day.
    pub daily_free_limit: u32,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            daily_free_limit: 1,
        }
    }
}

/// Fees taken from the boost pool at resolution.
#[derive(Debug, Clone)]
pub struct FeeConfig {
    /// Platform cut of the boost pool (fraction of 1).
    pub platform_rate: Decimal,

    /// Jackpot cut of the boost pool (fraction of 1).
    pub jackpot_rate: Decimal,
}

impl FeeConfig {
    /// Fraction of the boost pool left for winners.
    pub fn distributable_rate(&self) -> Decimal {
        Decimal::ONE - self.platform_rate - self.jackpot_rate
    }
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            platform_rate: Decimal::new(10, 2), // 0.10
            jackpot_rate: Decimal::new(10, 2),  // 0.10
        }
    }
}

/// Per-item exclusion parameters.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Maximum time a request waits for an item's lock before giving up
    /// with a retryable conflict (milliseconds).
    pub item_wait_ms: u64,
}

impl LockConfig {
    pub fn item_wait(&self) -> Duration {
        Duration::from_millis(self.item_wait_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { item_wait_ms: 2000 }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            tickets: TicketConfig::default(),
            fees: FeeConfig::default(),
            lock: LockConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        let config: EngineConfig = file.try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("PUNT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(limit) = std::env::var("PUNT_DAILY_FREE_LIMIT") {
            if let Ok(parsed) = limit.parse() {
                self.tickets.daily_free_limit = parsed;
            }
        }
        if let Ok(wait) = std::env::var("PUNT_ITEM_WAIT_MS") {
            if let Ok(parsed) = wait.parse() {
                self.lock.item_wait_ms = parsed;
            }
        }
    }

    /// Validate invariants the rest of the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let zero = Decimal::ZERO;
        let one = Decimal::ONE;
        if self.fees.platform_rate < zero || self.fees.platform_rate > one {
            bail!("platform fee rate must be within [0, 1]");
        }
        if self.fees.jackpot_rate < zero || self.fees.jackpot_rate > one {
            bail!("jackpot fee rate must be within [0, 1]");
        }
        if self.fees.platform_rate + self.fees.jackpot_rate > one {
            bail!("combined fee rates must not exceed 1");
        }
        if self.tickets.daily_free_limit == 0 {
            bail!("daily free limit must be at least 1");
        }
        Ok(())
    }
}

// TOML file representation, kept separate so serde defaults stay in one
// place and the runtime config can use Decimal.

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    tickets: TomlTickets,
    #[serde(default)]
    fees: TomlFees,
    #[serde(default)]
    lock: TomlLock,
}

#[derive(Debug, Deserialize)]
struct TomlGeneral {
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for TomlGeneral {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlTickets {
    #[serde(default = "default_daily_limit")]
    daily_free_limit: u32,
}

impl Default for TomlTickets {
    fn default() -> Self {
        Self {
            daily_free_limit: default_daily_limit(),
        }
    }
}

fn default_daily_limit() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct TomlFees {
    #[serde(default = "default_fee_rate")]
    platform_fee_rate: f64,
    #[serde(default = "default_fee_rate")]
    jackpot_fee_rate: f64,
}

impl Default for TomlFees {
    fn default() -> Self {
        Self {
            platform_fee_rate: default_fee_rate(),
            jackpot_fee_rate: default_fee_rate(),
        }
    }
}

fn default_fee_rate() -> f64 {
    0.10
}

#[derive(Debug, Deserialize)]
struct TomlLock {
    #[serde(default = "default_item_wait_ms")]
    item_wait_ms: u64,
}

impl Default for TomlLock {
    fn default() -> Self {
        Self {
            item_wait_ms: default_item_wait_ms(),
        }
    }
}

fn default_item_wait_ms() -> u64 {
    2000
}

impl TryFrom<TomlConfig> for EngineConfig {
    type Error = anyhow::Error;

    fn try_from(toml: TomlConfig) -> Result<Self> {
        Ok(Self {
            log_level: toml.general.log_level,
            tickets: TicketConfig {
                daily_free_limit: toml.tickets.daily_free_limit,
            },
            fees: FeeConfig {
                platform_rate: f64_to_decimal(toml.fees.platform_fee_rate)?,
                jackpot_rate: f64_to_decimal(toml.fees.jackpot_fee_rate)?,
            },
            lock: LockConfig {
                item_wait_ms: toml.lock.item_wait_ms,
            },
        })
    }
}

fn f64_to_decimal(value: f64) -> Result<Decimal> {
    Decimal::try_from(value).with_context(|| format!("value {} is not representable", value))
}
