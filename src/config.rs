use crate::models::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
    pub metrics: MetricsSettings,
}

/// Tolerances used by the allocator and the settlement planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Largest accepted gap, in minor units, between EXACT weights and the expense amount.
    pub split_tolerance_minor: i64,
    /// Largest accepted gap between the PERCENT weights and 100.
    pub percent_tolerance: Decimal,
    /// Balances within this many minor units of zero count as settled.
    pub settle_epsilon_minor: i64,
    /// Largest accepted non-zero total of a balance map before planning is refused.
    pub ledger_tolerance_minor: i64,
}

impl EngineSettings {
    pub fn split_tolerance(&self) -> Money {
        Money::from_minor(self.split_tolerance_minor.abs())
    }

    pub fn settle_epsilon(&self) -> Money {
        Money::from_minor(self.settle_epsilon_minor.abs())
    }

    pub fn ledger_tolerance(&self) -> Money {
        Money::from_minor(self.ledger_tolerance_minor.abs())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            split_tolerance_minor: 1,
            percent_tolerance: Decimal::new(1, 2),
            settle_epsilon_minor: 0,
            ledger_tolerance_minor: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
}

impl Settings {
    pub fn new() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        builder.build()?.try_deserialize()
    }
}
