use crate::models::Money;
use thiserror::Error;

/// Errors produced by the ledger engine and its ambient plumbing.
///
/// Engine errors are deterministic: the same inputs always yield the same
/// variant and message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid expense: {0}")]
    InvalidExpense(String),

    #[error("Invalid split: {0}")]
    InvalidSplit(String),

    #[error("Split mismatch: {0}")]
    SplitMismatch(String),

    #[error("Unbalanced ledger: balances sum to {0}, expected 0.00")]
    UnbalancedLedger(Money),

    #[error("Invalid group: {0}")]
    InvalidGroup(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Stable machine-readable code for API payloads and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidExpense(_) => "INVALID_EXPENSE",
            EngineError::InvalidSplit(_) => "INVALID_SPLIT",
            EngineError::SplitMismatch(_) => "SPLIT_MISMATCH",
            EngineError::UnbalancedLedger(_) => "UNBALANCED_LEDGER",
            EngineError::InvalidGroup(_) => "INVALID_GROUP",
            EngineError::Config(_) => "CONFIG",
            EngineError::Serialization(_) => "SERIALIZATION",
            EngineError::Io(_) => "IO",
        }
    }

    /// True when the error was caused by caller-supplied data rather than
    /// an upstream invariant violation or the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidExpense(_)
                | EngineError::InvalidSplit(_)
                | EngineError::SplitMismatch(_)
                | EngineError::InvalidGroup(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
