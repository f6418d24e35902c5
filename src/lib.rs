pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;

pub use error::{EngineError, Result};
pub use services::{compute_group_ledger, GroupLedger, LedgerEngine};
