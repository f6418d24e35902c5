pub mod ledger_cache;

pub use ledger_cache::{fingerprint, CacheStats, LedgerCache};
