//! Search ledger - remembers which items were searched and when.
//!
//! An entry younger than the TTL excludes its item from selection. Expired
//! rows are purged at the start of each cycle, but correctness only relies
//! on the timestamp comparison.
//!
//! The ledger assumes a single writer. Two processes sharing one database
//! file are only serialized by SQLite's own locking.

mod sqlite;
mod types;

pub use sqlite::SqliteLedger;
pub use types::*;

use chrono::{DateTime, Duration, Utc};

/// Trait for search ledger storage.
///
/// Every mutation is committed before the call returns.
pub trait SearchLedger: Send + Sync {
    /// Cooldown window.
    fn ttl(&self) -> Duration;

    /// True iff an entry exists with `searched_at > now - ttl`.
    fn is_recently_searched_at(
        &self,
        key: &LedgerKey<'_>,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError>;

    /// Insert or replace the entry with `searched_at = at`.
    fn mark_searched_at(&self, key: &LedgerKey<'_>, at: DateTime<Utc>) -> Result<(), LedgerError>;

    /// Delete entries with `searched_at <= now - ttl`; returns rows removed.
    fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, LedgerError>;

    /// All stored entries, oldest first.
    fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError>;

    fn stats(&self) -> Result<LedgerStats, LedgerError>;

    fn is_recently_searched(&self, key: &LedgerKey<'_>) -> Result<bool, LedgerError> {
        self.is_recently_searched_at(key, Utc::now())
    }

    fn mark_searched(&self, key: &LedgerKey<'_>) -> Result<(), LedgerError> {
        self.mark_searched_at(key, Utc::now())
    }

    fn purge_expired(&self) -> Result<usize, LedgerError> {
        self.purge_expired_at(Utc::now())
    }
}
