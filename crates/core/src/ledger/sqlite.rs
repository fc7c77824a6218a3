//! SQLite-backed search ledger implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{LedgerEntry, LedgerError, LedgerKey, LedgerStats, SearchLedger};

/// How long a statement waits on a lock held by another connection.
const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// SQLite-backed search ledger.
///
/// Owns one connection for the duration of a cycle. Dropping the ledger
/// closes the connection; [`SqliteLedger::close`] does the same and reports
/// close errors.
pub struct SqliteLedger {
    conn: Mutex<Connection>,
    ttl: Duration,
}

impl SqliteLedger {
    /// Open (or create) the ledger database at `path`.
    pub fn open(path: &Path, ttl_hours: u32) -> Result<Self, LedgerError> {
        let conn = Connection::open(path).map_err(|e| LedgerError::Database(e.to_string()))?;

        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(|e| LedgerError::Database(e.to_string()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Self::initialize_schema(&conn)?;
        debug!(path = %path.display(), ttl_hours, "Search ledger opened");

        Ok(Self {
            conn: Mutex::new(conn),
            ttl: Duration::hours(ttl_hours as i64),
        })
    }

    /// Create an in-memory ledger (useful for testing).
    pub fn in_memory(ttl_hours: u32) -> Result<Self, LedgerError> {
        let conn =
            Connection::open_in_memory().map_err(|e| LedgerError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            ttl: Duration::hours(ttl_hours as i64),
        })
    }

    /// Close the connection.
    pub fn close(self) -> Result<(), LedgerError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| LedgerError::Internal("ledger lock poisoned".to_string()))?;
        conn.close()
            .map_err(|(_, e)| LedgerError::Database(e.to_string()))
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LedgerError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS searched (
                app TEXT NOT NULL,
                instance TEXT NOT NULL,
                media_id TEXT NOT NULL,
                searched_at TEXT NOT NULL,
                PRIMARY KEY (app, instance, media_id)
            );

            CREATE INDEX IF NOT EXISTS idx_searched_searched_at ON searched(searched_at);
            "#,
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerError> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Internal("ledger lock poisoned".to_string()))
    }

    /// Oldest timestamp still inside the TTL window. Saturates for huge TTLs.
    fn cutoff(&self, now: DateTime<Utc>) -> String {
        let cutoff = now
            .checked_sub_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        format_timestamp(cutoff)
    }
}

impl SearchLedger for SqliteLedger {
    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_recently_searched_at(
        &self,
        key: &LedgerKey<'_>,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        let conn = self.lock()?;

        let found = conn
            .query_row(
                "SELECT 1 FROM searched
                 WHERE app = ? AND instance = ? AND media_id = ? AND searched_at > ?",
                params![
                    key.kind(),
                    key.instance,
                    key.media_id.to_string(),
                    self.cutoff(now)
                ],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    fn mark_searched_at(&self, key: &LedgerKey<'_>, at: DateTime<Utc>) -> Result<(), LedgerError> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO searched (app, instance, media_id, searched_at)
             VALUES (?, ?, ?, ?)",
            params![
                key.kind(),
                key.instance,
                key.media_id.to_string(),
                format_timestamp(at)
            ],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, LedgerError> {
        let conn = self.lock()?;

        conn.execute(
            "DELETE FROM searched WHERE searched_at <= ?",
            params![self.cutoff(now)],
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }

    fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT app, instance, media_id, searched_at FROM searched
                 ORDER BY searched_at ASC",
            )
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (kind, instance, media_id, searched_at) =
                row.map_err(|e| LedgerError::Database(e.to_string()))?;
            let searched_at = parse_timestamp(&searched_at).ok_or_else(|| {
                LedgerError::Database(format!(
                    "invalid searched_at {:?} for {}/{}/{}",
                    searched_at, kind, instance, media_id
                ))
            })?;
            entries.push(LedgerEntry {
                kind,
                instance,
                media_id,
                searched_at,
            });
        }
        Ok(entries)
    }

    fn stats(&self) -> Result<LedgerStats, LedgerError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT COUNT(*), MIN(searched_at), MAX(searched_at) FROM searched",
            [],
            |row| {
                let oldest: Option<String> = row.get(1)?;
                let newest: Option<String> = row.get(2)?;
                Ok(LedgerStats {
                    entries: row.get(0)?,
                    oldest: oldest.as_deref().and_then(parse_timestamp),
                    newest: newest.as_deref().and_then(parse_timestamp),
                })
            },
        )
        .map_err(|e| LedgerError::Database(e.to_string()))
    }
}

/// Fixed-width RFC 3339 so string order matches time order.
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
