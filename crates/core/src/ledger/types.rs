//! Types for the search ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arr::{AppKind, HuntKind};

/// Identifies one searched item: (kind, instance, media id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerKey<'a> {
    pub app: AppKind,
    pub hunt: HuntKind,
    pub instance: &'a str,
    pub media_id: i64,
}

impl<'a> LedgerKey<'a> {
    pub fn new(app: AppKind, hunt: HuntKind, instance: &'a str, media_id: i64) -> Self {
        Self {
            app,
            hunt,
            instance,
            media_id,
        }
    }

    /// Stored kind: `sonarr`, `sonarr_upgrade`, `radarr` or `radarr_upgrade`.
    pub fn kind(&self) -> &'static str {
        match (self.app, self.hunt) {
            (AppKind::Sonarr, HuntKind::Missing) => "sonarr",
            (AppKind::Sonarr, HuntKind::Upgrade) => "sonarr_upgrade",
            (AppKind::Radarr, HuntKind::Missing) => "radarr",
            (AppKind::Radarr, HuntKind::Upgrade) => "radarr_upgrade",
        }
    }
}

/// A stored ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: String,
    pub instance: String,
    pub media_id: String,
    pub searched_at: DateTime<Utc>,
}

/// Ledger statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Rows currently stored, expired or not.
    pub entries: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
}

/// Errors for ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
