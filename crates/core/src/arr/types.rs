//! Types shared by the *arr clients and the hunt.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A managed-system type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppKind {
    Sonarr,
    Radarr,
}

impl AppKind {
    /// Processing order for a cycle.
    pub const ALL: [AppKind; 2] = [AppKind::Sonarr, AppKind::Radarr];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppKind::Sonarr => "sonarr",
            AppKind::Radarr => "radarr",
        }
    }

    /// Default instance name and log prefix.
    pub fn display_name(&self) -> &'static str {
        match self {
            AppKind::Sonarr => "Sonarr",
            AppKind::Radarr => "Radarr",
        }
    }

    /// Noun for log lines ("missing episodes", "cutoff-unmet movies").
    pub fn item_noun(&self) -> &'static str {
        match self {
            AppKind::Sonarr => "episodes",
            AppKind::Radarr => "movies",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which wanted list a hunt draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuntKind {
    /// No file yet (`wanted/missing`).
    Missing,
    /// File present but below the quality cutoff (`wanted/cutoff`).
    Upgrade,
}

impl HuntKind {
    /// Processing order within an instance.
    pub const ALL: [HuntKind; 2] = [HuntKind::Missing, HuntKind::Upgrade];

    pub fn as_str(&self) -> &'static str {
        match self {
            HuntKind::Missing => "missing",
            HuntKind::Upgrade => "upgrades",
        }
    }

    /// API endpoint relative to `/api/v3/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            HuntKind::Missing => "wanted/missing",
            HuntKind::Upgrade => "wanted/cutoff",
        }
    }
}

impl fmt::Display for HuntKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display fields that differ between episodes and movies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaDetails {
    Episode {
        series_title: Option<String>,
        /// Monitored flag of the parent series.
        series_monitored: bool,
        season: Option<i64>,
        episode: Option<i64>,
    },
    Movie {
        title: Option<String>,
        year: Option<i64>,
    },
}

/// One wanted episode or movie, fetched per cycle and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Remote id, used for the search command and the ledger key.
    pub id: i64,
    /// The item's own monitored flag.
    pub monitored: bool,
    /// Air date (episodes) or first known release date (movies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    pub details: MediaDetails,
}

impl CandidateItem {
    /// True when the item and, for episodes, its series are monitored.
    pub fn is_monitored(&self) -> bool {
        let parent = match &self.details {
            MediaDetails::Episode {
                series_monitored, ..
            } => *series_monitored,
            MediaDetails::Movie { .. } => true,
        };
        self.monitored && parent
    }

    /// True when the item has a release date strictly after `now`.
    pub fn is_future(&self, now: DateTime<Utc>) -> bool {
        self.release_date.is_some_and(|d| d > now)
    }

    /// Human-readable label: `Series S01E02` or `Title (1999)`.
    pub fn label(&self) -> String {
        match &self.details {
            MediaDetails::Episode {
                series_title,
                season,
                episode,
                ..
            } => {
                let title = series_title.as_deref().unwrap_or("?");
                match (season, episode) {
                    (Some(s), Some(e)) => format!("{} S{:02}E{:02}", title, s, e),
                    _ => format!(
                        "{} S{}E{}",
                        title,
                        season.map_or("?".to_string(), |s| s.to_string()),
                        episode.map_or("?".to_string(), |e| e.to_string())
                    ),
                }
            }
            MediaDetails::Movie { title, year } => format!(
                "{} ({})",
                title.as_deref().unwrap_or("?"),
                year.map_or("?".to_string(), |y| y.to_string())
            ),
        }
    }
}

/// Result of `GET /api/v3/system/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl SystemStatus {
    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or("unknown")
    }
}

/// Paging parameters for a wanted-list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WantedQuery {
    /// 1-based page index.
    pub page: u32,
    pub page_size: u32,
    pub monitored_only: bool,
}

/// One page of a wanted list.
#[derive(Debug, Clone, Default)]
pub struct WantedPage {
    /// Total records across all pages.
    pub total_records: u64,
    pub records: Vec<CandidateItem>,
}

/// Errors talking to a Sonarr/Radarr instance.
#[derive(Debug, Error)]
pub enum ArrError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}
