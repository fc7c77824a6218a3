//! Types for hunt cycles and their reports.

use serde::Serialize;
use thiserror::Error;

use crate::arr::{AppKind, HuntKind};
use crate::ledger::LedgerError;

/// What happened to one selected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// Search triggered and recorded in the ledger.
    Searched,
    /// Dry run: logged only.
    WouldSearch,
    /// The search command failed; nothing was recorded.
    TriggerFailed(String),
    /// The search command succeeded but the ledger write failed.
    /// Counted as not searched.
    Unrecorded(String),
}

/// One selected item and its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub id: i64,
    pub label: String,
    pub outcome: TriggerOutcome,
}

/// Outcomes of one selected batch, in trigger order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub items: Vec<ItemOutcome>,
}

impl BatchOutcome {
    fn count(&self, pred: impl Fn(&TriggerOutcome) -> bool) -> usize {
        self.items.iter().filter(|i| pred(&i.outcome)).count()
    }

    pub fn searched(&self) -> usize {
        self.count(|o| matches!(o, TriggerOutcome::Searched))
    }

    pub fn trigger_failures(&self) -> usize {
        self.count(|o| matches!(o, TriggerOutcome::TriggerFailed(_)))
    }

    pub fn ledger_failures(&self) -> usize {
        self.count(|o| matches!(o, TriggerOutcome::Unrecorded(_)))
    }
}

/// Result of one (instance, hunt kind) pass.
#[derive(Debug, Clone, Serialize)]
pub struct HuntSummary {
    pub app: AppKind,
    pub kind: HuntKind,
    pub instance: String,
    /// Remote total for the wanted list.
    pub total_records: u64,
    /// Page sampled, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Candidates left on the page after all filters.
    pub eligible: usize,
    pub selected: usize,
    pub searched: usize,
    pub trigger_failures: usize,
    pub ledger_failures: usize,
    /// Set when the wanted list could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HuntSummary {
    pub fn new(app: AppKind, kind: HuntKind, instance: &str) -> Self {
        Self {
            app,
            kind,
            instance: instance.to_string(),
            total_records: 0,
            page: None,
            eligible: 0,
            selected: 0,
            searched: 0,
            trigger_failures: 0,
            ledger_failures: 0,
            error: None,
        }
    }

    pub(crate) fn record_batch(&mut self, batch: &BatchOutcome) {
        self.selected = batch.items.len();
        self.searched = batch.searched();
        self.trigger_failures = batch.trigger_failures();
        self.ledger_failures = batch.ledger_failures();
    }
}

/// Totals for one (system, hunt kind) across instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HuntTally {
    pub total_records: u64,
    pub eligible: usize,
    pub selected: usize,
    pub searched: usize,
    pub trigger_failures: usize,
    pub ledger_failures: usize,
}

/// Result of one full cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub dry_run: bool,
    /// Expired ledger rows removed at cycle start.
    pub purged: usize,
    /// Instances that passed the connectivity check.
    pub instances_processed: usize,
    /// Instances skipped for missing settings or failed connectivity.
    pub instances_skipped: usize,
    pub hunts: Vec<HuntSummary>,
}

impl CycleReport {
    pub fn tally(&self, app: AppKind, kind: HuntKind) -> HuntTally {
        self.hunts
            .iter()
            .filter(|h| h.app == app && h.kind == kind)
            .fold(HuntTally::default(), |mut t, h| {
                t.total_records += h.total_records;
                t.eligible += h.eligible;
                t.selected += h.selected;
                t.searched += h.searched;
                t.trigger_failures += h.trigger_failures;
                t.ledger_failures += h.ledger_failures;
                t
            })
    }

    /// Items searched and recorded for one system and kind.
    pub fn searched(&self, app: AppKind, kind: HuntKind) -> usize {
        self.tally(app, kind).searched
    }

    pub fn total_searched(&self) -> usize {
        self.hunts.iter().map(|h| h.searched).sum()
    }

    pub fn total_selected(&self) -> usize {
        self.hunts.iter().map(|h| h.selected).sum()
    }
}

/// Errors that abort a whole cycle.
#[derive(Debug, Error)]
pub enum HuntError {
    #[error("Search ledger unavailable: {0}")]
    Ledger(#[from] LedgerError),
}
