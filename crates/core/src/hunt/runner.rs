//! Hunt orchestrator: one cycle over every configured instance.
//!
//! Processing is strictly sequential. Systems run in order (Sonarr, then
//! Radarr), instances in configuration order, and within an instance the
//! missing hunt runs before the upgrade hunt. Every remote call is awaited
//! before the next one starts.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::arr::{
    AppKind, ArrApi, ArrConnector, CandidateItem, CandidateSource, HttpConnector, HuntKind,
};
use crate::config::{Config, InstanceConfig};
use crate::ledger::{LedgerKey, SearchLedger, SqliteLedger};

use super::sampler::{filter_monitored, filter_released, filter_unsearched, PagePlan, Sampler};
use super::types::{
    BatchOutcome, CycleReport, HuntError, HuntSummary, ItemOutcome, TriggerOutcome,
};

/// Per-hunt settings taken from an instance.
struct HuntPlan<'a> {
    app: AppKind,
    kind: HuntKind,
    instance: &'a str,
    limit: usize,
    monitored_only: bool,
    skip_future: bool,
}

impl HuntPlan<'_> {
    fn key(&self, media_id: i64) -> LedgerKey<'_> {
        LedgerKey::new(self.app, self.kind, self.instance, media_id)
    }

    /// "missing episodes", "cutoff-unmet movies"
    fn describe(&self) -> String {
        let list = match self.kind {
            HuntKind::Missing => "missing",
            HuntKind::Upgrade => "cutoff-unmet",
        };
        format!("{} {}", list, self.app.item_noun())
    }
}

/// Runs hunt cycles against the configured Sonarr/Radarr instances.
pub struct HuntOrchestrator<C: ArrConnector = HttpConnector> {
    config: Config,
    connector: C,
    sampler: Sampler,
    dry_run: bool,
}

impl HuntOrchestrator<HttpConnector> {
    /// Orchestrator talking to the real instances over HTTP.
    pub fn new(config: Config) -> Self {
        Self::with_connector(config, HttpConnector)
    }
}

impl<C: ArrConnector> HuntOrchestrator<C> {
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            config,
            connector,
            sampler: Sampler::new(),
            dry_run: false,
        }
    }

    /// Log selections without triggering searches or writing the ledger.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run one cycle with the ledger database from the configuration.
    ///
    /// The ledger is opened at the start and closed at the end of the cycle.
    /// Failing to open it aborts the cycle; everything else is logged and
    /// skipped.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, HuntError> {
        let ledger = SqliteLedger::open(&self.config.state.database, self.config.state.ttl_hours)?;

        let report = self.run_with_ledger(&ledger).await;

        if let Err(e) = ledger.close() {
            warn!("Failed to close search ledger: {}", e);
        }
        Ok(report)
    }

    /// Run one cycle against an already open ledger.
    pub async fn run_with_ledger(&mut self, ledger: &dyn SearchLedger) -> CycleReport {
        let mut report = CycleReport {
            dry_run: self.dry_run,
            ..CycleReport::default()
        };

        if self.dry_run {
            debug!("Dry run: skipping ledger purge");
        } else {
            match ledger.purge_expired() {
                Ok(purged) => {
                    report.purged = purged;
                    if purged > 0 {
                        info!("Purged {} expired ledger entries", purged);
                    }
                }
                Err(e) => warn!("Failed to purge expired ledger entries: {}", e),
            }
        }

        if let Ok(stats) = ledger.stats() {
            debug!(entries = stats.entries, "Search ledger loaded");
        }

        for app in AppKind::ALL {
            let instances = self.config.instances(app).to_vec();
            for instance in &instances {
                self.run_instance(ledger, app, instance, &mut report).await;
            }
        }

        report
    }

    async fn run_instance(
        &mut self,
        ledger: &dyn SearchLedger,
        app: AppKind,
        instance: &InstanceConfig,
        report: &mut CycleReport,
    ) {
        let name = instance.display_name(app);

        if !instance.has_connection() {
            warn!(app = %app, instance = %name, "Missing url or api_key, skipping instance");
            report.instances_skipped += 1;
            return;
        }

        info!(app = %app, instance = %name, "Processing {} instance", app.display_name());

        let api = match self.connector.connect(app, instance, &self.config.http) {
            Ok(api) => api,
            Err(e) => {
                error!(app = %app, instance = %name, error = %e, "Failed to create client");
                report.instances_skipped += 1;
                return;
            }
        };

        match api.system_status().await {
            Ok(status) => {
                info!(app = %app, instance = %name, version = %status.version(), "Connected");
            }
            Err(e) => {
                error!(app = %app, instance = %name, error = %e, "Connection check failed, skipping instance");
                report.instances_skipped += 1;
                return;
            }
        }
        report.instances_processed += 1;

        for kind in HuntKind::ALL {
            let limit = instance.limit(kind);
            if limit <= 0 {
                debug!(app = %app, instance = %name, kind = %kind, "Hunt disabled");
                continue;
            }

            let plan = HuntPlan {
                app,
                kind,
                instance: name,
                limit: limit as usize,
                monitored_only: instance.monitored_only,
                skip_future: instance.skip_future,
            };
            let summary = self.hunt(ledger, api.as_ref(), &plan).await;
            report.hunts.push(summary);
        }
    }

    /// One pass over one wanted list: count, sample a page, filter, select, trigger.
    async fn hunt(
        &mut self,
        ledger: &dyn SearchLedger,
        api: &dyn ArrApi,
        plan: &HuntPlan<'_>,
    ) -> HuntSummary {
        let mut summary = HuntSummary::new(plan.app, plan.kind, plan.instance);
        let what = plan.describe();
        let source = CandidateSource::new(api, plan.kind);

        let total = match source.count(plan.monitored_only).await {
            Ok(total) => total,
            Err(e) => {
                error!(instance = %plan.instance, error = %e, "Failed to count {}", what);
                summary.error = Some(e.to_string());
                return summary;
            }
        };
        summary.total_records = total;

        let Some(pages) = PagePlan::for_total(total) else {
            info!(instance = %plan.instance, "No {} found", what);
            return summary;
        };

        let page = self.sampler.choose_page(&pages);
        summary.page = Some(page);
        info!(
            instance = %plan.instance,
            "Found {} {}, sampling page {}/{}",
            total, what, page, pages.total_pages
        );

        let items = match source
            .fetch_page(page, pages.page_size, plan.monitored_only)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                error!(instance = %plan.instance, error = %e, "Failed to fetch {}", what);
                summary.error = Some(e.to_string());
                return summary;
            }
        };

        let now = Utc::now();
        let candidates = self.filter(ledger, plan, items, now);
        summary.eligible = candidates.len();

        if candidates.is_empty() {
            info!(instance = %plan.instance, "All sampled {} already searched recently or filtered", what);
            return summary;
        }

        let selected = self.sampler.choose(candidates, plan.limit);
        info!(
            instance = %plan.instance,
            "Selected {} of {} eligible {}",
            selected.len(), summary.eligible, what
        );

        let batch = self.trigger(ledger, api, plan, selected).await;
        summary.record_batch(&batch);
        summary
    }

    fn filter(
        &self,
        ledger: &dyn SearchLedger,
        plan: &HuntPlan<'_>,
        items: Vec<CandidateItem>,
        now: DateTime<Utc>,
    ) -> Vec<CandidateItem> {
        let fetched = items.len();

        let items = if plan.monitored_only {
            filter_monitored(items)
        } else {
            items
        };
        let items = if plan.skip_future && plan.kind == HuntKind::Missing {
            filter_released(items, now)
        } else {
            items
        };

        // A failed lookup excludes the item rather than risk a duplicate search.
        let items = filter_unsearched(items, |item| {
            match ledger.is_recently_searched_at(&plan.key(item.id), now) {
                Ok(recent) => recent,
                Err(e) => {
                    warn!(instance = %plan.instance, id = item.id, error = %e, "Ledger lookup failed, skipping item");
                    true
                }
            }
        });

        debug!(
            instance = %plan.instance,
            fetched,
            eligible = items.len(),
            "Filtered sampled page"
        );
        items
    }

    /// Trigger one search per item, recording each success before moving on.
    async fn trigger(
        &self,
        ledger: &dyn SearchLedger,
        api: &dyn ArrApi,
        plan: &HuntPlan<'_>,
        selected: Vec<CandidateItem>,
    ) -> BatchOutcome {
        let mut batch = BatchOutcome::default();
        let verb = match plan.kind {
            HuntKind::Missing => "search",
            HuntKind::Upgrade => "upgrade search",
        };

        for item in selected {
            let label = item.label();

            let outcome = if self.dry_run {
                info!(instance = %plan.instance, id = item.id, "[DRY RUN] Would trigger {} for {}", verb, label);
                TriggerOutcome::WouldSearch
            } else {
                match api.search(&[item.id]).await {
                    Ok(()) => match ledger.mark_searched(&plan.key(item.id)) {
                        Ok(()) => {
                            info!(instance = %plan.instance, id = item.id, "Triggered {} for {}", verb, label);
                            TriggerOutcome::Searched
                        }
                        Err(e) => {
                            error!(
                                instance = %plan.instance,
                                id = item.id,
                                error = %e,
                                "Triggered {} for {} but failed to record it",
                                verb, label
                            );
                            TriggerOutcome::Unrecorded(e.to_string())
                        }
                    },
                    Err(e) => {
                        error!(instance = %plan.instance, id = item.id, error = %e, "Failed to trigger {} for {}", verb, label);
                        TriggerOutcome::TriggerFailed(e.to_string())
                    }
                }
            };

            batch.items.push(ItemOutcome {
                id: item.id,
                label,
                outcome,
            });
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerEntry, LedgerError, LedgerStats, SqliteLedger};
    use crate::testing::{fixtures, MockArr, MockConnector};
    use chrono::Duration;

    /// In-memory ledger that fails lookups or writes for chosen ids.
    struct FailingLedger {
        inner: SqliteLedger,
        fail_lookup_for: Option<i64>,
        fail_mark_for: Option<i64>,
    }

    impl FailingLedger {
        fn new() -> Self {
            Self {
                inner: SqliteLedger::in_memory(24).unwrap(),
                fail_lookup_for: None,
                fail_mark_for: None,
            }
        }
    }

    impl SearchLedger for FailingLedger {
        fn ttl(&self) -> Duration {
            self.inner.ttl()
        }

        fn is_recently_searched_at(
            &self,
            key: &LedgerKey<'_>,
            now: DateTime<Utc>,
        ) -> Result<bool, LedgerError> {
            if self.fail_lookup_for == Some(key.media_id) {
                return Err(LedgerError::Database("disk I/O error".to_string()));
            }
            self.inner.is_recently_searched_at(key, now)
        }

        fn mark_searched_at(
            &self,
            key: &LedgerKey<'_>,
            at: DateTime<Utc>,
        ) -> Result<(), LedgerError> {
            if self.fail_mark_for == Some(key.media_id) {
                return Err(LedgerError::Database("database is locked".to_string()));
            }
            self.inner.mark_searched_at(key, at)
        }

        fn purge_expired_at(&self, now: DateTime<Utc>) -> Result<usize, LedgerError> {
            self.inner.purge_expired_at(now)
        }

        fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
            self.inner.entries()
        }

        fn stats(&self) -> Result<LedgerStats, LedgerError> {
            self.inner.stats()
        }
    }

    fn sonarr_with_episodes(count: i64) -> (MockArr, MockConnector) {
        let sonarr = MockArr::new(AppKind::Sonarr);
        sonarr.set_wanted(HuntKind::Missing, fixtures::episodes(1..=count));
        let connector =
            MockConnector::new().with_instance(AppKind::Sonarr, "Sonarr", sonarr.clone());
        (sonarr, connector)
    }

    fn orchestrator(config: Config, connector: MockConnector) -> HuntOrchestrator<MockConnector> {
        HuntOrchestrator::with_connector(config, connector).with_sampler(Sampler::seeded(11))
    }

    #[tokio::test]
    async fn test_failed_mark_keeps_trigger_and_continues_batch() {
        let (sonarr, connector) = sonarr_with_episodes(3);
        let ledger = FailingLedger {
            fail_mark_for: Some(2),
            ..FailingLedger::new()
        };

        let report = orchestrator(fixtures::sonarr_config(3, 0), connector)
            .run_with_ledger(&ledger)
            .await;

        let mut triggered = sonarr.searched_ids();
        triggered.sort();
        assert_eq!(triggered, vec![1, 2, 3]);

        let tally = report.tally(AppKind::Sonarr, HuntKind::Missing);
        assert_eq!(tally.selected, 3);
        assert_eq!(tally.searched, 2);
        assert_eq!(tally.ledger_failures, 1);
        assert_eq!(tally.trigger_failures, 0);

        let recorded: Vec<String> = ledger
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.media_id)
            .collect();
        assert_eq!(recorded.len(), 2);
        assert!(!recorded.contains(&"2".to_string()));
    }

    #[tokio::test]
    async fn test_single_failed_mark_reports_nothing_searched() {
        let (sonarr, connector) = sonarr_with_episodes(1);
        let ledger = FailingLedger {
            fail_mark_for: Some(1),
            ..FailingLedger::new()
        };

        let report = orchestrator(fixtures::sonarr_config(5, 0), connector)
            .run_with_ledger(&ledger)
            .await;

        assert_eq!(sonarr.searched_ids(), vec![1]);
        let tally = report.tally(AppKind::Sonarr, HuntKind::Missing);
        assert_eq!(tally.searched, 0);
        assert_eq!(tally.ledger_failures, 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_excludes_item() {
        let (sonarr, connector) = sonarr_with_episodes(3);
        let ledger = FailingLedger {
            fail_lookup_for: Some(2),
            ..FailingLedger::new()
        };

        let report = orchestrator(fixtures::sonarr_config(5, 0), connector)
            .run_with_ledger(&ledger)
            .await;

        let mut triggered = sonarr.searched_ids();
        triggered.sort();
        assert_eq!(triggered, vec![1, 3]);
        assert_eq!(report.tally(AppKind::Sonarr, HuntKind::Missing).eligible, 2);
    }

    #[tokio::test]
    async fn test_skip_future_only_applies_to_missing() {
        let future = Utc::now() + chrono::Duration::days(30);
        let mut items = fixtures::episodes(1..=4);
        for item in &mut items {
            item.release_date = Some(future);
        }

        let sonarr = MockArr::new(AppKind::Sonarr);
        sonarr.set_wanted(HuntKind::Missing, items.clone());
        sonarr.set_wanted(HuntKind::Upgrade, items);
        let connector =
            MockConnector::new().with_instance(AppKind::Sonarr, "Sonarr", sonarr.clone());

        let ledger = SqliteLedger::in_memory(24).unwrap();
        let mut hunt = orchestrator(fixtures::sonarr_config(5, 5), connector);
        let report = hunt.run_with_ledger(&ledger).await;

        assert_eq!(report.searched(AppKind::Sonarr, HuntKind::Missing), 0);
        assert_eq!(report.searched(AppKind::Sonarr, HuntKind::Upgrade), 4);
    }

    #[tokio::test]
    async fn test_monitored_only_off_keeps_unmonitored() {
        let mut items = fixtures::movies(1..=3);
        items[0].monitored = false;

        let radarr = MockArr::new(AppKind::Radarr);
        radarr.set_wanted(HuntKind::Missing, items);
        let connector =
            MockConnector::new().with_instance(AppKind::Radarr, "Radarr", radarr.clone());

        let mut instance = fixtures::instance("Radarr", 10, 0);
        instance.monitored_only = false;
        let config = Config {
            radarr: vec![instance],
            ..Config::default()
        };

        let ledger = SqliteLedger::in_memory(24).unwrap();
        let report = orchestrator(config, connector).run_with_ledger(&ledger).await;

        assert_eq!(report.searched(AppKind::Radarr, HuntKind::Missing), 3);
        assert!(!radarr.recorded_queries()[0].1.monitored_only);
    }

    #[tokio::test]
    async fn test_disabled_hunts_make_no_calls() {
        let sonarr = MockArr::new(AppKind::Sonarr);
        sonarr.set_wanted(HuntKind::Missing, fixtures::episodes(1..=10));
        let connector =
            MockConnector::new().with_instance(AppKind::Sonarr, "Sonarr", sonarr.clone());

        let ledger = SqliteLedger::in_memory(24).unwrap();
        let report = orchestrator(fixtures::sonarr_config(0, -3), connector)
            .run_with_ledger(&ledger)
            .await;

        assert!(report.hunts.is_empty());
        assert_eq!(report.instances_processed, 1);
        assert!(sonarr.recorded_queries().is_empty());
        assert!(sonarr.recorded_searches().is_empty());
    }

    #[tokio::test]
    async fn test_instance_without_connection_is_skipped() {
        let mut instance = fixtures::instance("Sonarr", 5, 0);
        instance.api_key.clear();
        let config = Config {
            sonarr: vec![instance],
            ..Config::default()
        };
        let connector = MockConnector::new();

        let ledger = SqliteLedger::in_memory(24).unwrap();
        let mut hunt = orchestrator(config, connector.clone());
        let report = hunt.run_with_ledger(&ledger).await;

        assert_eq!(report.instances_skipped, 1);
        assert!(connector.recorded_connects().is_empty());
    }

    #[tokio::test]
    async fn test_missing_runs_before_upgrades() {
        let radarr = MockArr::new(AppKind::Radarr);
        radarr.set_wanted(HuntKind::Missing, fixtures::movies(1..=3));
        radarr.set_wanted(HuntKind::Upgrade, fixtures::movies(101..=103));
        let connector =
            MockConnector::new().with_instance(AppKind::Radarr, "Radarr", radarr.clone());
        let config = Config {
            radarr: vec![fixtures::instance("Radarr", 3, 3)],
            ..Config::default()
        };

        let ledger = SqliteLedger::in_memory(24).unwrap();
        orchestrator(config, connector).run_with_ledger(&ledger).await;

        let kinds: Vec<HuntKind> = radarr.recorded_queries().iter().map(|q| q.0).collect();
        assert_eq!(
            kinds,
            vec![HuntKind::Missing, HuntKind::Missing, HuntKind::Upgrade, HuntKind::Upgrade]
        );
        let searched = radarr.searched_ids();
        assert!(searched[..3].iter().all(|id| *id < 100));
        assert!(searched[3..].iter().all(|id| *id > 100));
    }

    #[tokio::test]
    async fn test_upgrade_entries_use_upgrade_kind() {
        let radarr = MockArr::new(AppKind::Radarr);
        radarr.set_wanted(HuntKind::Upgrade, fixtures::movies(1..=2));
        let connector =
            MockConnector::new().with_instance(AppKind::Radarr, "Radarr", radarr.clone());
        let config = Config {
            radarr: vec![fixtures::instance("Radarr", 0, 5)],
            ..Config::default()
        };

        let ledger = SqliteLedger::in_memory(24).unwrap();
        orchestrator(config, connector).run_with_ledger(&ledger).await;

        let entries = ledger.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.kind == "radarr_upgrade"));
        assert!(!ledger
            .is_recently_searched(&LedgerKey::new(AppKind::Radarr, HuntKind::Missing, "Radarr", 1))
            .unwrap());
    }

    #[tokio::test]
    async fn test_run_cycle_opens_configured_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::sonarr_config(2, 0);
        config.state.database = dir.path().join("ledger.db");

        let sonarr = MockArr::new(AppKind::Sonarr);
        sonarr.set_wanted(HuntKind::Missing, fixtures::episodes(1..=2));
        let connector =
            MockConnector::new().with_instance(AppKind::Sonarr, "Sonarr", sonarr.clone());

        let report = orchestrator(config.clone(), connector).run_cycle().await.unwrap();
        assert_eq!(report.total_searched(), 2);

        let ledger = SqliteLedger::open(&config.state.database, 168).unwrap();
        assert_eq!(ledger.entries().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_cycle_fails_without_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = fixtures::sonarr_config(2, 0);
        config.state.database = dir.path().join("missing").join("nested").join("ledger.db");

        let result = orchestrator(config, MockConnector::new()).run_cycle().await;
        assert!(matches!(result, Err(HuntError::Ledger(_))));
    }
}
