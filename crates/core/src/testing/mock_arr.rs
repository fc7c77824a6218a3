//! Mock Sonarr/Radarr instance for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::arr::{
    AppKind, ArrApi, ArrError, CandidateItem, HuntKind, SystemStatus, WantedPage, WantedQuery,
};

#[derive(Default)]
struct MockArrState {
    wanted: HashMap<HuntKind, Vec<CandidateItem>>,
    wanted_errors: HashMap<HuntKind, String>,
    status_error: Option<String>,
    failing_ids: HashSet<i64>,
    queries: Vec<(HuntKind, WantedQuery)>,
    searches: Vec<Vec<i64>>,
    status_calls: usize,
}

/// Mock implementation of [`ArrApi`].
///
/// Wanted lists are paged exactly like the real API (1-based pages,
/// `totalRecords` = full list length). The `monitored` query flag is
/// recorded but not applied, so client-side filtering can be exercised.
///
/// Clones share state, which lets a [`MockConnector`](super::MockConnector)
/// hand out handles while the test keeps one for assertions.
///
/// # Example
///
/// ```rust,ignore
/// use huntarr_core::testing::{fixtures, MockArr};
///
/// let sonarr = MockArr::new(AppKind::Sonarr);
/// sonarr.set_wanted(HuntKind::Missing, fixtures::episodes(1..=10));
///
/// // ...run a cycle...
///
/// assert_eq!(sonarr.searched_ids().len(), 5);
/// ```
#[derive(Clone)]
pub struct MockArr {
    app: AppKind,
    version: String,
    state: Arc<Mutex<MockArrState>>,
}

impl std::fmt::Debug for MockArr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockArr")
            .field("app", &self.app)
            .field("version", &self.version)
            .field("state", &"<state>")
            .finish()
    }
}

impl MockArr {
    pub fn new(app: AppKind) -> Self {
        Self {
            app,
            version: "4.0.0.0".to_string(),
            state: Arc::new(Mutex::new(MockArrState::default())),
        }
    }

    /// Replace one wanted list.
    pub fn set_wanted(&self, kind: HuntKind, items: Vec<CandidateItem>) {
        self.state.lock().unwrap().wanted.insert(kind, items);
    }

    /// Make every query of one wanted list fail with a 500.
    pub fn fail_wanted(&self, kind: HuntKind, message: &str) {
        self.state
            .lock()
            .unwrap()
            .wanted_errors
            .insert(kind, message.to_string());
    }

    /// Make the status check fail.
    pub fn fail_status(&self, message: &str) {
        self.state.lock().unwrap().status_error = Some(message.to_string());
    }

    /// Make search commands that include `id` fail.
    pub fn fail_search_for(&self, id: i64) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    /// Every wanted-list query, in call order.
    pub fn recorded_queries(&self) -> Vec<(HuntKind, WantedQuery)> {
        self.state.lock().unwrap().queries.clone()
    }

    /// Every search command's id list, in call order (failed ones included).
    pub fn recorded_searches(&self) -> Vec<Vec<i64>> {
        self.state.lock().unwrap().searches.clone()
    }

    /// All ids sent in search commands, flattened.
    pub fn searched_ids(&self) -> Vec<i64> {
        self.recorded_searches().into_iter().flatten().collect()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }
}

#[async_trait]
impl ArrApi for MockArr {
    async fn system_status(&self) -> Result<SystemStatus, ArrError> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;

        if let Some(message) = &state.status_error {
            return Err(ArrError::ConnectionFailed(message.clone()));
        }
        Ok(SystemStatus {
            version: Some(self.version.clone()),
        })
    }

    async fn wanted(&self, kind: HuntKind, query: &WantedQuery) -> Result<WantedPage, ArrError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push((kind, *query));

        if let Some(message) = state.wanted_errors.get(&kind) {
            return Err(ArrError::Api {
                status: 500,
                message: message.clone(),
            });
        }

        let items = state.wanted.get(&kind).cloned().unwrap_or_default();
        let skip = (query.page.saturating_sub(1) as usize) * query.page_size as usize;
        let records = items
            .iter()
            .skip(skip)
            .take(query.page_size as usize)
            .cloned()
            .collect();

        Ok(WantedPage {
            total_records: items.len() as u64,
            records,
        })
    }

    async fn search(&self, ids: &[i64]) -> Result<(), ArrError> {
        let mut state = self.state.lock().unwrap();
        state.searches.push(ids.to_vec());

        if let Some(id) = ids.iter().find(|id| state.failing_ids.contains(*id)) {
            return Err(ArrError::Api {
                status: 500,
                message: format!("search command rejected for {}", id),
            });
        }
        Ok(())
    }
}
