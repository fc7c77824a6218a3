//! Candidate sources: one wanted list of one instance.

use super::types::{ArrError, CandidateItem, HuntKind, WantedQuery};
use super::ArrApi;

/// Largest page the hunt ever asks for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A remote wanted list (missing or cutoff-unmet) that can be counted and paged.
pub struct CandidateSource<'a> {
    api: &'a dyn ArrApi,
    kind: HuntKind,
}

impl<'a> CandidateSource<'a> {
    pub fn new(api: &'a dyn ArrApi, kind: HuntKind) -> Self {
        Self { api, kind }
    }

    /// Total records on the remote, learned with a one-item page.
    pub async fn count(&self, monitored_only: bool) -> Result<u64, ArrError> {
        let page = self
            .api
            .wanted(
                self.kind,
                &WantedQuery {
                    page: 1,
                    page_size: 1,
                    monitored_only,
                },
            )
            .await?;
        Ok(page.total_records)
    }

    /// Fetch one 1-based page. The page size is capped at [`MAX_PAGE_SIZE`].
    pub async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        monitored_only: bool,
    ) -> Result<Vec<CandidateItem>, ArrError> {
        let page = self
            .api
            .wanted(
                self.kind,
                &WantedQuery {
                    page: page.max(1),
                    page_size: page_size.clamp(1, MAX_PAGE_SIZE),
                    monitored_only,
                },
            )
            .await?;
        Ok(page.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arr::AppKind;
    use crate::testing::{fixtures, MockArr};

    #[tokio::test]
    async fn test_count_uses_single_item_page() {
        let mock = MockArr::new(AppKind::Sonarr);
        mock.set_wanted(HuntKind::Missing, fixtures::episodes(1..=250));

        let source = CandidateSource::new(&mock, HuntKind::Missing);
        assert_eq!(source.count(true).await.unwrap(), 250);

        let queries = mock.recorded_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].1.page, 1);
        assert_eq!(queries[0].1.page_size, 1);
        assert!(queries[0].1.monitored_only);
    }

    #[tokio::test]
    async fn test_fetch_page_caps_page_size() {
        let mock = MockArr::new(AppKind::Radarr);
        mock.set_wanted(HuntKind::Upgrade, fixtures::movies(1..=300));

        let source = CandidateSource::new(&mock, HuntKind::Upgrade);
        let items = source.fetch_page(3, 500, false).await.unwrap();

        assert_eq!(items.len(), 100);
        assert_eq!(items[0].id, 201);
        assert_eq!(mock.recorded_queries()[0].1.page_size, MAX_PAGE_SIZE);
    }

    #[tokio::test]
    async fn test_fetch_page_propagates_errors() {
        let mock = MockArr::new(AppKind::Sonarr);
        mock.fail_wanted(HuntKind::Missing, "HTTP 500");

        let source = CandidateSource::new(&mock, HuntKind::Missing);
        assert!(source.fetch_page(1, 10, true).await.is_err());
        assert!(source.count(true).await.is_err());
    }
}
