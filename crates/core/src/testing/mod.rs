//! Testing utilities: mock *arr instances and candidate fixtures.
//!
//! # Example
//!
//! ```rust,ignore
//! use huntarr_core::testing::{fixtures, MockArr, MockConnector};
//!
//! let sonarr = MockArr::new(AppKind::Sonarr);
//! sonarr.set_wanted(HuntKind::Missing, fixtures::episodes(1..=10));
//!
//! let connector = MockConnector::new().with_instance(AppKind::Sonarr, "Sonarr", sonarr.clone());
//! let mut hunt = HuntOrchestrator::with_connector(config, connector);
//! ```

mod mock_arr;
mod mock_connector;

pub use mock_arr::MockArr;
pub use mock_connector::MockConnector;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::ops::RangeInclusive;

    use chrono::{DateTime, TimeZone, Utc};

    use crate::arr::{CandidateItem, MediaDetails};
    use crate::config::{Config, InstanceConfig};

    fn past_date() -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single()
    }

    /// A monitored, already-aired episode of a monitored series.
    pub fn episode(id: i64) -> CandidateItem {
        CandidateItem {
            id,
            monitored: true,
            release_date: past_date(),
            details: MediaDetails::Episode {
                series_title: Some(format!("Series {}", id / 10)),
                series_monitored: true,
                season: Some(1),
                episode: Some(id % 10 + 1),
            },
        }
    }

    /// A monitored episode whose series is unmonitored.
    pub fn episode_in_unmonitored_series(id: i64) -> CandidateItem {
        let mut item = episode(id);
        if let MediaDetails::Episode {
            series_monitored, ..
        } = &mut item.details
        {
            *series_monitored = false;
        }
        item
    }

    /// A monitored, already-released movie.
    pub fn movie(id: i64) -> CandidateItem {
        CandidateItem {
            id,
            monitored: true,
            release_date: past_date(),
            details: MediaDetails::Movie {
                title: Some(format!("Movie {}", id)),
                year: Some(2000 + id % 25),
            },
        }
    }

    pub fn episodes(ids: RangeInclusive<i64>) -> Vec<CandidateItem> {
        ids.map(episode).collect()
    }

    pub fn movies(ids: RangeInclusive<i64>) -> Vec<CandidateItem> {
        ids.map(movie).collect()
    }

    /// An instance with a connection and the given limits.
    pub fn instance(name: &str, hunt_missing: i64, hunt_upgrades: i64) -> InstanceConfig {
        let mut instance = InstanceConfig::new(name, format!("http://{}.local", name), "test-key");
        instance.hunt_missing = hunt_missing;
        instance.hunt_upgrades = hunt_upgrades;
        instance
    }

    /// A config with one Sonarr instance named "Sonarr".
    pub fn sonarr_config(hunt_missing: i64, hunt_upgrades: i64) -> Config {
        Config {
            sonarr: vec![instance("Sonarr", hunt_missing, hunt_upgrades)],
            ..Config::default()
        }
    }
}
