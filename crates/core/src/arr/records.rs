//! Sonarr/Radarr v3 wire records and their conversion to candidates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::types::{CandidateItem, MediaDetails};

/// Envelope of `wanted/missing` and `wanted/cutoff`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WantedResponse<T> {
    #[serde(default)]
    pub total_records: u64,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EpisodeRecord {
    pub id: i64,
    #[serde(default)]
    pub monitored: Option<bool>,
    #[serde(default)]
    pub season_number: Option<i64>,
    #[serde(default)]
    pub episode_number: Option<i64>,
    #[serde(default)]
    pub air_date_utc: Option<String>,
    #[serde(default)]
    pub series: Option<SeriesRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SeriesRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub monitored: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovieRecord {
    pub id: i64,
    #[serde(default)]
    pub monitored: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub digital_release: Option<String>,
    #[serde(default)]
    pub physical_release: Option<String>,
}

impl From<EpisodeRecord> for CandidateItem {
    fn from(r: EpisodeRecord) -> Self {
        let (series_title, series_monitored) = match r.series {
            Some(s) => (s.title, s.monitored.unwrap_or(false)),
            None => (None, false),
        };

        Self {
            id: r.id,
            monitored: r.monitored.unwrap_or(false),
            release_date: r.air_date_utc.as_deref().and_then(parse_arr_date),
            details: MediaDetails::Episode {
                series_title,
                series_monitored,
                season: r.season_number,
                episode: r.episode_number,
            },
        }
    }
}

impl From<MovieRecord> for CandidateItem {
    fn from(r: MovieRecord) -> Self {
        // First non-empty date wins, even when it turns out unparseable.
        let release_date = [&r.release_date, &r.digital_release, &r.physical_release]
            .into_iter()
            .flatten()
            .find(|d| !d.is_empty())
            .and_then(|d| parse_arr_date(d));

        Self {
            id: r.id,
            monitored: r.monitored.unwrap_or(false),
            release_date,
            details: MediaDetails::Movie {
                title: r.title,
                year: r.year,
            },
        }
    }
}

/// Parse the date formats the *arr APIs emit.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC)
/// and a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_arr_date(date_str: &str) -> Option<DateTime<Utc>> {
    let s = date_str.trim();
    if s.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|ndt| ndt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_date_rfc3339_with_fraction() {
        let date = parse_arr_date("2024-06-15T10:30:00.123Z").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.hour(), 10);
    }

    #[test]
    fn test_parse_date_with_offset() {
        let date = parse_arr_date("2024-06-15T10:30:00+02:00").unwrap();
        assert_eq!(date.hour(), 8);
    }

    #[test]
    fn test_parse_date_naive() {
        let date = parse_arr_date("2024-06-15T10:30:00").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only() {
        let date = parse_arr_date("2031-01-02").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2031, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_arr_date("").is_none());
        assert!(parse_arr_date("TBA").is_none());
    }

    #[test]
    fn test_episode_record_conversion() {
        let json = r#"{
            "id": 42,
            "monitored": true,
            "seasonNumber": 3,
            "episodeNumber": 7,
            "airDateUtc": "2023-10-01T01:00:00Z",
            "series": {"title": "The Expanse", "monitored": true}
        }"#;
        let record: EpisodeRecord = serde_json::from_str(json).unwrap();
        let item: CandidateItem = record.into();

        assert_eq!(item.id, 42);
        assert!(item.is_monitored());
        assert_eq!(item.label(), "The Expanse S03E07");
        assert_eq!(item.release_date.unwrap().year(), 2023);
    }

    #[test]
    fn test_episode_without_series_is_unmonitored() {
        let record: EpisodeRecord =
            serde_json::from_str(r#"{"id": 1, "monitored": true}"#).unwrap();
        let item: CandidateItem = record.into();

        assert!(item.monitored);
        assert!(!item.is_monitored());
        assert_eq!(item.label(), "? S?E?");
        assert!(item.release_date.is_none());
    }

    #[test]
    fn test_movie_uses_first_present_date() {
        let json = r#"{
            "id": 9,
            "monitored": true,
            "title": "Dune",
            "year": 2021,
            "releaseDate": null,
            "digitalRelease": "2021-10-22T00:00:00Z",
            "physicalRelease": "2022-01-11T00:00:00Z"
        }"#;
        let record: MovieRecord = serde_json::from_str(json).unwrap();
        let item: CandidateItem = record.into();

        assert_eq!(item.label(), "Dune (2021)");
        assert_eq!(
            item.release_date.unwrap(),
            Utc.with_ymd_and_hms(2021, 10, 22, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_movie_unparseable_first_date_means_no_date() {
        let json = r#"{
            "id": 9,
            "releaseDate": "soon",
            "physicalRelease": "2099-01-01T00:00:00Z"
        }"#;
        let record: MovieRecord = serde_json::from_str(json).unwrap();
        let item: CandidateItem = record.into();

        assert!(item.release_date.is_none());
        assert!(!item.monitored);
    }

    #[test]
    fn test_wanted_response_defaults() {
        let response: WantedResponse<MovieRecord> = serde_json::from_str("{}").unwrap();
        assert_eq!(response.total_records, 0);
        assert!(response.records.is_empty());
    }
}
