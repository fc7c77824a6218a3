//! HTTP client for the Sonarr/Radarr v3 API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::records::{EpisodeRecord, MovieRecord, WantedResponse};
use super::types::{
    AppKind, ArrError, CandidateItem, HuntKind, SystemStatus, WantedPage, WantedQuery,
};
use super::ArrApi;

/// Header carrying the instance API key.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Error bodies are cut to this many characters.
const MAX_ERROR_BODY: usize = 200;

/// Client for one Sonarr or Radarr instance.
pub struct ArrClient {
    client: Client,
    app: AppKind,
    base_url: String,
}

impl ArrClient {
    /// Create a client; every request carries the API key and the timeout.
    pub fn new(
        app: AppKind,
        url: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, ArrError> {
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| ArrError::InvalidConfig(format!("api_key: {}", e)))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ArrError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            app,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Build the full URL for an endpoint under `/api/v3/`.
    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/api/v3/{}",
            self.base_url,
            endpoint.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ArrError> {
        let url = self.url(endpoint);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ArrError::Parse(e.to_string()))
    }

    async fn post_json(&self, endpoint: &str, body: &serde_json::Value) -> Result<(), ArrError> {
        let url = self.url(endpoint);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response).await?;
        Ok(())
    }

    fn wanted_params(&self, query: &WantedQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("pageSize", query.page_size.to_string()),
        ];
        if self.app == AppKind::Sonarr {
            params.push(("includeSeries", "true".to_string()));
        }
        params.push(("monitored", query.monitored_only.to_string()));
        params
    }

    async fn fetch_wanted<R>(
        &self,
        kind: HuntKind,
        query: &WantedQuery,
    ) -> Result<WantedPage, ArrError>
    where
        R: DeserializeOwned + Into<CandidateItem>,
    {
        let response: WantedResponse<R> = self
            .get_json(kind.endpoint(), &self.wanted_params(query))
            .await?;

        Ok(WantedPage {
            total_records: response.total_records,
            records: response.records.into_iter().map(Into::into).collect(),
        })
    }
}

#[async_trait]
impl ArrApi for ArrClient {
    async fn system_status(&self) -> Result<SystemStatus, ArrError> {
        self.get_json("system/status", &[]).await
    }

    async fn wanted(&self, kind: HuntKind, query: &WantedQuery) -> Result<WantedPage, ArrError> {
        match self.app {
            AppKind::Sonarr => self.fetch_wanted::<EpisodeRecord>(kind, query).await,
            AppKind::Radarr => self.fetch_wanted::<MovieRecord>(kind, query).await,
        }
    }

    async fn search(&self, ids: &[i64]) -> Result<(), ArrError> {
        let body = search_command(self.app, ids);
        self.post_json("command", &body).await
    }
}

/// Command body that asks the instance to search for the given ids.
pub(crate) fn search_command(app: AppKind, ids: &[i64]) -> serde_json::Value {
    match app {
        AppKind::Sonarr => json!({ "name": "EpisodeSearch", "episodeIds": ids }),
        AppKind::Radarr => json!({ "name": "MoviesSearch", "movieIds": ids }),
    }
}

fn map_transport_error(e: reqwest::Error) -> ArrError {
    if e.is_timeout() {
        ArrError::Timeout
    } else if e.is_connect() {
        ArrError::ConnectionFailed(e.to_string())
    } else {
        ArrError::Request(e.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, ArrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ArrError::Api {
        status: status.as_u16(),
        message: body.chars().take(MAX_ERROR_BODY).collect(),
    })
}
