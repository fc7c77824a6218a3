//! Sonarr/Radarr v3 API access.
//!
//! The hunt only needs four calls per instance: a status check, the two
//! wanted lists (`wanted/missing`, `wanted/cutoff`) and the search command.
//! [`ArrApi`] abstracts them so cycles can run against mocks.

mod client;
mod records;
mod source;
mod types;

pub use client::ArrClient;
pub use records::parse_arr_date;
pub use source::{CandidateSource, MAX_PAGE_SIZE};
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{HttpConfig, InstanceConfig};

/// The remote operations a hunt performs against one instance.
#[async_trait]
pub trait ArrApi: Send + Sync {
    /// Lightweight connectivity check.
    async fn system_status(&self) -> Result<SystemStatus, ArrError>;

    /// Fetch one page of a wanted list.
    async fn wanted(&self, kind: HuntKind, query: &WantedQuery) -> Result<WantedPage, ArrError>;

    /// Trigger a search for the given item ids.
    async fn search(&self, ids: &[i64]) -> Result<(), ArrError>;
}

/// Creates API handles for configured instances.
pub trait ArrConnector: Send + Sync {
    fn connect(
        &self,
        app: AppKind,
        instance: &InstanceConfig,
        http: &HttpConfig,
    ) -> Result<Box<dyn ArrApi>, ArrError>;
}

/// Connector producing real HTTP clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl ArrConnector for HttpConnector {
    fn connect(
        &self,
        app: AppKind,
        instance: &InstanceConfig,
        http: &HttpConfig,
    ) -> Result<Box<dyn ArrApi>, ArrError> {
        let client = ArrClient::new(
            app,
            &instance.url,
            &instance.api_key,
            Duration::from_secs(http.timeout_secs as u64),
        )?;
        Ok(Box::new(client))
    }
}
