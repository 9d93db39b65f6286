use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as ReqwestClient;

use crate::bookmark::{DirectSource, Extractor};
use crate::config::Config;
use crate::error::FetchError;

/// Shared application state passed to all handlers and extractors.
/// JWT secret is stored here (read once at startup) rather than re-reading
/// from the environment on every request.
#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: Arc<str>,
    pub http_client: ReqwestClient,
    pub fetch_timeout: Duration,
    pub allow_private_hosts: bool,
    pub max_body_bytes: usize,
    pub extractor: Extractor,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http_client = DirectSource::build_client(
            config.fetch_timeout,
            &config.fetch_user_agent,
            config.allow_private_hosts,
        )?;

        Ok(AppState {
            jwt_secret: Arc::from(config.jwt_secret.as_str()),
            http_client,
            fetch_timeout: config.fetch_timeout,
            allow_private_hosts: config.allow_private_hosts,
            max_body_bytes: config.fetch_max_body_bytes,
            extractor: Extractor::new(config.favicon_fallback),
        })
    }

    /// Page fetcher configured from this state; clones share one connection pool.
    pub fn direct_source(&self) -> DirectSource {
        DirectSource::new(self.http_client.clone())
            .allow_private_hosts(self.allow_private_hosts)
            .max_body_bytes(self.max_body_bytes)
    }
}
