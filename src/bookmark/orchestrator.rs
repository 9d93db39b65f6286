use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bookmark::extract::Extractor;
use crate::bookmark::source::MetadataSource;
use crate::bookmark::store::AttributeStore;
use crate::bookmark::url::validate_url;
use crate::error::FetchError;
use crate::models::{AttributeOp, AttributeUpdate};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    #[default]
    Idle,
    Fetching,
    Succeeded,
    Failed,
}

/// Observable fetch state of one block instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchStatus {
    pub state: FetchState,
    /// Detail of the last failure, for logs and tooltips. The block itself
    /// only shows `has_error`.
    pub last_error: Option<String>,
}

impl FetchStatus {
    pub fn is_busy(&self) -> bool {
        self.state == FetchState::Fetching
    }

    pub fn has_error(&self) -> bool {
        self.state == FetchState::Failed
    }
}

/// Runs metadata fetch cycles for a single block instance.
///
/// At most one cycle is in flight at a time. Failures are reported through
/// the returned `FetchError` and the `Failed` state; they never reach the
/// attribute store.
pub struct FetchOrchestrator<S: ?Sized> {
    source: Arc<S>,
    extractor: Extractor,
    timeout: Duration,
    status: Mutex<FetchStatus>,
    disposed: AtomicBool,
}

impl<S: MetadataSource + ?Sized> FetchOrchestrator<S> {
    pub fn new(source: Arc<S>) -> Self {
        FetchOrchestrator {
            source,
            extractor: Extractor::default(),
            timeout: DEFAULT_FETCH_TIMEOUT,
            status: Mutex::new(FetchStatus::default()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn status(&self) -> FetchStatus {
        self.lock_status().clone()
    }

    /// Mark the block instance as destroyed. Cycles still in flight finish
    /// without touching the status or the store.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        debug!("Fetch orchestrator disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Fetch `url` and extract its metadata.
    ///
    /// Returns `InvalidUrl` without leaving `Idle` when `url` does not
    /// validate, and `Busy` when another cycle is in flight.
    pub async fn fetch_metadata(&self, url: &str) -> Result<AttributeUpdate, FetchError> {
        let guard = self.begin(url)?;
        let result = self.run(url).await;

        if self.is_disposed() {
            guard.disarm();
            debug!(url = %url, "Discarding fetch result for disposed block");
            return Err(FetchError::Disposed);
        }

        guard.finish(&result);
        result
    }

    /// Run one cycle for the record's pending input (or its committed URL on
    /// reload) and commit the result atomically.
    pub async fn submit<St>(&self, store: &St) -> Result<AttributeUpdate, FetchError>
    where
        St: AttributeStore + ?Sized,
    {
        let record = store.get();
        let url = record
            .fetch_target()
            .ok_or_else(|| FetchError::InvalidUrl("no URL to fetch".into()))?
            .to_string();

        let update = self.fetch_metadata(&url).await?;
        store.set(vec![AttributeOp::CommitFetch(update.clone())]);
        info!(url = %url, "Committed bookmark metadata");
        Ok(update)
    }

    /// Store a new pending URL unless a cycle is in flight.
    ///
    /// Returns whether the input was accepted.
    pub fn set_url_input<St>(&self, store: &St, input: impl Into<String>) -> bool
    where
        St: AttributeStore + ?Sized,
    {
        if self.is_disposed() || self.status().is_busy() {
            return false;
        }
        store.set(vec![AttributeOp::SiteUrlInput(input.into())]);
        true
    }

    fn begin(&self, url: &str) -> Result<InFlight<'_>, FetchError> {
        if self.is_disposed() {
            return Err(FetchError::Disposed);
        }
        if !validate_url(url) {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let mut status = self.lock_status();
        if status.is_busy() {
            return Err(FetchError::Busy);
        }
        *status = FetchStatus {
            state: FetchState::Fetching,
            last_error: None,
        };
        debug!(url = %url, "Fetch started");

        Ok(InFlight {
            status: &self.status,
            armed: true,
        })
    }

    async fn run(&self, url: &str) -> Result<AttributeUpdate, FetchError> {
        let html = tokio::time::timeout(self.timeout, self.source.fetch_html(url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        let extractor = self.extractor;
        let source_url = url.to_string();
        let metadata = tokio::task::spawn_blocking(move || extractor.extract(&html, &source_url))
            .await
            .map_err(|e| FetchError::Extraction(e.to_string()))?;
        if metadata.is_empty() {
            debug!(url = %url, "Page carried no usable metadata");
        }

        Ok(AttributeUpdate {
            url: url.to_string(),
            metadata,
        })
    }

    fn lock_status(&self) -> MutexGuard<'_, FetchStatus> {
        lock(&self.status)
    }
}

fn lock(status: &Mutex<FetchStatus>) -> MutexGuard<'_, FetchStatus> {
    status
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the busy flag if a cycle is abandoned (its future dropped) before
/// it reports a result.
struct InFlight<'a> {
    status: &'a Mutex<FetchStatus>,
    armed: bool,
}

impl InFlight<'_> {
    fn finish(mut self, result: &Result<AttributeUpdate, FetchError>) {
        self.armed = false;
        let mut status = lock(self.status);
        match result {
            Ok(update) => {
                debug!(url = %update.url, "Fetch succeeded");
                *status = FetchStatus {
                    state: FetchState::Succeeded,
                    last_error: None,
                };
            }
            Err(e) => {
                warn!(error = %e, "Fetch failed");
                *status = FetchStatus {
                    state: FetchState::Failed,
                    last_error: Some(e.to_string()),
                };
            }
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            *lock(self.status) = FetchStatus::default();
        }
    }
}
