use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, EDIT_POSTS};
use crate::bookmark::{FetchOrchestrator, FetchStatus, MemoryStore};
use crate::error::{AppError, AppResult, FetchError};
use crate::models::{apply_all, AttributeOp, AttributeRecord};
use crate::state::AppState;

// ── Request / response shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub attributes: AttributeRecord,
    /// New URL to enter before fetching; omitted to reload the current one.
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub attributes: AttributeRecord,
    pub status: FetchStatus,
}

#[derive(Debug, Deserialize)]
pub struct AttributesRequest {
    #[serde(default)]
    pub attributes: AttributeRecord,
    #[serde(default)]
    pub ops: Vec<AttributeOp>,
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// POST /web-bookmark-block/v1/resolve
///
/// Runs one fetch cycle server-side for the given record. A failed fetch is
/// reported through `status`; the returned attributes are then unchanged.
pub async fn resolve_bookmark(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ResolveRequest>,
) -> AppResult<Json<ResolveResponse>> {
    auth.require_capability(EDIT_POSTS)?;

    let store = MemoryStore::new(req.attributes);
    let orchestrator = FetchOrchestrator::new(Arc::new(state.direct_source()))
        .with_timeout(state.fetch_timeout)
        .with_extractor(state.extractor);

    if let Some(url) = req.url {
        orchestrator.set_url_input(&store, url.trim());
    }

    match orchestrator.submit(&store).await {
        Ok(_) => {}
        Err(FetchError::InvalidUrl(detail)) => {
            return Err(AppError::Validation(format!("Invalid URL: {detail}")));
        }
        Err(e) => {
            tracing::warn!(error = ?e, subject = %auth.subject, "Bookmark resolve failed");
        }
    }

    let status = orchestrator.status();
    orchestrator.dispose();

    Ok(Json(ResolveResponse {
        attributes: store.into_inner(),
        status,
    }))
}

/// POST /web-bookmark-block/v1/attributes
///
/// Applies a batch of update operations and returns the new record.
pub async fn update_attributes(Json(req): Json<AttributesRequest>) -> Json<AttributeRecord> {
    Json(apply_all(req.attributes, req.ops))
}
