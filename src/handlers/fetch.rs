use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use url::Url;
use validator::Validate;

use crate::auth::{AuthUser, EDIT_POSTS};
use crate::bookmark::MetadataSource;
use crate::error::{AppError, AppResult, FetchError};
use crate::models::FetchResponse;
use crate::state::AppState;

// ── Query params ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct FetchQuery {
    #[validate(url(message = "Invalid URL"))]
    pub url: String,
}

impl FetchQuery {
    /// Trim the raw parameter and check it is an absolute http(s) URL.
    pub fn into_target(self) -> AppResult<String> {
        let query = FetchQuery {
            url: self.url.trim().to_string(),
        };
        query
            .validate()
            .map_err(|_| AppError::Validation("Invalid URL".into()))?;

        let parsed =
            Url::parse(&query.url).map_err(|_| AppError::Validation("Invalid URL".into()))?;
        match parsed.scheme() {
            "http" | "https" => {}
            _ => {
                return Err(AppError::Validation(
                    "Only http/https URLs are supported".into(),
                ))
            }
        }
        if parsed.host_str().is_none() {
            return Err(AppError::Validation("URL has no host".into()));
        }

        Ok(query.url)
    }
}

// ── Handler ────────────────────────────────────────────────────────────────

/// GET /web-bookmark-block/v1/fetch?url=<encoded-url>
///
/// Returns the raw HTML of the page. Requires the `edit_posts` capability.
/// Any failure after validation, including running past the fetch timeout,
/// answers `{"success": false}` with status 200.
pub async fn fetch_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<FetchQuery>,
) -> AppResult<Json<FetchResponse>> {
    auth.require_capability(EDIT_POSTS)?;
    let url = params.into_target()?;

    // Bounds host resolution too, which the HTTP client timeout does not cover.
    let fetched = tokio::time::timeout(state.fetch_timeout, state.direct_source().fetch_html(&url))
        .await
        .unwrap_or(Err(FetchError::Timeout(state.fetch_timeout)));

    match fetched {
        Ok(html) => {
            tracing::info!(url = %url, bytes = html.len(), "Fetched page for bookmark");
            Ok(Json(FetchResponse::ok(html)))
        }
        Err(e) => {
            tracing::warn!(error = ?e, url = %url, "Bookmark page fetch failed");
            Ok(Json(FetchResponse::failed()))
        }
    }
}
