use axum::Json;
use maud::Markup;
use serde::Deserialize;

use crate::bookmark::{render_preview, render_saved, FetchStatus};
use crate::models::AttributeRecord;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub attributes: AttributeRecord,
    #[serde(default)]
    pub status: FetchStatus,
}

/// POST /web-bookmark-block/v1/render/saved
///
/// Markup persisted into the host document for the given record.
pub async fn render_saved_card(Json(record): Json<AttributeRecord>) -> Markup {
    render_saved(&record)
}

/// POST /web-bookmark-block/v1/render/preview
pub async fn render_preview_card(Json(req): Json<PreviewRequest>) -> Markup {
    render_preview(&req.attributes, &req.status)
}
