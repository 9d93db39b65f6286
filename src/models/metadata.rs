use serde::{Deserialize, Serialize};

/// Metadata extracted from a fetched page.
///
/// Every field is independently optional; a page with no usable tags yields
/// the all-`None` snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSnapshot {
    pub title: Option<String>,
    pub description: Option<String>,
    pub favicon: Option<String>,
    pub image: Option<String>,
}

impl MetadataSnapshot {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.favicon.is_none()
            && self.image.is_none()
    }
}

/// Payload committed to the record after a successful fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    /// The URL that was fetched; becomes `siteUrl`.
    pub url: String,
    pub metadata: MetadataSnapshot,
}

/// Body returned by `GET /web-bookmark-block/v1/fetch`.
///
/// `html` is present only when `success` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl FetchResponse {
    pub fn ok(html: String) -> Self {
        FetchResponse {
            success: true,
            html: Some(html),
        }
    }

    pub fn failed() -> Self {
        FetchResponse {
            success: false,
            html: None,
        }
    }
}
