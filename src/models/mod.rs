use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::bookmark::url::validate_url;

pub mod metadata;

pub use metadata::{AttributeUpdate, FetchResponse, MetadataSnapshot};

pub const TOP_HEIGHT_MIN: f64 = 200.0;
pub const TOP_HEIGHT_MAX: f64 = 600.0;
pub const RIGHT_WIDTH_MIN: f64 = 32.8;
pub const RIGHT_WIDTH_MAX: f64 = 50.0;

// ============================================================================
// Attribute Record
// ============================================================================

/// Image placement relative to the card body.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardAlignment {
    #[default]
    Top,
    Right,
}

/// Persisted state for one bookmark block instance.
///
/// Field names follow the block attribute names so records stored in existing
/// documents deserialize unchanged. Unknown or missing fields fall back to the
/// block defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttributeRecord {
    #[serde(rename = "isURLFetched")]
    pub is_url_fetched: bool,
    pub site_url: Option<String>,
    pub site_url_input: Option<String>,
    #[serde(rename = "isURLValid")]
    pub is_url_valid: bool,

    pub site_title: Option<String>,
    pub site_description: Option<String>,
    pub site_favicon: Option<String>,
    pub site_image: Option<String>,

    pub hide_referer: bool,
    pub use_click_overlay: bool,
    pub use_link_underline: bool,
    pub use_border_radius: bool,
    pub display_site_url: bool,
    pub display_site_image: bool,
    pub display_site_favicon: bool,
    pub site_image_clickable: bool,
    pub open_in_new_window: bool,
    pub site_image_is_centered: bool,

    pub card_alignment: CardAlignment,
    pub site_image_top_height: f64,
    pub site_image_right_width: f64,
}

impl Default for AttributeRecord {
    fn default() -> Self {
        AttributeRecord {
            is_url_fetched: false,
            site_url: None,
            site_url_input: None,
            is_url_valid: false,
            site_title: None,
            site_description: None,
            site_favicon: None,
            site_image: None,
            hide_referer: false,
            use_click_overlay: false,
            use_link_underline: true,
            use_border_radius: true,
            display_site_url: true,
            display_site_image: true,
            display_site_favicon: true,
            site_image_clickable: false,
            open_in_new_window: true,
            site_image_is_centered: true,
            card_alignment: CardAlignment::Top,
            site_image_top_height: 300.0,
            site_image_right_width: 40.0,
        }
    }
}

impl AttributeRecord {
    /// The URL a fetch cycle should resolve: pending input first, then the
    /// committed URL (reload).
    pub fn fetch_target(&self) -> Option<&str> {
        self.site_url_input
            .as_deref()
            .or(self.site_url.as_deref())
    }

    /// Pixel height of a top-aligned image, clamped to its range.
    pub fn top_height(&self) -> f64 {
        clamp_or(self.site_image_top_height, TOP_HEIGHT_MIN, TOP_HEIGHT_MAX)
    }

    /// Percentage width of a right-aligned image, clamped to its range.
    pub fn right_width(&self) -> f64 {
        clamp_or(
            self.site_image_right_width,
            RIGHT_WIDTH_MIN,
            RIGHT_WIDTH_MAX,
        )
    }
}

/// NaN collapses to the lower bound instead of poisoning the markup.
fn clamp_or(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

// ============================================================================
// Update operations
// ============================================================================

/// One update to an [`AttributeRecord`].
///
/// Serialized as `{"op": "<attributeName>", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "camelCase")]
pub enum AttributeOp {
    HideReferer(bool),
    UseClickOverlay(bool),
    UseLinkUnderline(bool),
    OpenInNewWindow(bool),
    UseBorderRadius(bool),
    DisplaySiteUrl(bool),
    DisplaySiteFavicon(bool),
    DisplaySiteImage(bool),
    SiteImageClickable(bool),
    SiteImageIsCentered(bool),
    CardAlignment(CardAlignment),
    SiteImageTopHeight(f64),
    SiteImageRightWidth(f64),
    /// Stores the user's pending URL and caches its validity.
    SiteUrlInput(String),
    /// Commits a successful fetch cycle. Only the fetch orchestrator issues
    /// this; it is never accepted from the wire.
    #[serde(skip_deserializing)]
    CommitFetch(AttributeUpdate),
}

impl AttributeOp {
    pub fn apply(self, record: AttributeRecord) -> AttributeRecord {
        match self {
            AttributeOp::HideReferer(v) => AttributeRecord {
                hide_referer: v,
                ..record
            },
            AttributeOp::UseClickOverlay(v) => AttributeRecord {
                use_click_overlay: v,
                ..record
            },
            AttributeOp::UseLinkUnderline(v) => AttributeRecord {
                use_link_underline: v,
                ..record
            },
            AttributeOp::OpenInNewWindow(v) => AttributeRecord {
                open_in_new_window: v,
                ..record
            },
            AttributeOp::UseBorderRadius(v) => AttributeRecord {
                use_border_radius: v,
                ..record
            },
            AttributeOp::DisplaySiteUrl(v) => AttributeRecord {
                display_site_url: v,
                ..record
            },
            AttributeOp::DisplaySiteFavicon(v) => AttributeRecord {
                display_site_favicon: v,
                ..record
            },
            AttributeOp::DisplaySiteImage(v) => AttributeRecord {
                display_site_image: v,
                ..record
            },
            AttributeOp::SiteImageClickable(v) => AttributeRecord {
                site_image_clickable: v,
                ..record
            },
            AttributeOp::SiteImageIsCentered(v) => AttributeRecord {
                site_image_is_centered: v,
                ..record
            },
            AttributeOp::CardAlignment(v) => AttributeRecord {
                card_alignment: v,
                ..record
            },
            AttributeOp::SiteImageTopHeight(v) => AttributeRecord {
                site_image_top_height: clamp_or(v, TOP_HEIGHT_MIN, TOP_HEIGHT_MAX),
                ..record
            },
            AttributeOp::SiteImageRightWidth(v) => AttributeRecord {
                site_image_right_width: clamp_or(v, RIGHT_WIDTH_MIN, RIGHT_WIDTH_MAX),
                ..record
            },
            AttributeOp::SiteUrlInput(input) => AttributeRecord {
                is_url_valid: validate_url(&input),
                site_url_input: Some(input),
                ..record
            },
            AttributeOp::CommitFetch(update) => AttributeRecord {
                is_url_fetched: true,
                site_url: Some(update.url),
                site_url_input: None,
                site_title: update.metadata.title,
                site_description: update.metadata.description,
                site_favicon: update.metadata.favicon,
                site_image: update.metadata.image,
                ..record
            },
        }
    }
}

/// Applies `ops` in order.
pub fn apply_all(record: AttributeRecord, ops: impl IntoIterator<Item = AttributeOp>) -> AttributeRecord {
    ops.into_iter().fold(record, |acc, op| op.apply(acc))
}
