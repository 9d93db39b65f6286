//! Attribute record → render-agnostic card layout.
//!
//! Every visibility and enablement rule lives here; the preview and saved
//! renderers only translate a [`CardLayout`] into markup.

use serde::Serialize;

use crate::bookmark::orchestrator::FetchStatus;
use crate::bookmark::url::resolve_target;
use crate::models::{AttributeRecord, CardAlignment};

/// Wrapper class the host adds to every instance of the block.
pub const BLOCK_CLASS: &str = "wp-block-mdz-web-bookmark-block";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    Preview,
    Saved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkTarget {
    NewWindow,
    SameWindow,
}

impl LinkTarget {
    pub fn from_flag(open_in_new_window: bool) -> Self {
        if open_in_new_window {
            LinkTarget::NewWindow
        } else {
            LinkTarget::SameWindow
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            LinkTarget::NewWindow => "new-window",
            LinkTarget::SameWindow => "same-window",
        }
    }

    /// Value of the anchor `target` attribute.
    pub fn html_target(self) -> &'static str {
        match self {
            LinkTarget::NewWindow => "_blank",
            LinkTarget::SameWindow => "_self",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStyle {
    pub background_image: String,
    pub centered: bool,
    /// Pixels; only for top-aligned cards.
    pub height_px: Option<f64>,
    /// Percent of the card; only for right-aligned cards.
    pub width_percent: Option<f64>,
}

impl ImageStyle {
    /// Inline `style` value, e.g. `background-image:url(..);height:300px`.
    pub fn to_css(&self) -> String {
        let mut rules = vec![format!("background-image:url({})", css_url(&self.background_image))];
        if self.centered {
            rules.push("background-position:center".to_string());
        }
        if let Some(h) = self.height_px {
            rules.push(format!("height:{h}px"));
        }
        if let Some(w) = self.width_percent {
            rules.push(format!("width:{w}%"));
        }
        rules.join(";")
    }
}

/// Keep an unquoted CSS `url(...)` from being terminated early.
fn css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '"' => out.push_str("%22"),
            '\'' => out.push_str("%27"),
            '\\' => out.push_str("%5C"),
            c if c.is_whitespace() => {}
            c => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardImage {
    pub url: String,
    /// Effective value: the click overlay disables image links.
    pub clickable: bool,
    pub style: ImageStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetaLink {
    pub favicon: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    /// `None` when `displaySiteUrl` is off.
    pub link: Option<MetaLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SizeControl {
    /// Image height in pixels.
    Height(f64),
    /// Image width in percent.
    Width(f64),
}

/// Which preview controls are interactive.
///
/// Controls that are never disabled (new window, referrer, overlay, corners,
/// display URL, display image) are not listed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlStates {
    pub url_input: bool,
    pub submit: bool,
    pub reload: bool,
    pub link_underline: bool,
    pub site_favicon: bool,
    pub site_image_clickable: bool,
    pub site_image_centered: bool,
    pub card_alignment: bool,
    pub image_size: bool,
    pub size_control: SizeControl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardLayout {
    pub target: RenderTarget,
    pub fetched: bool,
    pub classes: Vec<&'static str>,
    pub link_target: LinkTarget,
    /// Anchor href after referrer masking.
    pub href: Option<String>,
    pub site_url: Option<String>,
    pub overlay: bool,
    pub meta: CardMeta,
    pub image: Option<CardImage>,
    pub busy: bool,
    pub show_error: bool,
    /// Current value of the URL text field.
    pub url_input: String,
    pub controls: ControlStates,
}

impl CardLayout {
    pub fn class_attr(&self) -> String {
        self.classes.join(" ")
    }
}

pub fn resolve_preview(record: &AttributeRecord, status: &FetchStatus) -> CardLayout {
    resolve_layout(record, RenderTarget::Preview, status)
}

pub fn resolve_saved(record: &AttributeRecord) -> CardLayout {
    resolve_layout(record, RenderTarget::Saved, &FetchStatus::default())
}

/// Fetch status only matters for the preview; saved markup is a function of
/// the record alone.
pub fn resolve_layout(
    record: &AttributeRecord,
    target: RenderTarget,
    status: &FetchStatus,
) -> CardLayout {
    let preview = target == RenderTarget::Preview;
    let busy = preview && status.is_busy();
    let fetched = record.is_url_fetched;

    let mut classes = vec![BLOCK_CLASS];
    if fetched {
        if busy {
            classes.push("is-fetching-url");
        }
        if record.display_site_image {
            classes.push("has-site-image");
        }
        if record.use_border_radius {
            classes.push("has-border-radius");
        }
        if record.use_link_underline {
            classes.push("has-link-underline");
        }
        if record.use_click_overlay {
            classes.push("has-click-overlay");
        }
        classes.push(match record.card_alignment {
            CardAlignment::Top => "card-alignment-top",
            CardAlignment::Right => "card-alignment-right",
        });
    } else if preview {
        classes.push("wb-link-entry");
    }

    let href = record
        .site_url
        .as_deref()
        .map(|url| resolve_target(url, record.hide_referer));

    let meta = CardMeta {
        title: record.site_title.clone(),
        description: record.site_description.clone(),
        link: record.display_site_url.then(|| MetaLink {
            favicon: if record.display_site_favicon {
                record.site_favicon.clone().filter(|f| !f.is_empty())
            } else {
                None
            },
            url: record.site_url.clone(),
        }),
    };

    let image = record
        .site_image
        .as_deref()
        .filter(|url| record.display_site_image && !url.is_empty())
        .map(|url| CardImage {
            url: url.to_string(),
            clickable: record.site_image_clickable && !record.use_click_overlay,
            style: ImageStyle {
                background_image: url.to_string(),
                centered: record.site_image_is_centered,
                height_px: (record.card_alignment == CardAlignment::Top)
                    .then(|| record.top_height()),
                width_percent: (record.card_alignment == CardAlignment::Right)
                    .then(|| record.right_width()),
            },
        });

    let controls = ControlStates {
        url_input: !busy,
        submit: !busy && record.is_url_valid,
        reload: !busy && record.fetch_target().is_some(),
        link_underline: !record.use_click_overlay,
        site_favicon: record.display_site_url,
        site_image_clickable: record.display_site_image && !record.use_click_overlay,
        site_image_centered: record.display_site_image,
        card_alignment: record.display_site_image,
        image_size: record.display_site_image,
        size_control: match record.card_alignment {
            CardAlignment::Top => SizeControl::Height(record.top_height()),
            CardAlignment::Right => SizeControl::Width(record.right_width()),
        },
    };

    CardLayout {
        target,
        fetched,
        classes,
        link_target: LinkTarget::from_flag(record.open_in_new_window),
        href,
        site_url: record.site_url.clone(),
        overlay: fetched && record.use_click_overlay,
        meta,
        image,
        busy,
        show_error: preview && status.has_error(),
        url_input: record
            .fetch_target()
            .map(str::to_string)
            .unwrap_or_default(),
        controls,
    }
}
