//! Card markup.
//!
//! Two thin adapters over [`CardLayout`]: the static markup stored in the
//! document, and the editable preview with its setting panels. Both are pure
//! functions of their inputs.

use maud::{html, Markup};

use crate::bookmark::layout::{resolve_preview, resolve_saved, CardLayout, SizeControl};
use crate::bookmark::orchestrator::FetchStatus;
use crate::models::{
    AttributeRecord, CardAlignment, RIGHT_WIDTH_MAX, RIGHT_WIDTH_MIN, TOP_HEIGHT_MAX,
    TOP_HEIGHT_MIN,
};

const FETCH_ERROR_TEXT: &str = "Errors fetching the site's metadata.";
const URL_PLACEHOLDER: &str = "Paste or type the URL";
const SITE_IMAGE_TEXT: &str = "Site image";

/// Markup persisted in the document for `record`.
pub fn render_saved(record: &AttributeRecord) -> Markup {
    saved_markup(&resolve_saved(record))
}

/// Editor preview for `record` given the instance's current fetch status.
pub fn render_preview(record: &AttributeRecord, status: &FetchStatus) -> Markup {
    preview_markup(&resolve_preview(record, status), record)
}

// ── Saved ──────────────────────────────────────────────────────────────────

fn saved_markup(layout: &CardLayout) -> Markup {
    let target = layout.link_target.html_target();
    let href = layout.href.as_deref();
    let title = layout.meta.title.as_deref().unwrap_or_default();

    html! {
        div class=(layout.class_attr()) {
            @if layout.fetched {
                @if layout.overlay {
                    a.wb-click-overlay target=(target) href=[href] rel="noopener" {
                        span.screen-reader-text { (title) }
                    }
                }
                div.wb-meta {
                    h3.wb-meta-title {
                        a target=(target) href=[href] rel="noopener" { (title) }
                    }
                    p.wb-meta-description {
                        (layout.meta.description.as_deref().unwrap_or_default())
                    }
                    @if let Some(link) = &layout.meta.link {
                        span.wb-meta-link {
                            @if let Some(favicon) = &link.favicon {
                                img alt="" src=(favicon);
                            }
                            @if let Some(url) = &link.url {
                                a target=(target) href=[href] rel="noopener" { (url) }
                            }
                        }
                    }
                }
                @if let Some(image) = &layout.image {
                    a.wb-card
                        target=[image.clickable.then_some(target)]
                        href=[href.filter(|_| image.clickable)]
                        style=(image.style.to_css())
                        rel="noopener"
                    {
                        span.screen-reader-text { (SITE_IMAGE_TEXT) }
                    }
                }
            }
        }
    }
}

// ── Preview ────────────────────────────────────────────────────────────────

fn preview_markup(layout: &CardLayout, record: &AttributeRecord) -> Markup {
    html! {
        div class=(layout.class_attr()) data-link-target=(layout.link_target.token()) {
            @if layout.fetched {
                (toolbar(layout))
                (inspector(layout, record))
                (preview_card(layout))
            } @else {
                strong { "Web Bookmark" }
                (url_field(layout))
                (error_notice(layout))
                button.wb-submit type="button" data-op="fetch" disabled[!layout.controls.submit] {
                    "Fetch metadata"
                }
                (spinner(layout))
            }
        }
    }
}

fn toolbar(layout: &CardLayout) -> Markup {
    let label = if layout.busy {
        "Fetching site metadata, please wait."
    } else {
        "Reload metadata"
    };
    let pressed = if layout.busy { "true" } else { "false" };
    html! {
        div.wb-toolbar {
            button.wb-reload
                type="button"
                data-op="reload"
                aria-pressed=(pressed)
                title=(label)
                disabled[!layout.controls.reload]
            {
                (label)
            }
        }
    }
}

fn inspector(layout: &CardLayout, record: &AttributeRecord) -> Markup {
    let c = &layout.controls;
    html! {
        div.wb-inspector {
            fieldset.wb-panel {
                legend { "URL" }
                (url_field(layout))
                (error_notice(layout))
                button.wb-submit type="button" data-op="fetch" disabled[!c.submit] {
                    "Update metadata"
                }
                (spinner(layout))
            }
            fieldset.wb-panel {
                legend { "Behavior" }
                (toggle("useLinkUnderline", "Underline links on hover", record.use_link_underline, c.link_underline))
                (toggle("openInNewWindow", "Open links in a new window", record.open_in_new_window, true))
                (toggle("hideReferer", "Hide referer for links", record.hide_referer, true))
                (toggle("useClickOverlay", "Make entire card clickable", record.use_click_overlay, true))
            }
            fieldset.wb-panel {
                legend { "Appearance" }
                (toggle("useBorderRadius", "Rounded corners", record.use_border_radius, true))
                (toggle("displaySiteUrl", "Display Site URL", record.display_site_url, true))
                (toggle("displaySiteFavicon", "Display Site Icon", record.display_site_favicon, c.site_favicon))
                (toggle("displaySiteImage", "Display Site Image", record.display_site_image, true))
                (toggle("siteImageClickable", "Site Image is clickable", record.site_image_clickable, c.site_image_clickable))
                (toggle("siteImageIsCentered", "Center Image", record.site_image_is_centered, c.site_image_centered))
                label.wb-select {
                    "Image Alignment"
                    select name="cardAlignment" data-op="cardAlignment" disabled[!c.card_alignment] {
                        option value=(CardAlignment::Top.to_string()) selected[record.card_alignment == CardAlignment::Top] {
                            "Top Aligned"
                        }
                        option value=(CardAlignment::Right.to_string()) selected[record.card_alignment == CardAlignment::Right] {
                            "Right Aligned"
                        }
                    }
                }
                (size_range(c.size_control, c.image_size))
            }
        }
    }
}

fn size_range(control: SizeControl, enabled: bool) -> Markup {
    let (op, label, help, min, max, step, value) = match control {
        SizeControl::Height(v) => (
            "siteImageTopHeight",
            "Image Height",
            "Value in pixels.",
            TOP_HEIGHT_MIN,
            TOP_HEIGHT_MAX,
            1.0,
            v,
        ),
        SizeControl::Width(v) => (
            "siteImageRightWidth",
            "Image Width",
            "Percentage width of container.",
            RIGHT_WIDTH_MIN,
            RIGHT_WIDTH_MAX,
            0.2,
            v,
        ),
    };
    html! {
        label.wb-range {
            (label)
            input type="range" name=(op) data-op=(op)
                min=(min.to_string()) max=(max.to_string()) step=(step.to_string()) value=(value.to_string())
                disabled[!enabled];
            small.wb-help { (help) }
        }
    }
}

fn toggle(op: &str, label: &str, checked: bool, enabled: bool) -> Markup {
    html! {
        label.wb-toggle {
            input type="checkbox" name=(op) data-op=(op) checked[checked] disabled[!enabled];
            " "
            (label)
        }
    }
}

fn url_field(layout: &CardLayout) -> Markup {
    html! {
        input.wb-url-input
            type="text"
            name="siteUrlInput"
            data-op="siteUrlInput"
            autocomplete="off"
            placeholder=(URL_PLACEHOLDER)
            value=(layout.url_input)
            readonly[!layout.controls.url_input];
    }
}

fn error_notice(layout: &CardLayout) -> Markup {
    html! {
        @if layout.show_error {
            p.web-bookmark-block__error role="alert" {
                span.dashicons.dashicons-dismiss {}
                span { (FETCH_ERROR_TEXT) }
            }
        }
    }
}

fn spinner(layout: &CardLayout) -> Markup {
    html! {
        @if layout.busy {
            span.components-spinner aria-busy="true" {}
        }
    }
}

fn preview_card(layout: &CardLayout) -> Markup {
    let data_href = layout.site_url.as_deref();
    html! {
        div.wb-meta {
            h3.wb-meta-title {
                span.wb-link-preview data-href=[data_href] {
                    (layout.meta.title.as_deref().unwrap_or_default())
                }
            }
            p.wb-meta-description {
                (layout.meta.description.as_deref().unwrap_or_default())
            }
            @if let Some(link) = &layout.meta.link {
                span.wb-meta-link {
                    @if let Some(favicon) = &link.favicon {
                        img alt="" src=(favicon);
                    }
                    @if let Some(url) = &link.url {
                        span.wb-link-preview data-href=(url) { (url) }
                    }
                }
            }
        }
        @if let Some(image) = &layout.image {
            div.wb-card style=(image.style.to_css()) {
                span.screen-reader-text { (SITE_IMAGE_TEXT) }
            }
        }
    }
}
