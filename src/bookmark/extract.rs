//! Open Graph / HTML metadata extraction.
//!
//! Lookup order per field (first non-blank value wins, duplicates resolve to
//! the first occurrence in document order):
//!
//! - title: `og:title`, `twitter:title`, `<title>`
//! - description: `og:description`, `twitter:description`, `meta[name=description]`
//! - favicon: `link[rel=icon]`, then any rel list containing `icon`
//!   (`shortcut icon`), then `apple-touch-icon*`
//! - image: `og:image`, `og:image:url`, `og:image:secure_url`, `twitter:image`,
//!   `link[rel=image_src]`, first `<img src>`
//!
//! Asset URLs are resolved against the page URL. Extraction never fails; a
//! page with nothing usable produces the empty snapshot.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use strum::{Display, EnumString};
use url::Url;

use crate::bookmark::url::base_url;
use crate::models::MetadataSnapshot;

static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content]").expect("meta selector is valid"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector is valid"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel][href]").expect("link selector is valid"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img[src]").expect("img selector is valid"));

const TITLE_KEYS: &[&str] = &["og:title", "twitter:title"];
const DESCRIPTION_KEYS: &[&str] = &["og:description", "twitter:description", "description"];
const IMAGE_KEYS: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
    "twitter:image:src",
];

/// What to report as the favicon when the page declares none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum FaviconFallback {
    /// Leave the favicon empty.
    #[default]
    None,
    /// Guess `{origin}/favicon.ico`.
    Conventional,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    favicon_fallback: FaviconFallback,
}

impl Extractor {
    pub fn new(favicon_fallback: FaviconFallback) -> Self {
        Extractor { favicon_fallback }
    }

    /// Extract a snapshot from `html` as if it had been served from `source_url`.
    pub fn extract(&self, html: &str, source_url: &str) -> MetadataSnapshot {
        let document = Html::parse_document(html);
        let base = Url::parse(source_url).ok();
        let meta = collect_meta(&document);

        let title = first_meta(&meta, TITLE_KEYS).or_else(|| title_tag(&document));
        let description = first_meta(&meta, DESCRIPTION_KEYS);

        let favicon = favicon_link(&document, base.as_ref()).or_else(|| match self
            .favicon_fallback
        {
            FaviconFallback::None => None,
            FaviconFallback::Conventional => {
                base_url(source_url).map(|origin| format!("{origin}/favicon.ico"))
            }
        });

        let image = IMAGE_KEYS
            .iter()
            .filter_map(|key| meta.get(*key))
            .find_map(|href| resolve_asset(base.as_ref(), href))
            .or_else(|| image_src_link(&document, base.as_ref()))
            .or_else(|| first_img(&document, base.as_ref()));

        MetadataSnapshot {
            title,
            description,
            favicon,
            image,
        }
    }
}

/// Extract with the default policy (no favicon guess).
pub fn extract_metadata(html: &str, source_url: &str) -> MetadataSnapshot {
    Extractor::default().extract(html, source_url)
}

// ── Helpers ────────────────────────────────────────────────────────────────

/// First non-blank `content` per lowercased `property` / `name` key.
fn collect_meta(doc: &Html) -> HashMap<String, String> {
    let mut meta = HashMap::new();
    for el in doc.select(&META_SELECTOR) {
        let Some(content) = el.value().attr("content").and_then(non_blank) else {
            continue;
        };
        for key in ["property", "name"] {
            if let Some(k) = el.value().attr(key) {
                meta.entry(k.trim().to_ascii_lowercase())
                    .or_insert_with(|| content.clone());
            }
        }
    }
    meta
}

fn first_meta(meta: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| meta.get(*key).cloned())
}

fn title_tag(doc: &Html) -> Option<String> {
    doc.select(&TITLE_SELECTOR)
        .find_map(|el| non_blank(&el.text().collect::<String>()))
}

fn rel_tokens(el: &ElementRef<'_>) -> Vec<String> {
    el.value()
        .attr("rel")
        .unwrap_or_default()
        .split_ascii_whitespace()
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Lower is better; `None` means the link is not an icon.
fn icon_rank(tokens: &[String]) -> Option<u8> {
    match tokens {
        [only] if only == "icon" => Some(0),
        _ if tokens.iter().any(|t| t == "icon") => Some(1),
        _ if tokens.iter().any(|t| t.starts_with("apple-touch-icon")) => Some(2),
        _ => None,
    }
}

fn favicon_link(doc: &Html, base: Option<&Url>) -> Option<String> {
    doc.select(&LINK_SELECTOR)
        .filter_map(|el| {
            let rank = icon_rank(&rel_tokens(&el))?;
            let href = resolve_asset(base, el.value().attr("href")?)?;
            Some((rank, href))
        })
        // min_by_key keeps the first of equal ranks, i.e. document order.
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, href)| href)
}

fn image_src_link(doc: &Html, base: Option<&Url>) -> Option<String> {
    doc.select(&LINK_SELECTOR)
        .filter(|el| rel_tokens(el).iter().any(|t| t == "image_src"))
        .find_map(|el| resolve_asset(base, el.value().attr("href")?))
}

fn first_img(doc: &Html, base: Option<&Url>) -> Option<String> {
    doc.select(&IMG_SELECTOR)
        .find_map(|el| resolve_asset(base, el.value().attr("src")?))
}

/// Resolve `href` against the page URL, keeping only web and inline assets.
fn resolve_asset(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" | "data" => Some(resolved.to_string()),
        _ => None,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_og_description() {
        let html = r#"<html><head><title>T</title><meta property="og:description" content="D"></head></html>"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(
            snapshot,
            MetadataSnapshot {
                title: Some("T".into()),
                description: Some("D".into()),
                favicon: None,
                image: None,
            }
        );
    }

    #[test]
    fn og_title_takes_precedence_over_title_tag() {
        let html = r#"<html><head>
            <title>Page Title</title>
            <meta property="og:title" content="OG Title"/>
        </head></html>"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn twitter_title_beats_title_tag() {
        let html = r#"<title>Plain</title><meta name="twitter:title" content="Card">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.title.as_deref(), Some("Card"));
    }

    #[test]
    fn falls_back_to_meta_description() {
        let html = r#"<head><meta name="description" content="Plain description"></head>"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.description.as_deref(), Some("Plain description"));
    }

    #[test]
    fn meta_keys_are_case_insensitive() {
        let html = r#"<meta name="Description" content="Capitalised"><meta property="OG:Title" content="Upper">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.description.as_deref(), Some("Capitalised"));
        assert_eq!(snapshot.title.as_deref(), Some("Upper"));
    }

    #[test]
    fn first_duplicate_meta_wins() {
        let html = r#"<head>
            <meta property="og:title" content="First">
            <meta property="og:title" content="Second">
            <meta property="og:image" content="/one.png">
            <meta property="og:image" content="/two.png">
        </head>"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.title.as_deref(), Some("First"));
        assert_eq!(snapshot.image.as_deref(), Some("https://example.com/one.png"));
    }

    #[test]
    fn whitespace_only_content_is_ignored() {
        let html = r#"<meta property="og:title" content="   "><title>  Fallback  </title>"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.title.as_deref(), Some("Fallback"));
    }

    #[test]
    fn entities_are_decoded() {
        let html = r#"<title>Tom &amp; Jerry</title><meta name="description" content="a &lt; b">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.title.as_deref(), Some("Tom & Jerry"));
        assert_eq!(snapshot.description.as_deref(), Some("a < b"));
    }

    #[test]
    fn works_without_head() {
        let html = r#"<title>Headless</title><body><img src="pic.jpg"></body>"#;
        let snapshot = extract_metadata(html, "https://example.com/blog/post");
        assert_eq!(snapshot.title.as_deref(), Some("Headless"));
        assert_eq!(
            snapshot.image.as_deref(),
            Some("https://example.com/blog/pic.jpg")
        );
    }

    #[test]
    fn garbage_yields_empty_snapshot() {
        for html in ["", "<<<>>>", "\u{0}\u{1}not html at all", "<html><head></head></html>"] {
            assert!(extract_metadata(html, "https://example.com").is_empty());
        }
    }

    #[test]
    fn resolves_relative_favicon() {
        let html = r#"<link rel="icon" href="/static/favicon.png">"#;
        let snapshot = extract_metadata(html, "https://example.com/a/b");
        assert_eq!(
            snapshot.favicon.as_deref(),
            Some("https://example.com/static/favicon.png")
        );
    }

    #[test]
    fn plain_icon_beats_shortcut_and_apple_touch() {
        let html = r#"
            <link rel="apple-touch-icon" href="/apple.png">
            <link rel="shortcut icon" href="/shortcut.ico">
            <link rel="icon" href="/icon.svg">
            <link rel="icon" href="/icon2.svg">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(
            snapshot.favicon.as_deref(),
            Some("https://example.com/icon.svg")
        );
    }

    #[test]
    fn shortcut_icon_beats_apple_touch() {
        let html = r#"
            <link rel="apple-touch-icon-precomposed" href="/apple.png">
            <link rel="Shortcut Icon" href="/shortcut.ico">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(
            snapshot.favicon.as_deref(),
            Some("https://example.com/shortcut.ico")
        );
    }

    #[test]
    fn no_favicon_link_yields_none_by_default() {
        let html = r#"<title>T</title>"#;
        let snapshot = extract_metadata(html, "https://example.com/deep/page");
        assert!(snapshot.favicon.is_none());
    }

    #[test]
    fn conventional_fallback_guesses_root_favicon() {
        let extractor = Extractor::new(FaviconFallback::Conventional);
        let snapshot = extractor.extract("<title>T</title>", "https://example.com:8443/deep/page");
        assert_eq!(
            snapshot.favicon.as_deref(),
            Some("https://example.com:8443/favicon.ico")
        );
    }

    #[test]
    fn conventional_fallback_needs_a_valid_source() {
        let extractor = Extractor::new(FaviconFallback::Conventional);
        let snapshot = extractor.extract("<title>T</title>", "not a url");
        assert!(snapshot.favicon.is_none());
    }

    #[test]
    fn declared_favicon_wins_over_fallback() {
        let extractor = Extractor::new(FaviconFallback::Conventional);
        let snapshot = extractor.extract(
            r#"<link rel="icon" href="https://cdn.example.net/i.png">"#,
            "https://example.com",
        );
        assert_eq!(
            snapshot.favicon.as_deref(),
            Some("https://cdn.example.net/i.png")
        );
    }

    #[test]
    fn image_priority_order() {
        let html = r#"
            <img src="/inline.png">
            <link rel="image_src" href="/link.png">
            <meta name="twitter:image" content="/twitter.png">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(
            snapshot.image.as_deref(),
            Some("https://example.com/twitter.png")
        );

        let html = r#"<img src="/inline.png"><link rel="image_src" href="/link.png">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.image.as_deref(), Some("https://example.com/link.png"));
    }

    #[test]
    fn rejects_script_urls() {
        let html = r#"<meta property="og:image" content="javascript:alert(1)"><link rel="icon" href="javascript:void(0)">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert!(snapshot.image.is_none());
        assert!(snapshot.favicon.is_none());
    }

    #[test]
    fn keeps_data_uri_favicons() {
        let html = r#"<link rel="icon" href="data:image/png;base64,AAAA">"#;
        let snapshot = extract_metadata(html, "https://example.com");
        assert_eq!(snapshot.favicon.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn relative_assets_drop_without_valid_source() {
        let html = r#"<meta property="og:image" content="/rel.png"><title>T</title>"#;
        let snapshot = extract_metadata(html, "not a url");
        assert_eq!(snapshot.title.as_deref(), Some("T"));
        assert!(snapshot.image.is_none());
    }

    #[test]
    fn extraction_is_idempotent() {
        let html = r#"<title>T</title><link rel="icon" href="/f.ico"><meta property="og:image" content="i.png">"#;
        let first = extract_metadata(html, "https://example.com/x/");
        let second = extract_metadata(html, "https://example.com/x/");
        assert_eq!(first, second);
    }

    #[test]
    fn fallback_parses_from_config_string() {
        assert_eq!("none".parse::<FaviconFallback>().unwrap(), FaviconFallback::None);
        assert_eq!(
            "conventional".parse::<FaviconFallback>().unwrap(),
            FaviconFallback::Conventional
        );
    }
}
