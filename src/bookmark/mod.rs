//! Bookmark card core: URL handling, metadata extraction, the per-instance
//! fetch orchestrator, and the record → markup pipeline.

pub mod extract;
pub mod layout;
pub mod orchestrator;
pub mod render;
pub mod source;
pub mod store;
pub mod url;

pub use extract::{extract_metadata, Extractor, FaviconFallback};
pub use layout::{resolve_layout, resolve_preview, resolve_saved, CardLayout, LinkTarget, RenderTarget};
pub use orchestrator::{FetchOrchestrator, FetchState, FetchStatus};
pub use render::{render_preview, render_saved};
pub use source::{DirectSource, EndpointSource, MetadataSource};
pub use store::{AttributeStore, MemoryStore};
pub use self::url::{resolve_target, validate_url};
