use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{header, redirect, Client as ReqwestClient};
use url::{Host, Url};

use crate::bookmark::url::is_private_ip;
use crate::error::FetchError;
use crate::models::FetchResponse;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; WebBookmarkBot/0.1; +https://github.com/mendezcode/web-bookmark-block)";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
const MAX_REDIRECTS: usize = 5;

/// Retrieves the raw HTML of a page.
///
/// Implementations are stateless per call and shared between block
/// instances.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError>;
}

// ── Endpoint client ────────────────────────────────────────────────────────

/// Talks to a `GET /web-bookmark-block/v1/fetch` endpoint.
///
/// Every failure mode (transport, non-2xx, malformed JSON, `success: false`)
/// collapses into `FetchError::Transport`.
#[derive(Clone)]
pub struct EndpointSource {
    client: ReqwestClient,
    endpoint: String,
    token: Option<String>,
}

impl EndpointSource {
    pub fn new(client: ReqwestClient, endpoint: impl Into<String>) -> Self {
        EndpointSource {
            client,
            endpoint: endpoint.into(),
            token: None,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request_url(&self, url: &str) -> String {
        format!("{}?url={}", self.endpoint, urlencoding::encode(url))
    }
}

#[async_trait]
impl MetadataSource for EndpointSource {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self.client.get(self.request_url(url));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;

        let body: FetchResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = ?e, url = %url, "Malformed fetch endpoint response");
            FetchError::Transport("malformed endpoint response".into())
        })?;

        match body {
            FetchResponse {
                success: true,
                html: Some(html),
            } => Ok(html),
            FetchResponse { success: true, .. } => {
                Err(FetchError::Transport("endpoint returned no HTML".into()))
            }
            FetchResponse { success: false, .. } => {
                Err(FetchError::Transport("endpoint reported failure".into()))
            }
        }
    }
}

// ── Direct fetcher ─────────────────────────────────────────────────────────

/// Fetches pages directly; this is what the fetch endpoint runs server-side.
#[derive(Clone)]
pub struct DirectSource {
    client: ReqwestClient,
    allow_private_hosts: bool,
    max_body_bytes: usize,
}

impl DirectSource {
    pub fn new(client: ReqwestClient) -> Self {
        DirectSource {
            client,
            allow_private_hosts: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Build the shared HTTP client used for page fetches.
    ///
    /// Unless `allow_private_hosts` is set, every connection the client makes
    /// (redirect hops included) goes through [`PublicOnlyResolver`], and
    /// redirects to private IP literals are refused.
    pub fn build_client(
        timeout: Duration,
        user_agent: &str,
        allow_private_hosts: bool,
    ) -> Result<ReqwestClient, FetchError> {
        let builder = ReqwestClient::builder()
            .timeout(timeout)
            .user_agent(user_agent);

        let builder = if allow_private_hosts {
            builder.redirect(redirect::Policy::limited(MAX_REDIRECTS))
        } else {
            builder
                .redirect(redirect::Policy::custom(|attempt| {
                    if attempt.previous().len() >= MAX_REDIRECTS {
                        attempt.error("too many redirects")
                    } else if !is_public_redirect(attempt.url()) {
                        attempt.error("redirect to a private or reserved address")
                    } else {
                        attempt.follow()
                    }
                }))
                .dns_resolver(Arc::new(PublicOnlyResolver))
        };

        builder.build().map_err(FetchError::from)
    }

    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Reject non-web schemes and, unless allowed, hosts that resolve to
    /// private or reserved addresses.
    async fn check_target(&self, url: &str) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FetchError::InvalidUrl(format!(
                    "unsupported scheme '{other}'"
                )))
            }
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| FetchError::InvalidUrl("URL has no host".into()))?;

        if self.allow_private_hosts {
            return Ok(());
        }

        let port = parsed.port_or_known_default().unwrap_or(80);
        let host = host.trim_start_matches('[').trim_end_matches(']');
        let addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|_| FetchError::Transport("could not resolve host".into()))?;

        for addr in addrs {
            if is_private_ip(addr.ip()) {
                return Err(FetchError::Transport(
                    "host resolves to a private or reserved address".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Whether a redirect hop may be followed. Domain names are vetted again by
/// [`PublicOnlyResolver`] when the hop connects.
fn is_public_redirect(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    match url.host() {
        Some(Host::Ipv4(ip)) => !is_private_ip(ip.into()),
        Some(Host::Ipv6(ip)) => !is_private_ip(ip.into()),
        Some(Host::Domain(domain)) => !domain.eq_ignore_ascii_case("localhost"),
        None => false,
    }
}

/// DNS resolver that fails any name with a private or reserved address.
///
/// The addresses it returns are the ones connected to, so a name cannot be
/// re-pointed at an internal address between the check and the connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name.as_str().to_string()))
    }
}

async fn resolve_public(host: String) -> Result<Addrs, Box<dyn StdError + Send + Sync>> {
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0)).await?.collect();
    if addrs.is_empty() {
        return Err(format!("{host} did not resolve").into());
    }
    if addrs.iter().any(|addr| is_private_ip(addr.ip())) {
        tracing::warn!(host = %host, "Refusing host with a private or reserved address");
        return Err(format!("{host} resolves to a private or reserved address").into());
    }
    Ok(Box::new(addrs.into_iter()))
}

fn is_html_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    matches!(mime.as_str(), "text/html" | "application/xhtml+xml" | "text/plain" | "")
}

#[async_trait]
impl MetadataSource for DirectSource {
    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        self.check_target(url).await?;

        let mut response = self.client.get(url).send().await?.error_for_status()?;

        if let Some(content_type) = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html_content_type(content_type) {
                return Err(FetchError::Transport(format!(
                    "unsupported content type '{content_type}'"
                )));
            }
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let remaining = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() >= remaining {
                // Metadata lives in <head>; a truncated page still parses.
                body.extend_from_slice(&chunk[..remaining]);
                tracing::debug!(url = %url, limit = self.max_body_bytes, "Truncated page body");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}
