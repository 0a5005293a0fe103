// Provider fetcher - pulls a provider's link list and turns it into streams
//
// A provider answers `{"links": [{"link": ..., "resolutionStr": ...}, ...]}`.
// Unknown fields are ignored. A missing or mistyped `links` field fails the
// provider; individual elements without a usable `link` are skipped.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::codec;
use super::errors::ExtensionError;
use super::models::{DecodedLocator, StreamCandidate, ENCODED_MARKER};

/// One element of a provider's `links` array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderLink {
    /// `link` exactly as the provider sent it (possibly obfuscated)
    pub raw_link: String,
    pub quality: Option<String>,
}

impl ProviderLink {
    /// Final playable URL, decoding nested obfuscation when present
    pub fn resolved_url(&self) -> String {
        match self.raw_link.strip_prefix(ENCODED_MARKER) {
            Some(payload) => {
                let decoded = codec::decode(payload);
                if codec::has_scheme(&decoded) {
                    decoded
                } else {
                    format!("https://{}", decoded.trim_start_matches('/'))
                }
            }
            None => self.raw_link.clone(),
        }
    }

    /// Stream candidate; `fallback_quality` fills in a missing resolution
    pub fn to_candidate(&self, fallback_quality: &str) -> StreamCandidate {
        let quality = self
            .quality
            .as_deref()
            .filter(|q| !q.is_empty())
            .unwrap_or(fallback_quality);
        StreamCandidate::new(self.resolved_url(), quality)
    }
}

#[derive(Debug, Deserialize)]
struct LinkListResponse {
    links: Vec<serde_json::Value>,
}

/// Parse a provider response body into its usable links
pub fn parse_links(body: &str) -> Result<Vec<ProviderLink>, ExtensionError> {
    let response: LinkListResponse = serde_json::from_str(body)?;

    let links = response
        .links
        .iter()
        .filter_map(|entry| {
            let link = entry["link"].as_str().filter(|l| !l.is_empty())?;
            Some(ProviderLink {
                raw_link: link.to_string(),
                quality: entry["resolutionStr"].as_str().map(|s| s.to_string()),
            })
        })
        .collect();

    Ok(links)
}

/// Something that can turn a decoded locator into provider links
#[async_trait]
pub trait LinkFetcher: Send + Sync {
    /// Name of the fetcher (for logging)
    fn name(&self) -> &'static str;

    /// Fetch and parse one provider's link list
    async fn fetch(&self, locator: &DecodedLocator) -> Result<Vec<ProviderLink>, ExtensionError>;
}

/// reqwest-backed fetcher talking to the origin's resource host
pub struct HttpLinkFetcher {
    client: reqwest::Client,
    resource_host: String,
}

impl HttpLinkFetcher {
    /// `client` should already carry the origin's referer and user agent
    pub fn new(client: reqwest::Client, resource_host: impl Into<String>) -> Self {
        Self {
            client,
            resource_host: resource_host.into(),
        }
    }
}

#[async_trait]
impl LinkFetcher for HttpLinkFetcher {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(&self, locator: &DecodedLocator) -> Result<Vec<ProviderLink>, ExtensionError> {
        let url = locator.resolve_against(&self.resource_host);
        debug!(%url, "fetching provider link list");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExtensionError::Transport(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtensionError::Parse(format!("{}: unexpected status {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtensionError::Transport(format!("{}: reading body: {}", url, e)))?;

        parse_links(&body).map_err(|e| match e {
            ExtensionError::Parse(msg) => ExtensionError::Parse(format!("{}: {}", url, msg)),
            other => other,
        })
    }
}
