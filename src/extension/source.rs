// Sources exposed by the extension and the AllAnime implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::api::OriginApi;
use super::config::ExtensionConfig;
use super::errors::ExtensionError;
use super::fetcher::HttpLinkFetcher;
use super::models::{EpisodeInfo, ExtensionInfo, ResolutionOutcome, SearchResult, SourceInfo};
use super::resolver::ConcurrentResolver;

/// One content origin reachable through the extension protocol
#[async_trait]
pub trait Source: Send + Sync {
    fn info(&self) -> SourceInfo;

    async fn search(&self, query: &str, page: u32) -> Result<Vec<SearchResult>, ExtensionError>;

    async fn episodes(&self, anime_id: &str) -> Result<Vec<EpisodeInfo>, ExtensionError>;

    /// Playable streams for one episode, best-ranked first
    async fn stream_url(
        &self,
        anime_id: &str,
        episode: &str,
    ) -> Result<ResolutionOutcome, ExtensionError>;
}

/// Check an episode flag is a non-negative number and return it trimmed
pub fn validate_episode(episode: &str) -> Result<&str, ExtensionError> {
    let trimmed = episode.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(trimmed),
        _ => Err(ExtensionError::InvalidArgument(format!(
            "episode must be a non-negative number, got {:?}",
            episode
        ))),
    }
}

pub struct AllAnimeSource {
    config: ExtensionConfig,
    api: OriginApi,
    resolver: ConcurrentResolver,
}

impl AllAnimeSource {
    pub const ID: &'static str = "allanime";

    pub fn new(config: ExtensionConfig) -> Result<Self, ExtensionError> {
        let client = config.http_client()?;
        let fetcher = Arc::new(HttpLinkFetcher::new(client.clone(), config.resource_host.clone()));
        let resolver = ConcurrentResolver::new(
            fetcher,
            config.priorities.clone(),
            config.resolver.clone(),
        );
        Ok(Self {
            api: OriginApi::new(client, config.api_url.clone()),
            resolver,
            config,
        })
    }
}

#[async_trait]
impl Source for AllAnimeSource {
    fn info(&self) -> SourceInfo {
        SourceInfo {
            id: Self::ID.to_string(),
            name: "AllAnime".to_string(),
            base_url: self.config.referer.clone(),
            language: "en".to_string(),
            nsfw: false,
            rate_limit: self.config.resolver.requests_per_second(),
            supports_latest: false,
            supports_search: true,
            supports_related_anime: false,
        }
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<SearchResult>, ExtensionError> {
        if query.trim().is_empty() {
            return Err(ExtensionError::InvalidArgument("search query is empty".to_string()));
        }
        self.api.search(query, page.max(1), self.config.mode).await
    }

    async fn episodes(&self, anime_id: &str) -> Result<Vec<EpisodeInfo>, ExtensionError> {
        self.api.episodes(anime_id, self.config.mode).await
    }

    async fn stream_url(
        &self,
        anime_id: &str,
        episode: &str,
    ) -> Result<ResolutionOutcome, ExtensionError> {
        let episode = validate_episode(episode)?;
        let entries = self
            .api
            .episode_sources(anime_id, episode, self.config.mode)
            .await?;
        debug!(anime_id, episode, sources = entries.len(), "episode sources fetched");

        let resolved = self.resolver.resolve(entries).await?;
        info!(
            streams = resolved.streams.len(),
            fast_path = resolved.fast_path,
            "episode resolved"
        );
        Ok(ResolutionOutcome::ranked(resolved.streams))
    }
}

/// The extension: its metadata and the sources it exposes
pub struct Extension {
    sources: Vec<Box<dyn Source>>,
}

impl Extension {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Extension wired to the AllAnime source
    pub fn allanime(config: ExtensionConfig) -> Result<Self, ExtensionError> {
        let mut extension = Self::new();
        extension.add_source(Box::new(AllAnimeSource::new(config)?));
        Ok(extension)
    }

    pub fn add_source(&mut self, source: Box<dyn Source>) {
        self.sources.push(source);
    }

    pub fn info(&self) -> ExtensionInfo {
        ExtensionInfo {
            name: "AllAnime".to_string(),
            pkg: AllAnimeSource::ID.to_string(),
            lang: "en".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            nsfw: false,
            sources: self.list_sources(),
        }
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.sources.iter().map(|s| s.info()).collect()
    }

    /// Source named by `--source`, or the first one when the flag is absent
    pub fn source(&self, id: Option<&str>) -> Result<&dyn Source, ExtensionError> {
        match id {
            Some(id) => self
                .sources
                .iter()
                .find(|s| s.info().id == id)
                .map(|s| &**s)
                .ok_or_else(|| ExtensionError::InvalidSource(id.to_string())),
            None => self
                .sources
                .first()
                .map(|s| &**s)
                .ok_or_else(|| ExtensionError::InvalidSource("<none configured>".to_string())),
        }
    }
}

impl Default for Extension {
    fn default() -> Self {
        Self::new()
    }
}
