// Common data models for the extension

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::codec;

/// Prefix the origin puts in front of obfuscated locators
pub const ENCODED_MARKER: &str = "--";

/// One element of an episode's source list as returned by the origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSourceEntry {
    /// Plain URL or `--`-prefixed obfuscated locator
    pub encoded_locator: String,
    /// Origin display name, used when a provider omits the quality
    pub label: String,
}

impl RawSourceEntry {
    pub fn new(encoded_locator: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            encoded_locator: encoded_locator.into(),
            label: label.into(),
        }
    }

    /// Only obfuscated provider locators are resolvable. Plain URLs are
    /// embed pages rather than link lists, and every encoded payload opens
    /// with a digit.
    pub fn is_usable(&self) -> bool {
        self.encoded_locator
            .strip_prefix(ENCODED_MARKER)
            .and_then(|payload| payload.chars().next())
            .map_or(false, |first| first.is_ascii_digit())
    }

    /// Decoded view of the locator; plain entries pass through untouched
    pub fn decode(&self) -> DecodedLocator {
        match self.encoded_locator.strip_prefix(ENCODED_MARKER) {
            Some(payload) => DecodedLocator::new(codec::decode(payload)),
            None => DecodedLocator::new(self.encoded_locator.clone()),
        }
    }
}

/// Host-relative path or absolute URL produced by the codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLocator {
    pub path_or_url: String,
}

impl DecodedLocator {
    pub fn new(path_or_url: impl Into<String>) -> Self {
        Self {
            path_or_url: path_or_url.into(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        codec::has_scheme(&self.path_or_url)
    }

    /// Full request URL, joining relative paths onto the resource host
    pub fn resolve_against(&self, resource_host: &str) -> String {
        if self.is_absolute() {
            return self.path_or_url.clone();
        }
        let host = resource_host.trim_end_matches('/');
        if self.path_or_url.starts_with('/') {
            format!("{}{}", host, self.path_or_url)
        } else {
            format!("{}/{}", host, self.path_or_url)
        }
    }
}

/// One playable stream discovered from a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    #[serde(rename = "videourl")]
    pub url: String,
    #[serde(rename = "quality")]
    pub quality_label: String,
    /// Derived locally; higher is better, `-1` for unknown domains
    #[serde(skip)]
    pub priority_rank: i32,
}

impl StreamCandidate {
    pub fn new(url: impl Into<String>, quality_label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality_label: quality_label.into(),
            priority_rank: super::priority::UNRANKED,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Final answer for one episode, serialised as `{"streams": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub streams: Vec<StreamCandidate>,
}

impl ResolutionOutcome {
    /// Orders streams by descending rank; equal ranks keep arrival order
    pub fn ranked(mut streams: Vec<StreamCandidate>) -> Self {
        // sort_by is stable
        streams.sort_by(|a, b| b.priority_rank.cmp(&a.priority_rank));
        Self { streams }
    }
}

/// Per-source metadata reported by `list-sources` and friends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    pub language: String,
    pub nsfw: bool,
    pub rate_limit: u32,
    pub supports_latest: bool,
    pub supports_search: bool,
    pub supports_related_anime: bool,
}

/// Output of `extension-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub name: String,
    pub pkg: String,
    pub lang: String,
    pub version: String,
    pub nsfw: bool,
    pub sources: Vec<SourceInfo>,
}

/// One `search` hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub anime_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alternate_titles: BTreeMap<String, String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episodes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// One `episodes` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub episode_number: f64,
    /// Exact string the origin uses to address this episode
    pub episode_string: String,
}

/// Translation track requested from the origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    #[default]
    Sub,
    Dub,
}

impl TranslationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Dub => "dub",
        }
    }
}

impl std::fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
