// Origin API client - GraphQL queries against the AllAnime API
//
// Responses are decoded into narrow typed shapes; fields we do not use are
// ignored. Only the episode-source query feeds the stream resolver.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::errors::ExtensionError;
use super::models::{EpisodeInfo, RawSourceEntry, SearchResult, TranslationMode};

const SEARCH_GQL: &str = "query($search: SearchInput, $limit: Int, $page: Int, $translationType: VaildTranslationTypeEnumType, $countryOrigin: VaildCountryOriginEnumType) { shows(search: $search, limit: $limit, page: $page, translationType: $translationType, countryOrigin: $countryOrigin) { edges { _id name englishName availableEpisodes thumbnail } } }";

const EPISODES_GQL: &str =
    "query ($showId: String!) { show( _id: $showId ) { _id availableEpisodesDetail }}";

const EPISODE_SOURCES_GQL: &str = "query($showId:String!,$translationType:VaildTranslationTypeEnumType!,$episodeString:String!){episode(showId:$showId,translationType:$translationType,episodeString:$episodeString){episodeString sourceUrls}}";

/// Results per search page
pub const SEARCH_PAGE_SIZE: u32 = 40;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ShowsData {
    shows: ShowEdges,
}

#[derive(Debug, Deserialize)]
struct ShowEdges {
    #[serde(default)]
    edges: Vec<ShowEdge>,
}

#[derive(Debug, Deserialize)]
struct ShowEdge {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(rename = "englishName")]
    english_name: Option<String>,
    #[serde(rename = "availableEpisodes")]
    available_episodes: Option<Value>,
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShowData {
    show: Option<ShowDetail>,
}

#[derive(Debug, Deserialize)]
struct ShowDetail {
    #[serde(rename = "availableEpisodesDetail", default)]
    available_episodes_detail: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct EpisodeData {
    episode: Option<EpisodeDetail>,
}

#[derive(Debug, Deserialize)]
struct EpisodeDetail {
    #[serde(rename = "sourceUrls", default)]
    source_urls: Vec<SourceUrl>,
}

#[derive(Debug, Deserialize)]
struct SourceUrl {
    #[serde(rename = "sourceUrl", default)]
    source_url: String,
    #[serde(rename = "sourceName", default)]
    source_name: Option<String>,
}

fn unwrap_data<T>(response: GraphQlResponse<T>) -> Result<T, ExtensionError> {
    match response.data {
        Some(data) => Ok(data),
        None if !response.errors.is_empty() => {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            Err(ExtensionError::Parse(format!("API error: {}", messages.join("; "))))
        }
        None => Err(ExtensionError::Parse("API response has no data".to_string())),
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T, ExtensionError> {
    let response: GraphQlResponse<T> = serde_json::from_str(body)?;
    unwrap_data(response)
}

/// Parse a `shows` search response
pub fn parse_search(body: &str, mode: TranslationMode) -> Result<Vec<SearchResult>, ExtensionError> {
    let data: ShowsData = decode_body(body)?;

    Ok(data
        .shows
        .edges
        .into_iter()
        .map(|show| {
            let mut alternate_titles = BTreeMap::new();
            if let Some(english) = show.english_name.filter(|n| !n.is_empty()) {
                alternate_titles.insert("en".to_string(), english);
            }
            let episodes = show
                .available_episodes
                .as_ref()
                .and_then(|counts| counts[mode.as_str()].as_u64())
                .map(|n| n.min(u32::MAX as u64) as u32);

            SearchResult {
                anime_id: show.id,
                title: show.name,
                alternate_titles,
                kind: "TV".to_string(),
                status: "Unknown".to_string(),
                episodes,
                thumbnail: show.thumbnail.filter(|t| !t.is_empty()),
            }
        })
        .collect())
}

/// Parse a `show` response into the numerically sorted episode list for `mode`
pub fn parse_episodes(body: &str, mode: TranslationMode) -> Result<Vec<EpisodeInfo>, ExtensionError> {
    let data: ShowData = decode_body(body)?;
    let show = data
        .show
        .ok_or_else(|| ExtensionError::Parse("show not found".to_string()))?;

    let mut episodes: Vec<EpisodeInfo> = show
        .available_episodes_detail
        .get(mode.as_str())
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|raw| {
                    let label = match raw {
                        Value::String(s) => s.trim().to_string(),
                        Value::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    let number: f64 = label.parse().ok()?;
                    number.is_finite().then(|| EpisodeInfo {
                        episode_number: number,
                        episode_string: label,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    episodes.sort_by(|a, b| a.episode_number.total_cmp(&b.episode_number));
    Ok(episodes)
}

/// Parse an `episode` response into the raw source entries it lists
pub fn parse_episode_sources(body: &str) -> Result<Vec<RawSourceEntry>, ExtensionError> {
    let data: EpisodeData = decode_body(body)?;
    let episode = data.episode.ok_or(ExtensionError::NoEligibleSources)?;

    Ok(episode
        .source_urls
        .into_iter()
        .map(|source| RawSourceEntry::new(source.source_url, source.source_name.unwrap_or_default()))
        .collect())
}

/// Thin client over the origin's GraphQL endpoint
pub struct OriginApi {
    client: reqwest::Client,
    api_url: String,
}

impl OriginApi {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// GET `api_url?variables=...&query=...` and return the raw body
    async fn query(&self, variables: Value, gql: &str) -> Result<String, ExtensionError> {
        let variables = serde_json::to_string(&variables)?;
        debug!(api = %self.api_url, %variables, "origin query");

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("variables", variables.as_str()), ("query", gql)])
            .send()
            .await
            .map_err(|e| ExtensionError::Transport(format!("error making request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtensionError::Parse(format!("API answered {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| ExtensionError::Transport(format!("error reading response: {}", e)))
    }

    pub async fn search(
        &self,
        query: &str,
        page: u32,
        mode: TranslationMode,
    ) -> Result<Vec<SearchResult>, ExtensionError> {
        let variables = json!({
            "search": {
                "allowAdult": false,
                "allowUnknown": false,
                "query": query,
            },
            "limit": SEARCH_PAGE_SIZE,
            "page": page,
            "translationType": mode.as_str(),
            "countryOrigin": "ALL",
        });
        let body = self.query(variables, SEARCH_GQL).await?;
        parse_search(&body, mode)
    }

    pub async fn episodes(
        &self,
        anime_id: &str,
        mode: TranslationMode,
    ) -> Result<Vec<EpisodeInfo>, ExtensionError> {
        let body = self.query(json!({ "showId": anime_id }), EPISODES_GQL).await?;
        parse_episodes(&body, mode)
    }

    pub async fn episode_sources(
        &self,
        anime_id: &str,
        episode: &str,
        mode: TranslationMode,
    ) -> Result<Vec<RawSourceEntry>, ExtensionError> {
        let variables = json!({
            "showId": anime_id,
            "translationType": mode.as_str(),
            "episodeString": episode,
        });
        let body = self.query(variables, EPISODE_SOURCES_GQL).await?;
        parse_episode_sources(&body)
    }
}
