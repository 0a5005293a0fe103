// Configuration for the extension and its stream resolver

use std::time::Duration;

use super::models::TranslationMode;
use super::priority::DomainPriorities;

pub const DEFAULT_API_URL: &str = "https://api.allanime.day/api";
pub const DEFAULT_RESOURCE_HOST: &str = "https://allanime.day";
pub const DEFAULT_REFERER: &str = "https://allanime.to";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0";

/// How the resolver treats first-tier providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastPathPolicy {
    /// Keep only the first top-domain entry when one exists
    pub exclusive_partition: bool,
    /// Number of leading priority domains whose links may win the race (0 disables it)
    pub race_tier: usize,
}

impl Default for FastPathPolicy {
    fn default() -> Self {
        Self {
            exclusive_partition: true,
            race_tier: 3,
        }
    }
}

/// Timing and policy knobs for one resolution call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Upper bound on the whole call
    pub overall_timeout: Duration,
    /// How long to wait for a fast-path result before draining everything
    pub fast_path_wait: Duration,
    /// Minimum spacing between successive task starts
    pub rate_interval: Duration,
    pub fast_path: FastPathPolicy,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_secs(10),
            fast_path_wait: Duration::from_secs(2),
            rate_interval: Duration::from_millis(50),
            fast_path: FastPathPolicy::default(),
        }
    }
}

impl ResolverSettings {
    pub fn with_fast_path(mut self, policy: FastPathPolicy) -> Self {
        self.fast_path = policy;
        self
    }

    /// Task starts per second implied by the rate interval
    pub fn requests_per_second(&self) -> u32 {
        let millis = self.rate_interval.as_millis();
        if millis == 0 {
            return 0;
        }
        (1000 / millis).min(u32::MAX as u128) as u32
    }
}

/// Configuration for the AllAnime source
#[derive(Debug, Clone)]
pub struct ExtensionConfig {
    /// GraphQL endpoint used for search, episode lists and episode sources
    pub api_url: String,
    /// Prefix joined onto decoded, host-relative provider paths
    pub resource_host: String,
    /// Referer the origin insists on
    pub referer: String,
    pub user_agent: String,
    pub mode: TranslationMode,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Per-request timeout
    pub request_timeout: Duration,
    pub priorities: DomainPriorities,
    pub resolver: ResolverSettings,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            resource_host: DEFAULT_RESOURCE_HOST.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            mode: TranslationMode::Sub,
            proxy: None,
            request_timeout: Duration::from_secs(30),
            priorities: DomainPriorities::default(),
            resolver: ResolverSettings::default(),
        }
    }
}

impl ExtensionConfig {
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_resource_host(mut self, host: impl Into<String>) -> Self {
        self.resource_host = host.into();
        self
    }

    pub fn with_mode(mut self, mode: TranslationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build the shared HTTP client with origin headers and optional proxy
    pub fn http_client(&self) -> Result<reqwest::Client, super::ExtensionError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let referer = reqwest::header::HeaderValue::from_str(&self.referer)
            .map_err(|e| super::ExtensionError::InvalidArgument(format!("referer: {}", e)))?;
        headers.insert(reqwest::header::REFERER, referer);

        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .timeout(self.request_timeout);

        if let Some(proxy_url) = self.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                super::ExtensionError::InvalidArgument(format!("proxy {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| super::ExtensionError::Transport(format!("Failed to build client: {}", e)))
    }
}
