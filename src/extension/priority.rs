// Priority classifier - ranks stream locations by preferred hosting domain

/// Rank given to locations matching no known domain
pub const UNRANKED: i32 = -1;

/// Ordered list of preferred hosting domains, most preferred first.
///
/// Matching is plain substring containment: origin locators embed the domain
/// but are not always well-formed URLs, so no host parsing is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPriorities {
    domains: Vec<String>,
}

impl DomainPriorities {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(Into::<String>::into)
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// The single most preferred domain, if any is configured
    pub fn top(&self) -> Option<&str> {
        self.domains.first().map(String::as_str)
    }

    /// `len - index` of the first matching domain, or [`UNRANKED`]
    pub fn classify(&self, url: &str) -> i32 {
        self.domains
            .iter()
            .position(|domain| url.contains(domain.as_str()))
            .map(|idx| (self.domains.len() - idx) as i32)
            .unwrap_or(UNRANKED)
    }

    /// Whether `text` contains the top-priority domain
    pub fn is_top(&self, text: &str) -> bool {
        self.top().map_or(false, |domain| text.contains(domain))
    }

    /// Whether `text` contains one of the first `tier` domains
    pub fn in_top_tier(&self, text: &str, tier: usize) -> bool {
        self.domains
            .iter()
            .take(tier)
            .any(|domain| text.contains(domain.as_str()))
    }
}

impl Default for DomainPriorities {
    fn default() -> Self {
        Self::new(["kraken", "dolphin", "duck"])
    }
}
