// Error types for the extension pipeline

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExtensionError {
    /// `--source` did not name a source this extension exposes
    #[error("invalid source ID: {0}")]
    InvalidSource(String),

    /// A flag was present but unusable (e.g. a non-numeric episode)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The episode listed no source entry worth resolving
    #[error("no eligible sources found for this episode")]
    NoEligibleSources,

    /// Request construction, sending or body reading failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed JSON, non-2xx status or a missing expected field
    #[error("parse error: {0}")]
    Parse(String),

    /// Every provider failed or returned nothing usable
    #[error("no valid streams found from {attempted} providers: {}", join_errors(.errors))]
    Exhausted {
        attempted: usize,
        errors: Vec<String>,
    },
}

fn join_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        "no provider reported an error".to_string()
    } else {
        errors.join("; ")
    }
}

impl From<reqwest::Error> for ExtensionError {
    fn from(err: reqwest::Error) -> Self {
        // A body that fails to decode is a parse problem, not a transport one
        if err.is_decode() {
            return Self::Parse(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Parse(format!("unexpected status {}", status));
        }
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ExtensionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("Invalid JSON: {}", err))
    }
}
