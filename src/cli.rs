//! Extension CLI protocol.
//!
//! One process invocation per command. Success prints JSON on stdout;
//! failure prints `Error: ...` on stderr and exits with code 1.
//!
//! ## Commands
//!
//! - `extension-info`: extension metadata and its sources
//! - `list-sources`: every exposed source
//! - `source-info`: one source
//! - `search`: shows matching a query
//! - `episodes`: episode numbers of a show
//! - `stream-url`: playable streams of one episode

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;

use crate::extension::{Extension, ExtensionConfig, ExtensionError, TranslationMode};

#[derive(Parser, Debug)]
#[command(name = "allanime-extension")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AllAnime extension: search, episodes and stream URLs as JSON", long_about = None)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Translation track to query
    #[arg(long, global = true, value_enum, env = "ALLANIME_MODE", default_value_t = TranslationMode::Sub)]
    pub mode: TranslationMode,

    /// SOCKS5/HTTP proxy URL for every request
    #[arg(long, global = true, env = "ALLANIME_PROXY")]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = "ALLANIME_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Override the origin GraphQL endpoint
    #[arg(long, global = true, env = "ALLANIME_API_URL", hide = true)]
    pub api_url: Option<String>,

    /// Override the host provider paths are joined onto
    #[arg(long, global = true, env = "ALLANIME_RESOURCE_HOST", hide = true)]
    pub resource_host: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print extension metadata
    ExtensionInfo,

    /// List the sources this extension exposes
    ListSources,

    /// Print one source's metadata
    SourceInfo {
        #[arg(long)]
        source: Option<String>,
    },

    /// Search shows by title
    Search {
        #[arg(long)]
        query: String,

        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long)]
        source: Option<String>,
    },

    /// List a show's episodes
    Episodes {
        #[arg(long)]
        anime: String,

        #[arg(long)]
        source: Option<String>,
    },

    /// Resolve playable streams for one episode
    StreamUrl {
        #[arg(long)]
        anime: String,

        #[arg(long)]
        episode: String,

        #[arg(long)]
        source: Option<String>,
    },
}

impl Command {
    /// `--source` value, for commands that take one
    pub fn source_id(&self) -> Option<&str> {
        match self {
            Self::ExtensionInfo | Self::ListSources => None,
            Self::SourceInfo { source }
            | Self::Search { source, .. }
            | Self::Episodes { source, .. }
            | Self::StreamUrl { source, .. } => source.as_deref(),
        }
    }
}

impl Cli {
    /// Extension configuration derived from global flags and environment
    pub fn config(&self) -> ExtensionConfig {
        let mut config = ExtensionConfig::default()
            .with_mode(self.mode)
            .with_proxy(self.proxy.clone());
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url.clone());
        }
        if let Some(host) = &self.resource_host {
            config = config.with_resource_host(host.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_request_timeout(Duration::from_secs(secs.max(1)));
        }
        config
    }
}

/// Run one command against the extension and return its JSON answer
pub async fn execute(extension: &Extension, command: &Command) -> Result<Value, ExtensionError> {
    // Reject an unknown --source before any other work
    let source = extension.source(command.source_id())?;

    let value = match command {
        Command::ExtensionInfo => serde_json::to_value(extension.info())?,
        Command::ListSources => serde_json::to_value(extension.list_sources())?,
        Command::SourceInfo { .. } => serde_json::to_value(source.info())?,
        Command::Search { query, page, .. } => {
            serde_json::to_value(source.search(query, *page).await?)?
        }
        Command::Episodes { anime, .. } => serde_json::to_value(source.episodes(anime).await?)?,
        Command::StreamUrl { anime, episode, .. } => {
            serde_json::to_value(source.stream_url(anime, episode).await?)?
        }
    };
    Ok(value)
}

/// Build the runtime and extension, execute, and render pretty JSON
pub fn run(cli: Cli) -> Result<String> {
    let extension = Extension::allanime(cli.config())?;
    debug!(command = ?cli.command, "dispatching");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let value = runtime.block_on(execute(&extension, &cli.command))?;
    serde_json::to_string_pretty(&value).context("failed to render JSON output")
}
