// Extension module - stream resolution pipeline behind the CLI protocol

pub mod api;
pub mod codec;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod models;
pub mod priority;
pub mod rate_gate;
pub mod resolver;
pub mod source;

pub use config::{ExtensionConfig, FastPathPolicy, ResolverSettings};
pub use errors::ExtensionError;
pub use fetcher::{HttpLinkFetcher, LinkFetcher, ProviderLink};
pub use models::{
    DecodedLocator, EpisodeInfo, ExtensionInfo, RawSourceEntry, ResolutionOutcome, SearchResult,
    SourceInfo, StreamCandidate, TranslationMode,
};
pub use priority::DomainPriorities;
pub use resolver::{ConcurrentResolver, Resolved};
pub use source::{AllAnimeSource, Extension, Source};
