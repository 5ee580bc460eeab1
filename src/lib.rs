//! `mzone-dl` - resolves m-zone.org watch references into playable
//! stream URLs and an optional subtitle track.
//!
//! The hard part is the resolution pipeline: watch pages reference their
//! real stream hosts through embed pages whose structure changes without
//! notice, so discovery and harvesting are pattern-based, tried in
//! priority order, and tolerate partial failure at every stage.
//!
//! # Example
//!
//! ```rust,no_run
//! use mzone_dl::{HttpFetcher, Resolver, SiteConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolver = Resolver::new(HttpFetcher::new()?, SiteConfig::load()?);
//!     let result = resolver.resolve("tv/1396?season=1&episode=1").await;
//!     println!("{} stream(s)", result.streams.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod fetch;
pub mod metadata;
pub mod reference;
pub mod resolve;

pub use config::{DirectEmbedConfig, SiteConfig};
pub use fetch::{Fetch, HttpFetcher};
pub use metadata::{EpisodeLink, SearchResult, TitleDetails, TmdbClient};
pub use reference::{
    parse_title_reference, parse_watch_reference, MediaKind, MediaReference, ReferenceError,
    TitleReference,
};
pub use resolve::resolver::resolve_streams;
pub use resolve::{
    harvest, select_subtitle, DiscoveryStrategy, EmbedCandidate, EmbedLocator, EmbedStrategy,
    HarvestReport, ResolutionResult, ResolveError, Resolver, StreamCandidate, SubtitleCandidate,
};

/// Version of mzone-dl
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
