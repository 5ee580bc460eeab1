//! Stream resolution pipeline: locate embed sources on a watch page,
//! harvest playable links and subtitles from each, pick a subtitle.

pub mod harvest;
pub mod locator;
pub mod resolver;
pub mod subtitle;

pub use harvest::{harvest, HarvestReport, StreamCandidate, SubtitleCandidate};
pub use locator::{DiscoveryStrategy, EmbedCandidate, EmbedLocator, EmbedStrategy};
pub use resolver::{ResolutionResult, ResolveError, Resolver};
pub use subtitle::select_subtitle;
