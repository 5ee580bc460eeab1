//! Watch-reference parsing.
//!
//! A reference is a URL-shaped string naming a single playable title:
//! a path containing `movie/<id>`, or `tv/<id>` plus `season=` and
//! `episode=` query parameters. Both full m-zone URLs and bare paths
//! are accepted.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static TITLE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|/)(movie|tv)/([^/?#]+)").expect("valid regex"));
static SEASON_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]season=(\d+)").expect("valid regex"));
static EPISODE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]episode=(\d+)").expect("valid regex"));

/// Reference parsing errors.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference matches neither movie nor tv shape: {0}")]
    UnrecognizedShape(String),

    #[error("episode reference is missing season or episode: {0}")]
    MissingSeasonOrEpisode(String),
}

/// Whether a title is a movie or a television show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

/// A title reference without playback coordinates, as used by the
/// metadata surface (details pages, episode listings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleReference {
    pub kind: MediaKind,
    pub id: String,
}

/// A fully-qualified playable reference. Season and episode exist
/// exactly when the reference is an episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaReference {
    Movie { id: String },
    Episode { id: String, season: u32, episode: u32 },
}

impl MediaReference {
    /// Build the watch-page URL for this reference against a site base.
    pub fn watch_url(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        match self {
            Self::Movie { id } => format!("{base}/watch/movie/{id}"),
            Self::Episode { id, season, episode } => {
                format!("{base}/watch/tv/{id}?season={season}&episode={episode}")
            }
        }
    }

    /// The title this reference plays.
    pub fn title(&self) -> TitleReference {
        match self {
            Self::Movie { id } => TitleReference { kind: MediaKind::Movie, id: id.clone() },
            Self::Episode { id, .. } => TitleReference { kind: MediaKind::Tv, id: id.clone() },
        }
    }
}

/// Parse a playable watch reference.
///
/// # Errors
///
/// Returns [`ReferenceError::UnrecognizedShape`] when the string contains
/// neither a `movie/<id>` nor a `tv/<id>` path segment, and
/// [`ReferenceError::MissingSeasonOrEpisode`] when a tv reference lacks
/// either query parameter.
pub fn parse_watch_reference(reference: &str) -> Result<MediaReference, ReferenceError> {
    let title = parse_title_reference(reference)?;

    match title.kind {
        MediaKind::Movie => Ok(MediaReference::Movie { id: title.id }),
        MediaKind::Tv => {
            let season = capture_u32(&SEASON_PARAM, reference);
            let episode = capture_u32(&EPISODE_PARAM, reference);
            match (season, episode) {
                (Some(season), Some(episode)) => {
                    Ok(MediaReference::Episode { id: title.id, season, episode })
                }
                _ => Err(ReferenceError::MissingSeasonOrEpisode(reference.to_string())),
            }
        }
    }
}

/// Parse a title reference (details pages, episode listings) where
/// season/episode coordinates are not required.
pub fn parse_title_reference(reference: &str) -> Result<TitleReference, ReferenceError> {
    let caps = TITLE_PATH
        .captures(reference)
        .ok_or_else(|| ReferenceError::UnrecognizedShape(reference.to_string()))?;

    let kind = match &caps[1] {
        "movie" => MediaKind::Movie,
        _ => MediaKind::Tv,
    };

    Ok(TitleReference { kind, id: caps[2].to_string() })
}

fn capture_u32(pattern: &Regex, haystack: &str) -> Option<u32> {
    pattern
        .captures(haystack)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
