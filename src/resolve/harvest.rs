//! Stream and subtitle harvesting from a single embed page.
//!
//! Embed pages are uncontrolled third-party markup, so harvesting is
//! deliberately pattern-based: absolute playable URLs and `url:`-keyed
//! script values become stream candidates, brace-delimited fragments with
//! a `"url"` field become subtitle candidates. Anything unrecognized is
//! simply not emitted.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Absolute URL ending in a known streaming-manifest or container extension.
static PLAYABLE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)https?://[^"'\s]+?\.(?:m3u8|mp4)[^"'\s]*"#).expect("valid regex")
});

/// Quoted `url:` key inside an inline script or JSON literal. The key is
/// anchored so that suffixed keys (`thumbnailUrl`, `poster_url`) don't
/// turn page art into stream candidates.
static URL_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|[^0-9A-Za-z_])["']?url["']?\s*:\s*["'](https?://[^"']+)["']"#)
        .expect("valid regex")
});

/// Brace-delimited fragment carrying a quoted `"url"` field.
static SUBTITLE_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{[^{}]*"url"\s*:\s*"[^"]*"[^{}]*\}"#).expect("valid regex"));

static FIELD_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""url"\s*:\s*"([^"]*)""#).expect("valid regex"));
static FIELD_LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""language"\s*:\s*"([^"]*)""#).expect("valid regex"));
static FIELD_ENCODING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""encoding"\s*:\s*"([^"]*)""#).expect("valid regex"));
static FIELD_DISPLAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""display"\s*:\s*"([^"]*)""#).expect("valid regex"));

/// One playable link found inside one embed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamCandidate {
    /// The embed page the link was harvested from.
    #[serde(rename = "provider")]
    pub provider_url: String,
    /// The direct media URL.
    #[serde(rename = "file")]
    pub file_url: String,
}

/// One subtitle track description found inside one embed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCandidate {
    pub url: String,
    /// Empty when the page doesn't label the track.
    pub language: String,
    pub encoding: Option<String>,
    pub display_name: Option<String>,
}

/// Everything harvested from one embed page.
#[derive(Debug, Clone, Default)]
pub struct HarvestReport {
    pub streams: Vec<StreamCandidate>,
    pub subtitles: Vec<SubtitleCandidate>,
}

/// Harvest all stream and subtitle candidates from one embed page body.
///
/// Candidates are emitted in order of appearance. Repeated URLs in
/// distinct occurrences are kept (providers legitimately repeat quality
/// variants); the same text occurrence is never emitted twice even when
/// both stream patterns match it.
pub fn harvest(embed_url: &str, body: &str) -> HarvestReport {
    HarvestReport {
        streams: harvest_streams(embed_url, body),
        subtitles: harvest_subtitles(body),
    }
}

fn harvest_streams(embed_url: &str, body: &str) -> Vec<StreamCandidate> {
    let mut found: Vec<(usize, String)> = Vec::new();
    let mut seen_offsets: HashSet<usize> = HashSet::new();

    for m in PLAYABLE_URL.find_iter(body) {
        seen_offsets.insert(m.start());
        found.push((m.start(), m.as_str().to_string()));
    }

    for caps in URL_KEY.captures_iter(body) {
        let Some(group) = caps.get(1) else {
            continue;
        };
        if seen_offsets.contains(&group.start()) {
            continue;
        }
        if is_subtitle_file(group.as_str()) {
            continue;
        }
        found.push((group.start(), group.as_str().to_string()));
    }

    found.sort_by_key(|(offset, _)| *offset);
    found
        .into_iter()
        .map(|(_, file_url)| StreamCandidate {
            provider_url: embed_url.to_string(),
            file_url,
        })
        .collect()
}

fn harvest_subtitles(body: &str) -> Vec<SubtitleCandidate> {
    SUBTITLE_FRAGMENT
        .find_iter(body)
        .filter_map(|fragment| {
            let fragment = fragment.as_str();
            let url = capture_field(&FIELD_URL, fragment)?;
            if !is_subtitle_file(&url) {
                return None;
            }
            Some(SubtitleCandidate {
                url,
                language: capture_field(&FIELD_LANGUAGE, fragment).unwrap_or_default(),
                encoding: capture_field(&FIELD_ENCODING, fragment),
                display_name: capture_field(&FIELD_DISPLAY, fragment),
            })
        })
        .collect()
}

fn capture_field(pattern: &Regex, fragment: &str) -> Option<String> {
    pattern.captures(fragment).map(|caps| caps[1].to_string())
}

fn is_subtitle_file(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
    path.ends_with(".vtt") || path.ends_with(".srt")
}
