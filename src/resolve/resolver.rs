//! End-to-end resolution of one watch reference.
//!
//! The aggregator parses the reference, locates embed candidates, harvests
//! each one, merges streams in embed order and selects a subtitle. Failure
//! signaling is pushed into the emptiness of the result's fields: the
//! public surface always hands back a structurally valid
//! [`ResolutionResult`], never a null/absent one.

use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::SiteConfig;
use crate::fetch::{Fetch, HttpFetcher};
use crate::reference::{parse_watch_reference, ReferenceError};
use crate::resolve::harvest::{harvest, HarvestReport, StreamCandidate, SubtitleCandidate};
use crate::resolve::locator::{EmbedCandidate, EmbedLocator};
use crate::resolve::subtitle::select_subtitle;

/// Failures that abort a resolution early.
///
/// Per-embed failures never appear here; they are logged and skipped.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("malformed watch reference")]
    MalformedReference(#[from] ReferenceError),

    #[error("watch page unavailable: {url}")]
    WatchPageUnavailable {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Terminal artifact of one resolution.
///
/// Wire shape: `{"streams": [{"provider": ..., "file": ...}], "subtitles": ""}`.
/// An empty `subtitles` string means no subtitle was selected; an empty
/// `streams` list with a successful return means the found sources yielded
/// no playable link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub streams: Vec<StreamCandidate>,
    pub subtitles: String,
}

impl ResolutionResult {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Drives the resolution pipeline for one site deployment.
pub struct Resolver<F> {
    fetcher: F,
    config: SiteConfig,
    locator: EmbedLocator,
}

impl<F: Fetch> Resolver<F> {
    pub fn new(fetcher: F, config: SiteConfig) -> Self {
        let locator = EmbedLocator::new(&config);
        Self { fetcher, config, locator }
    }

    /// Resolve a watch reference, degrading every failure to an empty
    /// result. This is the always-returns contract callers rely on.
    pub async fn resolve(&self, reference: &str) -> ResolutionResult {
        match self.try_resolve(reference).await {
            Ok(result) => result,
            Err(err) => {
                warn!(%reference, %err, "resolution degraded to empty result");
                ResolutionResult::empty()
            }
        }
    }

    /// Resolve a watch reference and serialize the result as JSON.
    pub async fn resolve_json(&self, reference: &str) -> Result<String> {
        let result = self.resolve(reference).await;
        Ok(serde_json::to_string(&result)?)
    }

    /// Resolve with typed early-abort errors for callers that distinguish
    /// bad input and unreachable watch pages from empty outcomes.
    pub async fn try_resolve(&self, reference: &str) -> Result<ResolutionResult, ResolveError> {
        let parsed = parse_watch_reference(reference)?;

        let page_html = if self.locator.requires_watch_page() {
            let url = parsed.watch_url(&self.config.base_url);
            self.fetcher
                .get_text(&url)
                .await
                .map_err(|source| ResolveError::WatchPageUnavailable { url, source })?
        } else {
            String::new()
        };

        let candidates = self.locator.locate(&page_html, &parsed);
        if candidates.is_empty() {
            // Expected for unsupported or restructured pages, not a crash
            warn!(%reference, "no embed sources found");
            return Ok(ResolutionResult::empty());
        }

        // Embed fetches are independent; join_all keeps candidate order,
        // which fixes both stream ordering and the subtitle tie-break.
        let reports = join_all(candidates.iter().map(|c| self.harvest_candidate(c))).await;

        let mut streams: Vec<StreamCandidate> = Vec::new();
        let mut subtitles: Vec<SubtitleCandidate> = Vec::new();
        for report in reports {
            streams.extend(report.streams);
            subtitles.extend(report.subtitles);
        }

        if streams.is_empty() {
            warn!(%reference, embeds = candidates.len(), "embeds found but none yielded a playable link");
        }

        let subtitle = select_subtitle(&subtitles).map(|s| s.url.clone()).unwrap_or_default();

        Ok(ResolutionResult { streams, subtitles: subtitle })
    }

    async fn harvest_candidate(&self, candidate: &EmbedCandidate) -> HarvestReport {
        match self.fetcher.get_text(&candidate.source_url).await {
            Ok(body) => harvest(&candidate.source_url, &body),
            Err(err) => {
                warn!(url = %candidate.source_url, %err, "skipping unreachable embed");
                HarvestReport::default()
            }
        }
    }
}

/// Resolve a watch reference with the on-disk config and a fresh HTTP
/// client, returning the serialized result. Never fails: any setup or
/// resolution problem degrades to `{"streams":[],"subtitles":""}`.
pub async fn resolve_streams(reference: &str) -> String {
    let result = match (SiteConfig::load(), HttpFetcher::new()) {
        (Ok(config), Ok(fetcher)) => Resolver::new(fetcher, config).resolve(reference).await,
        (config, fetcher) => {
            if let Err(err) = config {
                warn!(%err, "falling back to empty result: bad config");
            }
            if let Err(err) = fetcher {
                warn!(%err, "falling back to empty result: HTTP client setup failed");
            }
            ResolutionResult::empty()
        }
    };

    serde_json::to_string(&result)
        .unwrap_or_else(|_| r#"{"streams":[],"subtitles":""}"#.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use anyhow::anyhow;
    use async_trait::async_trait;

    use super::*;
    use crate::config::DirectEmbedConfig;

    /// Serves pages from fixtures; any URL without a fixture fails like a
    /// network error.
    struct FixtureFetcher {
        pages: HashMap<String, String>,
    }

    impl FixtureFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| ((*url).to_string(), (*body).to_string()))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl Fetch for FixtureFetcher {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("connection refused: {url}"))
        }

        async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
            Err(anyhow!("unexpected JSON fetch: {url}"))
        }
    }

    fn resolver(pages: &[(&str, &str)]) -> Resolver<FixtureFetcher> {
        Resolver::new(FixtureFetcher::new(pages), SiteConfig::default())
    }

    #[tokio::test]
    async fn malformed_reference_degrades_to_empty_result() {
        let result = resolver(&[]).resolve("https://m-zone.org/about").await;
        assert_eq!(result, ResolutionResult::empty());
    }

    #[tokio::test]
    async fn episode_reference_without_season_degrades_to_empty_result() {
        let result = resolver(&[]).resolve("tv/1396?episode=1").await;
        assert_eq!(result, ResolutionResult::empty());
    }

    #[tokio::test]
    async fn unreachable_watch_page_degrades_to_empty_result() {
        let result = resolver(&[]).resolve("movie/550").await;
        assert_eq!(result, ResolutionResult::empty());
    }

    #[tokio::test]
    async fn watch_page_failure_is_typed_for_try_resolve() {
        let err = resolver(&[]).try_resolve("movie/550").await.unwrap_err();
        assert!(matches!(err, ResolveError::WatchPageUnavailable { .. }));
    }

    #[tokio::test]
    async fn no_embeds_is_an_empty_success() {
        let fixtures =
            [("https://m-zone.org/watch/movie/550", "<html><body>nothing here</body></html>")];
        let result = resolver(&fixtures).try_resolve("movie/550").await.unwrap();
        assert_eq!(result, ResolutionResult::empty());
    }

    #[tokio::test]
    async fn failed_embed_is_skipped_and_the_rest_still_harvested() {
        let watch = r#"
            <iframe src="https://vidsrc.su/embed/down"></iframe>
            <iframe src="https://openload.co/embed/up"></iframe>
        "#;
        let fixtures = [
            ("https://m-zone.org/watch/movie/550", watch),
            ("https://openload.co/embed/up", r#"file: "https://cdn.example/only.m3u8""#),
        ];
        let result = resolver(&fixtures).resolve("movie/550").await;
        assert_eq!(result.streams.len(), 1);
        assert_eq!(result.streams[0].provider_url, "https://openload.co/embed/up");
        assert_eq!(result.streams[0].file_url, "https://cdn.example/only.m3u8");
    }

    #[tokio::test]
    async fn embeds_without_playable_links_are_a_success_with_empty_streams() {
        let watch = r#"<iframe src="https://vidsrc.su/embed/1"></iframe>"#;
        let fixtures = [
            ("https://m-zone.org/watch/movie/550", watch),
            ("https://vidsrc.su/embed/1", "<html>ad wall, no player</html>"),
        ];
        let result = resolver(&fixtures).try_resolve("movie/550").await.unwrap();
        assert!(result.streams.is_empty());
        assert_eq!(result.subtitles, "");
    }

    #[tokio::test]
    async fn streams_merge_in_embed_visit_order() {
        let watch = r#"
            <iframe src="https://vidsrc.su/embed/1"></iframe>
            <iframe src="https://openload.co/embed/2"></iframe>
        "#;
        let fixtures = [
            ("https://m-zone.org/watch/movie/550", watch),
            ("https://vidsrc.su/embed/1", r#""https://cdn.example/first.m3u8""#),
            ("https://openload.co/embed/2", r#""https://cdn.example/second.m3u8""#),
        ];
        let result = resolver(&fixtures).resolve("movie/550").await;
        let files: Vec<&str> = result.streams.iter().map(|s| s.file_url.as_str()).collect();
        assert_eq!(files, vec!["https://cdn.example/first.m3u8", "https://cdn.example/second.m3u8"]);
    }

    #[tokio::test]
    async fn direct_template_end_to_end_without_watch_page() {
        let mut config = SiteConfig::default();
        config.direct_embed = Some(DirectEmbedConfig {
            movie_template: None,
            tv_template: Some("https://vidsrc.su/embed/tv/{id}/{season}/{episode}".to_string()),
        });

        let embed_body = r#"
            player.setup({ url: "https://cdn.example/a.m3u8" });
            captions: [{"url": "https://cdn.example/en.vtt", "language": "English",
                        "encoding": "UTF-8"}]
        "#;
        // Only the embed page is served: fetching the watch page would fail
        let fetcher =
            FixtureFetcher::new(&[("https://vidsrc.su/embed/tv/1396/1/1", embed_body)]);
        let resolver = Resolver::new(fetcher, config);

        let result = resolver.resolve("tv/1396?season=1&episode=1").await;
        assert_eq!(
            result.streams,
            vec![StreamCandidate {
                provider_url: "https://vidsrc.su/embed/tv/1396/1/1".to_string(),
                file_url: "https://cdn.example/a.m3u8".to_string(),
            }]
        );
        assert_eq!(result.subtitles, "https://cdn.example/en.vtt");
    }

    #[tokio::test]
    async fn resolution_is_idempotent_over_identical_fixtures() {
        let watch = r#"<iframe src="https://vidsrc.su/embed/1"></iframe>"#;
        let embed = r#"
            "https://cdn.example/a.m3u8"
            {"url": "https://cdn.example/en.vtt", "language": "English"}
        "#;
        let fixtures = [
            ("https://m-zone.org/watch/tv/1396?season=1&episode=1", watch),
            ("https://vidsrc.su/embed/1", embed),
        ];
        let resolver = resolver(&fixtures);

        let first = resolver.resolve_json("tv/1396?season=1&episode=1").await.unwrap();
        let second = resolver.resolve_json("tv/1396?season=1&episode=1").await.unwrap();
        assert_eq!(first, second);
        assert!(first.contains(r#""provider":"https://vidsrc.su/embed/1""#));
        assert!(first.contains(r#""file":"https://cdn.example/a.m3u8""#));
        assert!(first.contains(r#""subtitles":"https://cdn.example/en.vtt""#));
    }

    #[test]
    fn degraded_result_serializes_to_the_empty_shape() {
        let json = serde_json::to_string(&ResolutionResult::empty()).unwrap();
        assert_eq!(json, r#"{"streams":[],"subtitles":""}"#);
    }
}
