//! TMDB-backed metadata surface: keyword search, title details and
//! episode listings for the m-zone catalog pages.
//!
//! This sits next to the resolution pipeline but is independent of it:
//! plain parameterized lookups against the TMDB JSON API, shaped into the
//! site's `details/` and `watch/` links.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::config::SiteConfig;
use crate::reference::{MediaKind, TitleReference};

const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// One search hit, linking into the site's details pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub image: String,
    pub href: String,
}

/// Details for one title, pre-formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleDetails {
    pub description: String,
    pub aliases: String,
    pub airdate: String,
}

/// One playable entry in a title's episode listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpisodeLink {
    pub href: String,
    pub number: u32,
    pub title: String,
}

pub struct TmdbClient {
    client: Client,
    api_key: String,
    site_base: String,
}

impl TmdbClient {
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mzone-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_key: config.tmdb_api_key.clone(),
            site_base: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search movies and shows by keyword.
    pub async fn search(&self, keyword: &str) -> Result<Vec<SearchResult>> {
        let url = format!(
            "{TMDB_API_BASE}/search/multi?api_key={}&query={}",
            self.api_key,
            urlencoding::encode(keyword)
        );
        let response: TmdbSearchResponse = self.get_json(&url).await?;
        debug!(hits = response.results.len(), %keyword, "search results");

        Ok(response
            .results
            .iter()
            .map(|item| map_search_item(item, &self.site_base))
            .collect())
    }

    /// Fetch display details for a movie or show.
    pub async fn details(&self, title: &TitleReference) -> Result<TitleDetails> {
        match title.kind {
            MediaKind::Movie => {
                let url =
                    format!("{TMDB_API_BASE}/movie/{}?api_key={}", title.id, self.api_key);
                let movie: TmdbMovie = self.get_json(&url).await?;
                Ok(movie_details(&movie))
            }
            MediaKind::Tv => {
                let url = format!("{TMDB_API_BASE}/tv/{}?api_key={}", title.id, self.api_key);
                let show: TmdbShow = self.get_json(&url).await?;
                Ok(show_details(&show))
            }
        }
    }

    /// List the playable entries for a title: one "Full Movie" entry for
    /// movies, every episode of every season (specials excluded) for shows.
    pub async fn episodes(&self, title: &TitleReference) -> Result<Vec<EpisodeLink>> {
        match title.kind {
            MediaKind::Movie => Ok(vec![EpisodeLink {
                href: format!("{}/watch/movie/{}", self.site_base, title.id),
                number: 1,
                title: "Full Movie".to_string(),
            }]),
            MediaKind::Tv => {
                let url = format!("{TMDB_API_BASE}/tv/{}?api_key={}", title.id, self.api_key);
                let show: TmdbShow = self.get_json(&url).await?;

                let mut all = Vec::new();
                for season in show.seasons.unwrap_or_default() {
                    // Season 0 holds specials
                    if season.season_number <= 0 {
                        continue;
                    }
                    let url = format!(
                        "{TMDB_API_BASE}/tv/{}/season/{}?api_key={}",
                        title.id, season.season_number, self.api_key
                    );
                    let season_data: TmdbSeason = self.get_json(&url).await?;
                    for episode in season_data.episodes.unwrap_or_default() {
                        all.push(episode_link(
                            &self.site_base,
                            &title.id,
                            season.season_number,
                            &episode,
                        ));
                    }
                }
                Ok(all)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(anyhow!("TMDB API error: {}", resp.status()));
        }

        let data: T = resp.json().await?;
        Ok(data)
    }
}

fn map_search_item(item: &TmdbMultiItem, site_base: &str) -> SearchResult {
    let is_movie = item.media_type.as_deref() == Some("movie") || item.title.is_some();

    // Movies and shows label their name fields differently; anything else
    // (e.g. a person hit) falls through to the tv shape.
    let title = if is_movie {
        [&item.title, &item.name, &item.original_title, &item.original_name]
    } else {
        [&item.name, &item.title, &item.original_name, &item.original_title]
    }
    .into_iter()
    .find_map(|t| t.clone())
    .unwrap_or_else(|| "Untitled".to_string());

    let image = item
        .poster_path
        .as_ref()
        .map(|path| format!("{TMDB_IMAGE_BASE}{path}"))
        .unwrap_or_default();

    let kind = if is_movie { "movie" } else { "tv" };

    SearchResult { title, image, href: format!("{site_base}/details/{kind}/{}", item.id) }
}

fn movie_details(movie: &TmdbMovie) -> TitleDetails {
    TitleDetails {
        description: movie
            .overview
            .clone()
            .unwrap_or_else(|| "No description available".to_string()),
        aliases: match movie.runtime {
            Some(runtime) => format!("Duration: {runtime} minutes"),
            None => "Duration: Unknown".to_string(),
        },
        airdate: format!(
            "Released: {}",
            movie.release_date.as_deref().unwrap_or("Unknown")
        ),
    }
}

fn show_details(show: &TmdbShow) -> TitleDetails {
    let run_times = show.episode_run_time.clone().unwrap_or_default();
    let aliases = if run_times.is_empty() {
        "Duration: Unknown".to_string()
    } else {
        let joined =
            run_times.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
        format!("Duration: {joined} minutes")
    };

    TitleDetails {
        description: show
            .overview
            .clone()
            .unwrap_or_else(|| "No description available".to_string()),
        aliases,
        airdate: format!("Aired: {}", show.first_air_date.as_deref().unwrap_or("Unknown")),
    }
}

fn episode_link(site_base: &str, show_id: &str, season: i64, episode: &TmdbEpisode) -> EpisodeLink {
    EpisodeLink {
        href: format!(
            "{site_base}/watch/tv/{show_id}?season={season}&episode={}",
            episode.episode_number
        ),
        number: episode.episode_number,
        title: episode.name.clone().unwrap_or_default(),
    }
}

// Serde structures for TMDB API responses

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    results: Vec<TmdbMultiItem>,
}

#[derive(Debug, Deserialize)]
struct TmdbMultiItem {
    id: i64,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    original_title: Option<String>,
    original_name: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    overview: Option<String>,
    runtime: Option<u32>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbShow {
    overview: Option<String>,
    episode_run_time: Option<Vec<u32>>,
    first_air_date: Option<String>,
    seasons: Option<Vec<TmdbSeasonSummary>>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonSummary {
    season_number: i64,
}

#[derive(Debug, Deserialize)]
struct TmdbSeason {
    episodes: Option<Vec<TmdbEpisode>>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    episode_number: u32,
    name: Option<String>,
}
