//! Site configuration loaded from `~/.config/mzone-dl/config.toml`.
//!
//! Every field has a default reproducing the m-zone.org deployment, so a
//! missing config file is not an error. Example:
//!
//! ```toml
//! base_url = "https://m-zone.org"
//! embed_hosts = ["vidsrc.su", "videocdn.net"]
//!
//! [direct_embed]
//! movie_template = "https://vidsrc.su/embed/movie/{id}"
//! tv_template = "https://vidsrc.su/embed/tv/{id}/{season}/{episode}"
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Embed-URL templates used when the embed URL can be synthesized from the
/// reference alone, without scraping the watch page. Placeholders: `{id}`,
/// `{season}`, `{episode}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectEmbedConfig {
    pub movie_template: Option<String>,
    pub tv_template: Option<String>,
}

/// Resolver and metadata configuration for one site deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base URL of the aggregator site hosting the watch pages.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Hosts whose `<iframe>` embeds are trusted as stream sources.
    #[serde(default = "default_embed_hosts")]
    pub embed_hosts: Vec<String>,

    /// Script variable holding the source-object array fallback.
    #[serde(default = "default_sources_variable")]
    pub sources_variable: String,

    /// When set, embed URLs are built from these templates and the watch
    /// page is never fetched.
    #[serde(default)]
    pub direct_embed: Option<DirectEmbedConfig>,

    /// TMDB API key for the metadata surface.
    #[serde(default = "default_tmdb_api_key")]
    pub tmdb_api_key: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embed_hosts: default_embed_hosts(),
            sources_variable: default_sources_variable(),
            direct_embed: None,
            tmdb_api_key: default_tmdb_api_key(),
        }
    }
}

impl SiteConfig {
    /// Load the config from `~/.config/mzone-dl/config.toml`.
    ///
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?;

        Ok(config)
    }
}

fn default_base_url() -> String {
    "https://m-zone.org".to_string()
}

fn default_embed_hosts() -> Vec<String> {
    ["vidsrc.su", "videocdn.net", "rapidvideo.com", "streamango.com", "openload.co"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sources_variable() -> String {
    "window.sources".to_string()
}

fn default_tmdb_api_key() -> String {
    // Read-only key for public movie/TV metadata, same as the site uses
    "8d6d91941230817f7807d643736e8a49".to_string()
}

/// Return the path to the config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mzone-dl")
        .join("config.toml")
}
