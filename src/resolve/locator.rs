//! Embed-source discovery.
//!
//! A watch page references its actual stream hosts in ways that change
//! without notice, so discovery is a set of independent strategies tried
//! in priority order. Each [`EmbedStrategy`] contributes zero or more
//! candidates; the locator keeps the first non-empty contribution.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::config::{DirectEmbedConfig, SiteConfig};
use crate::reference::MediaReference;

static IFRAME_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<iframe[^>]+src=['"]([^'"]+)['"]"#).expect("valid regex"));

/// How an embed candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    IframeScan,
    ScriptVariableScan,
    DirectTemplate,
}

/// One embed page believed to carry playable streams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedCandidate {
    pub source_url: String,
    pub strategy: DiscoveryStrategy,
}

/// One way of producing embed candidates from the available input.
///
/// Strategies never fail: a page they can't make sense of yields an empty
/// contribution.
pub trait EmbedStrategy: Send + Sync {
    /// Short lowercase strategy name for logging.
    fn name(&self) -> &'static str;

    /// Discover candidates from the watch-page HTML and/or the reference.
    fn discover(&self, page_html: &str, reference: &MediaReference) -> Vec<EmbedCandidate>;
}

/// Scans for `<iframe>` elements whose `src` host is on the allow-list.
pub struct IframeScan {
    hosts: Vec<String>,
}

impl IframeScan {
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts }
    }

    fn host_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.hosts
            .iter()
            .any(|allowed| host == allowed.as_str() || host.ends_with(&format!(".{allowed}")))
    }
}

impl EmbedStrategy for IframeScan {
    fn name(&self) -> &'static str {
        "iframe-scan"
    }

    fn discover(&self, page_html: &str, _reference: &MediaReference) -> Vec<EmbedCandidate> {
        IFRAME_SRC
            .captures_iter(page_html)
            .map(|caps| caps[1].to_string())
            .filter(|src| self.host_allowed(src))
            .map(|source_url| EmbedCandidate {
                source_url,
                strategy: DiscoveryStrategy::IframeScan,
            })
            .collect()
    }
}

/// Parses a script-level source array (e.g. `window.sources = [...]`) and
/// emits a candidate per element carrying a string `url` field.
pub struct ScriptVariableScan {
    variable: String,
    pattern: Regex,
}

impl ScriptVariableScan {
    pub fn new(variable: &str) -> Self {
        let pattern = Regex::new(&format!(r"{}\s*=\s*(\[[^\]]*\])", regex::escape(variable)))
            .expect("valid regex");
        Self { variable: variable.to_string(), pattern }
    }
}

impl EmbedStrategy for ScriptVariableScan {
    fn name(&self) -> &'static str {
        "script-variable-scan"
    }

    fn discover(&self, page_html: &str, _reference: &MediaReference) -> Vec<EmbedCandidate> {
        let Some(caps) = self.pattern.captures(page_html) else {
            return Vec::new();
        };

        match serde_json::from_str::<serde_json::Value>(&caps[1]) {
            Ok(serde_json::Value::Array(sources)) => sources
                .iter()
                .filter_map(|source| source.get("url").and_then(|u| u.as_str()))
                .map(|url| EmbedCandidate {
                    source_url: url.to_string(),
                    strategy: DiscoveryStrategy::ScriptVariableScan,
                })
                .collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                // Non-fatal: the page carries the variable but not as JSON
                warn!(variable = %self.variable, %err, "source array did not parse");
                Vec::new()
            }
        }
    }
}

/// Synthesizes the embed URL from the reference alone against configured
/// provider templates. Used by deployments with a single known provider;
/// no watch-page fetch is needed.
pub struct DirectTemplate {
    config: DirectEmbedConfig,
}

impl DirectTemplate {
    pub fn new(config: DirectEmbedConfig) -> Self {
        Self { config }
    }
}

impl EmbedStrategy for DirectTemplate {
    fn name(&self) -> &'static str {
        "direct-template"
    }

    fn discover(&self, _page_html: &str, reference: &MediaReference) -> Vec<EmbedCandidate> {
        let source_url = match reference {
            MediaReference::Movie { id } => self
                .config
                .movie_template
                .as_ref()
                .map(|template| template.replace("{id}", id)),
            MediaReference::Episode { id, season, episode } => {
                self.config.tv_template.as_ref().map(|template| {
                    template
                        .replace("{id}", id)
                        .replace("{season}", &season.to_string())
                        .replace("{episode}", &episode.to_string())
                })
            }
        };

        source_url
            .map(|source_url| EmbedCandidate {
                source_url,
                strategy: DiscoveryStrategy::DirectTemplate,
            })
            .into_iter()
            .collect()
    }
}

/// Ordered strategy chain for one site deployment.
pub struct EmbedLocator {
    strategies: Vec<Box<dyn EmbedStrategy>>,
    requires_watch_page: bool,
}

impl EmbedLocator {
    pub fn new(config: &SiteConfig) -> Self {
        // A configured direct template replaces the page scans entirely.
        if let Some(direct) = &config.direct_embed {
            return Self {
                strategies: vec![Box::new(DirectTemplate::new(direct.clone()))],
                requires_watch_page: false,
            };
        }

        Self {
            strategies: vec![
                Box::new(IframeScan::new(config.embed_hosts.clone())),
                Box::new(ScriptVariableScan::new(&config.sources_variable)),
            ],
            requires_watch_page: true,
        }
    }

    /// Whether the watch page must be fetched before locating embeds.
    pub fn requires_watch_page(&self) -> bool {
        self.requires_watch_page
    }

    /// Run the strategies in priority order and keep the first non-empty
    /// contribution. A malformed or empty page degrades to an empty
    /// sequence, never an error.
    pub fn locate(&self, page_html: &str, reference: &MediaReference) -> Vec<EmbedCandidate> {
        for strategy in &self.strategies {
            let candidates = strategy.discover(page_html, reference);
            if !candidates.is_empty() {
                debug!(strategy = strategy.name(), count = candidates.len(), "embeds located");
                return candidates;
            }
        }
        Vec::new()
    }
}
