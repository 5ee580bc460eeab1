//! `mzone-dl` CLI - search the catalog, inspect titles and resolve watch
//! references into playable stream URLs.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use mzone_dl::{parse_title_reference, HttpFetcher, Resolver, SiteConfig, TmdbClient};

#[derive(Parser)]
#[command(name = "mzone-dl")]
#[command(about = "Resolves m-zone.org watch references into playable stream URLs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search movies and shows by keyword
    Search {
        /// Keyword to search for
        query: String,
    },

    /// Show description, duration and air date for a title
    Details {
        /// Details URL or `movie/<id>` / `tv/<id>` reference
        reference: String,
    },

    /// List playable episodes for a title
    Episodes {
        /// Details URL or `movie/<id>` / `tv/<id>` reference
        reference: String,
    },

    /// Resolve a watch reference into stream URLs and a subtitle
    Resolve {
        /// Watch URL, `movie/<id>`, or `tv/<id>?season=<n>&episode=<n>`
        reference: String,

        /// Pretty-print the result JSON
        #[arg(short, long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search { query } => cmd_search(&query).await?,
        Commands::Details { reference } => cmd_details(&reference).await?,
        Commands::Episodes { reference } => cmd_episodes(&reference).await?,
        Commands::Resolve { reference, pretty } => cmd_resolve(&reference, pretty).await?,
    }

    Ok(())
}

async fn cmd_search(query: &str) -> Result<()> {
    let config = SiteConfig::load()?;
    let client = TmdbClient::new(&config)?;

    eprintln!("🔍 Searching: {query}");
    let results = client.search(query).await?;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    for hit in &results {
        println!("{}", hit.title);
        println!("  {}", hit.href);
    }
    Ok(())
}

async fn cmd_details(reference: &str) -> Result<()> {
    let config = SiteConfig::load()?;
    let client = TmdbClient::new(&config)?;
    let title = parse_title_reference(reference)?;

    let details = client.details(&title).await?;
    println!("{}", details.description);
    println!("{}", details.aliases);
    println!("{}", details.airdate);
    Ok(())
}

async fn cmd_episodes(reference: &str) -> Result<()> {
    let config = SiteConfig::load()?;
    let client = TmdbClient::new(&config)?;
    let title = parse_title_reference(reference)?;

    eprintln!("📋 Listing episodes for: {}", title.id);
    let episodes = client.episodes(&title).await?;

    println!("Episodes: {}", episodes.len());
    for episode in &episodes {
        println!("  E{}: {}", episode.number, episode.title);
        println!("    {}", episode.href);
    }
    Ok(())
}

async fn cmd_resolve(reference: &str, pretty: bool) -> Result<()> {
    let config = SiteConfig::load()?;
    let resolver = Resolver::new(HttpFetcher::new()?, config);

    eprintln!("📡 Resolving: {reference}");
    let result = resolver.resolve(reference).await;

    eprintln!("🎬 {} stream(s) found", result.streams.len());
    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");
    Ok(())
}
