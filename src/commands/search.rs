use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use ytsearch::config::SearchConfig;
use ytsearch::search::{SearchOutcome, Searcher};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text search query
    query: String,
    #[command(flatten)]
    opts: SearchOpts,
}

#[derive(Debug, Args)]
pub struct SongArgs {
    /// Song title
    title: String,
    /// Appended to the title, e.g. "reaction" or "cover"
    #[arg(default_value = "")]
    expansion: String,
    #[command(flatten)]
    opts: SearchOpts,
}

#[derive(Debug, Args)]
struct SearchOpts {
    #[arg(long, value_name = "N", help = "Maximum number of results (default: 10)")]
    max_results: Option<u32>,
    #[arg(long, help = "Store the response even if it is not a search list response")]
    write_always: bool,
}

impl SearchOpts {
    fn apply(&self, cfg: &mut SearchConfig) -> Result<()> {
        if let Some(n) = self.max_results {
            cfg.max_results = n;
        }
        cfg.write_always |= self.write_always;
        cfg.validate()?;
        Ok(())
    }
}

pub async fn search(mut cfg: SearchConfig, args: SearchArgs) -> Result<()> {
    args.opts.apply(&mut cfg)?;
    let searcher = Searcher::new(cfg).context("Failed to set up search")?;
    info!(query = %args.query, "Search started");
    let outcome = searcher
        .search_by_query(&args.query)
        .await
        .with_context(|| format!("Search for '{}' failed", args.query))?;
    report(&outcome);
    Ok(())
}

pub async fn song(mut cfg: SearchConfig, args: SongArgs) -> Result<()> {
    args.opts.apply(&mut cfg)?;
    let searcher = Searcher::new(cfg).context("Failed to set up search")?;
    let outcome = searcher
        .search_by_song(&args.title, &args.expansion)
        .await
        .with_context(|| format!("Song search for '{}' failed", args.title))?;
    report(&outcome);
    Ok(())
}

fn report(outcome: &SearchOutcome) {
    let items = outcome.response["items"]
        .as_array()
        .map(Vec::len)
        .unwrap_or(0);
    match &outcome.stored {
        Some(stored) => println!("{} results written to {}", items, stored.path.display()),
        None => println!(
            "{} results received; response kind {:?} was not stored (use --write-always)",
            items,
            outcome.response["kind"].as_str().unwrap_or("<missing>")
        ),
    }
}
