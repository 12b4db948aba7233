mod decode;
mod parse;
mod search;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use ytsearch::config::{ApiKeySource, SearchConfig};

/// Search YouTube, keep the raw responses, and flatten them into a dataset.
#[derive(Debug, Parser)]
#[command(name = "ytsearch", disable_help_subcommand = true)]
pub struct Cli {
    #[command(flatten)]
    shared: SharedArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct SharedArgs {
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Directory holding stored responses (default: $YTSEARCH_OUTPUT_DIR or ./response)"
    )]
    output_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "File containing the YouTube Data API key (default: ./apikey.txt)"
    )]
    api_key_file: Option<PathBuf>,
}

impl SharedArgs {
    /// Environment configuration with command-line overrides applied.
    fn config(&self) -> Result<SearchConfig> {
        let mut cfg = SearchConfig::from_env().context("Invalid YTSEARCH_* configuration")?;
        if let Some(dir) = &self.output_dir {
            cfg.output_dir = dir.clone();
        }
        if let Some(path) = &self.api_key_file {
            cfg.api_key_source = ApiKeySource::File(path.clone());
        }
        Ok(cfg)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one search and store the response
    Search(search::SearchArgs),
    /// Search for "<title> <expansion>" and store the response
    Song(search::SongArgs),
    /// Flatten stored responses into a Parquet dataset
    Parse(parse::ParseArgs),
    /// Show the search identity encoded in stored file names
    Decode(decode::DecodeArgs),
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Search(args) => search::search(cli.shared.config()?, args).await,
        Command::Song(args) => search::song(cli.shared.config()?, args).await,
        Command::Parse(args) => parse::parse(cli.shared.config()?, args).await,
        Command::Decode(args) => decode::decode(args),
    }
}
