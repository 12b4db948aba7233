use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use ytsearch::config::SearchConfig;
use ytsearch::export::write_parquet;
use ytsearch::flatten::{rename_columns, ErrorPolicy, Flattener};

#[derive(Debug, Args)]
pub struct ParseArgs {
    #[arg(long, value_name = "DIR", help = "Directory to read (default: the output directory)")]
    input_dir: Option<PathBuf>,
    #[arg(long, value_name = "FILE", default_value = "responses.parquet")]
    output: PathBuf,
    #[arg(long, help = "Stop at the first file that cannot be parsed")]
    fail_fast: bool,
    #[arg(long, help = "Decode file names only, ignoring manifest.jsonl")]
    no_manifest: bool,
}

pub async fn parse(cfg: SearchConfig, args: ParseArgs) -> Result<()> {
    let input = args.input_dir.unwrap_or(cfg.output_dir);
    let output = args.output;
    let policy = if args.fail_fast {
        ErrorPolicy::Abort
    } else {
        ErrorPolicy::Collect
    };
    let flattener = Flattener::new()
        .with_policy(policy)
        .with_manifest(!args.no_manifest);

    // Directory walk and Parquet encoding are blocking I/O.
    let input_owned = input.clone();
    let output_owned = output.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut report = flattener
            .flatten_all(&input_owned)
            .with_context(|| format!("Failed to parse responses in {}", input_owned.display()))?;
        report.dataset = rename_columns(std::mem::take(&mut report.dataset));
        if report.dataset.columns().next().is_some() {
            write_parquet(&report.dataset, &output_owned)
                .with_context(|| format!("Failed to write {}", output_owned.display()))?;
        }
        Ok(report)
    })
    .await
    .context("spawn_blocking join failed")??;

    for failure in &report.failures {
        eprintln!("skipped {}: {}", failure.path.display(), failure.error);
    }
    if report.dataset.columns().next().is_none() {
        println!("No responses found in {}, nothing written", input.display());
    } else {
        println!(
            "{} rows from {} files written to {} ({} skipped)",
            report.dataset.len(),
            report.files - report.failures.len(),
            output.display(),
            report.failures.len()
        );
    }
    Ok(())
}
