use anyhow::Result;
use clap::Args;

use ytsearch::codec::decode_filename;

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Stored response file names or paths
    #[arg(required = true)]
    names: Vec<String>,
}

pub fn decode(args: DecodeArgs) -> Result<()> {
    let mut failed = 0usize;
    for name in &args.names {
        match decode_filename(name) {
            Ok(record) => println!(
                "{}\ttimestamp={}\tquery={:?}\tmax_results={}",
                name, record.timestamp, record.query, record.max_results
            ),
            Err(e) => {
                failed += 1;
                eprintln!("{}\t{}", name, e);
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} names could not be decoded", failed, args.names.len());
    }
    Ok(())
}
