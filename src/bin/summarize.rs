use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use ckks_gps_distance::{RunSummary, format_table, read_records};

/// Aggregates one or more results files side by side, one column per file.
#[derive(Parser)]
#[command(name = "summarize")]
struct Opt {
    #[arg(required = true)]
    results: Vec<PathBuf>,
}

fn summarize(path: &Path) -> Result<(String, RunSummary)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let records =
        read_records(BufReader::new(file)).with_context(|| format!("reading {}", path.display()))?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((label, RunSummary::from_records(&records)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::parse();

    let columns = opt
        .results
        .iter()
        .map(|path| summarize(path))
        .collect::<Result<Vec<_>>>()?;

    println!("\nAggregated results:\n");
    println!("{}", format_table(&columns));
    Ok(())
}
