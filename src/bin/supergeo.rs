//! Supergeo Design Binary
//!
//! Reads geo units (and optionally a run configuration) from JSON files,
//! designs a balanced treatment/control split and prints it as JSON.

use anyhow::Context;
use clap::Parser;
use supergeo::*;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of geo units
    #[arg(long, required = true)]
    units: std::path::PathBuf,
    /// JSON run configuration; defaults apply to missing fields
    #[arg(long)]
    config: Option<std::path::PathBuf>,
    /// directory for the DEBUG log file
    #[arg(long, default_value = "logs")]
    logs: std::path::PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let path = log(&args.logs)?;
    log::debug!("{:<32}{:<32}", "log file", path.display());
    let units = std::fs::read_to_string(&args.units)
        .with_context(|| format!("reading units from {}", args.units.display()))?;
    let units = Units::new(serde_json::from_str::<Vec<GeoUnit>>(&units)?)?;
    let config = match args.config {
        Some(ref path) => Config::from_json(
            &std::fs::read_to_string(path)
                .with_context(|| format!("reading config from {}", path.display()))?,
        )?,
        None => Config::default(),
    };
    let design = Pipeline::new(config).run(&units)?;
    println!("{}", serde_json::to_string_pretty(&design)?);
    Ok(())
}
