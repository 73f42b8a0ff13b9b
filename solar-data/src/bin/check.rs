use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use solar_core::Jurisdiction;
use solar_data::load_reference_data;

/// Validate incentive and postcode tables before deploying them.
///
/// Without arguments the bundled tables are checked. Each `--lookup`
/// postcode is resolved against the loaded table and printed.
#[derive(Parser, Debug)]
#[command(name = "solar-data-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Incentive table CSV to check instead of the bundled one
    #[arg(short, long)]
    incentives: Option<PathBuf>,

    /// Postcode range CSV to check instead of the bundled one
    #[arg(short, long)]
    postcodes: Option<PathBuf>,

    /// Postcodes to look up after loading
    #[arg(short, long)]
    lookup: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let data = load_reference_data(args.incentives.as_deref(), args.postcodes.as_deref())
        .context("Failed to load reference tables")?;

    println!(
        "Incentives: default profile plus {} jurisdictions",
        data.incentives.len()
    );
    for jurisdiction in Jurisdiction::ALL {
        if !data.incentives.has_explicit(jurisdiction) {
            println!("  {jurisdiction}: using default profile");
        }
    }
    println!("Postcodes: {} entries", data.postcodes.len());

    for postcode in &args.lookup {
        match data.postcodes.get(postcode) {
            Some(record) => {
                let zone = record
                    .certificate_zone
                    .map_or_else(|| "unknown".to_string(), |z| z.to_string());
                println!("  {postcode}: {} zone {zone}", record.jurisdiction);
            }
            None => println!("  {postcode}: not found"),
        }
    }

    Ok(())
}
