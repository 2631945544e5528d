#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]

use clap::Parser;
use env_logger::Env;
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};
use std::fs::File;
use std::process;

use stemma::data::load_schedule;
use stemma::{DEFAULT_BIRTH_FEMALE, kin_stable_from_schedule};

/// Expected kin counts by age for a stable population.
#[derive(Parser)]
#[command(name = "stemma", version)]
struct Cli {
    /// Life table with `age`, `px`, and `fx` columns. Parsed as CSV when
    /// the extension is .csv, as TSV otherwise.
    life_table: String,

    /// Fraction of births that are female
    #[arg(long, default_value_t = DEFAULT_BIRTH_FEMALE)]
    birth_female: f64,

    /// Where to write the kin table (CSV)
    #[arg(long, short, default_value = "kin.csv")]
    output: String,

    /// Also write the stable age-at-maternity distribution to this path (CSV)
    #[arg(long)]
    pi: Option<String>,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let schedule = load_schedule(&cli.life_table, cli.birth_female)?;
    let mut result = kin_stable_from_schedule(&schedule, cli.pi.is_some())?;

    let file = File::create(&cli.output)?;
    CsvWriter::new(file).finish(&mut result.table)?;
    log::info!(
        "wrote {} kin-count rows for {} age classes to {}",
        result.table.height(),
        schedule.n_ages(),
        cli.output
    );

    if let (Some(path), Some(pi)) = (&cli.pi, &result.birth_age_distribution) {
        let mut table = DataFrame::new(vec![
            Series::new("age".into(), schedule.age.to_vec()).into(),
            Series::new("pi".into(), pi.to_vec()).into(),
        ])?;
        CsvWriter::new(File::create(path)?).finish(&mut table)?;
        log::info!("wrote the age-at-maternity distribution to {path}");
    }

    Ok(())
}
