//! Collect cycle and energy numbers of finished simulations into a csv table
use anyhow::{Context, bail};
use clap::Parser;
use cli_table::print_stdout;
use pim_experiments::{aggregate, find_run_logs, relative_to_cwd};
use std::{fs::File, io::BufWriter, path::PathBuf};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the run folder containing one folder per benchmark
    #[arg(short = 't', long = "output", default_value = "2021_12_16")]
    run_path: PathBuf,

    /// Path to result csv
    #[arg(long, default_value = "result.csv")]
    output_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    let logs = find_run_logs(&args.run_path)?;
    println!(
        "Parsing {} simulation log(s) in {}",
        logs.len(),
        args.run_path.display()
    );
    let aggregation = aggregate(&logs);

    let file = File::create(&args.output_path)
        .with_context(|| format!("Failed to create {}", args.output_path.display()))?;
    aggregation.write_csv(BufWriter::new(file))?;

    print_stdout(aggregation.summary_table())?;
    println!(
        "Result of {} benchmark(s) written to {}",
        aggregation.results.len(),
        relative_to_cwd(&args.output_path).display()
    );

    if !aggregation.failures.is_empty() {
        println!("Missing or unreadable logs:");
        print_stdout(aggregation.failure_table())?;
        bail!("{} log(s) could not be parsed", aggregation.failures.len());
    }

    Ok(())
}
