//! Generate a job script per trace and submit them to the cluster scheduler
use anyhow::bail;
use clap::Parser;
use cli_table::print_stdout;
use indicatif::ProgressIterator;
use log::warn;
use pim_experiments::{
    FailurePolicy, JobDirs, Sbatch, SimulatorConfig, check_run_id, failure_table, find_traces,
    get_run_dir, get_tqdm_style, materialize, relative_to_cwd, resolve, submit_all, today_run_id,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the folder containing trace files
    #[arg(short, long, default_value = "Newton_trace")]
    trace: PathBuf,

    /// Path to simulator config json, default to the built-in config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run id, default to today's date, e.g. 2021_12_16
    #[arg(short, long)]
    run_id: Option<String>,

    /// Folder to create the run folder in
    #[arg(short, long, default_value = ".")]
    output_root: PathBuf,

    /// Only generate job scripts, do not submit
    #[arg(long)]
    dry_run: bool,

    /// Stop at the first failed submission
    #[arg(long)]
    fail_fast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => SimulatorConfig::load(path)?,
        None => {
            let config = SimulatorConfig::default();
            config.validate()?;
            config
        }
    }
    .resolved()?;

    let run_id = args.run_id.clone().unwrap_or_else(today_run_id);
    check_run_id(&run_id)?;

    let traces = find_traces(&args.trace, config.trace_extension())?;
    if traces.is_empty() {
        warn!(
            "No .{} files found in {}",
            config.trace_extension(),
            args.trace.display()
        );
    }
    println!("Found {} trace(s) in {}", traces.len(), args.trace.display());

    let root = resolve(get_run_dir(&args.output_root, &run_id))?;
    let jobs = JobDirs::plan(&root, &run_id, &traces);
    materialize(&config, &jobs, &mut rand::thread_rng())?;
    for job in &jobs.jobs {
        println!("{}", relative_to_cwd(&job.dir).display());
    }

    if args.dry_run {
        println!(
            "Dry run: wrote {} job script(s) under {}",
            jobs.jobs.len(),
            relative_to_cwd(&jobs.root).display()
        );
        return Ok(());
    }

    let policy = if args.fail_fast {
        FailurePolicy::FailFast
    } else {
        FailurePolicy::KeepGoing
    };
    let pbar = indicatif::ProgressBar::new(jobs.jobs.len() as u64);
    pbar.set_style(get_tqdm_style()?);
    let mut scheduler = Sbatch::new(&config.scheduler);
    let report = submit_all(
        &mut scheduler,
        jobs.jobs.iter().progress_with(pbar),
        policy,
    );

    println!("You launched {} simulation(s)", report.launched.len());
    if !report.is_success() {
        print_stdout(failure_table(&report.failed))?;
        bail!("{} submission(s) failed", report.failed.len());
    }

    Ok(())
}
