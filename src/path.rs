// run folder structure:
// {output-root}/
// \- {run-id}/                 e.g. 2021_12_16
//    \- {benchmark-name}/
//       |- srun.sh             job script submitted to the scheduler
//       \- output.txt          simulator log

use crate::resolve;
use anyhow::bail;
use log::warn;
use std::path::{Path, PathBuf};

pub const JOB_SCRIPT_NAME: &str = "srun.sh";
pub const LOG_FILE_NAME: &str = "output.txt";

/// A trace file to be simulated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRef {
    /// Benchmark name: trace file name without extension
    pub name: String,
    /// Absolute path to the trace file
    pub path: PathBuf,
}

/// Simulator log of a finished (or running) job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLog {
    /// Benchmark name: the job directory name
    pub name: String,
    /// Path to the log, not checked for existence
    pub log_path: PathBuf,
}

/// Default run id: today's date
pub fn today_run_id() -> String {
    chrono::Local::now().format("%Y_%m_%d").to_string()
}

/// Run ids name a single directory level
pub fn check_run_id(run_id: &str) -> anyhow::Result<()> {
    if run_id.is_empty() || run_id == "." || run_id == ".." || run_id.contains(['/', '\\']) {
        bail!("Invalid run id `{}`", run_id);
    }
    Ok(())
}

pub fn get_run_dir<P: AsRef<Path>>(output_root: P, run_id: &str) -> PathBuf {
    output_root.as_ref().join(run_id)
}

pub fn get_job_dir<P: AsRef<Path>>(run_dir: P, name: &str) -> PathBuf {
    run_dir.as_ref().join(name)
}

fn resolve_dir<P: AsRef<Path>>(dir: P) -> anyhow::Result<PathBuf> {
    let dir = resolve(dir)?;
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    Ok(dir)
}

/// List trace files directly under `trace_dir` that carry the given extension
pub fn find_traces<P: AsRef<Path>>(trace_dir: P, extension: &str) -> anyhow::Result<Vec<TraceRef>> {
    let trace_dir = resolve_dir(trace_dir)?;
    let mut traces = vec![];
    for entry in std::fs::read_dir(&trace_dir)? {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != extension) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            warn!("Skipping trace with non utf-8 name: {}", path.display());
            continue;
        };
        traces.push(TraceRef {
            name: name.to_string(),
            path,
        });
    }
    traces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(traces)
}

/// List job directories under `run_dir` together with their log paths
pub fn find_run_logs<P: AsRef<Path>>(run_dir: P) -> anyhow::Result<Vec<RunLog>> {
    let run_dir = resolve_dir(run_dir)?;
    let mut logs = vec![];
    for entry in std::fs::read_dir(&run_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            warn!("Skipping job directory with non utf-8 name: {}", path.display());
            continue;
        };
        logs.push(RunLog {
            name: name.to_string(),
            log_path: path.join(LOG_FILE_NAME),
        });
    }
    logs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(logs)
}
