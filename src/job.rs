use crate::{
    JOB_SCRIPT_NAME, LOG_FILE_NAME, NodePolicy, SimulatorConfig, TraceRef, get_job_dir,
};
use anyhow::Context;
use log::debug;
use rand::{Rng, seq::SliceRandom};
use std::path::{Path, PathBuf};

/// One benchmark's job directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDir {
    pub name: String,
    pub dir: PathBuf,
    pub trace: PathBuf,
}

impl JobDir {
    pub fn script_path(&self) -> PathBuf {
        self.dir.join(JOB_SCRIPT_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }
}

/// Directories of one run, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDirs {
    pub run_id: String,
    pub root: PathBuf,
    pub jobs: Vec<JobDir>,
}

impl JobDirs {
    /// Plan directories for `traces` under `root` without touching the filesystem
    pub fn plan<P: AsRef<Path>>(root: P, run_id: &str, traces: &[TraceRef]) -> Self {
        let root = root.as_ref().to_path_buf();
        let jobs = traces
            .iter()
            .map(|trace| JobDir {
                name: trace.name.clone(),
                dir: get_job_dir(&root, &trace.name),
                trace: trace.path.clone(),
            })
            .collect();
        Self {
            run_id: run_id.to_string(),
            root,
            jobs,
        }
    }

    /// Run root followed by every job directory
    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.root.as_path()).chain(self.jobs.iter().map(|job| job.dir.as_path()))
    }

    pub fn get(&self, name: &str) -> Option<&JobDir> {
        self.jobs.iter().find(|job| job.name == name)
    }

    /// Create all directories; existing ones are fine
    pub fn create(&self) -> anyhow::Result<()> {
        for dir in self.dirs() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Quote a word for the job script's shell unless it is plainly safe
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Render the job script that runs one trace through the simulator
pub fn render_job_script<R: Rng + ?Sized>(
    config: &SimulatorConfig,
    run_id: &str,
    job: &JobDir,
    rng: &mut R,
) -> String {
    let mut script = String::from("#!/bin/bash\n\n");
    script.push_str(&format!("#SBATCH --job-name={}/{}\n", run_id, job.name));
    script.push_str(&format!("#SBATCH --partition={}\n", config.partition));
    match &config.nodes {
        NodePolicy::Any => {}
        NodePolicy::Fixed { nodes } => {
            script.push_str(&format!("#SBATCH --nodelist={}\n", nodes.join(",")));
        }
        NodePolicy::Random { nodes } => {
            if let Some(node) = nodes.choose(rng) {
                script.push_str(&format!("#SBATCH --nodelist={}\n", node));
            }
        }
        NodePolicy::Exclude { nodes } => {
            script.push_str(&format!("#SBATCH --exclude={}\n", nodes.join(",")));
        }
    }
    script.push_str("#SBATCH --parsable\n\n");

    if !config.env.is_empty() {
        for entry in &config.env {
            script.push_str(&format!("export {}\n", entry));
        }
        script.push('\n');
    }

    script.push_str(&format!(
        "{} {} --mode={} {} \\\n",
        shell_quote(&config.simulator.to_string_lossy()),
        shell_quote(&config.simulator_config.to_string_lossy()),
        shell_quote(&config.mode),
        shell_quote(&job.trace.to_string_lossy())
    ));
    script.push_str(&format!(
        " > {}\n",
        shell_quote(&job.log_path().to_string_lossy())
    ));
    script
}

/// Create the run directories and write one job script per benchmark
pub fn materialize<R: Rng + ?Sized>(
    config: &SimulatorConfig,
    jobs: &JobDirs,
    rng: &mut R,
) -> anyhow::Result<()> {
    jobs.create()?;
    for job in &jobs.jobs {
        let script = render_job_script(config, &jobs.run_id, job, rng);
        let script_path = job.script_path();
        std::fs::write(&script_path, script)
            .with_context(|| format!("Failed to write job script {}", script_path.display()))?;
        debug!("Wrote {}", script_path.display());
    }
    Ok(())
}
