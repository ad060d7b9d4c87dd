use crate::{JOB_SCRIPT_NAME, JobDir};
use anyhow::{Context, bail};
use log::{info, warn};
use std::{path::Path, process::Command};

/// Something that accepts job scripts and hands back a job id
pub trait Scheduler {
    fn submit(&mut self, dir: &Path, script: &str) -> anyhow::Result<String>;
}

/// Slurm's sbatch, run from inside the job directory
pub struct Sbatch {
    pub program: String,
}

impl Sbatch {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Scheduler for Sbatch {
    fn submit(&mut self, dir: &Path, script: &str) -> anyhow::Result<String> {
        let output = Command::new(&self.program)
            .arg("--export=ALL")
            .arg(script)
            .current_dir(dir)
            .output()
            .with_context(|| format!("Failed to run {}", self.program))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Submit every job, collecting failures
    #[default]
    KeepGoing,
    /// Stop at the first failed submission
    FailFast,
}

#[derive(Debug, Default)]
pub struct SubmitReport {
    /// (benchmark name, job id)
    pub launched: Vec<(String, String)>,
    /// (benchmark name, reason)
    pub failed: Vec<(String, String)>,
}

impl SubmitReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Submit each job in order, isolating failures per job unless asked to stop
pub fn submit_all<'a, S, I>(
    scheduler: &mut S,
    jobs: I,
    policy: FailurePolicy,
) -> SubmitReport
where
    S: Scheduler + ?Sized,
    I: IntoIterator<Item = &'a JobDir>,
{
    let mut report = SubmitReport::default();
    for job in jobs {
        match scheduler.submit(&job.dir, JOB_SCRIPT_NAME) {
            Ok(job_id) => {
                info!("Submitted {} as job {}", job.name, job_id);
                report.launched.push((job.name.clone(), job_id));
            }
            Err(err) => {
                warn!("Failed to submit {}: {:#}", job.name, err);
                report.failed.push((job.name.clone(), format!("{:#}", err)));
                if policy == FailurePolicy::FailFast {
                    break;
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use crate::{FailurePolicy, JobDir, Sbatch, Scheduler, submit_all};
    use anyhow::bail;
    use std::path::{Path, PathBuf};

    /// Accepts every job except those whose directory ends with `broken`
    #[derive(Default)]
    struct FakeScheduler {
        submitted: Vec<PathBuf>,
    }

    impl Scheduler for FakeScheduler {
        fn submit(&mut self, dir: &Path, script: &str) -> anyhow::Result<String> {
            assert_eq!(script, "srun.sh");
            self.submitted.push(dir.to_path_buf());
            if dir.ends_with("broken") {
                bail!("sbatch: error: invalid partition");
            }
            Ok(format!("{}", 1000 + self.submitted.len()))
        }
    }

    fn jobs(names: &[&str]) -> Vec<JobDir> {
        names
            .iter()
            .map(|name| JobDir {
                name: name.to_string(),
                dir: PathBuf::from("/runs/today").join(name),
                trace: PathBuf::from(format!("/traces/{}.trace", name)),
            })
            .collect()
    }

    #[test]
    fn test_submit_all() {
        let jobs = jobs(&["add", "gemv", "mul"]);
        let mut scheduler = FakeScheduler::default();
        let report = submit_all(&mut scheduler, &jobs, FailurePolicy::KeepGoing);
        assert!(report.is_success());
        assert_eq!(
            report.launched,
            vec![
                ("add".to_string(), "1001".to_string()),
                ("gemv".to_string(), "1002".to_string()),
                ("mul".to_string(), "1003".to_string()),
            ]
        );
        assert_eq!(scheduler.submitted[1], PathBuf::from("/runs/today/gemv"));
    }

    #[test]
    fn test_keep_going() {
        let jobs = jobs(&["add", "broken", "mul"]);
        let mut scheduler = FakeScheduler::default();
        let report = submit_all(&mut scheduler, &jobs, FailurePolicy::KeepGoing);
        assert_eq!(report.launched.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "broken");
        assert!(report.failed[0].1.contains("invalid partition"));
    }

    #[test]
    fn test_fail_fast() {
        let jobs = jobs(&["add", "broken", "mul"]);
        let mut scheduler = FakeScheduler::default();
        let report = submit_all(&mut scheduler, &jobs, FailurePolicy::FailFast);
        assert_eq!(report.launched.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(scheduler.submitted.len(), 2);
    }

    #[test]
    fn test_sbatch_job_id() {
        // echo stands in for sbatch: its stdout is the arguments
        let dir = tempfile::tempdir().unwrap();
        let mut sbatch = Sbatch::new("echo");
        let job_id = sbatch.submit(dir.path(), "srun.sh").unwrap();
        assert_eq!(job_id, "--export=ALL srun.sh");
    }

    #[test]
    fn test_sbatch_failures() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Sbatch::new("false").submit(dir.path(), "srun.sh").is_err());
        assert!(
            Sbatch::new("definitely-not-a-scheduler")
                .submit(dir.path(), "srun.sh")
                .is_err()
        );
    }
}
