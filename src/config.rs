use anyhow::{Context, bail};
use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which cluster nodes a job may land on
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum NodePolicy {
    /// Let the scheduler decide
    #[default]
    Any,
    /// Pin every job to this node list
    Fixed { nodes: Vec<String> },
    /// Pick one node per job, uniformly
    Random { nodes: Vec<String> },
    /// Keep jobs off these nodes
    Exclude { nodes: Vec<String> },
}

impl NodePolicy {
    fn nodes(&self) -> Option<&[String]> {
        match self {
            NodePolicy::Any => None,
            NodePolicy::Fixed { nodes }
            | NodePolicy::Random { nodes }
            | NodePolicy::Exclude { nodes } => Some(nodes.as_slice()),
        }
    }
}

/// How to invoke the simulator and how to ask the scheduler for resources
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Path to simulator binary
    pub simulator: PathBuf,
    /// Path to simulator configuration file
    pub simulator_config: PathBuf,
    /// Passed as --mode=
    pub mode: String,
    /// Scheduler partition
    pub partition: String,
    /// Node selection policy
    pub nodes: NodePolicy,
    /// Extra `NAME=value` pairs exported before the simulator runs
    pub env: Vec<String>,
    /// Extension of trace files, without the dot
    pub trace_extension: String,
    /// Scheduler submission command
    pub scheduler: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            simulator: PathBuf::from("ramulator"),
            simulator_config: PathBuf::from("configs/HBM-config.cfg"),
            mode: "dram".to_string(),
            partition: "allcpu".to_string(),
            nodes: NodePolicy::Any,
            env: vec![],
            trace_extension: "trace".to_string(),
            scheduler: "sbatch".to_string(),
        }
    }
}

impl SimulatorConfig {
    /// Load and validate a config from a json file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: SimulatorConfig = serde_json::from_slice(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.simulator.as_os_str().is_empty() {
            bail!("Simulator path must not be empty");
        }
        if self.simulator_config.as_os_str().is_empty() {
            bail!("Simulator config path must not be empty");
        }
        for (field, value) in [
            ("mode", &self.mode),
            ("partition", &self.partition),
            ("scheduler", &self.scheduler),
        ] {
            if value.trim().is_empty() {
                bail!("Config field `{}` must not be empty", field);
            }
        }
        if self.trace_extension().is_empty() {
            bail!("Config field `trace_extension` must not be empty");
        }
        if let Some(nodes) = self.nodes.nodes() {
            if nodes.is_empty() || nodes.iter().any(|node| node.trim().is_empty()) {
                bail!("Node policy {:?} needs a non-empty node list", self.nodes);
            }
        }
        for entry in &self.env {
            match entry.split_once('=') {
                Some((name, _)) if !name.trim().is_empty() => {}
                _ => bail!("Environment entry `{}` is not of the form NAME=value", entry),
            }
        }
        Ok(())
    }

    /// Trace extension with any leading dot stripped
    pub fn trace_extension(&self) -> &str {
        self.trace_extension.trim_start_matches('.')
    }

    /// Expand `~` and make simulator paths absolute, since job scripts run elsewhere
    pub fn resolved(&self) -> anyhow::Result<Self> {
        Ok(Self {
            simulator: if is_bare_command(&self.simulator) {
                self.simulator.clone()
            } else {
                resolve(&self.simulator)?
            },
            simulator_config: resolve(&self.simulator_config)?,
            ..self.clone()
        })
    }
}

/// A lone program name is left for the job's PATH lookup
fn is_bare_command(path: &Path) -> bool {
    path.components().count() == 1 && !path.starts_with("~") && !path.is_absolute()
}

/// Expand `~` and join relative paths onto the current directory
pub fn resolve<P: AsRef<Path>>(path: P) -> anyhow::Result<PathBuf> {
    let path = path.as_ref();
    let resolved = path
        .try_resolve()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(resolved.into_owned())
}

#[cfg(test)]
mod tests {
    use crate::{NodePolicy, SimulatorConfig};
    use std::path::PathBuf;

    #[test]
    fn test_sample_config() {
        let config = SimulatorConfig::load("configs/hbm-pim.json").unwrap();
        assert_eq!(config.mode, "dram");
        assert_eq!(config.partition, "allcpu");
        assert_eq!(config.nodes, NodePolicy::Any);
        assert_eq!(config.scheduler, "sbatch");
        assert_eq!(config.trace_extension(), "trace");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SimulatorConfig = serde_json::from_str(
            r#"{"partition": "gpu", "nodes": {"policy": "random", "nodes": ["n1", "n4"]}}"#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.partition, "gpu");
        assert_eq!(config.simulator, PathBuf::from("ramulator"));
        assert_eq!(
            config.nodes,
            NodePolicy::Random {
                nodes: vec!["n1".to_string(), "n4".to_string()]
            }
        );
    }

    #[test]
    fn test_validate() {
        let mut config = SimulatorConfig {
            nodes: NodePolicy::Exclude { nodes: vec![] },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.nodes = NodePolicy::Exclude {
            nodes: vec!["g1".to_string()],
        };
        config.validate().unwrap();

        config.env = vec!["LD_LIBRARY_PATH".to_string()];
        assert!(config.validate().is_err());
        config.env = vec!["LD_LIBRARY_PATH=/opt/lib".to_string()];
        config.validate().unwrap();

        config.partition = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trace_extension_dot() {
        let config = SimulatorConfig {
            trace_extension: ".trace".to_string(),
            ..Default::default()
        };
        assert_eq!(config.trace_extension(), "trace");
    }

    #[test]
    fn test_resolved_keeps_absolute() {
        let config = SimulatorConfig {
            simulator: PathBuf::from("/opt/pim/ramulator"),
            simulator_config: PathBuf::from("/opt/pim/HBM-config.cfg"),
            ..Default::default()
        };
        let resolved = config.resolved().unwrap();
        assert_eq!(resolved.simulator, PathBuf::from("/opt/pim/ramulator"));
        assert_eq!(
            resolved.simulator_config,
            PathBuf::from("/opt/pim/HBM-config.cfg")
        );
    }

    #[test]
    fn test_resolved_bare_command() {
        let resolved = SimulatorConfig::default().resolved().unwrap();
        assert_eq!(resolved.simulator, PathBuf::from("ramulator"));
        assert!(resolved.simulator_config.is_absolute());
    }
}
