use anyhow::{Context, bail};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Energy categories reported by the simulator, e.g. `COMP energy 9.87266e-06`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyComponent {
    #[serde(rename = "COMP")]
    Comp,
    #[serde(rename = "GWRITE")]
    GWrite,
    #[serde(rename = "READRES")]
    ReadRes,
    #[serde(rename = "PRE")]
    Pre,
    Total,
}

impl EnergyComponent {
    pub const ALL: [EnergyComponent; 5] = [
        EnergyComponent::Comp,
        EnergyComponent::GWrite,
        EnergyComponent::ReadRes,
        EnergyComponent::Pre,
        EnergyComponent::Total,
    ];

    /// Name as printed in the simulator log
    pub fn name(self) -> &'static str {
        match self {
            EnergyComponent::Comp => "COMP",
            EnergyComponent::GWrite => "GWRITE",
            EnergyComponent::ReadRes => "READRES",
            EnergyComponent::Pre => "PRE",
            EnergyComponent::Total => "Total",
        }
    }

    /// Exact, case-sensitive match against a log token
    pub fn from_name(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|component| component.name() == token)
    }
}

/// Power breakdown of one run, components default to zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyBreakdown {
    #[serde(rename = "COMP")]
    pub comp: f64,
    #[serde(rename = "GWRITE")]
    pub gwrite: f64,
    #[serde(rename = "READRES")]
    pub readres: f64,
    #[serde(rename = "PRE")]
    pub pre: f64,
    #[serde(rename = "Total")]
    pub total: f64,
}

impl EnergyBreakdown {
    pub fn get(&self, component: EnergyComponent) -> f64 {
        match component {
            EnergyComponent::Comp => self.comp,
            EnergyComponent::GWrite => self.gwrite,
            EnergyComponent::ReadRes => self.readres,
            EnergyComponent::Pre => self.pre,
            EnergyComponent::Total => self.total,
        }
    }

    pub fn set(&mut self, component: EnergyComponent, value: f64) {
        let slot = match component {
            EnergyComponent::Comp => &mut self.comp,
            EnergyComponent::GWrite => &mut self.gwrite,
            EnergyComponent::ReadRes => &mut self.readres,
            EnergyComponent::Pre => &mut self.pre,
            EnergyComponent::Total => &mut self.total,
        };
        *slot = value;
    }
}

/// What we scrape out of one simulator log
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    #[serde(rename = "Cycle")]
    pub cycle: u64,
    #[serde(rename = "Energy")]
    pub energy: EnergyBreakdown,
}

/// Scan a simulator log line by line; the last occurrence of each marker wins
pub fn parse_log<R: BufRead>(mut reader: R) -> anyhow::Result<RunResult> {
    let mut result = RunResult::default();
    let mut buf = vec![];
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        // stray non utf-8 bytes only spoil their own line
        let line = String::from_utf8_lossy(&buf);

        // e.g. "COMP energy 9.87266e-06"
        if line.contains("energy") {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if let Some(component) = tokens.first().and_then(|t| EnergyComponent::from_name(t)) {
                match tokens.get(2).map(|t| t.parse::<f64>()) {
                    Some(Ok(value)) => result.energy.set(component, value),
                    _ => warn!(
                        "Line {}: no {} energy value in {:?}",
                        line_no,
                        component.name(),
                        line
                    ),
                }
            }
        }

        // e.g. "Cycle 12345"
        if line.contains("Cycle") {
            match line.split_whitespace().nth(1).map(|t| t.parse::<u64>()) {
                Some(Ok(cycle)) => result.cycle = cycle,
                _ => warn!("Line {}: no cycle count in {:?}", line_no, line),
            }
        }
    }
    Ok(result)
}

/// Parse the simulator log at `path`
pub fn parse_output<P: AsRef<Path>>(path: P) -> anyhow::Result<RunResult> {
    let path = path.as_ref();
    if !path.is_file() {
        bail!("{}: file not found", path.display());
    }
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    parse_log(BufReader::new(file)).with_context(|| format!("Failed to read {}", path.display()))
}
