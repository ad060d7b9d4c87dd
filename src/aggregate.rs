use crate::{EnergyComponent, RunLog, RunResult, failure_table, parse_output};
use cli_table::{Cell, Table, TableStruct};
use log::{info, warn};
use serde::Serialize;
use std::io::Write;

/// Parsed result of one benchmark
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub name: String,
    pub result: RunResult,
}

/// Results of every benchmark in a run directory
#[derive(Debug, Default)]
pub struct Aggregation {
    /// in input order
    pub results: Vec<BenchmarkResult>,
    /// (benchmark name, reason)
    pub failures: Vec<(String, String)>,
}

/// One flattened csv row
#[derive(Serialize)]
struct CsvRow<'a> {
    benchmark: &'a str,
    #[serde(rename = "Cycle")]
    cycle: u64,
    #[serde(rename = "COMP")]
    comp: f64,
    #[serde(rename = "GWRITE")]
    gwrite: f64,
    #[serde(rename = "READRES")]
    readres: f64,
    #[serde(rename = "PRE")]
    pre: f64,
    #[serde(rename = "Total")]
    total: f64,
}

impl Aggregation {
    pub fn get(&self, name: &str) -> Option<&RunResult> {
        self.results
            .iter()
            .find(|result| result.name == name)
            .map(|result| &result.result)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for BenchmarkResult { name, result } in &self.results {
            let energy = &result.energy;
            writer.serialize(CsvRow {
                benchmark: name,
                cycle: result.cycle,
                comp: energy.comp,
                gwrite: energy.gwrite,
                readres: energy.readres,
                pre: energy.pre,
                total: energy.total,
            })?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn summary_table(&self) -> TableStruct {
        let mut table = vec![];
        for BenchmarkResult { name, result } in &self.results {
            let mut row = vec![name.cell(), result.cycle.cell()];
            for component in EnergyComponent::ALL {
                row.push(format!("{:e}", result.energy.get(component)).cell());
            }
            table.push(row);
        }
        let mut title = vec!["Benchmark".cell(), "Cycle".cell()];
        for component in EnergyComponent::ALL {
            title.push(component.name().cell());
        }
        table.table().title(title)
    }

    pub fn failure_table(&self) -> TableStruct {
        failure_table(&self.failures)
    }
}

/// Parse every log in order; a log that cannot be parsed gets a zeroed row and a failure entry
pub fn aggregate(logs: &[RunLog]) -> Aggregation {
    let mut aggregation = Aggregation::default();
    for log in logs {
        match parse_output(&log.log_path) {
            Ok(result) => {
                info!(
                    "{}: {} cycles, {:e} total energy",
                    log.name, result.cycle, result.energy.total
                );
                aggregation.results.push(BenchmarkResult {
                    name: log.name.clone(),
                    result,
                });
            }
            Err(err) => {
                warn!("Zeroing {}: {:#}", log.name, err);
                aggregation
                    .failures
                    .push((log.name.clone(), format!("{:#}", err)));
                aggregation.results.push(BenchmarkResult {
                    name: log.name.clone(),
                    result: RunResult::default(),
                });
            }
        }
    }
    aggregation
}
