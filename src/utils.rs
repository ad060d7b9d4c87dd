use cli_table::{Cell, Table, TableStruct};
use std::path::{Path, PathBuf};

pub fn get_tqdm_style() -> anyhow::Result<indicatif::ProgressStyle> {
    Ok(indicatif::ProgressStyle::with_template(
        "{percent:>3}% |{wide_bar}| {pos}/{len} [{elapsed_precise}<{eta_precise}, {custom_per_sec}] {msg}",
    )?
    .with_key(
        "custom_per_sec",
        |s: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| {
            write!(w, "{:.2} jobs/s", s.per_sec()).unwrap()
        },
    )
    .progress_chars("██ "))
}

/// Path relative to the current directory when possible, for printing
pub fn relative_to_cwd<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Table of (benchmark name, reason) pairs
pub fn failure_table(failures: &[(String, String)]) -> TableStruct {
    failures
        .iter()
        .map(|(name, reason)| vec![name.cell(), reason.cell()])
        .collect::<Vec<_>>()
        .table()
        .title(vec!["Benchmark".cell(), "Reason".cell()])
}
