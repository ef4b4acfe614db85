use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::Path;

/// A report payload stamped with when and what produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report<T> {
    pub created_at: DateTime<Utc>,
    /// e.g. "solution", "bottlenecks", "comparison"
    pub kind: String,
    pub tool_version: String,
    pub payload: T,
}

impl<T> Report<T> {
    pub fn new(kind: impl Into<String>, payload: T) -> Self {
        Self {
            created_at: Utc::now(),
            kind: kind.into(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            payload,
        }
    }
}

/// Pretty-print `value` as JSON to `path`, creating parent directories.
pub fn write_json_report<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serializing report to JSON")?;
    fs::write(path, json).with_context(|| format!("writing report '{}'", path.display()))?;
    Ok(())
}

pub fn read_json_report<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("opening report '{}'", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing report '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn report_writes_and_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/report.json");
        let report = Report::new("numbers", vec![1.5, 2.5]);

        write_json_report(&path, &report).unwrap();
        let back: Report<Vec<f64>> = read_json_report(&path).unwrap();
        assert_eq!(back.kind, "numbers");
        assert_eq!(back.payload, vec![1.5, 2.5]);
        assert_eq!(back.created_at, report.created_at);
    }
}
