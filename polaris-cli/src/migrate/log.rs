//! Thread-safe result log backed by a CSV file
//!
//! Every per-entity and task-level outcome is appended here as soon as it
//! is known, from whichever worker produced it. Opening the file is the
//! only fatal step; once the run is going, write errors are reported but
//! never abort migration work.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::{info, warn};

use super::kind::EntityKind;
use super::outcome::{MigrationOutcome, MigrationStatus};

struct LogInner {
    writer: csv::Writer<File>,
    outcomes: Vec<MigrationOutcome>,
}

pub struct MigrationLog {
    inner: Mutex<LogInner>,
}

impl MigrationLog {
    /// Open the result file and write the header row. Fails fast so a bad
    /// output path is caught before any task executes.
    pub fn create(path: &Path) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open result file: {}", path.display()))?;

        writer
            .write_record(["entityType", "description", "status", "reason", "properties"])
            .context("Failed to write result file header")?;
        writer.flush().context("Failed to write result file header")?;

        Ok(Self {
            inner: Mutex::new(LogInner {
                writer,
                outcomes: Vec::new(),
            }),
        })
    }

    pub fn append(&self, outcome: MigrationOutcome) {
        let mut inner = self.inner.lock().unwrap();

        let properties = serde_json::to_string(&outcome.properties).unwrap_or_default();
        let row = [
            outcome.kind.as_str(),
            outcome.description.as_str(),
            outcome.status.as_str(),
            outcome.reason.as_str(),
            properties.as_str(),
        ];

        if let Err(err) = inner
            .writer
            .write_record(row)
            .and_then(|()| inner.writer.flush().map_err(csv::Error::from))
        {
            warn!("Failed to write result row: {err}");
        }

        inner.outcomes.push(outcome);
    }

    pub fn snapshot(&self) -> Vec<MigrationOutcome> {
        self.inner.lock().unwrap().outcomes.clone()
    }

    pub fn report(&self) -> MigrationReport {
        MigrationReport::from_outcomes(&self.snapshot())
    }
}

/// Aggregated counts over a finished run, grouped by entity kind and
/// status.
#[derive(Debug, Default)]
pub struct MigrationReport {
    by_kind: BTreeMap<EntityKind, BTreeMap<MigrationStatus, usize>>,
}

impl MigrationReport {
    pub fn from_outcomes(outcomes: &[MigrationOutcome]) -> Self {
        let mut by_kind: BTreeMap<EntityKind, BTreeMap<MigrationStatus, usize>> = BTreeMap::new();

        for outcome in outcomes {
            *by_kind
                .entry(outcome.kind)
                .or_default()
                .entry(outcome.status)
                .or_default() += 1;
        }

        Self { by_kind }
    }

    pub fn count(&self, kind: EntityKind, status: MigrationStatus) -> usize {
        self.by_kind
            .get(&kind)
            .and_then(|statuses| statuses.get(&status))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self, kind: EntityKind) -> usize {
        self.by_kind
            .get(&kind)
            .map(|statuses| statuses.values().sum())
            .unwrap_or(0)
    }

    pub fn failure_count(&self) -> usize {
        self.by_kind
            .values()
            .flat_map(|statuses| statuses.iter())
            .filter(|(status, _)| status.is_failure())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn log_summary(&self) {
        info!("Statistics:");

        for (kind, statuses) in &self.by_kind {
            let total: usize = statuses.values().sum();

            info!("Type: {}", kind);
            info!("\tTotal = {}", total);

            for (status, count) in statuses {
                info!("\tResults with status {} = {}/{}", status, count, total);
            }
        }
    }
}
