//! Per-entity migration outcome records

use std::collections::BTreeMap;
use std::fmt;

use super::kind::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MigrationStatus {
    Success,
    Skipped,
    Conflict,
    FailedRetrieval,
    FailedMigration,
    NotModified,
}

impl MigrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MigrationStatus::Success => "SUCCESS",
            MigrationStatus::Skipped => "SKIPPED",
            MigrationStatus::Conflict => "CONFLICT",
            MigrationStatus::FailedRetrieval => "FAILED_RETRIEVAL",
            MigrationStatus::FailedMigration => "FAILED_MIGRATION",
            MigrationStatus::NotModified => "NOT_MODIFIED",
        }
    }

    /// Conflicts are expected on re-runs; only real failures should draw
    /// operator attention.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            MigrationStatus::FailedRetrieval | MigrationStatus::FailedMigration
        )
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the result log: what happened to one entity, or to a whole
/// task when its source listing failed.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub kind: EntityKind,
    pub description: String,
    pub status: MigrationStatus,
    pub reason: String,
    pub properties: BTreeMap<String, String>,
}

impl MigrationOutcome {
    pub fn new(kind: EntityKind, description: impl Into<String>, status: MigrationStatus) -> Self {
        Self {
            kind,
            description: description.into(),
            status,
            reason: String::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}
