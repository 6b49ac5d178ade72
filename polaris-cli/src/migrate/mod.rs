//! Bulk migration engine
//!
//! Copies management entities from a source instance to a target instance.
//! A driver loop pulls tasks off a dependency-ordered queue and runs them
//! one at a time; concurrency lives inside each task's per-entity fan-out,
//! bounded by a worker pool shared across the whole run. Entities are
//! never removed from the source.

pub mod kind;
pub mod log;
pub mod outcome;
pub mod path;
pub mod scheduler;
pub mod task;

use std::sync::Arc;

use crate::api::{ConcurrencyLimiter, ManagementApi};

pub use kind::EntityKind;
pub use log::{MigrationLog, MigrationReport};
pub use outcome::{MigrationOutcome, MigrationStatus};
pub use task::MigrationTask;

use scheduler::TaskScheduler;

/// Run-scoped dependencies threaded through every task: both instance
/// clients, the shared result log and the shared worker pool.
pub struct MigrationContext {
    pub source: Arc<dyn ManagementApi>,
    pub target: Arc<dyn ManagementApi>,
    pub log: Arc<MigrationLog>,
    pub limiter: ConcurrencyLimiter,
}

pub struct ManagementMigrator {
    context: MigrationContext,
}

impl ManagementMigrator {
    pub fn new(
        source: Arc<dyn ManagementApi>,
        target: Arc<dyn ManagementApi>,
        log: Arc<MigrationLog>,
        concurrency: usize,
    ) -> Self {
        Self {
            context: MigrationContext {
                source,
                target,
                log,
                limiter: ConcurrencyLimiter::new(concurrency),
            },
        }
    }

    pub async fn migrate_all(&self) -> Vec<MigrationOutcome> {
        self.execute(vec![
            MigrationTask::Catalogs {
                include_catalog_roles: true,
                include_grants: true,
                include_role_assignments: true,
            },
            MigrationTask::Principals {
                include_role_assignments: true,
            },
            MigrationTask::PrincipalRoles,
        ])
        .await
    }

    pub async fn migrate_catalogs(
        &self,
        include_catalog_roles: bool,
        include_grants: bool,
        include_role_assignments: bool,
    ) -> Vec<MigrationOutcome> {
        self.execute(vec![MigrationTask::Catalogs {
            include_catalog_roles,
            include_grants,
            include_role_assignments,
        }])
        .await
    }

    pub async fn migrate_principals(
        &self,
        include_role_assignments: bool,
    ) -> Vec<MigrationOutcome> {
        self.execute(vec![MigrationTask::Principals {
            include_role_assignments,
        }])
        .await
    }

    pub async fn migrate_principal_roles(&self) -> Vec<MigrationOutcome> {
        self.execute(vec![MigrationTask::PrincipalRoles]).await
    }

    /// Drive the scheduler until the queue drains. Each task runs to
    /// completion (including its internal fan-out join) before the next
    /// one starts, which is what makes the dependency ordering meaningful.
    async fn execute(&self, seeds: Vec<MigrationTask>) -> Vec<MigrationOutcome> {
        let mut scheduler = TaskScheduler::new();
        scheduler.enqueue_all(seeds);

        let mut outcomes = Vec::new();
        while let Some(task) = scheduler.pop_ready() {
            let run = task.migrate(&self.context).await;
            outcomes.extend(run.outcomes);
            scheduler.enqueue_all(run.children);
        }

        outcomes
    }
}
