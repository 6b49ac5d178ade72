//! Migrate command handler

use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};

use crate::cli::{MigrateArgs, MigrateScope};
use crate::migrate::{ManagementMigrator, MigrationLog, MigrationReport};

/// Run a bulk migration. Individual entity failures are data in the result
/// file, not process failures; only failing to reach the instances or to
/// open the result file is fatal.
pub async fn run(args: MigrateArgs) -> Result<()> {
    let (source, target) = args.connection.connect().await?;

    // Open the result sink before any task executes
    let log = Arc::new(MigrationLog::create(&args.output_file)?);

    let migrator = ManagementMigrator::new(source, target, log, args.concurrency);

    let outcomes = match args.scope {
        MigrateScope::All => migrator.migrate_all().await,
        MigrateScope::Catalogs {
            include_catalog_roles,
            include_grants,
            include_catalog_role_assignments,
        } => {
            migrator
                .migrate_catalogs(
                    include_catalog_roles,
                    include_grants,
                    include_catalog_role_assignments,
                )
                .await
        }
        MigrateScope::Principals {
            include_principal_role_assignments,
        } => {
            migrator
                .migrate_principals(include_principal_role_assignments)
                .await
        }
        MigrateScope::PrincipalRoles => migrator.migrate_principal_roles().await,
    };

    let report = MigrationReport::from_outcomes(&outcomes);
    report.log_summary();

    let failures = report.failure_count();
    if failures > 0 {
        warn!("{} entities failed to migrate; see the result file for reasons", failures);
    }
    info!("Results written to {}", args.output_file.display());

    Ok(())
}
