//! Migration tasks
//!
//! One task migrates all entities of one kind within one scope (e.g. all
//! roles of one catalog). Listing reads the source as a whole; creation
//! fans out per entity onto the shared worker pool and every entity gets
//! exactly one outcome, so a single bad entity never takes its siblings
//! down with it. After the fan-out has joined, a task may spawn child
//! tasks scoped by the entities it listed.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use log::{error, info};

use crate::api::error::ApiError;

use super::MigrationContext;
use super::kind::EntityKind;
use super::outcome::{MigrationOutcome, MigrationStatus};

/// Everything a finished task hands back to the scheduler.
pub struct TaskRun {
    pub outcomes: Vec<MigrationOutcome>,
    pub children: Vec<MigrationTask>,
}

/// The closed set of migration task types. Parameters bind a task to its
/// scope; the include flags control which descendant tasks get spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationTask {
    Catalogs {
        include_catalog_roles: bool,
        include_grants: bool,
        include_role_assignments: bool,
    },
    CatalogRoles {
        catalog: String,
        include_grants: bool,
        include_role_assignments: bool,
    },
    Grants {
        catalog: String,
        role: String,
    },
    CatalogRoleAssignments {
        catalog: String,
        role: String,
    },
    Principals {
        include_role_assignments: bool,
    },
    PrincipalRoleAssignments {
        principal: String,
    },
    PrincipalRoles,
}

impl MigrationTask {
    pub fn kind(&self) -> EntityKind {
        match self {
            MigrationTask::Catalogs { .. } => EntityKind::Catalog,
            MigrationTask::CatalogRoles { .. } => EntityKind::CatalogRole,
            MigrationTask::Grants { .. } => EntityKind::Grant,
            MigrationTask::CatalogRoleAssignments { .. } => EntityKind::CatalogRoleAssignment,
            MigrationTask::Principals { .. } => EntityKind::Principal,
            MigrationTask::PrincipalRoleAssignments { .. } => EntityKind::PrincipalRoleAssignment,
            MigrationTask::PrincipalRoles => EntityKind::PrincipalRole,
        }
    }

    pub fn depends_on(&self) -> &'static [EntityKind] {
        self.kind().dependencies()
    }

    fn scope_properties(&self) -> BTreeMap<String, String> {
        match self {
            MigrationTask::Catalogs { .. }
            | MigrationTask::Principals { .. }
            | MigrationTask::PrincipalRoles => BTreeMap::new(),
            MigrationTask::CatalogRoles { catalog, .. } => {
                props([("catalogName", catalog.clone())])
            }
            MigrationTask::Grants { catalog, role }
            | MigrationTask::CatalogRoleAssignments { catalog, role } => props([
                ("catalogName", catalog.clone()),
                ("catalogRoleName", role.clone()),
            ]),
            MigrationTask::PrincipalRoleAssignments { principal } => {
                props([("principalName", principal.clone())])
            }
        }
    }

    fn failed_listing(&self, context: &MigrationContext, err: &ApiError) -> TaskRun {
        let outcome = MigrationOutcome::new(self.kind(), "", MigrationStatus::FailedRetrieval)
            .with_reason(err.to_string())
            .with_properties(self.scope_properties());
        context.log.append(outcome.clone());

        error!(
            "[{}] Failed to list {}s from source: {}",
            MigrationStatus::FailedRetrieval,
            self.kind().label(),
            err
        );

        TaskRun {
            outcomes: vec![outcome],
            children: Vec::new(),
        }
    }

    /// Execute this task to completion: list from source, migrate each
    /// entity concurrently, join, then compute child tasks. Never fails;
    /// everything that can go wrong becomes an outcome record.
    pub async fn migrate(&self, context: &MigrationContext) -> TaskRun {
        match self {
            MigrationTask::Catalogs {
                include_catalog_roles,
                include_grants,
                include_role_assignments,
            } => {
                let catalogs = match context.source.list_catalogs().await {
                    Ok(catalogs) => catalogs,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::Catalog, catalogs.len());

                let outcomes = fan_out(
                    context,
                    EntityKind::Catalog,
                    &catalogs,
                    |catalog| async move {
                        context.target.create_catalog(catalog).await?;
                        Ok(BTreeMap::new())
                    },
                    |catalog| catalog.name.clone(),
                    |catalog| props([("catalogName", catalog.name.clone())]),
                )
                .await;

                let children = if *include_catalog_roles {
                    catalogs
                        .iter()
                        .map(|catalog| MigrationTask::CatalogRoles {
                            catalog: catalog.name.clone(),
                            include_grants: *include_grants,
                            include_role_assignments: *include_role_assignments,
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                TaskRun { outcomes, children }
            }

            MigrationTask::CatalogRoles {
                catalog,
                include_grants,
                include_role_assignments,
            } => {
                let roles = match context.source.list_catalog_roles(catalog).await {
                    Ok(roles) => roles,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::CatalogRole, roles.len());

                // The built-in administrative role exists on every catalog
                // and is never migrated; its subtree is not scheduled.
                let mut outcomes = Vec::new();
                let mut to_migrate = Vec::new();
                for role in roles {
                    if role.is_reserved() {
                        let outcome = MigrationOutcome::new(
                            EntityKind::CatalogRole,
                            format!("Catalog role ({}) under catalog ({})", role.name, catalog),
                            MigrationStatus::Skipped,
                        )
                        .with_reason("built-in administrative role")
                        .with_properties(props([
                            ("catalogRoleName", role.name.clone()),
                            ("catalogName", catalog.clone()),
                        ]));
                        context.log.append(outcome.clone());
                        info!(
                            "[{}] Skipped catalog role \"{}\" under catalog \"{}\"",
                            MigrationStatus::Skipped,
                            role.name,
                            catalog
                        );
                        outcomes.push(outcome);
                    } else {
                        to_migrate.push(role);
                    }
                }

                outcomes.extend(
                    fan_out(
                        context,
                        EntityKind::CatalogRole,
                        &to_migrate,
                        |role| async move {
                            context.target.create_catalog_role(catalog, role).await?;
                            Ok(BTreeMap::new())
                        },
                        |role| format!("Catalog role ({}) under catalog ({})", role.name, catalog),
                        |role| {
                            props([
                                ("catalogRoleName", role.name.clone()),
                                ("catalogName", catalog.clone()),
                            ])
                        },
                    )
                    .await,
                );

                let mut children = Vec::new();
                if *include_grants {
                    children.extend(to_migrate.iter().map(|role| MigrationTask::Grants {
                        catalog: catalog.clone(),
                        role: role.name.clone(),
                    }));
                }
                if *include_role_assignments {
                    children.extend(to_migrate.iter().map(|role| {
                        MigrationTask::CatalogRoleAssignments {
                            catalog: catalog.clone(),
                            role: role.name.clone(),
                        }
                    }));
                }

                TaskRun { outcomes, children }
            }

            MigrationTask::Grants { catalog, role } => {
                let grants = match context.source.list_grants(catalog, role).await {
                    Ok(grants) => grants,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::Grant, grants.len());

                let outcomes = fan_out(
                    context,
                    EntityKind::Grant,
                    &grants,
                    |grant| async move {
                        context.target.add_grant(catalog, role, grant).await?;
                        Ok(BTreeMap::new())
                    },
                    |grant| {
                        format!(
                            "Grant ({}) of type ({}) for catalog role ({}) under catalog ({})",
                            grant.privilege(),
                            grant.type_name(),
                            role,
                            catalog
                        )
                    },
                    |grant| {
                        props([
                            ("type", grant.type_name().to_string()),
                            ("privilege", grant.privilege().to_string()),
                            ("catalogName", catalog.clone()),
                            ("catalogRoleName", role.clone()),
                        ])
                    },
                )
                .await;

                TaskRun {
                    outcomes,
                    children: Vec::new(),
                }
            }

            MigrationTask::CatalogRoleAssignments { catalog, role } => {
                let principal_roles = match context
                    .source
                    .list_assignee_principal_roles(catalog, role)
                    .await
                {
                    Ok(roles) => roles,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::CatalogRoleAssignment, principal_roles.len());

                let outcomes = fan_out(
                    context,
                    EntityKind::CatalogRoleAssignment,
                    &principal_roles,
                    |principal_role| async move {
                        context
                            .target
                            .assign_catalog_role(&principal_role.name, catalog, role)
                            .await?;
                        Ok(BTreeMap::new())
                    },
                    |principal_role| {
                        format!(
                            "Assignment of catalog role ({}) under catalog ({}) to principal role ({})",
                            role, catalog, principal_role.name
                        )
                    },
                    |principal_role| {
                        props([
                            ("catalogName", catalog.clone()),
                            ("catalogRoleName", role.clone()),
                            ("principalRoleName", principal_role.name.clone()),
                        ])
                    },
                )
                .await;

                TaskRun {
                    outcomes,
                    children: Vec::new(),
                }
            }

            MigrationTask::Principals {
                include_role_assignments,
            } => {
                let principals = match context.source.list_principals().await {
                    Ok(principals) => principals,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::Principal, principals.len());

                let outcomes = fan_out(
                    context,
                    EntityKind::Principal,
                    &principals,
                    |principal| async move {
                        let created = context.target.create_principal(principal).await?;
                        // The target mints fresh credentials; record them so
                        // operators can recover them from the result file.
                        Ok(props([
                            (
                                "sourceClientId",
                                principal.client_id.clone().unwrap_or_default(),
                            ),
                            ("targetClientId", created.credentials.client_id),
                            ("targetClientSecret", created.credentials.client_secret),
                        ]))
                    },
                    |principal| principal.name.clone(),
                    |principal| props([("principalName", principal.name.clone())]),
                )
                .await;

                let children = if *include_role_assignments {
                    principals
                        .iter()
                        .map(|principal| MigrationTask::PrincipalRoleAssignments {
                            principal: principal.name.clone(),
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                TaskRun { outcomes, children }
            }

            MigrationTask::PrincipalRoleAssignments { principal } => {
                let roles = match context.source.list_principal_roles_assigned(principal).await {
                    Ok(roles) => roles,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::PrincipalRoleAssignment, roles.len());

                let outcomes = fan_out(
                    context,
                    EntityKind::PrincipalRoleAssignment,
                    &roles,
                    |role| async move {
                        context
                            .target
                            .assign_principal_role(principal, &role.name)
                            .await?;
                        Ok(BTreeMap::new())
                    },
                    |role| {
                        format!(
                            "Assignment of principal role ({}) to principal ({})",
                            role.name, principal
                        )
                    },
                    |role| {
                        props([
                            ("principalName", principal.clone()),
                            ("principalRoleName", role.name.clone()),
                        ])
                    },
                )
                .await;

                TaskRun {
                    outcomes,
                    children: Vec::new(),
                }
            }

            MigrationTask::PrincipalRoles => {
                let roles = match context.source.list_principal_roles().await {
                    Ok(roles) => roles,
                    Err(err) => return self.failed_listing(context, &err),
                };
                log_listed(EntityKind::PrincipalRole, roles.len());

                let outcomes = fan_out(
                    context,
                    EntityKind::PrincipalRole,
                    &roles,
                    |role| async move {
                        context.target.create_principal_role(role).await?;
                        Ok(BTreeMap::new())
                    },
                    |role| role.name.clone(),
                    |role| props([("principalRoleName", role.name.clone())]),
                )
                .await;

                TaskRun {
                    outcomes,
                    children: Vec::new(),
                }
            }
        }
    }
}

fn log_listed(kind: EntityKind, count: usize) {
    info!("Identified {} {}(s) from source", count, kind.label());
}

fn props<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Dispatch one creation per entity onto the shared worker pool, append an
/// outcome to the log as each completes, and wait for all of them.
///
/// `create` yields extra outcome properties on success; most kinds have
/// none. Errors are classified here: conflicts from the target are their
/// own status so re-runs stay readable, anything else is a migration
/// failure. Nothing escapes this function.
async fn fan_out<'a, T, C, Fut, D, P>(
    context: &'a MigrationContext,
    kind: EntityKind,
    entities: &'a [T],
    create: C,
    describe: D,
    properties: P,
) -> Vec<MigrationOutcome>
where
    C: Fn(&'a T) -> Fut,
    Fut: Future<Output = Result<BTreeMap<String, String>, ApiError>>,
    D: Fn(&'a T) -> String,
    P: Fn(&'a T) -> BTreeMap<String, String>,
{
    let total = entities.len();
    let completed = AtomicUsize::new(0);
    let completed = &completed;
    let describe = &describe;
    let properties = &properties;

    let migrations = entities.iter().map(|entity| {
        let creation = create(entity);
        async move {
            let _permit = context.limiter.acquire().await;

            let outcome = match creation.await {
                Ok(extra) => {
                    let mut merged = properties(entity);
                    merged.extend(extra);
                    MigrationOutcome::new(kind, describe(entity), MigrationStatus::Success)
                        .with_properties(merged)
                }
                Err(err) => {
                    let status = if err.is_conflict() {
                        MigrationStatus::Conflict
                    } else {
                        MigrationStatus::FailedMigration
                    };
                    MigrationOutcome::new(kind, describe(entity), status)
                        .with_reason(err.to_string())
                        .with_properties(properties(entity))
                }
            };

            context.log.append(outcome.clone());

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if outcome.status == MigrationStatus::Success {
                info!(
                    "[{}] Migrated {} \"{}\" - {}/{}",
                    outcome.status,
                    kind.label(),
                    outcome.description,
                    done,
                    total
                );
            } else {
                error!(
                    "[{}] Failed to migrate {} \"{}\" - {}/{}",
                    outcome.status,
                    kind.label(),
                    outcome.description,
                    done,
                    total
                );
            }

            outcome
        }
    });

    join_all(migrations).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::api::models::*;
    use crate::api::testing::FakeApi;
    use crate::api::{ConcurrencyLimiter, ManagementApi};
    use crate::migrate::log::MigrationLog;

    use super::*;

    fn context(source: FakeApi, target: FakeApi) -> (MigrationContext, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let log = MigrationLog::create(&dir.path().join("results.csv")).unwrap();

        (
            MigrationContext {
                source: Arc::new(source),
                target: Arc::new(target),
                log: Arc::new(log),
                limiter: ConcurrencyLimiter::new(4),
            },
            dir,
        )
    }

    fn catalogs_task() -> MigrationTask {
        MigrationTask::Catalogs {
            include_catalog_roles: true,
            include_grants: true,
            include_role_assignments: true,
        }
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_task_without_children() {
        let source = FakeApi::new();
        source.seed_catalog(Catalog::new("sales"));
        source.fail_listing("catalogs");
        let (ctx, _dir) = context(source, FakeApi::new());

        let run = catalogs_task().migrate(&ctx).await;

        assert_eq!(run.outcomes.len(), 1);
        assert_eq!(run.outcomes[0].status, MigrationStatus::FailedRetrieval);
        assert!(run.children.is_empty());
        assert!(ctx.target.list_catalogs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_isolation_with_conflict() {
        // Catalog 2 already exists on the target; 1 and 3 migrate cleanly.
        // All three get outcomes and all three spawn a roles child task.
        let source = FakeApi::new();
        source.seed_catalog(Catalog::new("one"));
        source.seed_catalog(Catalog::new("two"));
        source.seed_catalog(Catalog::new("three"));

        let target = FakeApi::new();
        target.seed_catalog(Catalog::new("two"));

        let (ctx, _dir) = context(source, target);
        let run = catalogs_task().migrate(&ctx).await;

        assert_eq!(run.outcomes.len(), 3);
        let statuses: Vec<_> = run.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                MigrationStatus::Success,
                MigrationStatus::Conflict,
                MigrationStatus::Success
            ]
        );

        // Children derive from the source listing, not the create results
        assert_eq!(run.children.len(), 3);
        assert!(run.children.iter().all(|c| c.kind() == EntityKind::CatalogRole));
    }

    #[tokio::test]
    async fn test_fan_out_isolation_with_hard_failure() {
        let source = FakeApi::new();
        for name in ["a", "b", "c", "d"] {
            source.seed_catalog(Catalog::new(name));
        }

        let target = FakeApi::new();
        target.fail_create("b");

        let (ctx, _dir) = context(source, target);
        let run = catalogs_task().migrate(&ctx).await;

        assert_eq!(run.outcomes.len(), 4);
        let failed: Vec<_> = run
            .outcomes
            .iter()
            .filter(|o| o.status == MigrationStatus::FailedMigration)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].description, "b");
        assert!(!failed[0].reason.is_empty());

        let created = ctx.target.list_catalogs().await.unwrap();
        assert_eq!(created.len(), 3);
    }

    #[tokio::test]
    async fn test_reserved_role_skipped_and_spawns_no_subtree() {
        let source = FakeApi::new();
        source.seed_catalog(Catalog::new("sales"));
        source.seed_catalog_role("sales", CatalogRole::new("analyst"));

        let target = FakeApi::new();
        target.seed_catalog(Catalog::new("sales"));

        let (ctx, _dir) = context(source, target);
        let task = MigrationTask::CatalogRoles {
            catalog: "sales".into(),
            include_grants: true,
            include_role_assignments: true,
        };
        let run = task.migrate(&ctx).await;

        // catalog_admin (seeded automatically) plus analyst
        let skipped: Vec<_> = run
            .outcomes
            .iter()
            .filter(|o| o.status == MigrationStatus::Skipped)
            .collect();
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].description.contains(RESERVED_CATALOG_ROLE));

        // Grants + assignment children for analyst only
        assert_eq!(run.children.len(), 2);
        for child in &run.children {
            match child {
                MigrationTask::Grants { role, .. }
                | MigrationTask::CatalogRoleAssignments { role, .. } => {
                    assert_eq!(role, "analyst");
                }
                other => panic!("unexpected child task {other:?}"),
            }
        }

        // The reserved role was never created on the target; it was
        // already there from catalog creation.
        let roles = ctx.target.list_catalog_roles("sales").await.unwrap();
        assert_eq!(roles.len(), 2);
    }

    #[tokio::test]
    async fn test_principal_migration_records_target_credentials() {
        let source = FakeApi::new();
        let mut principal = Principal::new("etl");
        principal.client_id = Some("etl-source".into());
        source.seed_principal(principal);

        let (ctx, _dir) = context(source, FakeApi::new());
        let task = MigrationTask::Principals {
            include_role_assignments: true,
        };
        let run = task.migrate(&ctx).await;

        assert_eq!(run.outcomes.len(), 1);
        let outcome = &run.outcomes[0];
        assert_eq!(outcome.status, MigrationStatus::Success);
        assert_eq!(outcome.properties["sourceClientId"], "etl-source");
        assert_eq!(outcome.properties["targetClientId"], "etl-client-id");
        assert_eq!(outcome.properties["targetClientSecret"], "etl-secret");

        assert_eq!(run.children.len(), 1);
        assert_eq!(run.children[0].kind(), EntityKind::PrincipalRoleAssignment);
    }

    #[tokio::test]
    async fn test_outcomes_append_to_shared_log() {
        let source = FakeApi::new();
        source.seed_principal_role(PrincipalRole::new("ops"));
        source.seed_principal_role(PrincipalRole::new("dev"));

        let (ctx, _dir) = context(source, FakeApi::new());
        MigrationTask::PrincipalRoles.migrate(&ctx).await;

        let logged = ctx.log.snapshot();
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().all(|o| o.kind == EntityKind::PrincipalRole));
    }
}
