//! Idempotent two-way synchronization
//!
//! The alternate driver to the create-only migrator: per entity kind it
//! lists both instances, plans a create/retain/remove partition, then
//! applies it against the target. Retained entities are only overwritten
//! when their change signature differs; everything else reports
//! NOT_MODIFIED. Recursion into child kinds happens level by level,
//! synchronously, after the parent level has been applied.

pub mod events;
pub mod planner;
pub mod signature;

use std::sync::Arc;

use crate::api::models::{Catalog, CatalogRole, PrincipalRole};
use crate::api::{ApiError, ManagementApi};
use crate::migrate::path::EntityPath;

use events::{Side, SyncEvent, SyncEventListener};
use planner::SourceParityPlanner;

pub use events::LoggingSyncEventListener;

pub struct Synchronizer {
    source: Arc<dyn ManagementApi>,
    target: Arc<dyn ManagementApi>,
    planner: SourceParityPlanner,
    listener: Arc<dyn SyncEventListener>,
}

impl Synchronizer {
    pub fn new(
        source: Arc<dyn ManagementApi>,
        target: Arc<dyn ManagementApi>,
        listener: Arc<dyn SyncEventListener>,
    ) -> Self {
        Self {
            source,
            target,
            planner: SourceParityPlanner,
            listener,
        }
    }

    /// Principal roles first so catalog role assignments created further
    /// down the hierarchy can resolve their assignees.
    pub async fn sync_all(&self) {
        self.sync_principal_roles().await;
        self.sync_catalogs().await;
    }

    fn listed<T>(
        &self,
        path: &EntityPath,
        side: Side,
        result: Result<Vec<T>, ApiError>,
    ) -> Option<Vec<T>> {
        match result {
            Ok(items) => {
                self.listener.handle(SyncEvent::Listed {
                    path: path.clone(),
                    side,
                    count: items.len(),
                });
                Some(items)
            }
            Err(error) => {
                self.listener.handle(SyncEvent::ListFailed {
                    path: path.clone(),
                    side,
                    error: &error,
                });
                None
            }
        }
    }

    fn emit_created(&self, path: EntityPath, result: Result<(), ApiError>) {
        self.listener.handle(SyncEvent::Created {
            path,
            error: result.as_ref().err(),
        });
    }

    fn emit_overwritten(&self, path: EntityPath, result: Result<(), ApiError>) {
        self.listener.handle(SyncEvent::Overwritten {
            path,
            error: result.as_ref().err(),
        });
    }

    fn emit_removed(&self, path: EntityPath, result: Result<(), ApiError>) {
        self.listener.handle(SyncEvent::Removed {
            path,
            error: result.as_ref().err(),
        });
    }

    pub async fn sync_principal_roles(&self) {
        let listing_path = EntityPath::principal_roles();

        let Some(source_roles) = self.listed(
            &listing_path,
            Side::Source,
            self.source.list_principal_roles().await,
        ) else {
            return;
        };
        let Some(target_roles) = self.listed(
            &listing_path,
            Side::Target,
            self.target.list_principal_roles().await,
        ) else {
            return;
        };

        let plan = self
            .planner
            .plan_principal_roles(source_roles.clone(), target_roles);

        for role in &plan.to_create {
            let result = self.target.create_principal_role(role).await;
            self.emit_created(EntityPath::principal_role(&role.name), result);
        }

        for target_role in &plan.to_retain {
            let Some(source_role) = source_roles.iter().find(|r| r.name == target_role.name)
            else {
                continue;
            };
            let path = EntityPath::principal_role(&target_role.name);

            if signature::has_changed(source_role, target_role) {
                let result = self.overwrite_principal_role(source_role).await;
                self.emit_overwritten(path, result);
            } else {
                self.listener.handle(SyncEvent::NotModified { path });
            }
        }

        for role in &plan.to_remove {
            let result = self.target.delete_principal_role(&role.name).await;
            self.emit_removed(EntityPath::principal_role(&role.name), result);
        }
    }

    async fn overwrite_principal_role(&self, role: &PrincipalRole) -> Result<(), ApiError> {
        self.target.delete_principal_role(&role.name).await?;
        self.target.create_principal_role(role).await
    }

    pub async fn sync_catalogs(&self) {
        let listing_path = EntityPath::catalogs();

        let Some(source_catalogs) = self.listed(
            &listing_path,
            Side::Source,
            self.source.list_catalogs().await,
        ) else {
            return;
        };
        let Some(target_catalogs) = self.listed(
            &listing_path,
            Side::Target,
            self.target.list_catalogs().await,
        ) else {
            return;
        };

        let plan = self
            .planner
            .plan_catalogs(source_catalogs.clone(), target_catalogs);

        for catalog in &plan.to_create {
            let result = self.target.create_catalog(catalog).await;
            self.emit_created(EntityPath::catalog(&catalog.name), result);
        }

        for target_catalog in &plan.to_retain {
            let Some(source_catalog) = source_catalogs
                .iter()
                .find(|c| c.name == target_catalog.name)
            else {
                continue;
            };
            let path = EntityPath::catalog(&target_catalog.name);

            if signature::has_changed(source_catalog, target_catalog) {
                let result = self.overwrite_catalog(source_catalog).await;
                self.emit_overwritten(path, result);
            } else {
                self.listener.handle(SyncEvent::NotModified { path });
            }
        }

        for catalog in &plan.to_remove {
            let result = self.remove_catalog_cascade(&catalog.name).await;
            self.emit_removed(EntityPath::catalog(&catalog.name), result);
        }

        // Child reconciliation covers every catalog that exists on both
        // sides after this level, unchanged parents included: their roles
        // and grants can still have drifted.
        for catalog in plan.to_create.iter().chain(&plan.to_retain) {
            self.sync_catalog_roles(&catalog.name).await;
        }
    }

    async fn overwrite_catalog(&self, catalog: &Catalog) -> Result<(), ApiError> {
        self.remove_catalog_cascade(&catalog.name).await?;
        self.target.create_catalog(catalog).await
    }

    /// Deleting a catalog requires its roles to go first; the built-in
    /// administrative role is removed by the service with the catalog.
    async fn remove_catalog_cascade(&self, catalog_name: &str) -> Result<(), ApiError> {
        let roles = self.target.list_catalog_roles(catalog_name).await?;

        for role in roles {
            if role.is_reserved() {
                continue;
            }
            self.target
                .delete_catalog_role(catalog_name, &role.name)
                .await?;
        }

        self.target.delete_catalog(catalog_name).await
    }

    pub async fn sync_catalog_roles(&self, catalog_name: &str) {
        let listing_path = EntityPath::catalog_roles(catalog_name);

        let Some(source_roles) = self.listed(
            &listing_path,
            Side::Source,
            self.source.list_catalog_roles(catalog_name).await,
        ) else {
            return;
        };
        let Some(target_roles) = self.listed(
            &listing_path,
            Side::Target,
            self.target.list_catalog_roles(catalog_name).await,
        ) else {
            return;
        };

        for role in source_roles.iter().filter(|r| r.is_reserved()) {
            self.listener.handle(SyncEvent::Skipped {
                path: EntityPath::catalog_role(catalog_name, &role.name),
            });
        }

        let plan = self
            .planner
            .plan_catalog_roles(source_roles.clone(), target_roles);

        for role in &plan.to_create {
            let result = self.target.create_catalog_role(catalog_name, role).await;
            self.emit_created(EntityPath::catalog_role(catalog_name, &role.name), result);
        }

        for target_role in &plan.to_retain {
            let Some(source_role) = source_roles.iter().find(|r| r.name == target_role.name)
            else {
                continue;
            };
            let path = EntityPath::catalog_role(catalog_name, &target_role.name);

            if signature::has_changed(source_role, target_role) {
                let result = self.overwrite_catalog_role(catalog_name, source_role).await;
                self.emit_overwritten(path, result);
            } else {
                self.listener.handle(SyncEvent::NotModified { path });
            }
        }

        for role in &plan.to_remove {
            let result = self
                .target
                .delete_catalog_role(catalog_name, &role.name)
                .await;
            self.emit_removed(EntityPath::catalog_role(catalog_name, &role.name), result);
        }

        for role in plan.to_create.iter().chain(&plan.to_retain) {
            self.sync_catalog_role_assignments(catalog_name, &role.name)
                .await;
            self.sync_grants(catalog_name, &role.name).await;
        }
    }

    async fn overwrite_catalog_role(
        &self,
        catalog_name: &str,
        role: &CatalogRole,
    ) -> Result<(), ApiError> {
        self.target
            .delete_catalog_role(catalog_name, &role.name)
            .await?;
        self.target.create_catalog_role(catalog_name, role).await
    }

    async fn sync_grants(&self, catalog_name: &str, role_name: &str) {
        let listing_path = EntityPath::grants(catalog_name, role_name);

        let Some(source_grants) = self.listed(
            &listing_path,
            Side::Source,
            self.source.list_grants(catalog_name, role_name).await,
        ) else {
            return;
        };
        let Some(target_grants) = self.listed(
            &listing_path,
            Side::Target,
            self.target.list_grants(catalog_name, role_name).await,
        ) else {
            return;
        };

        let plan = self.planner.plan_grants(source_grants, target_grants);

        for grant in &plan.to_create {
            let result = self.target.add_grant(catalog_name, role_name, grant).await;
            self.emit_created(EntityPath::grant(catalog_name, role_name, grant), result);
        }

        // Grant identity is the full structure, so a retained grant is by
        // definition unchanged.
        for grant in &plan.to_retain {
            self.listener.handle(SyncEvent::NotModified {
                path: EntityPath::grant(catalog_name, role_name, grant),
            });
        }

        for grant in &plan.to_remove {
            let result = self
                .target
                .revoke_grant(catalog_name, role_name, grant)
                .await;
            self.emit_removed(EntityPath::grant(catalog_name, role_name, grant), result);
        }
    }

    async fn sync_catalog_role_assignments(&self, catalog_name: &str, role_name: &str) {
        let listing_path = EntityPath::catalog_role_assignments(catalog_name, role_name);

        let Some(source_assignees) = self.listed(
            &listing_path,
            Side::Source,
            self.source
                .list_assignee_principal_roles(catalog_name, role_name)
                .await,
        ) else {
            return;
        };
        let Some(target_assignees) = self.listed(
            &listing_path,
            Side::Target,
            self.target
                .list_assignee_principal_roles(catalog_name, role_name)
                .await,
        ) else {
            return;
        };

        let plan = self
            .planner
            .plan_catalog_role_assignments(source_assignees, target_assignees);

        for principal_role in &plan.to_create {
            let result = self
                .target
                .assign_catalog_role(&principal_role.name, catalog_name, role_name)
                .await;
            self.emit_created(
                EntityPath::catalog_role_assignment(catalog_name, role_name, &principal_role.name),
                result,
            );
        }

        for principal_role in &plan.to_remove {
            let result = self
                .target
                .revoke_catalog_role(&principal_role.name, catalog_name, role_name)
                .await;
            self.emit_removed(
                EntityPath::catalog_role_assignment(catalog_name, role_name, &principal_role.name),
                result,
            );
        }
    }
}
