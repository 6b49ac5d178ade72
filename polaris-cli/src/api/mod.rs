//! Polaris Management API Module
//!
//! Everything needed to talk to one Polaris instance: the wire models, the
//! OAuth2 token exchange, a reqwest-backed client, and the `ManagementApi`
//! trait that the migration and synchronization engines are written
//! against so they can run against an in-memory instance in tests.

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod resilience;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;

pub use client::PolarisClient;
pub use error::ApiError;
pub use models::{
    Catalog, CatalogRole, GrantResource, Principal, PrincipalRole, PrincipalWithCredentials,
    RESERVED_CATALOG_ROLE,
};
pub use resilience::ConcurrencyLimiter;

/// Operations the migration engines need from a Polaris instance.
///
/// One method per remote call; every error carries the conflict/not-found
/// classification the callers branch on.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn list_catalogs(&self) -> Result<Vec<Catalog>, ApiError>;
    async fn create_catalog(&self, catalog: &Catalog) -> Result<(), ApiError>;
    async fn delete_catalog(&self, catalog_name: &str) -> Result<(), ApiError>;

    async fn list_catalog_roles(&self, catalog_name: &str) -> Result<Vec<CatalogRole>, ApiError>;
    async fn create_catalog_role(
        &self,
        catalog_name: &str,
        role: &CatalogRole,
    ) -> Result<(), ApiError>;
    async fn delete_catalog_role(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError>;

    async fn list_grants(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<Vec<GrantResource>, ApiError>;
    async fn add_grant(
        &self,
        catalog_name: &str,
        role_name: &str,
        grant: &GrantResource,
    ) -> Result<(), ApiError>;
    async fn revoke_grant(
        &self,
        catalog_name: &str,
        role_name: &str,
        grant: &GrantResource,
    ) -> Result<(), ApiError>;

    /// Principal roles that hold the given catalog role.
    async fn list_assignee_principal_roles(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<Vec<PrincipalRole>, ApiError>;
    async fn assign_catalog_role(
        &self,
        principal_role_name: &str,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError>;
    async fn revoke_catalog_role(
        &self,
        principal_role_name: &str,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError>;

    async fn list_principals(&self) -> Result<Vec<Principal>, ApiError>;
    async fn create_principal(
        &self,
        principal: &Principal,
    ) -> Result<PrincipalWithCredentials, ApiError>;
    async fn delete_principal(&self, principal_name: &str) -> Result<(), ApiError>;

    async fn list_principal_roles(&self) -> Result<Vec<PrincipalRole>, ApiError>;
    async fn create_principal_role(&self, role: &PrincipalRole) -> Result<(), ApiError>;
    async fn delete_principal_role(&self, role_name: &str) -> Result<(), ApiError>;

    /// Principal roles assigned to the given principal.
    async fn list_principal_roles_assigned(
        &self,
        principal_name: &str,
    ) -> Result<Vec<PrincipalRole>, ApiError>;
    async fn assign_principal_role(
        &self,
        principal_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError>;
    async fn revoke_principal_role(
        &self,
        principal_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError>;
}
