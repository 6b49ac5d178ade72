//! In-memory `ManagementApi` implementation for tests
//!
//! Behaves like a small Polaris instance: creates conflict on duplicate
//! names, deletes fail on missing entities, and every catalog ships with
//! the built-in administrative role. Listings and creates can be told to
//! fail to exercise the error paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::ManagementApi;
use super::error::ApiError;
use super::models::*;

#[derive(Default)]
struct FakeState {
    catalogs: Vec<Catalog>,
    catalog_roles: BTreeMap<String, Vec<CatalogRole>>,
    grants: BTreeMap<(String, String), Vec<GrantResource>>,
    assignee_roles: BTreeMap<(String, String), Vec<PrincipalRole>>,
    principals: Vec<Principal>,
    principal_roles: Vec<PrincipalRole>,
    assigned_roles: BTreeMap<String, Vec<PrincipalRole>>,
    fail_listings: HashSet<&'static str>,
    fail_creates: HashSet<String>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_catalog(&self, catalog: Catalog) {
        let mut state = self.state.lock().unwrap();
        let name = catalog.name.clone();
        state.catalogs.push(catalog);
        state
            .catalog_roles
            .entry(name)
            .or_default()
            .push(CatalogRole::new(RESERVED_CATALOG_ROLE));
    }

    pub fn seed_catalog_role(&self, catalog_name: &str, role: CatalogRole) {
        let mut state = self.state.lock().unwrap();
        state
            .catalog_roles
            .entry(catalog_name.to_string())
            .or_default()
            .push(role);
    }

    pub fn seed_grant(&self, catalog_name: &str, role_name: &str, grant: GrantResource) {
        let mut state = self.state.lock().unwrap();
        state
            .grants
            .entry((catalog_name.to_string(), role_name.to_string()))
            .or_default()
            .push(grant);
    }

    pub fn seed_assignee_role(&self, catalog_name: &str, role_name: &str, role: PrincipalRole) {
        let mut state = self.state.lock().unwrap();
        state
            .assignee_roles
            .entry((catalog_name.to_string(), role_name.to_string()))
            .or_default()
            .push(role);
    }

    pub fn seed_principal(&self, principal: Principal) {
        self.state.lock().unwrap().principals.push(principal);
    }

    pub fn seed_principal_role(&self, role: PrincipalRole) {
        self.state.lock().unwrap().principal_roles.push(role);
    }

    pub fn seed_assigned_role(&self, principal_name: &str, role: PrincipalRole) {
        let mut state = self.state.lock().unwrap();
        state
            .assigned_roles
            .entry(principal_name.to_string())
            .or_default()
            .push(role);
    }

    /// Make one listing endpoint fail. Keys: "catalogs", "catalog_roles",
    /// "grants", "assignee_roles", "principals", "principal_roles",
    /// "assigned_roles".
    pub fn fail_listing(&self, key: &'static str) {
        self.state.lock().unwrap().fail_listings.insert(key);
    }

    /// Make creation of the entity with the given name fail with a
    /// non-conflict error.
    pub fn fail_create(&self, name: &str) {
        self.state.lock().unwrap().fail_creates.insert(name.to_string());
    }

    pub fn catalog_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .catalogs
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn catalog_role_names(&self, catalog_name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .catalog_roles
            .get(catalog_name)
            .map(|roles| roles.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn principal_role_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .principal_roles
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn principal_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .principals
            .iter()
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn grants_for(&self, catalog_name: &str, role_name: &str) -> Vec<GrantResource> {
        self.state
            .lock()
            .unwrap()
            .grants
            .get(&(catalog_name.to_string(), role_name.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn assigned_role_names(&self, principal_name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .assigned_roles
            .get(principal_name)
            .map(|roles| roles.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn assignee_role_names(&self, catalog_name: &str, role_name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .assignee_roles
            .get(&(catalog_name.to_string(), role_name.to_string()))
            .map(|roles| roles.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    fn check_create(state: &FakeState, name: &str, exists: bool) -> Result<(), ApiError> {
        if state.fail_creates.contains(name) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("injected failure for {name}"),
            });
        }
        if exists {
            return Err(ApiError::Conflict {
                message: format!("{name} already exists"),
            });
        }
        Ok(())
    }

    fn listing_failure(key: &'static str) -> ApiError {
        ApiError::Status {
            status: 503,
            message: format!("injected listing failure: {key}"),
        }
    }
}

#[async_trait]
impl ManagementApi for FakeApi {
    async fn list_catalogs(&self) -> Result<Vec<Catalog>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("catalogs") {
            return Err(Self::listing_failure("catalogs"));
        }
        Ok(state.catalogs.clone())
    }

    async fn create_catalog(&self, catalog: &Catalog) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let exists = state.catalogs.iter().any(|c| c.name == catalog.name);
        Self::check_create(&state, &catalog.name, exists)?;

        state.catalogs.push(catalog.clone());
        state
            .catalog_roles
            .entry(catalog.name.clone())
            .or_default()
            .push(CatalogRole::new(RESERVED_CATALOG_ROLE));
        Ok(())
    }

    async fn delete_catalog(&self, catalog_name: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let before = state.catalogs.len();
        state.catalogs.retain(|c| c.name != catalog_name);
        if state.catalogs.len() == before {
            return Err(ApiError::NotFound {
                message: format!("catalog {catalog_name} not found"),
            });
        }
        state.catalog_roles.remove(catalog_name);
        Ok(())
    }

    async fn list_catalog_roles(&self, catalog_name: &str) -> Result<Vec<CatalogRole>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("catalog_roles") {
            return Err(Self::listing_failure("catalog_roles"));
        }
        Ok(state
            .catalog_roles
            .get(catalog_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_catalog_role(
        &self,
        catalog_name: &str,
        role: &CatalogRole,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let exists = state
            .catalog_roles
            .get(catalog_name)
            .is_some_and(|roles| roles.iter().any(|r| r.name == role.name));
        Self::check_create(&state, &role.name, exists)?;

        state
            .catalog_roles
            .entry(catalog_name.to_string())
            .or_default()
            .push(role.clone());
        Ok(())
    }

    async fn delete_catalog_role(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let roles = state
            .catalog_roles
            .get_mut(catalog_name)
            .ok_or_else(|| ApiError::NotFound {
                message: format!("catalog {catalog_name} not found"),
            })?;
        let before = roles.len();
        roles.retain(|r| r.name != role_name);
        if roles.len() == before {
            return Err(ApiError::NotFound {
                message: format!("catalog role {role_name} not found"),
            });
        }
        state
            .grants
            .remove(&(catalog_name.to_string(), role_name.to_string()));
        Ok(())
    }

    async fn list_grants(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<Vec<GrantResource>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("grants") {
            return Err(Self::listing_failure("grants"));
        }
        Ok(state
            .grants
            .get(&(catalog_name.to_string(), role_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn add_grant(
        &self,
        catalog_name: &str,
        role_name: &str,
        grant: &GrantResource,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_creates.contains(grant.privilege()) {
            return Err(ApiError::Status {
                status: 500,
                message: format!("injected failure for {}", grant.privilege()),
            });
        }
        let grants = state
            .grants
            .entry((catalog_name.to_string(), role_name.to_string()))
            .or_default();
        // Grant addition is idempotent on the real service
        if !grants.contains(grant) {
            grants.push(grant.clone());
        }
        Ok(())
    }

    async fn revoke_grant(
        &self,
        catalog_name: &str,
        role_name: &str,
        grant: &GrantResource,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(grants) = state
            .grants
            .get_mut(&(catalog_name.to_string(), role_name.to_string()))
        {
            grants.retain(|g| g != grant);
        }
        Ok(())
    }

    async fn list_assignee_principal_roles(
        &self,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<Vec<PrincipalRole>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("assignee_roles") {
            return Err(Self::listing_failure("assignee_roles"));
        }
        Ok(state
            .assignee_roles
            .get(&(catalog_name.to_string(), role_name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_catalog_role(
        &self,
        principal_role_name: &str,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let assignees = state
            .assignee_roles
            .entry((catalog_name.to_string(), role_name.to_string()))
            .or_default();
        if !assignees.iter().any(|r| r.name == principal_role_name) {
            assignees.push(PrincipalRole::new(principal_role_name));
        }
        Ok(())
    }

    async fn revoke_catalog_role(
        &self,
        principal_role_name: &str,
        catalog_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(assignees) = state
            .assignee_roles
            .get_mut(&(catalog_name.to_string(), role_name.to_string()))
        {
            assignees.retain(|r| r.name != principal_role_name);
        }
        Ok(())
    }

    async fn list_principals(&self) -> Result<Vec<Principal>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("principals") {
            return Err(Self::listing_failure("principals"));
        }
        Ok(state.principals.clone())
    }

    async fn create_principal(
        &self,
        principal: &Principal,
    ) -> Result<PrincipalWithCredentials, ApiError> {
        let mut state = self.state.lock().unwrap();
        let exists = state.principals.iter().any(|p| p.name == principal.name);
        Self::check_create(&state, &principal.name, exists)?;

        state.principals.push(principal.clone());
        Ok(PrincipalWithCredentials {
            principal: principal.clone(),
            credentials: PrincipalCredentials {
                client_id: format!("{}-client-id", principal.name),
                client_secret: format!("{}-secret", principal.name),
            },
        })
    }

    async fn delete_principal(&self, principal_name: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let before = state.principals.len();
        state.principals.retain(|p| p.name != principal_name);
        if state.principals.len() == before {
            return Err(ApiError::NotFound {
                message: format!("principal {principal_name} not found"),
            });
        }
        Ok(())
    }

    async fn list_principal_roles(&self) -> Result<Vec<PrincipalRole>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("principal_roles") {
            return Err(Self::listing_failure("principal_roles"));
        }
        Ok(state.principal_roles.clone())
    }

    async fn create_principal_role(&self, role: &PrincipalRole) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let exists = state.principal_roles.iter().any(|r| r.name == role.name);
        Self::check_create(&state, &role.name, exists)?;

        state.principal_roles.push(role.clone());
        Ok(())
    }

    async fn delete_principal_role(&self, role_name: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let before = state.principal_roles.len();
        state.principal_roles.retain(|r| r.name != role_name);
        if state.principal_roles.len() == before {
            return Err(ApiError::NotFound {
                message: format!("principal role {role_name} not found"),
            });
        }
        Ok(())
    }

    async fn list_principal_roles_assigned(
        &self,
        principal_name: &str,
    ) -> Result<Vec<PrincipalRole>, ApiError> {
        let state = self.state.lock().unwrap();
        if state.fail_listings.contains("assigned_roles") {
            return Err(Self::listing_failure("assigned_roles"));
        }
        Ok(state
            .assigned_roles
            .get(principal_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_principal_role(
        &self,
        principal_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        let assigned = state
            .assigned_roles
            .entry(principal_name.to_string())
            .or_default();
        if !assigned.iter().any(|r| r.name == role_name) {
            assigned.push(PrincipalRole::new(role_name));
        }
        Ok(())
    }

    async fn revoke_principal_role(
        &self,
        principal_name: &str,
        role_name: &str,
    ) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        if let Some(assigned) = state.assigned_roles.get_mut(principal_name) {
            assigned.retain(|r| r.name != role_name);
        }
        Ok(())
    }
}
