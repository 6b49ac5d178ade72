//! Wire models for the Polaris management API

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of the built-in administrative role every catalog ships with.
/// It is managed by the service itself and must never be created,
/// overwritten or removed by this tool.
pub const RESERVED_CATALOG_ROLE: &str = "catalog_admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub catalog_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_config_info: Option<StorageConfigInfo>,
}

impl Catalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            catalog_type: None,
            properties: BTreeMap::new(),
            storage_config_info: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfigInfo {
    pub storage_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRole {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl CatalogRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.name == RESERVED_CATALOG_ROLE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalRole {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl PrincipalRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            client_id: None,
            properties: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalWithCredentials {
    pub principal: Principal,
    pub credentials: PrincipalCredentials,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// A grant held by a catalog role. Grants carry no name of their own, so
/// identity is the full structure: type, privilege and the securable path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GrantResource {
    Catalog {
        privilege: String,
    },
    Namespace {
        namespace: Vec<String>,
        privilege: String,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        namespace: Vec<String>,
        table_name: String,
        privilege: String,
    },
    #[serde(rename_all = "camelCase")]
    View {
        namespace: Vec<String>,
        view_name: String,
        privilege: String,
    },
}

impl GrantResource {
    pub fn privilege(&self) -> &str {
        match self {
            GrantResource::Catalog { privilege } => privilege,
            GrantResource::Namespace { privilege, .. } => privilege,
            GrantResource::Table { privilege, .. } => privilege,
            GrantResource::View { privilege, .. } => privilege,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            GrantResource::Catalog { .. } => "catalog",
            GrantResource::Namespace { .. } => "namespace",
            GrantResource::Table { .. } => "table",
            GrantResource::View { .. } => "view",
        }
    }
}

// Request and response envelopes. The management API wraps every listing
// and mutation payload in a single-field object.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogs {
    pub catalogs: Vec<Catalog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRoles {
    pub roles: Vec<CatalogRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalRoles {
    pub roles: Vec<PrincipalRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principals {
    pub principals: Vec<Principal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantResources {
    pub grants: Vec<GrantResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCatalogRequest {
    pub catalog: Catalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCatalogRoleRequest {
    pub catalog_role: CatalogRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePrincipalRequest {
    pub principal: Principal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePrincipalRoleRequest {
    pub principal_role: PrincipalRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddGrantRequest {
    pub grant: GrantResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeGrantRequest {
    pub grant: GrantResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantCatalogRoleRequest {
    pub catalog_role: CatalogRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantPrincipalRoleRequest {
    pub principal_role: PrincipalRole,
}
