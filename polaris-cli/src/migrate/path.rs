//! Hierarchical entity paths
//!
//! A path identifies any entity across both instances, e.g.
//! `CATALOG/sales/CATALOG_ROLE/analyst`. Used for log correlation and as
//! the key for change-signature lookups in the synchronizer.

use std::fmt;

use thiserror::Error;

use crate::api::models::GrantResource;

use super::kind::EntityKind;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("entity path requires at least one non-empty segment")]
pub struct InvalidPathError;

/// Immutable, order-sensitive sequence of path segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPath(Vec<String>);

impl EntityPath {
    pub fn new(segments: Vec<String>) -> Result<Self, InvalidPathError> {
        if segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(InvalidPathError);
        }
        Ok(Self(segments))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    fn from_parts(parts: Vec<&str>) -> Self {
        Self(parts.into_iter().map(String::from).collect())
    }

    pub fn catalogs() -> Self {
        Self::from_parts(vec![EntityKind::Catalog.as_str()])
    }

    pub fn catalog(catalog_name: &str) -> Self {
        Self::from_parts(vec![EntityKind::Catalog.as_str(), catalog_name])
    }

    pub fn catalog_roles(catalog_name: &str) -> Self {
        Self::from_parts(vec![
            EntityKind::Catalog.as_str(),
            catalog_name,
            EntityKind::CatalogRole.as_str(),
        ])
    }

    pub fn catalog_role(catalog_name: &str, role_name: &str) -> Self {
        Self::from_parts(vec![
            EntityKind::Catalog.as_str(),
            catalog_name,
            EntityKind::CatalogRole.as_str(),
            role_name,
        ])
    }

    pub fn grants(catalog_name: &str, role_name: &str) -> Self {
        Self::from_parts(vec![
            EntityKind::Catalog.as_str(),
            catalog_name,
            EntityKind::CatalogRole.as_str(),
            role_name,
            EntityKind::Grant.as_str(),
        ])
    }

    /// Grants have no name, so the path encodes the full securable
    /// identity: type, any namespace/table/view levels, and the privilege.
    pub fn grant(catalog_name: &str, role_name: &str, grant: &GrantResource) -> Self {
        let mut parts = vec![
            EntityKind::Catalog.as_str().to_string(),
            catalog_name.to_string(),
            EntityKind::CatalogRole.as_str().to_string(),
            role_name.to_string(),
            EntityKind::Grant.as_str().to_string(),
            grant.type_name().to_string(),
        ];

        match grant {
            GrantResource::Catalog { .. } => {}
            GrantResource::Namespace { namespace, .. } => {
                parts.extend(namespace.iter().cloned());
            }
            GrantResource::Table {
                namespace,
                table_name,
                ..
            } => {
                parts.extend(namespace.iter().cloned());
                parts.push(table_name.clone());
            }
            GrantResource::View {
                namespace,
                view_name,
                ..
            } => {
                parts.extend(namespace.iter().cloned());
                parts.push(view_name.clone());
            }
        }

        parts.push(grant.privilege().to_string());
        Self(parts)
    }

    pub fn principal_roles() -> Self {
        Self::from_parts(vec![EntityKind::PrincipalRole.as_str()])
    }

    pub fn principal_role(role_name: &str) -> Self {
        Self::from_parts(vec![EntityKind::PrincipalRole.as_str(), role_name])
    }

    pub fn catalog_role_assignments(catalog_name: &str, role_name: &str) -> Self {
        Self::from_parts(vec![
            EntityKind::Catalog.as_str(),
            catalog_name,
            EntityKind::CatalogRole.as_str(),
            role_name,
            EntityKind::CatalogRoleAssignment.as_str(),
        ])
    }

    pub fn catalog_role_assignment(
        catalog_name: &str,
        role_name: &str,
        principal_role_name: &str,
    ) -> Self {
        Self::from_parts(vec![
            EntityKind::Catalog.as_str(),
            catalog_name,
            EntityKind::CatalogRole.as_str(),
            role_name,
            EntityKind::CatalogRoleAssignment.as_str(),
            principal_role_name,
        ])
    }

}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}
