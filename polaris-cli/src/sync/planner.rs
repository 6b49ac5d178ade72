//! Synchronization planning
//!
//! Pure set reconciliation between a source and a target listing of the
//! same entity kind. The output partitions both inputs: everything only on
//! the source gets created, everything on both is retained (and may later
//! be overwritten if it changed), everything only on the target gets
//! removed.

use std::collections::HashSet;
use std::hash::Hash;

use crate::api::models::{Catalog, CatalogRole, GrantResource, PrincipalRole};

/// Three-way partition of a source and target listing.
///
/// `to_retain` holds the target-side copies so the caller can compare them
/// against their source counterparts for drift.
#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizationPlan<T> {
    pub to_create: Vec<T>,
    pub to_retain: Vec<T>,
    pub to_remove: Vec<T>,
}

impl<T> SynchronizationPlan<T> {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_retain.is_empty() && self.to_remove.is_empty()
    }
}

/// Partition `source` and `target` by the given identity function,
/// preserving each input's relative order.
pub fn plan<T, K, F>(source: Vec<T>, target: Vec<T>, identity: F) -> SynchronizationPlan<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    plan_with_exclusion(source, target, identity, |_| false)
}

/// Like [`plan`], but first drops every entity matching `excluded` from
/// both inputs so protected entities can never appear in any partition.
pub fn plan_with_exclusion<T, K, F, E>(
    source: Vec<T>,
    target: Vec<T>,
    identity: F,
    excluded: E,
) -> SynchronizationPlan<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
    E: Fn(&T) -> bool,
{
    let source: Vec<T> = source.into_iter().filter(|e| !excluded(e)).collect();
    let target: Vec<T> = target.into_iter().filter(|e| !excluded(e)).collect();

    let source_keys: HashSet<K> = source.iter().map(&identity).collect();
    let target_keys: HashSet<K> = target.iter().map(&identity).collect();

    let mut to_create = Vec::new();
    for entity in source {
        if !target_keys.contains(&identity(&entity)) {
            to_create.push(entity);
        }
    }

    let mut to_retain = Vec::new();
    let mut to_remove = Vec::new();
    for entity in target {
        if source_keys.contains(&identity(&entity)) {
            to_retain.push(entity);
        } else {
            to_remove.push(entity);
        }
    }

    SynchronizationPlan {
        to_create,
        to_retain,
        to_remove,
    }
}

/// Planner that drives the target towards parity with the source.
#[derive(Debug, Default)]
pub struct SourceParityPlanner;

impl SourceParityPlanner {
    pub fn plan_catalogs(
        &self,
        source: Vec<Catalog>,
        target: Vec<Catalog>,
    ) -> SynchronizationPlan<Catalog> {
        plan(source, target, |catalog| catalog.name.clone())
    }

    /// The built-in administrative role is excluded from every partition;
    /// it must never be created, overwritten or removed.
    pub fn plan_catalog_roles(
        &self,
        source: Vec<CatalogRole>,
        target: Vec<CatalogRole>,
    ) -> SynchronizationPlan<CatalogRole> {
        plan_with_exclusion(
            source,
            target,
            |role| role.name.clone(),
            CatalogRole::is_reserved,
        )
    }

    pub fn plan_principal_roles(
        &self,
        source: Vec<PrincipalRole>,
        target: Vec<PrincipalRole>,
    ) -> SynchronizationPlan<PrincipalRole> {
        plan(source, target, |role| role.name.clone())
    }

    /// Grants have no name; identity is the full structure.
    pub fn plan_grants(
        &self,
        source: Vec<GrantResource>,
        target: Vec<GrantResource>,
    ) -> SynchronizationPlan<GrantResource> {
        plan(source, target, Clone::clone)
    }

    /// Role assignments can be re-applied freely and have no overwrite
    /// concept, so every source assignment is planned as a create.
    pub fn plan_catalog_role_assignments(
        &self,
        source: Vec<PrincipalRole>,
        target: Vec<PrincipalRole>,
    ) -> SynchronizationPlan<PrincipalRole> {
        let source_names: HashSet<String> =
            source.iter().map(|role| role.name.clone()).collect();

        let to_remove = target
            .into_iter()
            .filter(|role| !source_names.contains(&role.name))
            .collect();

        SynchronizationPlan {
            to_create: source,
            to_retain: Vec::new(),
            to_remove,
        }
    }
}
