//! Entity kinds and their static dependency graph

use std::fmt;

/// The closed set of management entity kinds this tool moves between
/// instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Catalog,
    CatalogRole,
    Grant,
    Principal,
    PrincipalRole,
    CatalogRoleAssignment,
    PrincipalRoleAssignment,
}

impl EntityKind {
    /// Kinds whose migration must have fully finished before a task of
    /// this kind may start. The lists are transitively closed, so a task
    /// is ready as soon as no task of any listed kind remains queued.
    ///
    /// | kind                      | depends on                             |
    /// |---------------------------|----------------------------------------|
    /// | Catalog                   | -                                      |
    /// | CatalogRole               | Catalog                                |
    /// | Grant                     | Catalog, CatalogRole                   |
    /// | CatalogRoleAssignment     | Catalog, CatalogRole, PrincipalRole    |
    /// | Principal                 | -                                      |
    /// | PrincipalRoleAssignment   | Principal, PrincipalRole               |
    /// | PrincipalRole             | -                                      |
    pub fn dependencies(self) -> &'static [EntityKind] {
        use EntityKind::*;

        match self {
            Catalog => &[],
            CatalogRole => &[Catalog],
            Grant => &[Catalog, CatalogRole],
            CatalogRoleAssignment => &[Catalog, CatalogRole, PrincipalRole],
            Principal => &[],
            PrincipalRoleAssignment => &[Principal, PrincipalRole],
            PrincipalRole => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Catalog => "CATALOG",
            EntityKind::CatalogRole => "CATALOG_ROLE",
            EntityKind::Grant => "GRANT",
            EntityKind::Principal => "PRINCIPAL",
            EntityKind::PrincipalRole => "PRINCIPAL_ROLE",
            EntityKind::CatalogRoleAssignment => "CATALOG_ROLE_ASSIGNMENT",
            EntityKind::PrincipalRoleAssignment => "PRINCIPAL_ROLE_ASSIGNMENT",
        }
    }

    /// Lowercase, space-separated form for log lines.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Catalog => "catalog",
            EntityKind::CatalogRole => "catalog role",
            EntityKind::Grant => "grant",
            EntityKind::Principal => "principal",
            EntityKind::PrincipalRole => "principal role",
            EntityKind::CatalogRoleAssignment => "catalog role assignment",
            EntityKind::PrincipalRoleAssignment => "principal role assignment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [EntityKind; 7] = [
        EntityKind::Catalog,
        EntityKind::CatalogRole,
        EntityKind::Grant,
        EntityKind::Principal,
        EntityKind::PrincipalRole,
        EntityKind::CatalogRoleAssignment,
        EntityKind::PrincipalRoleAssignment,
    ];

    #[test]
    fn test_dependency_graph_is_acyclic() {
        // Walk every dependency chain; the graph is tiny, so a depth
        // bound larger than the kind count proves acyclicity.
        fn depth(kind: EntityKind, remaining: usize) -> usize {
            assert!(remaining > 0, "cycle detected at {kind}");
            kind.dependencies()
                .iter()
                .map(|d| 1 + depth(*d, remaining - 1))
                .max()
                .unwrap_or(0)
        }

        for kind in ALL {
            depth(kind, ALL.len() + 1);
        }
    }

    #[test]
    fn test_dependency_lists_are_transitively_closed() {
        for kind in ALL {
            for dep in kind.dependencies() {
                for transitive in dep.dependencies() {
                    assert!(
                        kind.dependencies().contains(transitive),
                        "{kind} depends on {dep} but not on its dependency {transitive}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_roots_have_no_dependencies() {
        assert!(EntityKind::Catalog.dependencies().is_empty());
        assert!(EntityKind::Principal.dependencies().is_empty());
        assert!(EntityKind::PrincipalRole.dependencies().is_empty());
    }
}
