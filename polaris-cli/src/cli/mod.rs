//! Command-line surface

pub mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConnectionArgs;

#[derive(Debug, Parser)]
#[command(
    name = "polaris-cli",
    version,
    about = "Migrate and synchronize Polaris management entities between instances"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bulk-copy management entities to the target instance. Entities are
    /// never removed from the source.
    Migrate(MigrateArgs),
    /// Reconcile the target instance against the source: create what is
    /// missing, overwrite what changed, remove what the source no longer
    /// has.
    Sync(SyncArgs),
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Number of entities migrated in parallel within one task
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// CSV file the per-entity results are written to
    #[arg(long)]
    pub output_file: PathBuf,

    #[command(subcommand)]
    pub scope: MigrateScope,
}

#[derive(Debug, Subcommand)]
pub enum MigrateScope {
    /// Migrate every supported entity kind
    All,
    /// Migrate catalogs, optionally including their sub-entities
    Catalogs {
        #[arg(long)]
        include_catalog_roles: bool,
        #[arg(long)]
        include_grants: bool,
        #[arg(long)]
        include_catalog_role_assignments: bool,
    },
    /// Migrate principals
    Principals {
        #[arg(long)]
        include_principal_role_assignments: bool,
    },
    /// Migrate principal roles
    PrincipalRoles,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    const CONNECTION: &[&str] = &[
        "--source-base-url",
        "https://src.example.com",
        "--source-access-token",
        "s",
        "--target-base-url",
        "https://dst.example.com",
        "--target-access-token",
        "t",
    ];

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["polaris-cli"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn test_migrate_all_with_defaults() {
        let mut args = vec!["migrate"];
        args.extend_from_slice(CONNECTION);
        args.extend_from_slice(&["--output-file", "results.csv", "all"]);

        let cli = parse(&args);
        let Commands::Migrate(migrate) = cli.command else {
            panic!("expected migrate command");
        };
        assert_eq!(migrate.concurrency, 1);
        assert_eq!(migrate.connection.timeout_secs, 30);
        assert!(matches!(migrate.scope, MigrateScope::All));
    }

    #[test]
    fn test_migrate_catalogs_flags() {
        let mut args = vec!["migrate"];
        args.extend_from_slice(CONNECTION);
        args.extend_from_slice(&[
            "--output-file",
            "results.csv",
            "--concurrency",
            "8",
            "catalogs",
            "--include-catalog-roles",
            "--include-grants",
        ]);

        let cli = parse(&args);
        let Commands::Migrate(migrate) = cli.command else {
            panic!("expected migrate command");
        };
        assert_eq!(migrate.concurrency, 8);
        match migrate.scope {
            MigrateScope::Catalogs {
                include_catalog_roles,
                include_grants,
                include_catalog_role_assignments,
            } => {
                assert!(include_catalog_roles);
                assert!(include_grants);
                assert!(!include_catalog_role_assignments);
            }
            other => panic!("unexpected scope {other:?}"),
        }
    }

    #[test]
    fn test_sync_parses() {
        let mut args = vec!["sync"];
        args.extend_from_slice(CONNECTION);

        let cli = parse(&args);
        assert!(matches!(cli.command, Commands::Sync(_)));
    }

    #[test]
    fn test_output_file_required_for_migrate() {
        let mut args = vec!["polaris-cli", "migrate"];
        args.extend_from_slice(CONNECTION);
        args.push("all");

        assert!(Cli::try_parse_from(args).is_err());
    }
}
