//! Synchronization event reporting
//!
//! The synchronizer reports every phase through a listener instead of the
//! shared migration log. Events carry the entity path so log lines from
//! different levels of the hierarchy stay correlatable.

use std::collections::BTreeMap;
use std::sync::Mutex;

use log::{error, info};

use crate::api::error::ApiError;
use crate::migrate::path::EntityPath;

/// Which side of the reconciliation a listing ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

/// One synchronization phase step, successful or not.
#[derive(Debug)]
pub enum SyncEvent<'a> {
    Listed {
        path: EntityPath,
        side: Side,
        count: usize,
    },
    ListFailed {
        path: EntityPath,
        side: Side,
        error: &'a ApiError,
    },
    Created {
        path: EntityPath,
        error: Option<&'a ApiError>,
    },
    Overwritten {
        path: EntityPath,
        error: Option<&'a ApiError>,
    },
    Removed {
        path: EntityPath,
        error: Option<&'a ApiError>,
    },
    /// Entity exists on both sides with an identical signature.
    NotModified { path: EntityPath },
    /// Reserved entity encountered on the source and left untouched.
    Skipped { path: EntityPath },
}

impl SyncEvent<'_> {
    /// Counter key for summaries. Failed steps count under their own key.
    pub fn counter(&self) -> &'static str {
        match self {
            SyncEvent::Listed { .. } => "listed",
            SyncEvent::ListFailed { .. } => "list_failed",
            SyncEvent::Created { error: None, .. } => "created",
            SyncEvent::Overwritten { error: None, .. } => "overwritten",
            SyncEvent::Removed { error: None, .. } => "removed",
            SyncEvent::Created { error: Some(_), .. }
            | SyncEvent::Overwritten { error: Some(_), .. }
            | SyncEvent::Removed { error: Some(_), .. } => "failed",
            SyncEvent::NotModified { .. } => "not_modified",
            SyncEvent::Skipped { .. } => "skipped",
        }
    }
}

pub trait SyncEventListener: Send + Sync {
    fn handle(&self, event: SyncEvent<'_>);
}

/// Listener that writes every event to the console log and tallies counts
/// for the end-of-run summary.
#[derive(Default)]
pub struct LoggingSyncEventListener {
    counts: Mutex<BTreeMap<&'static str, usize>>,
}

impl LoggingSyncEventListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.counts.lock().unwrap().clone()
    }

    pub fn log_summary(&self) {
        info!("Synchronization summary:");
        for (counter, count) in self.counts() {
            if counter != "listed" {
                info!("\t{} = {}", counter, count);
            }
        }
    }
}

impl SyncEventListener for LoggingSyncEventListener {
    fn handle(&self, event: SyncEvent<'_>) {
        match &event {
            SyncEvent::Listed { path, side, count } => {
                info!("Listed {} entities under {} on {}", count, path, side.label());
            }
            SyncEvent::ListFailed { path, side, error } => {
                error!("Failed to list {} on {}: {}", path, side.label(), error);
            }
            SyncEvent::Created { path, error: None } => info!("Created {}", path),
            SyncEvent::Created {
                path,
                error: Some(error),
            } => error!("Failed to create {}: {}", path, error),
            SyncEvent::Overwritten { path, error: None } => info!("Overwrote {}", path),
            SyncEvent::Overwritten {
                path,
                error: Some(error),
            } => error!("Failed to overwrite {}: {}", path, error),
            SyncEvent::Removed { path, error: None } => info!("Removed {}", path),
            SyncEvent::Removed {
                path,
                error: Some(error),
            } => error!("Failed to remove {}: {}", path, error),
            SyncEvent::NotModified { path } => info!("Not modified: {}", path),
            SyncEvent::Skipped { path } => info!("Skipped reserved entity {}", path),
        }

        *self.counts.lock().unwrap().entry(event.counter()).or_default() += 1;
    }
}
