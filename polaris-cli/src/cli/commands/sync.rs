//! Sync command handler

use std::sync::Arc;

use anyhow::Result;

use crate::cli::SyncArgs;
use crate::sync::{LoggingSyncEventListener, Synchronizer};

pub async fn run(args: SyncArgs) -> Result<()> {
    let (source, target) = args.connection.connect().await?;

    let listener = Arc::new(LoggingSyncEventListener::new());
    let synchronizer = Synchronizer::new(source, target, listener.clone());

    synchronizer.sync_all().await;
    listener.log_summary();

    Ok(())
}
