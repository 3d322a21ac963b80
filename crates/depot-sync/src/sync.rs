use tokio_util::sync::CancellationToken;

use crate::error::{SyncError, SyncResult};
use crate::source::SourceRegistry;

/// Outcome of a completed synchronization pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Sources whose `sync` ran, in order.
    pub synced: Vec<String>,
    /// Sources skipped as inactive, disabled, or lacking sync support.
    pub skipped: usize,
}

/// Synchronize users from every active, sync-enabled login source.
///
/// Sources run one at a time in registry order. `cancel` is checked before
/// each source starts; a source already running is left to finish. The first
/// failing source aborts the pass and its error is returned unchanged.
pub async fn sync_external_users(
    registry: &dyn SourceRegistry,
    cancel: &CancellationToken,
    update_existing: bool,
) -> SyncResult<SyncReport> {
    tracing::trace!("doing: sync_external_users");

    let sources = registry.login_sources().await.inspect_err(|e| {
        tracing::error!(error = %e, "sync_external_users: listing login sources failed");
    })?;

    let mut report = SyncReport::default();
    for source in &sources {
        if !source.wants_sync() {
            report.skipped += 1;
            continue;
        }
        if cancel.is_cancelled() {
            tracing::warn!(source = %source.name, "sync_external_users: cancelled before update");
            return Err(SyncError::Cancelled {
                name: source.name.clone(),
            });
        }

        let Some(syncable) = source.config.as_synchronizable() else {
            report.skipped += 1;
            continue;
        };
        tracing::debug!(source = %source.name, update_existing, "synchronizing login source");
        syncable.sync(cancel, update_existing).await?;
        report.synced.push(source.name.clone());
    }

    tracing::debug!(
        synced = report.synced.len(),
        skipped = report.skipped,
        "sync_external_users finished"
    );
    Ok(report)
}
