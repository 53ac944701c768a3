//! Crash-resume loop
//!
//! On startup, every definition whose execution record still contains a
//! WAITING job is re-invoked. The controller skips terminal jobs, so
//! resuming is idempotent: finished work stays finished, cancelled work
//! stays cancelled, and only the genuinely pending jobs run.

use std::sync::Arc;

use tracing::{error, info};

use crate::controller::Controller;
use crate::store::{ResultStore, StoreError};

pub async fn resume_pending_definitions(
    controller: &Controller,
    store: &Arc<dyn ResultStore>,
) -> Result<(), StoreError> {
    let pending = store.list_resumable_definitions().await?;
    if pending.is_empty() {
        return Ok(());
    }

    info!("Resuming {} interrupted definition(s)", pending.len());
    for definition in pending {
        match controller.invoke(&definition).await {
            Ok(result_definition) => {
                info!(
                    "Resumed definition {} ({} job(s))",
                    definition.id,
                    result_definition.result_jobs.len()
                );
            }
            Err(err) => {
                // One stuck definition must not block the rest; it stays
                // resumable for the next start.
                error!("Failed to resume definition {}: {}", definition.id, err);
            }
        }
    }
    Ok(())
}
