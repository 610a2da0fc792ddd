use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::{CanonicalListing, HarvestQuery};
use crate::traits::Harvester;

/// Outcome of one source within a multi-source run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRun {
    pub platform: String,
    pub listings: Vec<CanonicalListing>,
    pub error: Option<String>,
}

/// Run several harvesters concurrently with the same query.
///
/// A failing source is recorded in its [`SourceRun`] and never affects the
/// others. Cancellation re-raised by any harvester aborts the whole run
/// with [`AppError::Cancelled`].
pub async fn harvest_all<H: Harvester>(
    harvesters: &[H],
    query: &HarvestQuery,
    cancel: &CancellationToken,
) -> Result<Vec<SourceRun>, AppError> {
    let results = join_all(harvesters.iter().map(|h| h.harvest(query, cancel))).await;

    let mut runs = Vec::with_capacity(results.len());
    for (harvester, result) in harvesters.iter().zip(results) {
        let platform = harvester.platform().to_string();
        match result {
            Ok(listings) => {
                tracing::info!(%platform, count = listings.len(), "Source finished");
                runs.push(SourceRun {
                    platform,
                    listings,
                    error: None,
                });
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!(%platform, "Source propagated cancellation, aborting run");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(%platform, error = %e, "Source failed");
                runs.push(SourceRun {
                    platform,
                    listings: Vec::new(),
                    error: Some(e.to_string()),
                });
            }
        }
    }
    Ok(runs)
}
