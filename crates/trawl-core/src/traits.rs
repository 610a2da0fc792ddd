use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::AppError;
use crate::models::{CanonicalListing, HarvestQuery};

/// Fetches the raw body of a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Verdict of a [`CompliancePolicy`] for one outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Allow,
    /// Allow, but only after this much extra wait on top of the origin interval.
    Delay(Duration),
    Deny(String),
}

/// Decides whether a request may be issued at all.
pub trait CompliancePolicy: Send + Sync + Clone {
    fn check(&self, url: &Url) -> PolicyDecision;
}

/// The capability every listing source exposes.
///
/// `harvest` never fails for fetch or parse problems; it returns whatever
/// was collected. The only error that may cross this boundary is
/// [`AppError::Cancelled`], and only when the source is configured to
/// propagate cancellation.
pub trait Harvester {
    fn platform(&self) -> &str;

    fn harvest(
        &self,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<CanonicalListing>, AppError>>;

    /// Fetch one listing from its detail page. `Ok(None)` when the page
    /// cannot be fetched or parsed, or when the source needs no detail pass.
    fn harvest_detail(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Option<CanonicalListing>, AppError>>;
}
