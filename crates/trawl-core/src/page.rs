//! Paced, cancellable page fetching with soft-failure classification.

use scraper::Html;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::compliance::{AllowAll, ComplianceGate};
use crate::error::AppError;
use crate::selector::SelectorCascade;
use crate::traits::{CompliancePolicy, Fetcher};

/// Expected, non-exceptional reasons a page yielded nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoftFailure {
    #[error("fetch error: {0}")]
    FetchError(String),
    #[error("empty body")]
    EmptyBody,
    /// The site answered with a login wall. Ends the current source run.
    #[error("auth wall")]
    AuthWall,
    #[error("blocked: {0}")]
    Blocked(String),
}

impl SoftFailure {
    pub fn is_auth_wall(&self) -> bool {
        matches!(self, SoftFailure::AuthWall)
    }
}

#[derive(Debug)]
pub enum PageOutcome {
    Document(Html),
    Soft(SoftFailure),
}

#[derive(Debug)]
pub enum BodyOutcome {
    Body(String),
    Soft(SoftFailure),
}

const AUTH_WALL_PATTERNS: &[&str] = &[
    ".authwall",
    "[class*='authwall']",
    "form[action*='login']",
    "form[action*='signin']",
    "form[action*='sign-in']",
    "form input[type='password']",
];

/// Fetches pages through a [`ComplianceGate`] and classifies the result.
///
/// Only cancellation is returned as `Err`; everything else that can go
/// wrong with a single page is a [`SoftFailure`] value.
#[derive(Clone)]
pub struct PageFetcher<F, P = AllowAll> {
    fetcher: F,
    gate: ComplianceGate<P>,
    auth_wall: SelectorCascade,
}

impl<F: Fetcher, P: CompliancePolicy> PageFetcher<F, P> {
    pub fn new(fetcher: F, gate: ComplianceGate<P>) -> Self {
        Self {
            fetcher,
            gate,
            auth_wall: default_auth_wall(),
        }
    }

    /// Replace the auth-wall signature.
    pub fn with_auth_wall(mut self, signature: SelectorCascade) -> Self {
        self.auth_wall = signature;
        self
    }

    pub fn gate(&self) -> &ComplianceGate<P> {
        &self.gate
    }

    /// Fetch and parse an HTML page.
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<PageOutcome, AppError> {
        let body = match self.fetch_body(url, cancel).await? {
            BodyOutcome::Body(body) => body,
            BodyOutcome::Soft(soft) => return Ok(PageOutcome::Soft(soft)),
        };

        let doc = Html::parse_document(&body);
        if self.auth_wall.matches(doc.root_element()) {
            tracing::warn!(%url, "Auth wall detected");
            return Ok(PageOutcome::Soft(SoftFailure::AuthWall));
        }
        Ok(PageOutcome::Document(doc))
    }

    /// Fetch a raw body (JSON APIs). Same classification minus the auth-wall check.
    pub async fn fetch_body(&self, url: &str, cancel: &CancellationToken) -> Result<BodyOutcome, AppError> {
        match self.gate.await_turn(url, cancel).await {
            Ok(()) => {}
            Err(AppError::Blocked(reason)) => {
                return Ok(BodyOutcome::Soft(SoftFailure::Blocked(reason)));
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => return Ok(BodyOutcome::Soft(SoftFailure::FetchError(e.to_string()))),
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AppError::Cancelled),
            result = self.fetcher.fetch(url) => result,
        };

        match result {
            Ok(body) if body.trim().is_empty() => {
                tracing::debug!(%url, "Empty body");
                Ok(BodyOutcome::Soft(SoftFailure::EmptyBody))
            }
            Ok(body) => Ok(BodyOutcome::Body(body)),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                if e.is_transient() {
                    tracing::debug!(%url, error = %e, "Fetch failed");
                } else {
                    tracing::warn!(%url, error = %e, "Fetcher returned an unexpected error");
                }
                Ok(BodyOutcome::Soft(SoftFailure::FetchError(e.to_string())))
            }
        }
    }
}

fn default_auth_wall() -> SelectorCascade {
    SelectorCascade::parse(AUTH_WALL_PATTERNS).unwrap_or_else(|_| SelectorCascade::empty())
}
