//! Test utilities: handwritten mocks for the core traits.
//!
//! All mocks use `Arc<Mutex<_>>` for interior mutability so tests can
//! assert on recorded calls after handing a clone to the code under test.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::id::IdGenerator;
use crate::models::{CanonicalListing, HarvestQuery, ListingBuilder};
use crate::traits::{Fetcher, Harvester};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher answering from per-URL routes, then a response queue, then
/// a fallback body. Every requested URL is recorded.
#[derive(Clone, Default)]
pub struct MockFetcher {
    routes: Arc<Mutex<HashMap<String, String>>>,
    /// Each unrouted call pops the first element.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    /// Returned once routes and queue are exhausted.
    fallback: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    /// Answer every call with the same body.
    pub fn repeating(body: &str) -> Self {
        Self::default().or_else(body)
    }

    pub fn route(self, url: &str, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
        self
    }

    pub fn or_else(self, body: &str) -> Self {
        *self.fallback.lock().unwrap() = Some(body.to_string());
        self
    }

    /// URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(body) = self.routes.lock().unwrap().get(url) {
            return Ok(body.clone());
        }
        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            return responses.remove(0);
        }
        match self.fallback.lock().unwrap().as_ref() {
            Some(body) => Ok(body.clone()),
            None => Ok("<html><body>default</body></html>".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockHarvester
// ---------------------------------------------------------------------------

/// Mock harvester returning a fixed result and recording queries.
#[derive(Clone)]
pub struct MockHarvester {
    platform: String,
    listings: Vec<CanonicalListing>,
    cancelled: bool,
    pub queries: Arc<Mutex<Vec<HarvestQuery>>>,
}

impl MockHarvester {
    pub fn new(platform: &str, listings: Vec<CanonicalListing>) -> Self {
        Self {
            platform: platform.to_string(),
            listings,
            cancelled: false,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Harvester that propagates cancellation.
    pub fn cancelling(platform: &str) -> Self {
        Self {
            cancelled: true,
            ..Self::new(platform, Vec::new())
        }
    }
}

impl Harvester for MockHarvester {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn harvest(
        &self,
        query: &HarvestQuery,
        _cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.cancelled {
            return Err(AppError::Cancelled);
        }
        Ok(self.listings.clone())
    }

    async fn harvest_detail(
        &self,
        url: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<CanonicalListing>, AppError> {
        Ok(self.listings.iter().find(|l| l.url == url).cloned())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A minimal valid listing.
pub fn listing(platform: &str, native_id: &str, title: &str) -> CanonicalListing {
    ListingBuilder::new(&IdGenerator::new(platform), native_id)
        .title(title)
        .company("Acme")
        .description("")
        .url(format!("https://example.com/jobs/{native_id}"))
        .build()
        .expect("fixture listing is valid")
}
