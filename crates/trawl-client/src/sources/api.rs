//! Shared harvester for hosted job-board JSON APIs.

use scraper::Html;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use trawl_core::compliance::AllowAll;
use trawl_core::dedup::{DedupPolicy, ListingSet};
use trawl_core::error::AppError;
use trawl_core::harvest::CancelMode;
use trawl_core::id::IdGenerator;
use trawl_core::models::{CanonicalListing, HarvestQuery};
use trawl_core::page::{BodyOutcome, PageFetcher};
use trawl_core::salary::SalaryParser;
use trawl_core::traits::{CompliancePolicy, Fetcher, Harvester};
use trawl_core::util::normalize_whitespace;

/// What a posting mapper needs besides the payload.
pub struct BoardContext<'a> {
    pub ids: &'a IdGenerator,
    pub company: &'a str,
    pub salary: &'a SalaryParser,
}

/// One hosted ATS: where its public board lives and how postings map.
pub trait BoardApi: Send + Sync + Clone {
    fn platform(&self) -> &'static str;

    fn board_url(&self, board: &str) -> String;

    /// Decode a board payload. The outer error rejects the whole payload;
    /// inner errors reject single postings.
    fn parse(
        &self,
        body: &str,
        ctx: &BoardContext<'_>,
    ) -> Result<Vec<Result<CanonicalListing, AppError>>, AppError>;
}

/// Harvester over one company board of a [`BoardApi`].
///
/// Boards are served in one response, so `max_pages` only matters when it
/// is zero. Keywords filter postings by title and skills; an empty query
/// returns the whole board.
#[derive(Clone)]
pub struct ApiHarvester<A, F, P = AllowAll> {
    api: A,
    board: String,
    company: String,
    pages: PageFetcher<F, P>,
    ids: IdGenerator,
    salary: SalaryParser,
    dedup: DedupPolicy,
    cancel_mode: CancelMode,
}

impl<A: BoardApi, F: Fetcher, P: CompliancePolicy> ApiHarvester<A, F, P> {
    pub fn new(api: A, board: &str, pages: PageFetcher<F, P>) -> Self {
        let ids = IdGenerator::new(api.platform());
        Self {
            api,
            board: board.to_string(),
            company: board.to_string(),
            pages,
            ids,
            salary: SalaryParser::default(),
            dedup: DedupPolicy::default(),
            cancel_mode: CancelMode::default(),
        }
    }

    /// Display name used as `company` on every posting.
    pub fn with_company(mut self, company: &str) -> Self {
        if !company.trim().is_empty() {
            self.company = company.trim().to_string();
        }
        self
    }

    /// Which posting survives when a board lists the same id twice.
    pub fn with_dedup(mut self, policy: DedupPolicy) -> Self {
        self.dedup = policy;
        self
    }

    pub fn with_cancel_mode(mut self, mode: CancelMode) -> Self {
        self.cancel_mode = mode;
        self
    }

    pub fn board(&self) -> &str {
        &self.board
    }

    async fn collect(
        &self,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        let platform = self.api.platform();
        if query.max_pages == 0 {
            return Ok(Vec::new());
        }

        let url = self.api.board_url(&self.board);
        let body = match self.pages.fetch_body(&url, cancel).await? {
            BodyOutcome::Body(body) => body,
            BodyOutcome::Soft(failure) => {
                tracing::warn!(%platform, board = %self.board, %failure, "Board unavailable");
                return Ok(Vec::new());
            }
        };

        let ctx = BoardContext {
            ids: &self.ids,
            company: &self.company,
            salary: &self.salary,
        };
        let postings = match self.api.parse(&body, &ctx) {
            Ok(postings) => postings,
            Err(error) => {
                tracing::warn!(%platform, board = %self.board, %error, "Board payload rejected");
                return Ok(Vec::new());
            }
        };

        let mut found = ListingSet::new(self.dedup);
        let mut skipped = 0usize;
        let mut duplicates = 0usize;
        for posting in postings {
            match posting {
                Ok(listing) if matches_query(&listing, query) => {
                    if !found.insert(listing) {
                        duplicates += 1;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    skipped += 1;
                    tracing::debug!(%platform, %error, "Posting skipped");
                }
            }
        }
        let listings = found.into_vec();

        tracing::info!(
            %platform,
            board = %self.board,
            count = listings.len(),
            skipped,
            duplicates,
            "Board harvested"
        );
        Ok(listings)
    }
}

impl<A: BoardApi, F: Fetcher, P: CompliancePolicy> Harvester for ApiHarvester<A, F, P> {
    fn platform(&self) -> &str {
        self.api.platform()
    }

    async fn harvest(
        &self,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        match self.collect(query, cancel).await {
            Err(e) if e.is_cancelled() && self.cancel_mode == CancelMode::ReturnPartial => {
                Ok(Vec::new())
            }
            other => other,
        }
    }

    /// Board payloads already carry full postings.
    async fn harvest_detail(
        &self,
        _url: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<CanonicalListing>, AppError> {
        Ok(None)
    }
}

/// Decode each record on its own, so a malformed posting only rejects itself.
pub fn decode_records<T: DeserializeOwned>(
    records: Vec<Value>,
) -> impl Iterator<Item = Result<T, AppError>> {
    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(AppError::from))
}

fn matches_query(listing: &CanonicalListing, query: &HarvestQuery) -> bool {
    let title = listing.title.to_lowercase();
    let mut keywords = query
        .keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .peekable();
    if keywords.peek().is_none() {
        return true;
    }
    keywords.any(|k| {
        title.contains(&k) || listing.required_skills.iter().any(|s| s.to_lowercase() == k)
    })
}

/// Plain text of an HTML fragment. Entity-escaped markup (as some APIs
/// return it) is unescaped and stripped as well.
pub fn html_to_text(fragment: &str) -> String {
    let once = Html::parse_fragment(fragment).root_element().text().collect::<String>();
    let text = if once.contains('<') && once.contains('>') {
        Html::parse_fragment(&once).root_element().text().collect::<String>()
    } else {
        once
    };
    normalize_whitespace(&text)
}
