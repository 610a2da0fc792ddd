//! Data-configured listing harvester.
//!
//! One [`SourceHarvester`] drives every HTML source. Per-source behaviour
//! (URL template, pagination style, selector cascades, id rule, defaults)
//! is a [`SourceConfig`] value.
//!
//! A run is an explicit state machine:
//!
//! ```text
//! Start -> FetchingPage(1) -> HasCards -> Emitting -> CheckNextPage -> FetchingPage(2) ...
//!                  |                                        |
//!                  +-> Stop (page limit, soft failure,      +-> Stop (no next indicator,
//!                        no cards)                                    short offset page)
//! any await point -> Cancelled
//! ```

use std::fmt;

use chrono::Utc;
use regex::Regex;
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::classify::{
    EngagementType, GeoRestriction, RemotePolicy, SeniorityLevel, classify_engagement_or,
    classify_geo_or, classify_remote_or, classify_seniority, classify_seniority_or,
};
use crate::compliance::AllowAll;
use crate::dates::parse_posted_date;
use crate::dedup::{DedupPolicy, ListingSet};
use crate::error::AppError;
use crate::id::IdGenerator;
use crate::models::{CanonicalListing, HarvestQuery, ListingBuilder, ListingKind};
use crate::page::{PageFetcher, PageOutcome, SoftFailure};
use crate::report::{HarvestEvent, HarvestReporter, TracingHarvestReporter};
use crate::salary::SalaryParser;
use crate::selector::{SelectorCascade, element_text};
use crate::skills::{DEFAULT_VOCABULARY, extract_skills};
use crate::traits::{CompliancePolicy, Fetcher, Harvester};
use crate::util::{canonicalize_url, normalize_whitespace, split_location};

/// How result pages are addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// `{page}` is the page number, counting from `first`.
    PageNumber { first: u32 },
    /// `{page}` is the zero-based offset of the first result. A page with
    /// fewer than `page_size` cards is the last one.
    Offset { page_size: u32 },
    /// Page 1 comes from the template (`{page}` empty); later pages follow
    /// the `href` of the next-page indicator.
    NextLink,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::PageNumber { first: 1 }
    }
}

/// Where a card's source-native id comes from.
#[derive(Debug, Clone)]
pub enum NativeIdRule {
    /// Attribute on the card element, or on its first descendant carrying it.
    CardAttr(String),
    /// Capture group 1 of a pattern applied to the listing URL.
    UrlPattern(Regex),
    /// Last non-empty path segment of the listing URL.
    UrlPathTail,
    /// The canonical listing URL itself.
    Url,
}

impl NativeIdRule {
    /// Build a [`NativeIdRule::UrlPattern`], rejecting invalid patterns.
    pub fn url_pattern(pattern: &str) -> Result<Self, AppError> {
        Regex::new(pattern)
            .map(NativeIdRule::UrlPattern)
            .map_err(|e| AppError::ConfigError(format!("invalid id pattern `{pattern}`: {e}")))
    }

    fn resolve_card(&self, card: ElementRef<'_>, url: &str) -> Option<String> {
        match self {
            NativeIdRule::CardAttr(attr) => card
                .descendants()
                .filter_map(ElementRef::wrap)
                .find_map(|el| el.value().attr(attr))
                .map(|id| id.trim().to_string()),
            rule => rule.resolve_url(url),
        }
    }

    /// Id derivable from the URL alone. Card-attribute rules fall back to
    /// the path tail.
    fn resolve_url(&self, url: &str) -> Option<String> {
        match self {
            NativeIdRule::UrlPattern(re) => re
                .captures(url)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
            NativeIdRule::Url => Some(url.to_string()),
            NativeIdRule::CardAttr(_) | NativeIdRule::UrlPathTail => Url::parse(url)
                .ok()?
                .path_segments()?
                .rev()
                .find(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Selector cascades for the fields of one listing.
///
/// Empty cascades never match. Anchor cards fall back to their own text
/// and `href`, which lets link-only fallback tiers still parse.
#[derive(Debug, Clone)]
pub struct FieldSelectors {
    pub title: SelectorCascade,
    pub link: SelectorCascade,
    pub company: SelectorCascade,
    pub location: SelectorCascade,
    pub salary: SelectorCascade,
    pub description: SelectorCascade,
    pub tags: SelectorCascade,
    pub posted: SelectorCascade,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            title: SelectorCascade::empty(),
            link: SelectorCascade::empty(),
            company: SelectorCascade::empty(),
            location: SelectorCascade::empty(),
            salary: SelectorCascade::empty(),
            description: SelectorCascade::empty(),
            tags: SelectorCascade::empty(),
            posted: SelectorCascade::empty(),
        }
    }
}

/// Values used when a listing carries no signal of its own.
#[derive(Debug, Clone)]
pub struct SourceDefaults {
    pub seniority: SeniorityLevel,
    pub remote: RemotePolicy,
    pub engagement: EngagementType,
    pub geo: GeoRestriction,
    pub company: Option<String>,
}

impl Default for SourceDefaults {
    fn default() -> Self {
        Self {
            seniority: SeniorityLevel::Unknown,
            remote: RemotePolicy::Unknown,
            engagement: EngagementType::Unknown,
            geo: GeoRestriction::Unknown,
            company: None,
        }
    }
}

/// What a harvester does when it observes cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelMode {
    /// Stop and return what was collected.
    #[default]
    ReturnPartial,
    /// Stop and return [`AppError::Cancelled`].
    Propagate,
}

/// Everything that distinguishes one HTML source from another.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub platform: String,
    pub kind: ListingKind,
    /// Search URL with `{keywords}` and `{page}` placeholders.
    pub search_url: String,
    pub pagination: Pagination,
    pub cards: SelectorCascade,
    /// Broader tier tried only when `cards` finds nothing.
    pub fallback_cards: SelectorCascade,
    pub fields: FieldSelectors,
    /// Presence of a match means another page exists. Empty: always assume one.
    pub next_page: SelectorCascade,
    /// Detail-page selectors. `None` when summaries are complete.
    pub detail: Option<FieldSelectors>,
    pub native_id: NativeIdRule,
    pub defaults: SourceDefaults,
    pub salary: SalaryParser,
    pub dedup: DedupPolicy,
    pub cancel_mode: CancelMode,
}

impl SourceConfig {
    /// Config with empty selectors, page-number pagination and path-tail ids.
    pub fn new(platform: impl Into<String>, search_url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            kind: ListingKind::Job,
            search_url: search_url.into(),
            pagination: Pagination::default(),
            cards: SelectorCascade::empty(),
            fallback_cards: SelectorCascade::empty(),
            fields: FieldSelectors::default(),
            next_page: SelectorCascade::empty(),
            detail: None,
            native_id: NativeIdRule::UrlPathTail,
            defaults: SourceDefaults::default(),
            salary: SalaryParser::default(),
            dedup: DedupPolicy::default(),
            cancel_mode: CancelMode::default(),
        }
    }

    /// URL of result page `page` (1-based) for `keywords`.
    fn page_url(&self, keywords: &str, page: u32) -> String {
        let page_value = match self.pagination {
            Pagination::PageNumber { first } => (first + page - 1).to_string(),
            Pagination::Offset { page_size } => ((page - 1) * page_size).to_string(),
            Pagination::NextLink => String::new(),
        };
        let encoded: String = url::form_urlencoded::byte_serialize(keywords.as_bytes()).collect();
        self.search_url
            .replace("{keywords}", &encoded)
            .replace("{page}", &page_value)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.platform.trim().is_empty() {
            return Err(AppError::ConfigError("platform name is empty".into()));
        }
        if self.cards.is_empty() && self.fallback_cards.is_empty() {
            return Err(AppError::ConfigError(format!(
                "{}: no card selectors configured",
                self.platform
            )));
        }
        if let Pagination::Offset { page_size: 0 } = self.pagination {
            return Err(AppError::ConfigError(format!(
                "{}: offset pagination needs a page size",
                self.platform
            )));
        }
        let probe = self.page_url("probe", 1);
        Url::parse(&probe).map_err(|e| {
            AppError::ConfigError(format!(
                "{}: search URL template `{}` is not a URL: {e}",
                self.platform, self.search_url
            ))
        })?;
        Ok(())
    }
}

/// Why a harvest run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    PageLimit,
    Soft(SoftFailure),
    NoCards,
    NoNextPage,
    ShortPage,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::PageLimit => write!(f, "page limit reached"),
            StopReason::Soft(soft) => write!(f, "{soft}"),
            StopReason::NoCards => write!(f, "no cards found"),
            StopReason::NoNextPage => write!(f, "no next page"),
            StopReason::ShortPage => write!(f, "short page"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one harvest run.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub listings: Vec<CanonicalListing>,
    pub pages_fetched: u32,
    pub cards_skipped: usize,
    pub stop: StopReason,
}

/// Cards of one fetched page, already parsed so the document can be dropped.
#[derive(Debug)]
struct PageScan {
    cards: Vec<Result<CanonicalListing, AppError>>,
    tier: Option<usize>,
    has_next: bool,
    next_href: Option<String>,
}

enum State {
    Start,
    FetchingPage { page: u32, url: String },
    HasCards { page: u32, scan: PageScan },
    Emitting { page: u32, cards: Vec<Result<CanonicalListing, AppError>>, next: NextPage },
    CheckNextPage { page: u32, card_count: usize, next: NextPage },
    Stop(StopReason),
    Cancelled,
}

struct NextPage {
    has_next: bool,
    href: Option<String>,
}

/// Generic HTML harvester driven by a [`SourceConfig`].
#[derive(Clone)]
pub struct SourceHarvester<F, P = AllowAll> {
    config: SourceConfig,
    pages: PageFetcher<F, P>,
    ids: IdGenerator,
}

impl<F: Fetcher, P: CompliancePolicy> SourceHarvester<F, P> {
    /// Validates the config: a bad URL template or missing card selectors
    /// is a [`AppError::ConfigError`].
    pub fn new(config: SourceConfig, pages: PageFetcher<F, P>) -> Result<Self, AppError> {
        config.validate()?;
        let ids = IdGenerator::new(config.platform.clone());
        Ok(Self { config, pages, ids })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Run the pagination state machine and report how it ended.
    pub async fn run<R: HarvestReporter>(
        &self,
        query: &HarvestQuery,
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<HarvestReport, AppError> {
        let platform = self.config.platform.as_str();
        let keywords = query.joined();
        let mut found = ListingSet::new(self.config.dedup);
        let mut pages_fetched = 0u32;
        let mut cards_skipped = 0usize;

        reporter.report(HarvestEvent::Started {
            platform,
            keywords: &keywords,
            max_pages: query.max_pages,
        });

        let mut state = State::Start;
        let stop = loop {
            state = match state {
                State::Start => State::FetchingPage {
                    page: 1,
                    url: self.config.page_url(&keywords, 1),
                },

                State::FetchingPage { page, url } => {
                    if page > query.max_pages {
                        State::Stop(StopReason::PageLimit)
                    } else if cancel.is_cancelled() {
                        State::Cancelled
                    } else {
                        match self.pages.fetch(&url, cancel).await {
                            Err(e) if e.is_cancelled() => State::Cancelled,
                            Err(e) => State::Stop(StopReason::Soft(SoftFailure::FetchError(
                                e.to_string(),
                            ))),
                            Ok(PageOutcome::Soft(failure)) => {
                                pages_fetched += 1;
                                reporter.report(HarvestEvent::PageFailed {
                                    platform,
                                    page,
                                    url: &url,
                                    failure: &failure,
                                });
                                State::Stop(StopReason::Soft(failure))
                            }
                            Ok(PageOutcome::Document(doc)) => {
                                pages_fetched += 1;
                                let scan = self.scan_page(doc.root_element(), &url);
                                drop(doc);
                                match scan {
                                    Some(scan) => {
                                        reporter.report(HarvestEvent::PageFetched {
                                            platform,
                                            page,
                                            url: &url,
                                            cards: scan.cards.len(),
                                            tier: scan.tier,
                                        });
                                        State::HasCards { page, scan }
                                    }
                                    None => State::Stop(StopReason::NoCards),
                                }
                            }
                        }
                    }
                }

                State::HasCards { page, scan } => State::Emitting {
                    page,
                    cards: scan.cards,
                    next: NextPage {
                        has_next: scan.has_next,
                        href: scan.next_href,
                    },
                },

                State::Emitting { page, cards, next } => {
                    let card_count = cards.len();
                    for card in cards {
                        match card {
                            Ok(listing) => {
                                found.insert(listing);
                            }
                            Err(error) => {
                                cards_skipped += 1;
                                reporter.report(HarvestEvent::CardSkipped {
                                    platform,
                                    page,
                                    error: &error,
                                });
                            }
                        }
                    }
                    State::CheckNextPage {
                        page,
                        card_count,
                        next,
                    }
                }

                State::CheckNextPage {
                    page,
                    card_count,
                    next,
                } => self.next_state(&keywords, page, card_count, next),

                State::Stop(reason) => break reason,

                State::Cancelled => {
                    if self.config.cancel_mode == CancelMode::Propagate {
                        tracing::info!(
                            %platform,
                            collected = found.len(),
                            "Harvest cancelled, propagating"
                        );
                        return Err(AppError::Cancelled);
                    }
                    break StopReason::Cancelled;
                }
            };
        };

        reporter.report(HarvestEvent::Stopped {
            platform,
            reason: &stop,
            pages: pages_fetched,
            listings: found.len(),
        });

        Ok(HarvestReport {
            listings: found.into_vec(),
            pages_fetched,
            cards_skipped,
            stop,
        })
    }

    fn next_state(&self, keywords: &str, page: u32, card_count: usize, next: NextPage) -> State {
        if let Pagination::Offset { page_size } = self.config.pagination
            && card_count < page_size as usize
        {
            return State::Stop(StopReason::ShortPage);
        }
        if !self.config.next_page.is_empty() && !next.has_next {
            return State::Stop(StopReason::NoNextPage);
        }
        let url = match self.config.pagination {
            Pagination::NextLink => match next.href {
                Some(href) => href,
                None => return State::Stop(StopReason::NoNextPage),
            },
            _ => self.config.page_url(keywords, page + 1),
        };
        State::FetchingPage {
            page: page + 1,
            url,
        }
    }

    /// Find the cards on a page and parse each one independently.
    /// `None` when neither the primary nor the fallback tier matches.
    fn scan_page(&self, root: ElementRef<'_>, page_url: &str) -> Option<PageScan> {
        let base = Url::parse(page_url).ok();
        let (tier, nodes) = match self.config.cards.resolve(root) {
            Some(resolved) => (Some(resolved.pattern_index), resolved.nodes),
            None => (None, self.config.fallback_cards.resolve(root)?.nodes),
        };

        let cards = nodes
            .into_iter()
            .map(|card| {
                self.parse_listing(card, base.as_ref(), &self.config.fields, None, |url| {
                    self.config.native_id.resolve_card(card, url)
                })
            })
            .collect();

        let has_next = self.config.next_page.matches(root);
        let next_href = self
            .config
            .next_page
            .first_attr(root, "href")
            .and_then(|href| canonicalize_url(&href, base.as_ref()).ok());

        Some(PageScan {
            cards,
            tier,
            has_next,
            next_href,
        })
    }

    /// Turn one card (or a detail page root) into a listing.
    ///
    /// Anchor cards supply their own text and `href` when the field
    /// cascades find nothing; `own_url` is the last resort for the link.
    fn parse_listing(
        &self,
        card: ElementRef<'_>,
        base: Option<&Url>,
        fields: &FieldSelectors,
        own_url: Option<&str>,
        native_id: impl FnOnce(&str) -> Option<String>,
    ) -> Result<CanonicalListing, AppError> {
        let defaults = &self.config.defaults;
        let is_anchor = card.value().name() == "a";

        let title = fields
            .title
            .first_text(card)
            .or_else(|| is_anchor.then(|| element_text(card)).filter(|t| !t.is_empty()))
            .ok_or(AppError::MissingField("title"))?;
        let href = fields
            .link
            .first_attr(card, "href")
            .or_else(|| card.value().attr("href").map(str::to_string))
            .or_else(|| own_url.map(str::to_string))
            .ok_or(AppError::MissingField("url"))?;
        let url = canonicalize_url(&href, base)?;
        let native = native_id(&url).ok_or(AppError::MissingField("source_native_id"))?;

        let company = fields.company.first_text(card).or_else(|| defaults.company.clone());
        let location = fields.location.first_text(card).unwrap_or_default();
        let description = fields.description.first_text(card).unwrap_or_default();
        let tags = fields.tags.all_texts(card);
        let salary = fields
            .salary
            .first_text(card)
            .map(|text| self.config.salary.parse(&text))
            .unwrap_or_else(|| self.config.salary.parse(""));
        let posted = fields
            .posted
            .first_attr(card, "datetime")
            .or_else(|| fields.posted.first_text(card))
            .and_then(|text| parse_posted_date(&text, Utc::now()));

        let body = normalize_whitespace(&format!("{location} {description} {}", tags.join(" ")));
        let seniority = match classify_seniority(&title) {
            SeniorityLevel::Unknown => classify_seniority_or(&body, defaults.seniority),
            level => level,
        };
        let everything = format!("{title} {body}");
        let (city, country) = split_location(&location);

        let mut builder = ListingBuilder::new(&self.ids, &native)
            .kind(self.config.kind)
            .title(title.as_str())
            .description(description.as_str())
            .location(city, country)
            .salary(salary)
            .seniority(seniority)
            .remote_policy(classify_remote_or(&everything, defaults.remote))
            .engagement(classify_engagement_or(&everything, defaults.engagement))
            .geo(classify_geo_or(&body, defaults.geo))
            .skills(tags.iter().chain(extract_skills(&everything, DEFAULT_VOCABULARY).iter()))
            .url(url)
            .posted(posted);
        if let Some(company) = company {
            builder = builder.company(company);
        }
        builder.build()
    }

    async fn detail(&self, url: &str, cancel: &CancellationToken) -> Result<Option<CanonicalListing>, AppError> {
        let Some(fields) = self.config.detail.as_ref() else {
            return Ok(None);
        };
        let doc = match self.pages.fetch(url, cancel).await? {
            PageOutcome::Document(doc) => doc,
            PageOutcome::Soft(failure) => {
                tracing::debug!(platform = %self.config.platform, %url, %failure, "Detail page unavailable");
                return Ok(None);
            }
        };

        let base = Url::parse(url).ok();
        let root = doc.root_element();
        let listing = self.parse_listing(root, base.as_ref(), fields, Some(url), |canonical| {
            self.config.native_id.resolve_url(canonical)
        });
        match listing {
            Ok(listing) => Ok(Some(listing)),
            Err(error) => {
                tracing::debug!(platform = %self.config.platform, %url, %error, "Detail page did not parse");
                Ok(None)
            }
        }
    }

    fn absorb_cancel<T: Default>(&self, result: Result<T, AppError>) -> Result<T, AppError> {
        match result {
            Err(e) if e.is_cancelled() && self.config.cancel_mode == CancelMode::ReturnPartial => {
                Ok(T::default())
            }
            other => other,
        }
    }
}

impl<F: Fetcher, P: CompliancePolicy> Harvester for SourceHarvester<F, P> {
    fn platform(&self) -> &str {
        &self.config.platform
    }

    async fn harvest(
        &self,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        let report = self.run(query, cancel, &TracingHarvestReporter).await?;
        Ok(report.listings)
    }

    async fn harvest_detail(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CanonicalListing>, AppError> {
        let result = self.detail(url, cancel).await;
        self.absorb_cancel(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::compliance::{ComplianceGate, GateConfig};
    use crate::testutil::MockFetcher;

    fn cascade(patterns: &[&str]) -> SelectorCascade {
        SelectorCascade::parse(patterns).unwrap()
    }

    fn board_config() -> SourceConfig {
        let mut config = SourceConfig::new(
            "TestBoard",
            "https://board.example.com/jobs?q={keywords}&page={page}",
        );
        config.cards = cascade(&["div.job-card", "li.vacancy"]);
        config.fallback_cards = cascade(&["a.job-link"]);
        config.fields = FieldSelectors {
            title: cascade(&["h2.title", "h2"]),
            link: cascade(&["a.job-link"]),
            company: cascade(&[".company"]),
            location: cascade(&[".location"]),
            salary: cascade(&[".salary"]),
            description: cascade(&[".summary"]),
            tags: cascade(&[".tag"]),
            posted: cascade(&["time"]),
        };
        config.next_page = cascade(&["a.next"]);
        config
    }

    fn card(id: u32, title: &str) -> String {
        format!(
            r#"<div class="job-card">
                 <h2 class="title">{title}</h2>
                 <a class="job-link" href="/jobs/{id}?utm_source=list">Open</a>
                 <span class="company">Acme</span>
                 <span class="location">Remote</span>
               </div>"#
        )
    }

    fn page(cards: &[String], next: bool) -> String {
        let next = if next { r#"<a class="next" href="?page=next">Next</a>"# } else { "" };
        format!("<html><body>{}{next}</body></html>", cards.join(""))
    }

    fn harvester(config: SourceConfig, fetcher: MockFetcher) -> SourceHarvester<MockFetcher> {
        let pages = PageFetcher::new(fetcher, ComplianceGate::new(GateConfig::new(Duration::ZERO)));
        SourceHarvester::new(config, pages).unwrap()
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl HarvestReporter for RecordingReporter {
        fn report(&self, event: HarvestEvent<'_>) {
            let label = match event {
                HarvestEvent::Started { .. } => "started".to_string(),
                HarvestEvent::PageFetched { page, cards, .. } => format!("page {page}: {cards}"),
                HarvestEvent::PageFailed { page, failure, .. } => format!("failed {page}: {failure}"),
                HarvestEvent::CardSkipped { page, .. } => format!("skipped on {page}"),
                HarvestEvent::Stopped { reason, .. } => format!("stopped: {reason}"),
            };
            self.events.lock().unwrap().push(label);
        }
    }

    #[tokio::test]
    async fn page_limit_bounds_fetches() {
        let mock = MockFetcher::repeating(&page(&[card(1, "Rust Developer")], true));
        let harvester = harvester(board_config(), mock.clone());

        let report = harvester
            .run(
                &HarvestQuery::new(["rust"], 3),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();

        assert_eq!(mock.calls().len(), 3);
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.stop, StopReason::PageLimit);
        assert_eq!(report.listings.len(), 1);
        assert_eq!(
            mock.calls(),
            vec![
                "https://board.example.com/jobs?q=rust&page=1",
                "https://board.example.com/jobs?q=rust&page=2",
                "https://board.example.com/jobs?q=rust&page=3",
            ]
        );
    }

    #[tokio::test]
    async fn zero_page_limit_fetches_nothing() {
        let mock = MockFetcher::repeating(&page(&[card(1, "Rust Developer")], true));
        let report = harvester(board_config(), mock.clone())
            .run(
                &HarvestQuery::new(["rust"], 0),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();
        assert!(mock.calls().is_empty());
        assert!(report.listings.is_empty());
    }

    #[tokio::test]
    async fn auth_wall_returns_prior_results() {
        let mock = MockFetcher::with_responses(vec![
            Ok(page(&[card(1, "Rust Developer"), card(2, "Go Developer")], true)),
            Ok(r#"<html><body><form action="/login"><input type="password"></form></body></html>"#.into()),
        ])
        .or_else(&page(&[card(3, "Never Reached")], true));
        let harvester = harvester(board_config(), mock.clone());

        let listings = harvester
            .harvest(&HarvestQuery::new(["dev"], 10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(listings.len(), 2);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn auth_wall_on_first_page_is_empty() {
        let mock = MockFetcher::new(r#"<html><body><div class="authwall">Sign in</div></body></html>"#);
        let report = harvester(board_config(), mock)
            .run(
                &HarvestQuery::new(["dev"], 5),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();
        assert!(report.listings.is_empty());
        assert_eq!(report.stop, StopReason::Soft(SoftFailure::AuthWall));
    }

    #[tokio::test]
    async fn fetch_error_stops_softly() {
        let mock = MockFetcher::with_responses(vec![
            Ok(page(&[card(1, "Rust Developer")], true)),
            Err(AppError::HttpError("HTTP 503".into())),
        ]);
        let report = harvester(board_config(), mock)
            .run(
                &HarvestQuery::new(["rust"], 5),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();
        assert_eq!(report.listings.len(), 1);
        assert!(matches!(report.stop, StopReason::Soft(SoftFailure::FetchError(_))));
    }

    #[tokio::test]
    async fn broken_card_is_skipped() {
        let broken = r#"<div class="job-card"><h2 class="title">No link</h2><span class="company">Acme</span></div>"#;
        let body = page(
            &[card(1, "Rust Developer"), broken.to_string(), card(2, "Go Developer")],
            false,
        );
        let reporter = RecordingReporter::default();
        let report = harvester(board_config(), MockFetcher::new(&body))
            .run(&HarvestQuery::new(["dev"], 5), &CancellationToken::new(), &reporter)
            .await
            .unwrap();

        assert_eq!(report.listings.len(), 2);
        assert_eq!(report.cards_skipped, 1);
        assert_eq!(report.stop, StopReason::NoNextPage);
        let events = reporter.events.lock().unwrap();
        assert!(events.contains(&"skipped on 1".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("stopped: no next page"));
    }

    #[tokio::test]
    async fn no_cards_stops() {
        let mock = MockFetcher::repeating("<html><body><p>Nothing here</p></body></html>");
        let report = harvester(board_config(), mock.clone())
            .run(
                &HarvestQuery::new(["dev"], 5),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();
        assert_eq!(report.stop, StopReason::NoCards);
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn fallback_tier_parses_anchor_cards() {
        let body = r#"<html><body>
            <a class="job-link" href="/jobs/5">Junior QA Engineer</a>
            <a class="job-link" href="/jobs/6">Senior SRE</a>
        </body></html>"#;
        let mut config = board_config();
        config.defaults.company = Some("Initech".into());
        let reporter = RecordingReporter::default();
        let report = harvester(config, MockFetcher::new(body))
            .run(&HarvestQuery::new(["qa"], 1), &CancellationToken::new(), &reporter)
            .await
            .unwrap();

        assert_eq!(report.listings.len(), 2);
        assert_eq!(report.listings[0].title, "Junior QA Engineer");
        assert_eq!(report.listings[0].company, "Initech");
        assert_eq!(report.listings[0].seniority_level, SeniorityLevel::Junior);
        assert_eq!(report.listings[0].url, "https://board.example.com/jobs/5");
    }

    #[tokio::test]
    async fn duplicate_cards_across_pages_are_deduplicated() {
        let mock = MockFetcher::with_responses(vec![
            Ok(page(&[card(1, "Rust Developer"), card(2, "Go Developer")], true)),
            Ok(page(&[card(2, "Go Developer (updated)"), card(3, "QA")], false)),
        ]);
        let mut config = board_config();
        config.dedup = DedupPolicy::KeepLast;
        let report = harvester(config, mock)
            .run(
                &HarvestQuery::new(["dev"], 5),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();

        let titles: Vec<_> = report.listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust Developer", "Go Developer (updated)", "QA"]);
    }

    #[tokio::test]
    async fn offset_short_page_stops() {
        let mut config = SourceConfig::new(
            "OffsetBoard",
            "https://board.example.com/search?kw={keywords}&start={page}",
        );
        config.pagination = Pagination::Offset { page_size: 2 };
        config.cards = cascade(&["div.job-card"]);
        config.fields = board_config().fields;

        let mock = MockFetcher::with_responses(vec![
            Ok(page(&[card(1, "A"), card(2, "B")], false)),
            Ok(page(&[card(3, "C")], false)),
        ])
        .or_else(&page(&[card(4, "D"), card(5, "E")], false));
        let report = harvester(config, mock.clone())
            .run(
                &HarvestQuery::new(["rust dev"], 10),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();

        assert_eq!(report.stop, StopReason::ShortPage);
        assert_eq!(report.listings.len(), 3);
        assert_eq!(
            mock.calls(),
            vec![
                "https://board.example.com/search?kw=rust+dev&start=0",
                "https://board.example.com/search?kw=rust+dev&start=2",
            ]
        );
    }

    #[tokio::test]
    async fn next_link_pagination_follows_href() {
        let mut config = board_config();
        config.search_url = "https://board.example.com/remote-jobs{page}".into();
        config.pagination = Pagination::NextLink;

        let first = format!(
            r#"<html><body>{}<a class="next" href="/remote-jobs?after=abc">Next</a></body></html>"#,
            card(1, "A")
        );
        let mock = MockFetcher::default()
            .route("https://board.example.com/remote-jobs", &first)
            .route(
                "https://board.example.com/remote-jobs?after=abc",
                &page(&[card(2, "B")], false),
            );
        let report = harvester(config, mock.clone())
            .run(
                &HarvestQuery::new(["x"], 5),
                &CancellationToken::new(),
                &TracingHarvestReporter,
            )
            .await
            .unwrap();

        assert_eq!(report.listings.len(), 2);
        assert_eq!(mock.calls().len(), 2);
    }

    #[tokio::test]
    async fn end_to_end_card_mapping() {
        let body = r#"<html><body>
            <div class="job-card" data-id="777">
              <h2 class="title">Senior .NET Developer</h2>
              <a class="job-link" href="https://board.example.com/jobs/777#apply">Open</a>
              <span class="company">Contoso</span>
              <span class="location">Berlin, Germany</span>
              <span class="salary">€60,000 - €80,000</span>
              <p class="summary">Full-time role building payment services in C# and Azure.</p>
              <span class="tag">C#</span><span class="tag">.NET</span>
              <time datetime="2026-10-01">2 weeks ago</time>
            </div>
        </body></html>"#;
        let mut config = board_config();
        config.native_id = NativeIdRule::CardAttr("data-id".into());
        let listings = harvester(config, MockFetcher::new(body))
            .harvest(&HarvestQuery::new([".net"], 1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.id, IdGenerator::new("TestBoard").generate("777"));
        assert_eq!(listing.title, "Senior .NET Developer");
        assert_eq!(listing.company, "Contoso");
        assert_eq!(listing.seniority_level, SeniorityLevel::Senior);
        assert_eq!(listing.city.as_deref(), Some("Berlin"));
        assert_eq!(listing.country.as_deref(), Some("Germany"));
        assert_eq!(listing.salary_min, Some(60000.0));
        assert_eq!(listing.salary_max, Some(80000.0));
        assert_eq!(listing.salary_currency.as_deref(), Some("EUR"));
        assert_eq!(listing.is_hourly_rate, Some(false));
        assert_eq!(listing.engagement_type, EngagementType::FullTime);
        assert_eq!(listing.url, "https://board.example.com/jobs/777");
        assert!(listing.required_skills.iter().any(|s| s == "Azure"));
        assert!(listing.required_skills.iter().any(|s| s == "C#"));
        assert!(listing.posted_date.is_some());
    }

    #[tokio::test]
    async fn absurd_posted_age_leaves_date_unset() {
        let body = r#"<html><body>
            <div class="job-card">
              <h2 class="title">Rust Developer</h2>
              <a class="job-link" href="/jobs/5">Open</a>
              <span class="company">Acme</span>
              <time>99999999 days ago</time>
            </div>
        </body></html>"#;
        let listings = harvester(board_config(), MockFetcher::new(body))
            .harvest(&HarvestQuery::new(["rust"], 1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(listings.len(), 1);
        assert!(listings[0].posted_date.is_none());
    }

    #[tokio::test]
    async fn source_defaults_fill_missing_signal() {
        let mut config = board_config();
        config.defaults.seniority = SeniorityLevel::Senior;
        config.defaults.engagement = EngagementType::Freelance;
        let body = page(&[card(1, "Logo design for a bakery")], false);
        let listings = harvester(config, MockFetcher::new(&body))
            .harvest(&HarvestQuery::new(["logo"], 1), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(listings[0].seniority_level, SeniorityLevel::Senior);
        assert_eq!(listings[0].engagement_type, EngagementType::Freelance);
        assert_eq!(listings[0].remote_policy, RemotePolicy::Remote);
    }

    #[tokio::test]
    async fn cancellation_returns_partial_by_default() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mock = MockFetcher::repeating(&page(&[card(1, "A")], true));
        let report = harvester(board_config(), mock.clone())
            .run(&HarvestQuery::new(["a"], 3), &cancel, &TracingHarvestReporter)
            .await
            .unwrap();
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(report.listings.is_empty());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn cancellation_mid_run_keeps_collected_listings() {
        let mock = MockFetcher::repeating(&page(&[card(1, "A")], true));
        let pages = PageFetcher::new(
            mock.clone(),
            ComplianceGate::new(GateConfig::new(Duration::from_secs(30))),
        );
        let harvester = SourceHarvester::new(board_config(), pages).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = harvester
            .run(&HarvestQuery::new(["a"], 3), &cancel, &TracingHarvestReporter)
            .await
            .unwrap();
        assert_eq!(report.stop, StopReason::Cancelled);
        assert_eq!(report.listings.len(), 1);
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_can_propagate() {
        let mut config = board_config();
        config.cancel_mode = CancelMode::Propagate;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = harvester(config, MockFetcher::default())
            .harvest(&HarvestQuery::new(["a"], 3), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn detail_page_is_parsed() {
        let mut config = board_config();
        config.native_id = NativeIdRule::url_pattern(r"/jobs/(\d+)").unwrap();
        config.detail = Some(FieldSelectors {
            title: cascade(&["h1"]),
            company: cascade(&[".employer"]),
            description: cascade(&["#description"]),
            ..FieldSelectors::default()
        });
        let body = r#"<html><body>
            <h1>Lead Backend Engineer</h1>
            <div class="employer">Globex</div>
            <div id="description">Hybrid role in Kyiv. Rust, PostgreSQL.</div>
        </body></html>"#;
        let url = "https://board.example.com/jobs/31";
        let harvester = harvester(config, MockFetcher::default().route(url, body));

        let listing = harvester
            .harvest_detail(url, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listing.id, IdGenerator::new("TestBoard").generate("31"));
        assert_eq!(listing.seniority_level, SeniorityLevel::Lead);
        assert_eq!(listing.remote_policy, RemotePolicy::Hybrid);
        assert_eq!(listing.required_skills, vec!["PostgreSQL", "Rust"]);
    }

    #[tokio::test]
    async fn detail_is_none_without_detail_selectors_or_page() {
        let cancel = CancellationToken::new();
        let plain = harvester(board_config(), MockFetcher::default());
        assert!(plain.harvest_detail("https://board.example.com/jobs/1", &cancel).await.unwrap().is_none());

        let mut config = board_config();
        config.detail = Some(FieldSelectors::default());
        let failing = harvester(config, MockFetcher::with_error(AppError::Timeout(30)));
        assert!(failing.harvest_detail("https://board.example.com/jobs/1", &cancel).await.unwrap().is_none());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let pages = PageFetcher::new(
            MockFetcher::default(),
            ComplianceGate::new(GateConfig::new(Duration::ZERO)),
        );
        let no_cards = SourceConfig::new("Empty", "https://example.com/?q={keywords}");
        assert!(matches!(
            SourceHarvester::new(no_cards, pages.clone()),
            Err(AppError::ConfigError(_))
        ));

        let mut bad_url = board_config();
        bad_url.search_url = "not a url {keywords}".into();
        assert!(matches!(
            SourceHarvester::new(bad_url, pages),
            Err(AppError::ConfigError(_))
        ));
    }
}
