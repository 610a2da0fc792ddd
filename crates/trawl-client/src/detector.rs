//! ATS auto-detection and company careers-page resolution.

use tokio_util::sync::CancellationToken;
use trawl_core::ats::{AtsInfo, AtsType, detect_ats};
use trawl_core::compliance::AllowAll;
use trawl_core::error::AppError;
use trawl_core::harvest::{CancelMode, FieldSelectors, NativeIdRule, Pagination, SourceConfig, SourceHarvester};
use trawl_core::models::{CanonicalListing, CompanyJobsResult, HarvestQuery};
use trawl_core::page::{BodyOutcome, PageFetcher};
use trawl_core::selector::SelectorCascade;
use trawl_core::traits::{CompliancePolicy, Fetcher, Harvester};

use crate::sources::{ApiHarvester, Ashby, BoardApi, Greenhouse, Lever};

const GENERIC_CARDS: &[&str] = &[
    "li[class*='job']",
    "div[class*='job-item']",
    "[class*='job-listing']",
    "[class*='position']",
    "[class*='opening']",
    "[class*='vacanc']",
];

const GENERIC_LINKS: &[&str] = &[
    "a[href*='/job']",
    "a[href*='/career']",
    "a[href*='/position']",
    "a[href*='/opening']",
    "a[href*='/vacanc']",
];

/// Detects the ATS behind a careers page and pulls its open positions.
#[derive(Clone)]
pub struct AtsDetector<F, P = AllowAll> {
    pages: PageFetcher<F, P>,
}

impl<F: Fetcher, P: CompliancePolicy> AtsDetector<F, P> {
    pub fn new(pages: PageFetcher<F, P>) -> Self {
        Self { pages }
    }

    /// Fetch the careers page once and match ATS signatures against the
    /// URL, then the body. An unreachable page is matched on the URL alone.
    pub async fn detect(&self, careers_url: &str, cancel: &CancellationToken) -> Result<AtsInfo, AppError> {
        let info = match self.pages.fetch_body(careers_url, cancel).await? {
            BodyOutcome::Body(body) => detect_ats(careers_url, Some(&body)),
            BodyOutcome::Soft(failure) => {
                tracing::debug!(url = %careers_url, %failure, "Careers page unavailable, matching URL only");
                detect_ats(careers_url, None)
            }
        };
        tracing::info!(
            url = %careers_url,
            ats = %info.ats_type,
            identifier = %info.identifier,
            "ATS detected"
        );
        Ok(info)
    }

    /// Detect the ATS and collect every open position of `company_name`.
    ///
    /// Only cancellation is an `Err`; any other failure is reported through
    /// `success` and `error` on the result.
    pub async fn resolve_company(
        &self,
        company_name: &str,
        careers_url: &str,
        cancel: &CancellationToken,
    ) -> Result<CompanyJobsResult, AppError> {
        let info = self.detect(careers_url, cancel).await?;
        let query = HarvestQuery::new(Vec::<String>::new(), 1);

        let outcome = match info.ats_type {
            AtsType::Greenhouse => self.board(Greenhouse, &info, company_name, &query, cancel).await,
            AtsType::Lever => self.board(Lever, &info, company_name, &query, cancel).await,
            AtsType::Ashby => self.board(Ashby, &info, company_name, &query, cancel).await,
            AtsType::Generic => self.careers_page(company_name, careers_url, &query, cancel).await,
            other => {
                tracing::info!(ats = %other, company = %company_name, "No harvester for this ATS");
                Ok(Vec::new())
            }
        };

        let (listings, error) = match outcome {
            Ok(listings) => (listings, None),
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                tracing::warn!(company = %company_name, error = %e, "Company resolution failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        Ok(CompanyJobsResult {
            company_name: company_name.to_string(),
            ats_type: info.ats_type,
            ats_identifier: info.identifier,
            listings,
            success: error.is_none(),
            error,
        })
    }

    async fn board<A: BoardApi>(
        &self,
        api: A,
        info: &AtsInfo,
        company_name: &str,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        ApiHarvester::new(api, &info.identifier, self.pages.clone())
            .with_company(company_name)
            .with_cancel_mode(CancelMode::Propagate)
            .harvest(query, cancel)
            .await
    }

    async fn careers_page(
        &self,
        company_name: &str,
        careers_url: &str,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        let config = generic_config(company_name, careers_url)?;
        SourceHarvester::new(config, self.pages.clone())?
            .harvest(query, cancel)
            .await
    }
}

/// Best-effort config for a careers page on no known ATS.
fn generic_config(company_name: &str, careers_url: &str) -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new("Careers", careers_url);
    config.pagination = Pagination::NextLink;
    config.cards = SelectorCascade::parse(GENERIC_CARDS)?;
    config.fallback_cards = SelectorCascade::parse(GENERIC_LINKS)?;
    config.fields = FieldSelectors {
        title: SelectorCascade::parse(&["h2", "h3", "h4", "[class*='title']", "a"])?,
        link: SelectorCascade::parse(&["a[href]"])?,
        location: SelectorCascade::parse(&["[class*='location']"])?,
        description: SelectorCascade::parse(&["[class*='description']", "p"])?,
        ..FieldSelectors::default()
    };
    config.native_id = NativeIdRule::Url;
    config.defaults.company = Some(company_name.to_string());
    config.cancel_mode = CancelMode::Propagate;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use trawl_core::classify::RemotePolicy;
    use trawl_core::compliance::{ComplianceGate, GateConfig};
    use trawl_core::testutil::MockFetcher;

    use super::*;

    fn detector(mock: MockFetcher) -> AtsDetector<MockFetcher> {
        AtsDetector::new(PageFetcher::new(mock, ComplianceGate::new(GateConfig::new(Duration::ZERO))))
    }

    #[tokio::test]
    async fn detects_embedded_board() {
        let mock = MockFetcher::new(
            r#"<html><body><div id="grnhse_app"></div>
               <script src="https://boards.greenhouse.io/embed/job_board/js?for=initech"></script></body></html>"#,
        );
        let info = detector(mock.clone())
            .detect("https://initech.com/careers", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(info.ats_type, AtsType::Greenhouse);
        assert_eq!(info.identifier, "initech");
        assert_eq!(mock.calls(), vec!["https://initech.com/careers"]);
    }

    #[tokio::test]
    async fn unreachable_page_matches_url_only() {
        let mock = MockFetcher::with_error(AppError::NetworkError("refused".into()));
        let info = detector(mock)
            .detect("https://jobs.lever.co/globex", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(info.ats_type, AtsType::Lever);
        assert_eq!(info.identifier, "globex");
    }

    #[tokio::test]
    async fn resolves_greenhouse_company() {
        let mock = MockFetcher::default()
            .route(
                "https://initech.com/careers",
                r#"<a href="https://boards.greenhouse.io/initech">Open roles</a>"#,
            )
            .route(
                "https://boards-api.greenhouse.io/v1/boards/initech/jobs?content=true",
                r#"{"jobs": [{"id": 11, "title": "Remote Rust Developer",
                    "absolute_url": "https://boards.greenhouse.io/initech/jobs/11"}]}"#,
            );
        let result = detector(mock)
            .resolve_company("Initech", "https://initech.com/careers", &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.ats_type, AtsType::Greenhouse);
        assert_eq!(result.ats_identifier, "initech");
        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[0].company, "Initech");
        assert_eq!(result.listings[0].remote_policy, RemotePolicy::Remote);
    }

    #[tokio::test]
    async fn generic_careers_page_is_scraped() {
        let page = r#"<html><body><ul>
            <li class="job-opening">
              <a href="/careers/backend-engineer?utm_campaign=site">Backend Engineer</a>
              <span class="job-location">Amsterdam, Netherlands</span>
            </li>
            <li class="job-opening">
              <a href="/careers/designer">Product Designer</a>
            </li>
          </ul></body></html>"#;
        let mock = MockFetcher::repeating(page);
        let result = detector(mock)
            .resolve_company("Hooli", "https://hooli.example/careers", &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.ats_type, AtsType::Generic);
        assert_eq!(result.listings.len(), 2);
        let backend = &result.listings[0];
        assert_eq!(backend.company, "Hooli");
        assert_eq!(backend.url, "https://hooli.example/careers/backend-engineer");
        assert_eq!(backend.city.as_deref(), Some("Amsterdam"));
    }

    #[tokio::test]
    async fn unsupported_ats_is_empty_success() {
        let mock = MockFetcher::new(r#"<a href="https://apply.workable.com/vandelay/">Jobs</a>"#);
        let result = detector(mock.clone())
            .resolve_company("Vandelay", "https://vandelay.com/careers", &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.ats_type, AtsType::Workable);
        assert!(result.listings.is_empty());
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_is_an_error() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = detector(MockFetcher::default())
            .resolve_company("Acme", "https://acme.com/careers", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
