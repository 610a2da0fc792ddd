//! Concrete sources: HTML board presets and hosted ATS board APIs.

pub mod api;
pub mod ashby;
pub mod boards;
pub mod greenhouse;
pub mod lever;

use tokio_util::sync::CancellationToken;
use trawl_core::compliance::AllowAll;
use trawl_core::error::AppError;
use trawl_core::harvest::SourceHarvester;
use trawl_core::models::{CanonicalListing, HarvestQuery};
use trawl_core::page::PageFetcher;
use trawl_core::traits::{CompliancePolicy, Fetcher, Harvester};

pub use api::{ApiHarvester, BoardApi, html_to_text};
pub use ashby::Ashby;
pub use boards::{PRESETS, Preset, preset};
pub use greenhouse::Greenhouse;
pub use lever::Lever;

/// ATS board sources addressed as `<ats>:<board>`.
pub const ATS_SOURCES: &[&str] = &["greenhouse", "lever", "ashby"];

/// Any source the CLI can name, behind one [`Harvester`] type.
#[derive(Clone)]
pub enum Source<F, P = AllowAll> {
    Board(SourceHarvester<F, P>),
    Greenhouse(ApiHarvester<Greenhouse, F, P>),
    Lever(ApiHarvester<Lever, F, P>),
    Ashby(ApiHarvester<Ashby, F, P>),
}

impl<F: Fetcher, P: CompliancePolicy> Source<F, P> {
    /// Resolve a source name: a board preset (`djinni`) or an ATS board
    /// (`greenhouse:acme`).
    pub fn from_name(name: &str, pages: PageFetcher<F, P>) -> Result<Self, AppError> {
        if let Some((ats, board)) = name.split_once(':') {
            let board = board.trim();
            if board.is_empty() {
                return Err(AppError::ConfigError(format!("`{name}`: missing board name")));
            }
            return match ats.trim().to_lowercase().as_str() {
                "greenhouse" => Ok(Source::Greenhouse(ApiHarvester::new(Greenhouse, board, pages))),
                "lever" => Ok(Source::Lever(ApiHarvester::new(Lever, board, pages))),
                "ashby" => Ok(Source::Ashby(ApiHarvester::new(Ashby, board, pages))),
                other => Err(AppError::ConfigError(format!("unknown ATS `{other}`"))),
            };
        }
        SourceHarvester::new(preset(name)?, pages).map(Source::Board)
    }
}

impl<F: Fetcher, P: CompliancePolicy> Harvester for Source<F, P> {
    fn platform(&self) -> &str {
        match self {
            Source::Board(h) => h.platform(),
            Source::Greenhouse(h) => h.platform(),
            Source::Lever(h) => h.platform(),
            Source::Ashby(h) => h.platform(),
        }
    }

    async fn harvest(
        &self,
        query: &HarvestQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<CanonicalListing>, AppError> {
        match self {
            Source::Board(h) => h.harvest(query, cancel).await,
            Source::Greenhouse(h) => h.harvest(query, cancel).await,
            Source::Lever(h) => h.harvest(query, cancel).await,
            Source::Ashby(h) => h.harvest(query, cancel).await,
        }
    }

    async fn harvest_detail(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<CanonicalListing>, AppError> {
        match self {
            Source::Board(h) => h.harvest_detail(url, cancel).await,
            Source::Greenhouse(h) => h.harvest_detail(url, cancel).await,
            Source::Lever(h) => h.harvest_detail(url, cancel).await,
            Source::Ashby(h) => h.harvest_detail(url, cancel).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use trawl_core::compliance::{ComplianceGate, GateConfig};
    use trawl_core::run::harvest_all;
    use trawl_core::testutil::MockFetcher;

    use super::*;

    fn pages(mock: MockFetcher) -> PageFetcher<MockFetcher> {
        PageFetcher::new(mock, ComplianceGate::new(GateConfig::new(Duration::ZERO)))
    }

    #[test]
    fn resolves_names() {
        let mock = MockFetcher::default();
        assert_eq!(Source::from_name("djinni", pages(mock.clone())).unwrap().platform(), "Djinni");
        assert_eq!(
            Source::from_name("Lever:globex", pages(mock.clone())).unwrap().platform(),
            "Lever"
        );
        assert!(Source::from_name("greenhouse:", pages(mock.clone())).is_err());
        assert!(Source::from_name("workday:acme", pages(mock.clone())).is_err());
        assert!(Source::from_name("nowhere", pages(mock)).is_err());
    }

    #[tokio::test]
    async fn mixed_sources_run_together() {
        let mock = MockFetcher::default()
            .route(
                "https://api.lever.co/v0/postings/globex?mode=json",
                r#"[{"id": "1", "text": "Rust Engineer", "hostedUrl": "https://jobs.lever.co/globex/1"}]"#,
            )
            .or_else("<html><body><p>nothing here</p></body></html>");
        let sources = vec![
            Source::from_name("lever:globex", pages(mock.clone())).unwrap(),
            Source::from_name("weworkremotely", pages(mock.clone())).unwrap(),
        ];

        let runs = harvest_all(&sources, &HarvestQuery::new(["rust"], 1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].platform, "Lever");
        assert_eq!(runs[0].listings.len(), 1);
        assert_eq!(runs[1].platform, "WeWorkRemotely");
        assert!(runs[1].listings.is_empty());
        assert!(runs.iter().all(|r| r.error.is_none()));
    }
}
