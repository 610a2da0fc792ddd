use chrono::{DateTime, Utc};
use serde::Deserialize;
use trawl_core::classify::{
    RemotePolicy, classify_engagement, classify_geo, classify_remote, classify_seniority,
};
use trawl_core::error::AppError;
use trawl_core::models::{CanonicalListing, ListingBuilder};
use trawl_core::salary::SalaryInfo;
use trawl_core::skills::{DEFAULT_VOCABULARY, extract_skills};
use trawl_core::util::{canonicalize_url, normalize_whitespace, split_location};

use super::api::{ApiHarvester, BoardApi, BoardContext, decode_records};

/// Lever postings API (`api.lever.co/v0/postings`).
#[derive(Debug, Default, Clone, Copy)]
pub struct Lever;

pub type LeverHarvester<F, P = trawl_core::compliance::AllowAll> = ApiHarvester<Lever, F, P>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Posting {
    id: String,
    text: String,
    hosted_url: String,
    #[serde(default)]
    categories: Categories,
    #[serde(default)]
    description_plain: Option<String>,
    #[serde(default)]
    additional_plain: Option<String>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    workplace_type: Option<String>,
    #[serde(default)]
    salary_range: Option<SalaryRange>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Categories {
    commitment: Option<String>,
    location: Option<String>,
    team: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SalaryRange {
    min: Option<f64>,
    max: Option<f64>,
    currency: Option<String>,
    interval: Option<String>,
}

impl BoardApi for Lever {
    fn platform(&self) -> &'static str {
        "Lever"
    }

    fn board_url(&self, board: &str) -> String {
        format!("https://api.lever.co/v0/postings/{board}?mode=json")
    }

    fn parse(
        &self,
        body: &str,
        ctx: &BoardContext<'_>,
    ) -> Result<Vec<Result<CanonicalListing, AppError>>, AppError> {
        let records: Vec<serde_json::Value> = serde_json::from_str(body)?;
        Ok(decode_records::<Posting>(records)
            .map(|posting| posting.and_then(|p| map_posting(p, ctx)))
            .collect())
    }
}

fn map_posting(posting: Posting, ctx: &BoardContext<'_>) -> Result<CanonicalListing, AppError> {
    let description = normalize_whitespace(&format!(
        "{} {}",
        posting.description_plain.unwrap_or_default(),
        posting.additional_plain.unwrap_or_default()
    ));
    let location = posting.categories.location.unwrap_or_default();
    let commitment = posting.categories.commitment.unwrap_or_default();
    let team = posting.categories.team.unwrap_or_default();
    let (city, country) = split_location(&location);

    let salary = match posting.salary_range {
        Some(range) if range.min.is_some() || range.max.is_some() => SalaryInfo::from_bounds(
            range.min,
            range.max,
            range
                .currency
                .map(|c| c.to_uppercase())
                .unwrap_or_else(|| ctx.salary.default_currency().to_string()),
            range.interval.as_deref().is_some_and(|i| i.contains("hour")),
        ),
        _ => ctx.salary.parse(&description),
    };

    let remote = match posting.workplace_type.as_deref() {
        Some("remote") => RemotePolicy::Remote,
        Some("hybrid") => RemotePolicy::Hybrid,
        Some("onsite") => RemotePolicy::OnSite,
        _ => classify_remote(&format!("{location} {}", posting.text)),
    };

    let posted = posting.created_at.and_then(DateTime::<Utc>::from_timestamp_millis);

    ListingBuilder::new(ctx.ids, &posting.id)
        .title(posting.text.as_str())
        .company(ctx.company)
        .description(description.as_str())
        .location(city, country)
        .salary(salary)
        .seniority(classify_seniority(&posting.text))
        .remote_policy(remote)
        .engagement(classify_engagement(&format!("{commitment} {}", posting.text)))
        .geo(classify_geo(&format!("{location} {description}")))
        .skills(extract_skills(
            &format!("{} {team} {description}", posting.text),
            DEFAULT_VOCABULARY,
        ))
        .url(canonicalize_url(&posting.hosted_url, None)?)
        .posted(posted)
        .build()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;
    use trawl_core::classify::{EngagementType, SeniorityLevel};
    use trawl_core::compliance::{ComplianceGate, GateConfig};
    use trawl_core::dedup::DedupPolicy;
    use trawl_core::id::IdGenerator;
    use trawl_core::models::HarvestQuery;
    use trawl_core::page::PageFetcher;
    use trawl_core::testutil::MockFetcher;
    use trawl_core::traits::Harvester;

    use super::*;

    const POSTINGS: &str = r#"[
      {
        "id": "5ac2f8b4-1c5e-4d7a-9f21-0b1a6e2c9d10",
        "text": "Staff Platform Engineer",
        "hostedUrl": "https://jobs.lever.co/globex/5ac2f8b4-1c5e-4d7a-9f21-0b1a6e2c9d10",
        "categories": {"commitment": "Full-time", "location": "Lisbon, Portugal", "team": "Platform"},
        "descriptionPlain": "Own our Kubernetes and Terraform estate.",
        "createdAt": 1788000000000,
        "workplaceType": "hybrid",
        "salaryRange": {"min": 95000, "max": 120000, "currency": "eur", "interval": "per-year-salary"}
      },
      {
        "id": "c0ffee00-0000-0000-0000-000000000001",
        "text": "Support Contractor",
        "hostedUrl": "https://jobs.lever.co/globex/c0ffee00-0000-0000-0000-000000000001",
        "categories": {"commitment": "Contract"},
        "descriptionPlain": "Paid $40/hour. Work from anywhere.",
        "workplaceType": "unspecified"
      },
      {
        "id": "",
        "text": "Ghost posting",
        "hostedUrl": "https://jobs.lever.co/globex/ghost"
      }
    ]"#;

    fn harvester(mock: MockFetcher) -> LeverHarvester<MockFetcher> {
        let pages = PageFetcher::new(mock, ComplianceGate::new(GateConfig::new(Duration::ZERO)));
        ApiHarvester::new(Lever, "globex", pages).with_company("Globex")
    }

    #[tokio::test]
    async fn maps_postings() {
        let mock = MockFetcher::new(POSTINGS);
        let listings = harvester(mock.clone())
            .harvest(&HarvestQuery::new(Vec::<String>::new(), 1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(mock.calls(), vec!["https://api.lever.co/v0/postings/globex?mode=json"]);
        assert_eq!(listings.len(), 2);

        let staff = &listings[0];
        assert_eq!(
            staff.id,
            IdGenerator::new("Lever").generate("5ac2f8b4-1c5e-4d7a-9f21-0b1a6e2c9d10")
        );
        assert_eq!(staff.source_platform, "Lever");
        assert_eq!(staff.company, "Globex");
        assert_eq!(staff.remote_policy, RemotePolicy::Hybrid);
        assert_eq!(staff.engagement_type, EngagementType::FullTime);
        assert_eq!(staff.country.as_deref(), Some("Portugal"));
        assert_eq!(staff.salary_min, Some(95000.0));
        assert_eq!(staff.salary_max, Some(120000.0));
        assert_eq!(staff.salary_currency.as_deref(), Some("EUR"));
        assert_eq!(staff.is_hourly_rate, Some(false));
        assert_eq!(staff.required_skills, vec!["Kubernetes", "Terraform"]);
        assert!(staff.posted_date.is_some());

        let contractor = &listings[1];
        assert_eq!(contractor.engagement_type, EngagementType::Contract);
        assert_eq!(contractor.seniority_level, SeniorityLevel::Unknown);
        assert_eq!(contractor.salary_min, Some(40.0));
        assert_eq!(contractor.is_hourly_rate, Some(true));
        assert!(contractor.posted_date.is_none());
    }

    #[tokio::test]
    async fn malformed_posting_only_drops_itself() {
        let body = r#"[
          {"id": "ok-1", "text": "Backend Engineer", "hostedUrl": "https://jobs.lever.co/globex/ok-1"},
          {"id": "no-title", "hostedUrl": "https://jobs.lever.co/globex/no-title"},
          {"id": 42, "text": "Numeric id", "hostedUrl": "https://jobs.lever.co/globex/42"}
        ]"#;
        let listings = harvester(MockFetcher::new(body))
            .harvest(&HarvestQuery::new(Vec::<String>::new(), 1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Backend Engineer");
    }

    #[tokio::test]
    async fn repeated_ids_are_collapsed() {
        let body = r#"[
          {"id": "dup", "text": "Data Engineer", "hostedUrl": "https://jobs.lever.co/globex/dup"},
          {"id": "dup", "text": "Data Engineer (reposted)", "hostedUrl": "https://jobs.lever.co/globex/dup"}
        ]"#;
        let query = HarvestQuery::new(Vec::<String>::new(), 1);

        let first = harvester(MockFetcher::new(body))
            .harvest(&query, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].title, "Data Engineer");

        let last = harvester(MockFetcher::new(body))
            .with_dedup(DedupPolicy::KeepLast)
            .harvest(&query, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].title, "Data Engineer (reposted)");
    }

    #[tokio::test]
    async fn salary_range_bounds_are_normalised() {
        let body = r#"[
          {
            "id": "a", "text": "Engineer A", "hostedUrl": "https://jobs.lever.co/globex/a",
            "salaryRange": {"min": 150000, "max": 100000, "currency": "USD", "interval": "per-year-salary"}
          },
          {
            "id": "b", "text": "Engineer B", "hostedUrl": "https://jobs.lever.co/globex/b",
            "salaryRange": {"min": 90000, "currency": "USD"}
          }
        ]"#;
        let listings = harvester(MockFetcher::new(body))
            .harvest(&HarvestQuery::new(Vec::<String>::new(), 1), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(listings[0].salary_min, Some(100000.0));
        assert_eq!(listings[0].salary_max, Some(150000.0));
        assert_eq!(listings[1].salary_min, Some(90000.0));
        assert_eq!(listings[1].salary_max, Some(90000.0));
    }

    #[tokio::test]
    async fn object_payload_is_rejected() {
        let listings = harvester(MockFetcher::new(r#"{"ok": false, "error": "Document not found"}"#))
            .harvest(&HarvestQuery::new(Vec::<String>::new(), 1), &CancellationToken::new())
            .await
            .unwrap();
        assert!(listings.is_empty());
    }
}
