use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ats::AtsType;
use crate::classify::{EngagementType, GeoRestriction, RemotePolicy, SeniorityLevel};
use crate::error::AppError;
use crate::id::IdGenerator;
use crate::salary::SalaryInfo;
use crate::skills::dedup_skills;

/// What a listing describes. Both kinds share one record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    #[default]
    Job,
    InterviewQuestion,
}

/// A normalized listing produced by a harvester.
///
/// Built once through [`ListingBuilder`]; classification fields always hold
/// a concrete value (possibly `Unknown`), compensation fields are `None`
/// when no salary was recognised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalListing {
    pub id: String,
    pub kind: ListingKind,
    pub title: String,
    pub company: String,
    pub description: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub is_hourly_rate: Option<bool>,
    pub remote_policy: RemotePolicy,
    pub seniority_level: SeniorityLevel,
    pub engagement_type: EngagementType,
    pub geo_restrictions: GeoRestriction,
    pub required_skills: Vec<String>,
    pub source_platform: String,
    pub url: String,
    pub posted_date: Option<DateTime<Utc>>,
    pub scraped_date: DateTime<Utc>,
}

/// Collects extracted fields and validates them into a [`CanonicalListing`].
#[derive(Debug, Clone)]
pub struct ListingBuilder {
    id: String,
    native_id: String,
    platform: String,
    kind: ListingKind,
    title: Option<String>,
    company: Option<String>,
    description: Option<String>,
    city: Option<String>,
    country: Option<String>,
    salary: Option<SalaryInfo>,
    remote_policy: RemotePolicy,
    seniority_level: SeniorityLevel,
    engagement_type: EngagementType,
    geo_restrictions: GeoRestriction,
    required_skills: Vec<String>,
    url: Option<String>,
    posted_date: Option<DateTime<Utc>>,
}

impl ListingBuilder {
    pub fn new(ids: &IdGenerator, source_native_id: &str) -> Self {
        Self {
            id: ids.generate(source_native_id),
            native_id: source_native_id.trim().to_string(),
            platform: ids.platform().to_string(),
            kind: ListingKind::Job,
            title: None,
            company: None,
            description: None,
            city: None,
            country: None,
            salary: None,
            remote_policy: RemotePolicy::Unknown,
            seniority_level: SeniorityLevel::Unknown,
            engagement_type: EngagementType::Unknown,
            geo_restrictions: GeoRestriction::Unknown,
            required_skills: Vec::new(),
            url: None,
            posted_date: None,
        }
    }

    pub fn kind(mut self, kind: ListingKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn location(mut self, city: Option<String>, country: Option<String>) -> Self {
        self.city = city;
        self.country = country;
        self
    }

    /// Attach a parsed salary. Unparsed salaries leave every compensation
    /// field empty.
    pub fn salary(mut self, salary: SalaryInfo) -> Self {
        self.salary = salary.is_parsed().then_some(salary);
        self
    }

    pub fn remote_policy(mut self, value: RemotePolicy) -> Self {
        self.remote_policy = value;
        self
    }

    pub fn seniority(mut self, value: SeniorityLevel) -> Self {
        self.seniority_level = value;
        self
    }

    pub fn engagement(mut self, value: EngagementType) -> Self {
        self.engagement_type = value;
        self
    }

    pub fn geo(mut self, value: GeoRestriction) -> Self {
        self.geo_restrictions = value;
        self
    }

    pub fn skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_skills
            .extend(skills.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Canonical URL of the listing (see [`crate::util::canonicalize_url`]).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn posted(mut self, posted: Option<DateTime<Utc>>) -> Self {
        self.posted_date = posted;
        self
    }

    pub fn build(self) -> Result<CanonicalListing, AppError> {
        if self.native_id.is_empty() {
            return Err(AppError::MissingField("source_native_id"));
        }
        let title = non_blank(self.title).ok_or(AppError::MissingField("title"))?;
        let company = non_blank(self.company).ok_or(AppError::MissingField("company"))?;
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .ok_or(AppError::MissingField("description"))?;
        let url = non_blank(self.url).ok_or(AppError::MissingField("url"))?;

        let (salary_min, salary_max, salary_currency, is_hourly_rate) = match self.salary {
            Some(s) => (s.min, s.max, Some(s.currency), Some(s.is_hourly)),
            None => (None, None, None, None),
        };

        Ok(CanonicalListing {
            id: self.id,
            kind: self.kind,
            title,
            company,
            description,
            city: non_blank(self.city),
            country: non_blank(self.country),
            salary_min,
            salary_max,
            salary_currency,
            is_hourly_rate,
            remote_policy: self.remote_policy,
            seniority_level: self.seniority_level,
            engagement_type: self.engagement_type,
            geo_restrictions: self.geo_restrictions,
            required_skills: dedup_skills(self.required_skills),
            source_platform: self.platform,
            url,
            posted_date: self.posted_date,
            scraped_date: Utc::now(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Search input for one harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestQuery {
    pub keywords: Vec<String>,
    /// Upper bound on fetched result pages. Zero fetches nothing.
    pub max_pages: u32,
}

impl HarvestQuery {
    pub fn new<I, S>(keywords: I, max_pages: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            max_pages,
        }
    }

    /// Keywords joined with single spaces, as typed into a search box.
    pub fn joined(&self) -> String {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of resolving one company's careers page through its ATS.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyJobsResult {
    pub company_name: String,
    pub ats_type: AtsType,
    pub ats_identifier: String,
    pub listings: Vec<CanonicalListing>,
    pub success: bool,
    pub error: Option<String>,
}

/// Compute a SHA-256 hash of a string, returned as 64-char hex.
pub fn compute_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salary::parse_salary;

    fn builder() -> ListingBuilder {
        ListingBuilder::new(&IdGenerator::new("Test"), "42")
            .title("Rust Engineer")
            .company("Acme")
            .description("Build things")
            .url("https://example.com/jobs/42")
    }

    #[test]
    fn test_compute_hash_consistency() {
        let h1 = compute_hash("hello world");
        let h2 = compute_hash("hello world");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_build_complete_listing() {
        let listing = builder()
            .salary(parse_salary("$80-$120/hr"))
            .skills(["Rust", "rust", "Tokio"])
            .build()
            .unwrap();
        assert_eq!(listing.id, IdGenerator::new("Test").generate("42"));
        assert_eq!(listing.source_platform, "Test");
        assert_eq!(listing.salary_min, Some(80.0));
        assert_eq!(listing.salary_currency.as_deref(), Some("USD"));
        assert_eq!(listing.is_hourly_rate, Some(true));
        assert_eq!(listing.required_skills, vec!["Rust", "Tokio"]);
        assert_eq!(listing.seniority_level, SeniorityLevel::Unknown);
        assert_eq!(listing.kind, ListingKind::Job);
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let err = ListingBuilder::new(&IdGenerator::new("Test"), "42")
            .title("   ")
            .company("Acme")
            .description("x")
            .url("https://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::MissingField("title")));
    }

    #[test]
    fn test_missing_description_and_company_are_rejected() {
        let err = ListingBuilder::new(&IdGenerator::new("Test"), "42")
            .title("Rust")
            .description("x")
            .url("https://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::MissingField("company")));

        let err = ListingBuilder::new(&IdGenerator::new("Test"), "42")
            .title("Rust")
            .company("Acme")
            .url("https://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::MissingField("description")));
    }

    #[test]
    fn test_unparsed_salary_leaves_fields_empty() {
        let listing = builder()
            .salary(parse_salary("competitive"))
            .build()
            .unwrap();
        assert_eq!(listing.salary_min, None);
        assert_eq!(listing.salary_currency, None);
        assert_eq!(listing.is_hourly_rate, None);
    }

    #[test]
    fn test_query_joins_trimmed_keywords() {
        let query = HarvestQuery::new([" rust ", "", "tokio"], 2);
        assert_eq!(query.joined(), "rust tokio");
        assert_eq!(query.max_pages, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(builder().build().unwrap()).unwrap();
        assert!(json.get("seniorityLevel").is_some());
        assert!(json.get("sourcePlatform").is_some());
        assert_eq!(json["remotePolicy"], "unknown");
    }
}
