use chrono::{DateTime, Utc};
use serde::Deserialize;
use trawl_core::classify::{
    EngagementType, RemotePolicy, classify_engagement, classify_geo, classify_remote,
    classify_seniority,
};
use trawl_core::error::AppError;
use trawl_core::models::{CanonicalListing, ListingBuilder};
use trawl_core::skills::{DEFAULT_VOCABULARY, extract_skills};
use trawl_core::util::{canonicalize_url, split_location};

use super::api::{ApiHarvester, BoardApi, BoardContext, decode_records, html_to_text};

/// Ashby public posting API.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ashby;

pub type AshbyHarvester<F, P = trawl_core::compliance::AllowAll> = ApiHarvester<Ashby, F, P>;

#[derive(Debug, Deserialize)]
struct Board {
    jobs: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    id: String,
    title: String,
    job_url: String,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    is_remote: Option<bool>,
    #[serde(default)]
    is_listed: Option<bool>,
    #[serde(default)]
    employment_type: Option<String>,
    #[serde(default)]
    description_plain: Option<String>,
    #[serde(default)]
    description_html: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    compensation: Option<Compensation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Compensation {
    compensation_tier_summary: Option<String>,
}

impl BoardApi for Ashby {
    fn platform(&self) -> &'static str {
        "Ashby"
    }

    fn board_url(&self, board: &str) -> String {
        format!("https://api.ashbyhq.com/posting-api/job-board/{board}?includeCompensation=true")
    }

    fn parse(
        &self,
        body: &str,
        ctx: &BoardContext<'_>,
    ) -> Result<Vec<Result<CanonicalListing, AppError>>, AppError> {
        let board: Board = serde_json::from_str(body)?;
        Ok(decode_records::<Job>(board.jobs)
            .filter(|job| !matches!(job, Ok(posting) if posting.is_listed == Some(false)))
            .map(|job| job.and_then(|job| map_job(job, ctx)))
            .collect())
    }
}

fn employment_engagement(employment_type: &str) -> Option<EngagementType> {
    match employment_type {
        "FullTime" => Some(EngagementType::FullTime),
        "PartTime" => Some(EngagementType::PartTime),
        "Contract" | "Temporary" => Some(EngagementType::Contract),
        "Intern" => Some(EngagementType::Internship),
        _ => None,
    }
}

fn map_job(job: Job, ctx: &BoardContext<'_>) -> Result<CanonicalListing, AppError> {
    let description = match (job.description_plain, job.description_html) {
        (Some(plain), _) if !plain.trim().is_empty() => plain,
        (_, Some(html)) => html_to_text(&html),
        _ => String::new(),
    };
    let location = job.location.unwrap_or_default();
    let (city, country) = split_location(&location);
    let pay = job
        .compensation
        .and_then(|c| c.compensation_tier_summary)
        .unwrap_or_default();

    let remote = if job.is_remote == Some(true) {
        RemotePolicy::Remote
    } else {
        classify_remote(&format!("{location} {}", job.title))
    };
    let engagement = job
        .employment_type
        .as_deref()
        .and_then(employment_engagement)
        .unwrap_or_else(|| classify_engagement(&format!("{} {description}", job.title)));
    let salary = if pay.is_empty() {
        ctx.salary.parse(&description)
    } else {
        ctx.salary.parse(&pay)
    };

    ListingBuilder::new(ctx.ids, &job.id)
        .title(job.title.as_str())
        .company(ctx.company)
        .description(description.trim())
        .location(city, country)
        .salary(salary)
        .seniority(classify_seniority(&job.title))
        .remote_policy(remote)
        .engagement(engagement)
        .geo(classify_geo(&format!("{location} {description}")))
        .skills(extract_skills(&format!("{} {description}", job.title), DEFAULT_VOCABULARY))
        .url(canonicalize_url(&job.job_url, None)?)
        .posted(job.published_at)
        .build()
}
