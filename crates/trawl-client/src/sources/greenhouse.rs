use chrono::{DateTime, Utc};
use serde::Deserialize;
use trawl_core::classify::{classify_engagement, classify_geo, classify_remote, classify_seniority};
use trawl_core::error::AppError;
use trawl_core::models::{CanonicalListing, ListingBuilder};
use trawl_core::skills::{DEFAULT_VOCABULARY, extract_skills};
use trawl_core::util::{canonicalize_url, split_location};

use super::api::{ApiHarvester, BoardApi, BoardContext, decode_records, html_to_text};

/// Greenhouse public job board API.
#[derive(Debug, Default, Clone, Copy)]
pub struct Greenhouse;

pub type GreenhouseHarvester<F, P = trawl_core::compliance::AllowAll> = ApiHarvester<Greenhouse, F, P>;

#[derive(Debug, Deserialize)]
struct Board {
    jobs: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Job {
    id: u64,
    title: String,
    absolute_url: String,
    #[serde(default)]
    location: Option<Location>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    departments: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

impl BoardApi for Greenhouse {
    fn platform(&self) -> &'static str {
        "Greenhouse"
    }

    fn board_url(&self, board: &str) -> String {
        format!("https://boards-api.greenhouse.io/v1/boards/{board}/jobs?content=true")
    }

    fn parse(
        &self,
        body: &str,
        ctx: &BoardContext<'_>,
    ) -> Result<Vec<Result<CanonicalListing, AppError>>, AppError> {
        let board: Board = serde_json::from_str(body)?;
        Ok(decode_records::<Job>(board.jobs)
            .map(|job| job.and_then(|job| map_job(job, ctx)))
            .collect())
    }
}

fn map_job(job: Job, ctx: &BoardContext<'_>) -> Result<CanonicalListing, AppError> {
    let description = job.content.as_deref().map(html_to_text).unwrap_or_default();
    let location = job.location.map(|l| l.name).unwrap_or_default();
    let (city, country) = split_location(&location);
    let departments: Vec<_> = job.departments.into_iter().map(|d| d.name).collect();
    let text = format!("{} {location} {description}", job.title);

    ListingBuilder::new(ctx.ids, &job.id.to_string())
        .title(job.title.as_str())
        .company(ctx.company)
        .description(description.as_str())
        .location(city, country)
        .salary(ctx.salary.parse(&description))
        .seniority(classify_seniority(&job.title))
        .remote_policy(classify_remote(&format!("{location} {}", job.title)))
        .engagement(classify_engagement(&text))
        .geo(classify_geo(&format!("{location} {description}")))
        .skills(extract_skills(&format!("{} {}", text, departments.join(" ")), DEFAULT_VOCABULARY))
        .url(canonicalize_url(&job.absolute_url, None)?)
        .posted(job.updated_at)
        .build()
}
