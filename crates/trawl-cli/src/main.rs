use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use trawl_client::sources::ATS_SOURCES;
use trawl_client::{AtsDetector, PRESETS, ReqwestFetcher, Source};
use trawl_core::classify::{EngagementType, GeoRestriction, RemotePolicy, SeniorityLevel};
use trawl_core::compliance::ComplianceGate;
use trawl_core::config::HarvestSettings;
use trawl_core::dedup::{DedupPolicy, ListingSet};
use trawl_core::models::{CanonicalListing, HarvestQuery, ListingKind};
use trawl_core::page::PageFetcher;
use trawl_core::run::harvest_all;

#[derive(Parser)]
#[command(name = "trawl", version, about = "Job and interview-question listing harvester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available sources
    Sources,

    /// Harvest listings from one or more sources
    Harvest {
        /// Source name: a board preset (e.g. "djinni") or "<ats>:<board>"
        /// (e.g. "greenhouse:acme"). Repeat to run several concurrently.
        #[arg(short, long = "source", required = true)]
        sources: Vec<String>,

        /// Search keywords
        #[arg(short, long, num_args = 1..)]
        keywords: Vec<String>,

        /// Maximum result pages per source (defaults to TRAWL_MAX_PAGES or 5)
        #[arg(short = 'p', long)]
        max_pages: Option<u32>,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },

    /// Detect the applicant tracking system behind a careers page
    Detect {
        /// Careers page URL
        #[arg(short, long)]
        url: String,
    },

    /// Collect every open position of a company from its careers page
    Company {
        /// Company display name
        #[arg(short, long)]
        name: String,

        /// Careers page URL
        #[arg(short, long)]
        url: String,

        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries only data.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("trawl=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => cmd_sources(),
        Commands::Harvest {
            sources,
            keywords,
            max_pages,
            format,
        } => {
            let settings = load_settings()?;
            let max_pages = max_pages.unwrap_or(settings.max_pages);
            cmd_harvest(&settings, &sources, keywords, max_pages, format).await?;
        }
        Commands::Detect { url } => {
            let settings = load_settings()?;
            cmd_detect(&settings, &url).await?;
        }
        Commands::Company { name, url, format } => {
            let settings = load_settings()?;
            cmd_company(&settings, &name, &url, format).await?;
        }
    }

    Ok(())
}

fn load_settings() -> Result<HarvestSettings> {
    HarvestSettings::from_env().context("Invalid TRAWL_* settings")
}

/// One gate shared by every source so per-origin pacing holds across them.
fn page_fetcher(settings: &HarvestSettings) -> Result<PageFetcher<ReqwestFetcher>> {
    let fetcher = ReqwestFetcher::from_settings(settings).context("Failed to create HTTP client")?;
    Ok(PageFetcher::new(fetcher, ComplianceGate::new(settings.gate_config())))
}

/// Token cancelled on Ctrl-C. Harvesters then stop and return what they have.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Interrupted, returning partial results");
                token.cancel();
            }
            Err(e) => tracing::error!(error = %e, "Failed to install Ctrl-C handler"),
        }
    });
    cancel
}

fn cmd_sources() {
    println!("Board presets:");
    for preset in PRESETS {
        println!("  {:<26} {}", preset.name, preset.about);
    }
    println!("\nATS boards (<ats>:<board>):");
    for ats in ATS_SOURCES {
        println!("  {ats}:<board>");
    }
}

async fn cmd_harvest(
    settings: &HarvestSettings,
    names: &[String],
    keywords: Vec<String>,
    max_pages: u32,
    format: Format,
) -> Result<()> {
    let pages = page_fetcher(settings)?;
    let sources = names
        .iter()
        .map(|name| {
            Source::from_name(name, pages.clone()).with_context(|| format!("Unknown source `{name}`"))
        })
        .collect::<Result<Vec<_>>>()?;

    let query = HarvestQuery::new(keywords, max_pages);
    let cancel = cancel_on_ctrl_c();

    tracing::info!(
        sources = names.len(),
        keywords = %query.joined(),
        max_pages,
        "Harvest started"
    );

    let runs = harvest_all(&sources, &query, &cancel)
        .await
        .context("Harvest aborted")?;

    let mut found = ListingSet::new(DedupPolicy::KeepFirst);
    for run in runs {
        if let Some(error) = &run.error {
            tracing::warn!(platform = %run.platform, %error, "Source failed");
        }
        found.extend(run.listings);
    }

    let listings = found.into_vec();
    tracing::info!(count = listings.len(), "Harvest complete");
    write_listings(&listings, format)
}

async fn cmd_detect(settings: &HarvestSettings, url: &str) -> Result<()> {
    let detector = AtsDetector::new(page_fetcher(settings)?);
    let info = detector
        .detect(url, &cancel_on_ctrl_c())
        .await
        .context("Detection cancelled")?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn cmd_company(settings: &HarvestSettings, name: &str, url: &str, format: Format) -> Result<()> {
    let detector = AtsDetector::new(page_fetcher(settings)?);
    let result = detector
        .resolve_company(name, url, &cancel_on_ctrl_c())
        .await
        .context("Company resolution cancelled")?;

    if let Some(error) = &result.error {
        tracing::warn!(company = %name, %error, "Company resolution failed");
    }

    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Format::Csv => write_listings(&result.listings, format),
    }
}

fn write_listings(listings: &[CanonicalListing], format: Format) -> Result<()> {
    let stdout = std::io::stdout().lock();
    match format {
        Format::Json => {
            let mut out = stdout;
            serde_json::to_writer_pretty(&mut out, listings)?;
            writeln!(out)?;
        }
        Format::Csv => write_csv(stdout, listings)?,
    }
    Ok(())
}

/// Flat CSV shape of a listing. Skills are joined with `;`.
#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    kind: ListingKind,
    title: &'a str,
    company: &'a str,
    city: Option<&'a str>,
    country: Option<&'a str>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    salary_currency: Option<&'a str>,
    is_hourly_rate: Option<bool>,
    remote_policy: &'a RemotePolicy,
    seniority_level: &'a SeniorityLevel,
    engagement_type: &'a EngagementType,
    geo_restrictions: &'a GeoRestriction,
    required_skills: String,
    source_platform: &'a str,
    url: &'a str,
    posted_date: Option<String>,
    scraped_date: String,
    description: &'a str,
}

impl<'a> From<&'a CanonicalListing> for CsvRow<'a> {
    fn from(l: &'a CanonicalListing) -> Self {
        Self {
            id: &l.id,
            kind: l.kind,
            title: &l.title,
            company: &l.company,
            city: l.city.as_deref(),
            country: l.country.as_deref(),
            salary_min: l.salary_min,
            salary_max: l.salary_max,
            salary_currency: l.salary_currency.as_deref(),
            is_hourly_rate: l.is_hourly_rate,
            remote_policy: &l.remote_policy,
            seniority_level: &l.seniority_level,
            engagement_type: &l.engagement_type,
            geo_restrictions: &l.geo_restrictions,
            required_skills: l.required_skills.join(";"),
            source_platform: &l.source_platform,
            url: &l.url,
            posted_date: l.posted_date.map(|d| d.to_rfc3339()),
            scraped_date: l.scraped_date.to_rfc3339(),
            description: &l.description,
        }
    }
}

fn write_csv<W: Write>(out: W, listings: &[CanonicalListing]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for listing in listings {
        writer.serialize(CsvRow::from(listing))?;
    }
    writer.flush()?;
    Ok(())
}
