//! HTML job-board presets.
//!
//! Each preset is plain [`SourceConfig`] data for the generic
//! [`SourceHarvester`](trawl_core::harvest::SourceHarvester). Selector
//! cascades list the current markup first and older layouts after it.

use trawl_core::classify::{EngagementType, RemotePolicy, SeniorityLevel};
use trawl_core::error::AppError;
use trawl_core::harvest::{FieldSelectors, NativeIdRule, Pagination, SourceConfig};
use trawl_core::models::ListingKind;
use trawl_core::salary::SalaryParser;
use trawl_core::selector::SelectorCascade;

/// A named source configuration.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub about: &'static str,
    pub build: fn() -> Result<SourceConfig, AppError>,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "djinni",
        about: "Djinni.co developer vacancies",
        build: djinni,
    },
    Preset {
        name: "dou",
        about: "jobs.dou.ua vacancy search",
        build: dou,
    },
    Preset {
        name: "weworkremotely",
        about: "We Work Remotely search (remote only)",
        build: weworkremotely,
    },
    Preset {
        name: "linkedin",
        about: "LinkedIn public guest job search",
        build: linkedin,
    },
    Preset {
        name: "freelancehunt",
        about: "Freelancehunt project marketplace",
        build: freelancehunt,
    },
    Preset {
        name: "stackoverflow-interview",
        about: "Stack Overflow questions by tag, as interview questions",
        build: stackoverflow_interview,
    },
];

/// Build the named preset.
pub fn preset(name: &str) -> Result<SourceConfig, AppError> {
    let name = name.trim().to_lowercase();
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| AppError::ConfigError(format!("unknown source preset `{name}`")))
        .and_then(|p| (p.build)())
}

fn css(patterns: &[&str]) -> Result<SelectorCascade, AppError> {
    SelectorCascade::parse(patterns)
}

pub fn djinni() -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new(
        "Djinni",
        "https://djinni.co/jobs/?all-keywords={keywords}&page={page}",
    );
    config.cards = css(&["li.list-jobs__item", "[id^='job-item-']", "li.job-list-item"])?;
    config.fallback_cards = css(&["a[href^='/jobs/']"])?;
    config.fields = FieldSelectors {
        title: css(&["a.job-item__title-link", ".job-list-item__link", "h3 a", "h2 a"])?,
        link: css(&["a.job-item__title-link", ".job-list-item__link", "a[href^='/jobs/']"])?,
        company: css(&["a[data-analytics='company_page']", ".job-list-item__pic + div a", ".mr-2 a"])?,
        location: css(&[".location-text", ".job-list-item__job-info .location-text"])?,
        salary: css(&[".public-salary-item", ".job-item__salary", ".text-success"])?,
        description: css(&[".js-truncated-text", ".job-list-item__description", ".job-item__description"])?,
        tags: css(&[".job-list-item__tags .badge", ".job-item__tags .badge"])?,
        posted: css(&["[data-original-title]", ".text-date"])?,
    };
    config.next_page = css(&[
        ".pagination li.page-item:not(.disabled) a[aria-label='Next']",
        ".pagination li:last-child:not(.disabled) a.page-link",
    ])?;
    config.detail = Some(FieldSelectors {
        title: css(&["h1"])?,
        company: css(&["a.job-details--title", ".job-details--title"])?,
        location: css(&[".location-text"])?,
        salary: css(&[".public-salary-item"])?,
        description: css(&[".job-post__description", ".job-post-description", ".mb-4 .text-break"])?,
        tags: css(&[".job-additional-info--item-text span"])?,
        ..FieldSelectors::default()
    });
    config.native_id = NativeIdRule::url_pattern(r"/jobs/(\d+)")?;
    Ok(config)
}

pub fn dou() -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new(
        "DOU",
        "https://jobs.dou.ua/vacancies/?search={keywords}",
    );
    config.pagination = Pagination::NextLink;
    config.cards = css(&["li.l-vacancy", "div.vacancy"])?;
    config.fallback_cards = css(&["a[href*='/vacancies/']"])?;
    config.fields = FieldSelectors {
        title: css(&["a.vt", ".title a"])?,
        link: css(&["a.vt", ".title a"])?,
        company: css(&["a.company", ".company"])?,
        location: css(&["span.cities", ".cities"])?,
        salary: css(&["span.salary", ".salary"])?,
        description: css(&["div.sh-info", ".sh-info"])?,
        posted: css(&["div.date", ".date"])?,
        ..FieldSelectors::default()
    };
    config.next_page = css(&[".more-btn a[href]", "a.next[href]"])?;
    config.detail = Some(FieldSelectors {
        title: css(&["h1.g-h2", "h1"])?,
        company: css(&[".b-compinfo .l-n a", ".b-compinfo a"])?,
        location: css(&["span.place", ".sh-info .place"])?,
        salary: css(&["span.salary"])?,
        description: css(&["div.vacancy-section", ".b-typo.vacancy-section"])?,
        posted: css(&["div.date"])?,
        ..FieldSelectors::default()
    });
    config.native_id = NativeIdRule::url_pattern(r"/vacancies/(\d+)")?;
    config.salary = SalaryParser::default().with_default_currency("USD");
    Ok(config)
}

pub fn weworkremotely() -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new(
        "WeWorkRemotely",
        "https://weworkremotely.com/remote-jobs/search?term={keywords}",
    );
    config.pagination = Pagination::NextLink;
    config.cards = css(&["li.new-listing-container", "li.feature", "section.jobs li:not(.view-all)"])?;
    config.fallback_cards = css(&["a[href^='/remote-jobs/']"])?;
    config.fields = FieldSelectors {
        title: css(&[".new-listing__header__title", "span.title"])?,
        link: css(&[".listing-link--unlocked", "a[href^='/remote-jobs/']", "a[href*='/remote-jobs/']"])?,
        company: css(&[".new-listing__company-name", "span.company"])?,
        location: css(&[".new-listing__company-headquarters", "span.region"])?,
        salary: css(&[".new-listing__categories__category--salary"])?,
        tags: css(&[".new-listing__categories__category"])?,
        posted: css(&[".new-listing__header__icons__date", "time"])?,
        ..FieldSelectors::default()
    };
    config.next_page = css(&[".pagination a[rel='next']", "a.next_page"])?;
    config.native_id = NativeIdRule::UrlPathTail;
    config.defaults.remote = RemotePolicy::Remote;
    Ok(config)
}

pub fn linkedin() -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new(
        "LinkedIn",
        "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search?keywords={keywords}&start={page}",
    );
    config.pagination = Pagination::Offset { page_size: 25 };
    config.cards = css(&["div.base-search-card", "div.base-card", "li div[data-entity-urn]"])?;
    config.fallback_cards = css(&["a[href*='/jobs/view/']"])?;
    config.fields = FieldSelectors {
        title: css(&[".base-search-card__title", "h3"])?,
        link: css(&["a.base-card__full-link", "a[href*='/jobs/view/']"])?,
        company: css(&[".base-search-card__subtitle a", ".base-search-card__subtitle", "h4"])?,
        location: css(&[".job-search-card__location"])?,
        salary: css(&[".job-search-card__salary-info"])?,
        posted: css(&["time.job-search-card__listdate", "time.job-search-card__listdate--new", "time"])?,
        ..FieldSelectors::default()
    };
    config.detail = Some(FieldSelectors {
        title: css(&["h1.top-card-layout__title", "h1"])?,
        company: css(&["a.topcard__org-name-link", ".topcard__flavor a"])?,
        location: css(&[".topcard__flavor--bullet"])?,
        salary: css(&[".salary.compensation__salary", ".compensation__salary"])?,
        description: css(&[".show-more-less-html__markup", ".description__text"])?,
        tags: css(&[".description__job-criteria-text"])?,
        posted: css(&[".posted-time-ago__text"])?,
        ..FieldSelectors::default()
    });
    config.native_id = NativeIdRule::CardAttr("data-entity-urn".to_string());
    Ok(config)
}

pub fn freelancehunt() -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new(
        "Freelancehunt",
        "https://freelancehunt.com/projects?name={keywords}&page={page}",
    );
    config.cards = css(&["table.project-list tbody tr", "tr[data-published]"])?;
    config.fallback_cards = css(&["a.biggest[href*='/project/']"])?;
    config.fields = FieldSelectors {
        title: css(&["a.biggest", "td a.visitable"])?,
        link: css(&["a.biggest", "td a.visitable"])?,
        salary: css(&[".price", "span.text-green"])?,
        description: css(&["p", ".project-description"])?,
        tags: css(&["small.with-tags a", ".skills a"])?,
        posted: css(&["h2.with-tooltip", ".calendar"])?,
        ..FieldSelectors::default()
    };
    config.next_page = css(&[".pagination li.next:not(.disabled) a", "a[rel='next']"])?;
    config.native_id = NativeIdRule::url_pattern(r"/project/(?:[^/]+/)?(\d+)\.html")?;
    config.defaults.seniority = SeniorityLevel::Senior;
    config.defaults.engagement = EngagementType::Freelance;
    config.defaults.remote = RemotePolicy::Remote;
    config.defaults.company = Some("Freelancehunt client".to_string());
    config.salary = SalaryParser::default().with_default_currency("UAH");
    Ok(config)
}

pub fn stackoverflow_interview() -> Result<SourceConfig, AppError> {
    let mut config = SourceConfig::new(
        "StackOverflow",
        "https://stackoverflow.com/questions/tagged/{keywords}?tab=votes&page={page}",
    );
    config.kind = ListingKind::InterviewQuestion;
    config.cards = css(&["div.s-post-summary", "div.question-summary"])?;
    config.fallback_cards = css(&["a.s-link[href^='/questions/']"])?;
    config.fields = FieldSelectors {
        title: css(&["h3.s-post-summary--content-title a", "a.question-hyperlink"])?,
        link: css(&["h3.s-post-summary--content-title a", "a.question-hyperlink"])?,
        description: css(&[".s-post-summary--content-excerpt", ".excerpt"])?,
        tags: css(&[".s-post-summary--meta-tags a.s-tag", "a.post-tag"])?,
        posted: css(&["span.relativetime", ".s-user-card--time span"])?,
        ..FieldSelectors::default()
    };
    config.next_page = css(&["a[rel='next']", ".s-pagination a[rel='next']"])?;
    config.native_id = NativeIdRule::url_pattern(r"/questions/(\d+)")?;
    config.defaults.company = Some("Stack Overflow".to_string());
    Ok(config)
}
