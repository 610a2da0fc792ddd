//! Applicant-tracking-system signature detection.
//!
//! Careers pages built on a hosted ATS leak the platform through embed
//! scripts, iframe sources and outbound links. Signatures are tested in a
//! fixed priority order; the first one whose identifier rule yields a value
//! wins.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsType {
    Greenhouse,
    Lever,
    Ashby,
    Workable,
    SmartRecruiters,
    Workday,
    BambooHr,
    Recruitee,
    Teamtailor,
    Personio,
    /// No known signature; the identifier is the careers URL itself.
    Generic,
}

impl AtsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AtsType::Greenhouse => "greenhouse",
            AtsType::Lever => "lever",
            AtsType::Ashby => "ashby",
            AtsType::Workable => "workable",
            AtsType::SmartRecruiters => "smartrecruiters",
            AtsType::Workday => "workday",
            AtsType::BambooHr => "bamboohr",
            AtsType::Recruitee => "recruitee",
            AtsType::Teamtailor => "teamtailor",
            AtsType::Personio => "personio",
            AtsType::Generic => "generic",
        }
    }
}

impl fmt::Display for AtsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of ATS detection: platform plus the platform-specific board id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsInfo {
    pub ats_type: AtsType,
    pub identifier: String,
}

impl AtsInfo {
    pub fn generic(careers_url: &str) -> Self {
        Self {
            ats_type: AtsType::Generic,
            identifier: careers_url.to_string(),
        }
    }
}

struct Signature {
    ats_type: AtsType,
    /// Cheap lower-case substring pre-check.
    marker: &'static str,
    /// Captures the board identifier in group 1.
    identifier: Regex,
}

fn signature(ats_type: AtsType, marker: &'static str, pattern: &str) -> Signature {
    Signature {
        ats_type,
        marker,
        identifier: Regex::new(pattern).expect("ATS pattern is valid"),
    }
}

static SIGNATURES: LazyLock<Vec<Signature>> = LazyLock::new(|| {
    vec![
        signature(
            AtsType::Greenhouse,
            "greenhouse.io",
            r"(?i)(?:boards|job-boards)(?:\.eu)?\.greenhouse\.io/(?:embed/job_board(?:/js)?\?for=|v1/boards/)?([a-z0-9_-]+)",
        ),
        signature(
            AtsType::Lever,
            "lever.co",
            r"(?i)(?:jobs|api)\.lever\.co/(?:v0/postings/)?([a-z0-9_.-]+)",
        ),
        signature(
            AtsType::Ashby,
            "ashbyhq.com",
            r"(?i)jobs\.ashbyhq\.com/([a-z0-9_.%-]+)",
        ),
        signature(
            AtsType::Workable,
            "workable.com",
            r"(?i)apply\.workable\.com/([a-z0-9_-]+)",
        ),
        signature(
            AtsType::SmartRecruiters,
            "smartrecruiters.com",
            r"(?i)(?:jobs|careers)\.smartrecruiters\.com/([a-z0-9_-]+)",
        ),
        signature(
            AtsType::Workday,
            "myworkdayjobs.com",
            r"(?i)([a-z0-9_-]+)\.wd\d+\.myworkdayjobs\.com",
        ),
        signature(
            AtsType::BambooHr,
            "bamboohr.com",
            r"(?i)([a-z0-9_-]+)\.bamboohr\.com",
        ),
        signature(
            AtsType::Recruitee,
            "recruitee.com",
            r"(?i)([a-z0-9_-]+)\.recruitee\.com",
        ),
        signature(
            AtsType::Teamtailor,
            "teamtailor.com",
            r"(?i)([a-z0-9_-]+)\.teamtailor\.com",
        ),
        signature(
            AtsType::Personio,
            "personio.",
            r"(?i)([a-z0-9_-]+)\.jobs\.personio\.(?:de|com)",
        ),
    ]
});

/// Identifiers that are path or host fragments, never board names.
const RESERVED_IDENTIFIERS: &[&str] = &["www", "api", "app", "embed", "js", "v1", "jobs", "careers"];

/// Detect the ATS behind a careers page from its URL and (optionally) body.
///
/// The URL is tested against every signature before the body, so a careers
/// URL that already points at an ATS host is never overridden by an
/// unrelated widget in the page.
pub fn detect_ats(careers_url: &str, body: Option<&str>) -> AtsInfo {
    if let Some(info) = match_signatures(careers_url) {
        return info;
    }
    if let Some(info) = body.and_then(match_signatures) {
        return info;
    }
    AtsInfo::generic(careers_url)
}

fn match_signatures(haystack: &str) -> Option<AtsInfo> {
    let lower = haystack.to_lowercase();
    SIGNATURES
        .iter()
        .filter(|sig| lower.contains(sig.marker))
        .find_map(|sig| {
            sig.identifier
                .captures_iter(haystack)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_lowercase())
                .find(|id| !RESERVED_IDENTIFIERS.contains(&id.as_str()))
                .map(|identifier| AtsInfo {
                    ats_type: sig.ats_type,
                    identifier,
                })
        })
}
