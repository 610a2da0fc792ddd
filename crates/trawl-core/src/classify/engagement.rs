use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::table::KeywordTable;

/// Contractual form of the engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
    Unknown,
}

impl EngagementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementType::FullTime => "full_time",
            EngagementType::PartTime => "part_time",
            EngagementType::Contract => "contract",
            EngagementType::Freelance => "freelance",
            EngagementType::Internship => "internship",
            EngagementType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EngagementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static ENGAGEMENT: LazyLock<KeywordTable<EngagementType>> = LazyLock::new(|| {
    KeywordTable::new(EngagementType::Unknown)
        .rule(
            &["internship", "intern", "trainee", "стажування", "стажировка"],
            EngagementType::Internship,
        )
        .rule(
            &["freelance", "freelancer", "gig", "фріланс", "фриланс"],
            EngagementType::Freelance,
        )
        .rule(
            &[
                "contract",
                "contractor",
                "b2b",
                "fixed-price",
                "fixed price",
                "hourly",
                "temporary",
                "project-based",
                "контракт",
                "проєктна",
                "проектная",
            ],
            EngagementType::Contract,
        )
        .rule(
            &[
                "part-time",
                "part time",
                "parttime",
                "часткова зайнятість",
                "частичная занятость",
            ],
            EngagementType::PartTime,
        )
        .rule(
            &[
                "full-time",
                "full time",
                "fulltime",
                "permanent",
                "повна зайнятість",
                "полная занятость",
            ],
            EngagementType::FullTime,
        )
});

pub fn classify_engagement(text: &str) -> EngagementType {
    ENGAGEMENT.classify(text)
}

pub fn classify_engagement_or(text: &str, default: EngagementType) -> EngagementType {
    ENGAGEMENT.classify_or(text, default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_engagement_rules() {
        assert_eq!(
            classify_engagement("Paid internship, full-time"),
            EngagementType::Internship
        );
        assert_eq!(
            classify_engagement("Full-time contract (B2B)"),
            EngagementType::Contract
        );
        assert_eq!(classify_engagement("Part-time"), EngagementType::PartTime);
        assert_eq!(classify_engagement("Permanent"), EngagementType::FullTime);
        assert_eq!(
            classify_engagement("Повна зайнятість"),
            EngagementType::FullTime
        );
    }

    #[test]
    fn unknown_without_signal() {
        assert_eq!(classify_engagement("Rust developer"), EngagementType::Unknown);
        assert_eq!(
            classify_engagement_or("Rust developer", EngagementType::Freelance),
            EngagementType::Freelance
        );
    }
}
