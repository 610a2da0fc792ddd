use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::table::KeywordTable;

/// Where candidates must be located for a (usually remote) role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoRestriction {
    Worldwide,
    UsOnly,
    UkOnly,
    EuOnly,
    Americas,
    Emea,
    Apac,
    Unknown,
}

impl GeoRestriction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoRestriction::Worldwide => "worldwide",
            GeoRestriction::UsOnly => "us_only",
            GeoRestriction::UkOnly => "uk_only",
            GeoRestriction::EuOnly => "eu_only",
            GeoRestriction::Americas => "americas",
            GeoRestriction::Emea => "emea",
            GeoRestriction::Apac => "apac",
            GeoRestriction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for GeoRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Narrow restrictions first; "worldwide" only wins when nothing narrower
// is stated.
static GEO: LazyLock<KeywordTable<GeoRestriction>> = LazyLock::new(|| {
    KeywordTable::new(GeoRestriction::Unknown)
        .rule(
            &[
                "us only",
                "usa only",
                "us-only",
                "us based",
                "us-based",
                "united states only",
                "must be located in the us",
                "us citizens",
                "us residents",
            ],
            GeoRestriction::UsOnly,
        )
        .rule(
            &["uk only", "uk-only", "uk based", "uk-based", "united kingdom only"],
            GeoRestriction::UkOnly,
        )
        .rule(
            &[
                "eu only",
                "eu-only",
                "eu based",
                "eu-based",
                "european union",
                "europe only",
                "eu timezone",
                "cet",
                "cest",
            ],
            GeoRestriction::EuOnly,
        )
        .rule(
            &[
                "americas",
                "north america",
                "latam",
                "latin america",
                "south america",
            ],
            GeoRestriction::Americas,
        )
        .rule(&["emea", "europe", "європа", "европа"], GeoRestriction::Emea)
        .rule(&["apac", "asia", "asia-pacific", "oceania"], GeoRestriction::Apac)
        .rule(
            &[
                "worldwide",
                "anywhere",
                "global",
                "any location",
                "any country",
                "будь-яка країна",
                "весь мир",
            ],
            GeoRestriction::Worldwide,
        )
});

pub fn classify_geo(text: &str) -> GeoRestriction {
    GEO.classify(text)
}

pub fn classify_geo_or(text: &str, default: GeoRestriction) -> GeoRestriction {
    GEO.classify_or(text, default)
}
