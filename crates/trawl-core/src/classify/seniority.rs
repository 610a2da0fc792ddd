use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::table::KeywordTable;

/// Seniority of the advertised role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeniorityLevel {
    Intern,
    Junior,
    Middle,
    Senior,
    Lead,
    Architect,
    /// Principal and Staff levels.
    Principal,
    Unknown,
}

impl SeniorityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeniorityLevel::Intern => "intern",
            SeniorityLevel::Junior => "junior",
            SeniorityLevel::Middle => "middle",
            SeniorityLevel::Senior => "senior",
            SeniorityLevel::Lead => "lead",
            SeniorityLevel::Architect => "architect",
            SeniorityLevel::Principal => "principal",
            SeniorityLevel::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Each level carries its Latin and Cyrillic terms together so that a
// higher level wins regardless of the language it is written in.
static SENIORITY: LazyLock<KeywordTable<SeniorityLevel>> = LazyLock::new(|| {
    KeywordTable::new(SeniorityLevel::Unknown)
        .rule(
            &["principal", "staff", "distinguished", "провідний", "ведущий"],
            SeniorityLevel::Principal,
        )
        .rule(
            &["architect", "архітектор", "архитектор"],
            SeniorityLevel::Architect,
        )
        .rule(
            &[
                "lead",
                "team lead",
                "teamlead",
                "tech lead",
                "head of",
                "лід",
                "тімлід",
                "тимлид",
                "лид",
                "керівник",
                "руководитель",
            ],
            SeniorityLevel::Lead,
        )
        .rule(
            &["senior", "sr", "sr.", "сеньйор", "сеньор", "синьор", "старший"],
            SeniorityLevel::Senior,
        )
        .rule(
            &[
                "middle",
                "mid",
                "mid-level",
                "intermediate",
                "regular",
                "мідл",
                "миддл",
                "середній",
            ],
            SeniorityLevel::Middle,
        )
        .rule(
            &[
                "junior",
                "jr",
                "jr.",
                "entry level",
                "entry-level",
                "graduate",
                "джуніор",
                "джун",
                "джуниор",
                "молодший",
                "младший",
            ],
            SeniorityLevel::Junior,
        )
        .rule(
            &[
                "intern",
                "internship",
                "trainee",
                "стажер",
                "стажист",
                "стажування",
                "стажировка",
            ],
            SeniorityLevel::Intern,
        )
});

/// Classify seniority from a title (or any free text).
pub fn classify_seniority(text: &str) -> SeniorityLevel {
    SENIORITY.classify(text)
}

/// Classify seniority, falling back to a per-source default instead of
/// `Unknown` when the text carries no signal.
pub fn classify_seniority_or(text: &str, default: SeniorityLevel) -> SeniorityLevel {
    SENIORITY.classify_or(text, default)
}
