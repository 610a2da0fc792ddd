use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use super::table::KeywordTable;

/// Where the work is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemotePolicy {
    Remote,
    Hybrid,
    OnSite,
    Unknown,
}

impl RemotePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemotePolicy::Remote => "remote",
            RemotePolicy::Hybrid => "hybrid",
            RemotePolicy::OnSite => "on_site",
            RemotePolicy::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RemotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// "Remote or office" style phrasing is hybrid, so hybrid is checked first.
static REMOTE: LazyLock<KeywordTable<RemotePolicy>> = LazyLock::new(|| {
    KeywordTable::new(RemotePolicy::Unknown)
        .rule(
            &[
                "hybrid",
                "remote/office",
                "office/remote",
                "office or remote",
                "remote or office",
                "partially remote",
                "гібрид",
                "гибрид",
                "офіс/віддалено",
                "офис/удаленно",
            ],
            RemotePolicy::Hybrid,
        )
        .rule(
            &[
                "remote",
                "fully remote",
                "100% remote",
                "work from home",
                "wfh",
                "anywhere",
                "distributed",
                "віддалено",
                "віддалена робота",
                "дистанційно",
                "удаленно",
                "удаленная работа",
            ],
            RemotePolicy::Remote,
        )
        .rule(
            &[
                "on-site",
                "onsite",
                "on site",
                "in office",
                "in-office",
                "office",
                "relocation",
                "офіс",
                "офис",
                "релокейт",
            ],
            RemotePolicy::OnSite,
        )
});

pub fn classify_remote(text: &str) -> RemotePolicy {
    REMOTE.classify(text)
}

pub fn classify_remote_or(text: &str, default: RemotePolicy) -> RemotePolicy {
    REMOTE.classify_or(text, default)
}
