use crate::error::AppError;
use crate::harvest::StopReason;
use crate::page::SoftFailure;

/// Events emitted by a harvester for monitoring/logging.
#[derive(Debug, Clone)]
pub enum HarvestEvent<'a> {
    Started {
        platform: &'a str,
        keywords: &'a str,
        max_pages: u32,
    },
    PageFetched {
        platform: &'a str,
        page: u32,
        url: &'a str,
        cards: usize,
        /// Index of the card selector that matched; `None` for the fallback tier.
        tier: Option<usize>,
    },
    PageFailed {
        platform: &'a str,
        page: u32,
        url: &'a str,
        failure: &'a SoftFailure,
    },
    CardSkipped {
        platform: &'a str,
        page: u32,
        error: &'a AppError,
    },
    Stopped {
        platform: &'a str,
        reason: &'a StopReason,
        pages: u32,
        listings: usize,
    },
}

impl HarvestEvent<'_> {
    /// True for an auth wall, or for a card lost to something other than
    /// its own markup.
    pub fn needs_attention(&self) -> bool {
        match self {
            HarvestEvent::PageFailed { failure, .. } => failure.is_auth_wall(),
            HarvestEvent::CardSkipped { error, .. } => !error.is_parse_failure(),
            _ => false,
        }
    }
}

/// Trait for receiving harvest events (decoupled logging).
pub trait HarvestReporter: Send + Sync {
    fn report(&self, event: HarvestEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHarvestReporter;

impl HarvestReporter for TracingHarvestReporter {
    fn report(&self, event: HarvestEvent<'_>) {
        let attention = event.needs_attention();
        match event {
            HarvestEvent::Started {
                platform,
                keywords,
                max_pages,
            } => {
                tracing::info!(%platform, %keywords, %max_pages, "Harvest started");
            }
            HarvestEvent::PageFetched {
                platform,
                page,
                url,
                cards,
                tier,
            } => {
                tracing::debug!(%platform, %page, %url, %cards, ?tier, "Page fetched");
            }
            HarvestEvent::PageFailed {
                platform,
                page,
                url,
                failure,
            } => {
                if attention {
                    tracing::warn!(%platform, %page, %url, "Auth wall, ending source run");
                } else {
                    tracing::info!(%platform, %page, %url, %failure, "Page yielded nothing");
                }
            }
            HarvestEvent::CardSkipped {
                platform,
                page,
                error,
            } => {
                if attention {
                    tracing::warn!(%platform, %page, %error, "Card failed");
                } else {
                    tracing::debug!(%platform, %page, %error, "Card skipped");
                }
            }
            HarvestEvent::Stopped {
                platform,
                reason,
                pages,
                listings,
            } => {
                tracing::info!(%platform, %reason, %pages, %listings, "Harvest stopped");
            }
        }
    }
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl HarvestReporter for NullReporter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_failed(failure: &SoftFailure) -> HarvestEvent<'_> {
        HarvestEvent::PageFailed {
            platform: "Board",
            page: 1,
            url: "https://board.example.com/jobs",
            failure,
        }
    }

    fn card_skipped(error: &AppError) -> HarvestEvent<'_> {
        HarvestEvent::CardSkipped {
            platform: "Board",
            page: 2,
            error,
        }
    }

    #[test]
    fn auth_wall_needs_attention() {
        assert!(page_failed(&SoftFailure::AuthWall).needs_attention());
        assert!(!page_failed(&SoftFailure::EmptyBody).needs_attention());
        assert!(!page_failed(&SoftFailure::FetchError("HTTP 503".into())).needs_attention());
    }

    #[test]
    fn only_non_markup_card_errors_need_attention() {
        assert!(!card_skipped(&AppError::MissingField("title")).needs_attention());
        assert!(!card_skipped(&AppError::ParseError("no id".into())).needs_attention());
        assert!(card_skipped(&AppError::ConfigError("bad template".into())).needs_attention());
    }
}
