use std::time::Duration;

use crate::compliance::GateConfig;
use crate::error::AppError;

/// Process-wide harvest settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestSettings {
    pub delay: Duration,
    pub jitter: Duration,
    pub max_pages: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

pub const DEFAULT_USER_AGENT: &str = concat!("trawl/", env!("CARGO_PKG_VERSION"));

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            jitter: Duration::from_secs(1),
            max_pages: 5,
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HarvestSettings {
    /// Read settings from environment variables.
    ///
    /// - `TRAWL_DELAY_MS` (optional, defaults to 3000)
    /// - `TRAWL_JITTER_MS` (optional, defaults to 1000)
    /// - `TRAWL_MAX_PAGES` (optional, defaults to 5, at least 1)
    /// - `TRAWL_TIMEOUT_SECS` (optional, defaults to 30, at least 1)
    /// - `TRAWL_USER_AGENT` (optional)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let delay = match lookup("TRAWL_DELAY_MS") {
            None => defaults.delay,
            Some(raw) => Duration::from_millis(parse_number("TRAWL_DELAY_MS", &raw, 0)?),
        };
        let jitter = match lookup("TRAWL_JITTER_MS") {
            None => defaults.jitter,
            Some(raw) => Duration::from_millis(parse_number("TRAWL_JITTER_MS", &raw, 0)?),
        };
        let max_pages = match lookup("TRAWL_MAX_PAGES") {
            None => defaults.max_pages,
            Some(raw) => {
                let parsed = parse_number("TRAWL_MAX_PAGES", &raw, 1)?;
                u32::try_from(parsed).map_err(|_| {
                    AppError::ConfigError(format!("TRAWL_MAX_PAGES '{raw}' is too large"))
                })?
            }
        };
        let timeout = match lookup("TRAWL_TIMEOUT_SECS") {
            None => defaults.timeout,
            Some(raw) => Duration::from_secs(parse_number("TRAWL_TIMEOUT_SECS", &raw, 1)?),
        };
        let user_agent = match lookup("TRAWL_USER_AGENT") {
            Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            Some(_) => {
                return Err(AppError::ConfigError("TRAWL_USER_AGENT is blank".into()));
            }
            None => defaults.user_agent,
        };

        Ok(Self {
            delay,
            jitter,
            max_pages,
            timeout,
            user_agent,
        })
    }

    pub fn gate_config(&self) -> GateConfig {
        GateConfig::new(self.delay).with_jitter(self.jitter)
    }
}

fn parse_number(key: &str, raw: &str, min: u64) -> Result<u64, AppError> {
    let parsed: u64 = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a non-negative integer"
        ))
    })?;
    if parsed < min {
        return Err(AppError::ConfigError(format!("{key} must be at least {min}")));
    }
    Ok(parsed)
}
