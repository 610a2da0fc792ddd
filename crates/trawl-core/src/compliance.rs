//! Per-origin request pacing and request-level policy.
//!
//! Every outgoing request first waits its turn at the [`ComplianceGate`].
//! Turns are reserved per origin (`scheme://host:port`): each caller takes
//! the next free slot under a short lock, releases the lock and sleeps until
//! its slot. Requests to one origin are therefore spaced by at least the
//! configured interval, while unrelated origins never wait on each other.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use trawl_core::compliance::{ComplianceGate, GateConfig};
//!
//! # async fn run() -> Result<(), trawl_core::AppError> {
//! let gate = ComplianceGate::new(
//!     GateConfig::new(Duration::from_secs(3)).with_jitter(Duration::from_millis(500)),
//! );
//! let cancel = CancellationToken::new();
//! gate.await_turn("https://jobs.example.com/search?page=1", &cancel).await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::AppError;
use crate::traits::{CompliancePolicy, PolicyDecision};

/// Pacing configuration for a [`ComplianceGate`].
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Minimum spacing between requests to the same origin.
    pub delay: Duration,

    /// Maximum random jitter added to each interval (uniform `[0, jitter)`).
    pub jitter: Duration,

    /// Per-origin overrides of `delay`, keyed by `scheme://host:port`.
    pub origin_delays: HashMap<String, Duration>,
}

impl GateConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
            origin_delays: HashMap::new(),
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Override the interval for one origin. Accepts any URL on that origin.
    pub fn with_origin_delay(mut self, url: &str, delay: Duration) -> Self {
        if let Some(origin) = Url::parse(url).ok().as_ref().and_then(origin_key) {
            self.origin_delays.insert(origin, delay);
        }
        self
    }

    /// Spacing to enforce before the next request to `origin`.
    fn interval_for(&self, origin: &str) -> Duration {
        let base = self
            .origin_delays
            .get(origin)
            .copied()
            .unwrap_or(self.delay);
        if self.jitter.is_zero() {
            return base;
        }
        base + Duration::from_millis(rand_jitter_ms(self.jitter.as_millis() as u64))
    }
}

impl Default for GateConfig {
    /// 2 seconds between requests to one origin, up to 1 second of jitter.
    fn default() -> Self {
        Self::new(Duration::from_secs(2)).with_jitter(Duration::from_secs(1))
    }
}

/// Policy that allows every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl CompliancePolicy for AllowAll {
    fn check(&self, _url: &Url) -> PolicyDecision {
        PolicyDecision::Allow
    }
}

/// Policy that denies any URL whose path starts with a listed prefix.
#[derive(Debug, Default, Clone)]
pub struct PathDenyList {
    prefixes: Vec<String>,
}

impl PathDenyList {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }
}

impl CompliancePolicy for PathDenyList {
    fn check(&self, url: &Url) -> PolicyDecision {
        let path = url.path();
        match self.prefixes.iter().find(|p| path.starts_with(p.as_str())) {
            Some(prefix) => PolicyDecision::Deny(format!("path {path} matches deny prefix {prefix}")),
            None => PolicyDecision::Allow,
        }
    }
}

/// Paces requests per origin and applies a [`CompliancePolicy`].
///
/// Clones share the same slot table, so one gate can be handed to several
/// harvesters that happen to hit the same origin.
#[derive(Clone)]
pub struct ComplianceGate<P = AllowAll> {
    config: Arc<GateConfig>,
    policy: P,
    /// Last reserved slot per origin key.
    slots: Arc<Mutex<HashMap<String, Instant>>>,
}

impl ComplianceGate<AllowAll> {
    pub fn new(config: GateConfig) -> Self {
        Self::with_policy(config, AllowAll)
    }
}

impl<P: CompliancePolicy> ComplianceGate<P> {
    pub fn with_policy(config: GateConfig, policy: P) -> Self {
        Self {
            config: Arc::new(config),
            policy,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Wait until `url`'s origin may be contacted again.
    ///
    /// Returns [`AppError::Blocked`] when the policy denies the request and
    /// [`AppError::Cancelled`] when `cancel` fires before or during the wait.
    /// URLs without a parseable origin are not paced.
    pub async fn await_turn(&self, url: &str, cancel: &CancellationToken) -> Result<(), AppError> {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let Ok(parsed) = Url::parse(url) else {
            return Ok(());
        };
        let extra = match self.policy.check(&parsed) {
            PolicyDecision::Allow => Duration::ZERO,
            PolicyDecision::Delay(extra) => extra,
            PolicyDecision::Deny(reason) => {
                tracing::info!(%url, %reason, "Request denied by compliance policy");
                return Err(AppError::Blocked(reason));
            }
        };
        let Some(origin) = origin_key(&parsed) else {
            return Ok(());
        };

        let slot = self.reserve(&origin, extra).await;
        let now = Instant::now();
        if slot <= now {
            return Ok(());
        }

        tracing::debug!(
            %origin,
            wait_ms = %(slot - now).as_millis(),
            "Waiting for origin turn"
        );
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AppError::Cancelled),
            () = tokio::time::sleep_until(slot) => Ok(()),
        }
    }

    /// Take the next free slot for `origin` and record it.
    async fn reserve(&self, origin: &str, extra: Duration) -> Instant {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();
        let earliest = match slots.get(origin) {
            Some(&last) => (last + self.config.interval_for(origin)).max(now),
            None => now,
        };
        let slot = earliest + extra;
        slots.insert(origin.to_string(), slot);
        slot
    }
}

/// `scheme://host:port` of a URL, with the scheme's default port filled in.
pub fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let port = url
        .port_or_known_default()
        .map(|p| format!(":{p}"))
        .unwrap_or_default();
    Some(format!("{}://{}{}", url.scheme(), host, port))
}

// xorshift seeded from the clock; good enough for jitter.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
