//! Fixed-window rate limiting per client address

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Entries are swept once the table grows past this many clients
const SWEEP_THRESHOLD: usize = 10_000;

/// Quota of one rate-limited scope
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Time window in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

fn default_window_seconds() -> u64 {
    15 * 60
}

impl QuotaConfig {
    pub fn per_fifteen_minutes(max_requests: u32) -> Self {
        Self {
            max_requests,
            window_seconds: default_window_seconds(),
        }
    }
}

/// Rate limiter configuration for every scope
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Every route
    pub general: QuotaConfig,
    /// Password signup and login
    pub auth: QuotaConfig,
    /// `/playList/*`
    pub playlist: QuotaConfig,
    /// `/notes/*`
    pub notes: QuotaConfig,
    /// Key clients by the first `X-Forwarded-For` address (behind a proxy)
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            general: QuotaConfig::per_fifteen_minutes(100),
            auth: QuotaConfig::per_fifteen_minutes(5),
            playlist: QuotaConfig::per_fifteen_minutes(30),
            notes: QuotaConfig::per_fifteen_minutes(50),
            trust_forwarded_for: false,
        }
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Requests seen in the current window
    requests: u32,
    /// Start of the current window
    window_started: Instant,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: QuotaConfig,
    /// Body message returned once the quota is exhausted
    message: &'static str,
    trust_forwarded_for: bool,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: QuotaConfig, message: &'static str, trust_forwarded_for: bool) -> Self {
        Self {
            config,
            message,
            trust_forwarded_for,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request from `key` and tell whether it is within quota
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        if entries.len() > SWEEP_THRESHOLD {
            entries.retain(|_, entry| now.duration_since(entry.window_started) < window);
        }

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            requests: 0,
            window_started: now,
        });

        // Window expired, start a new one
        if now.duration_since(entry.window_started) >= window {
            entry.requests = 0;
            entry.window_started = now;
        }

        if entry.requests >= self.config.max_requests {
            warn!("Rate limit exceeded for {}", key);
            return false;
        }

        entry.requests += 1;
        true
    }

    pub fn message(&self) -> &'static str {
        self.message
    }

    pub fn trusts_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }
}

/// The limiters of every scope
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub general: RateLimiter,
    pub auth: RateLimiter,
    pub playlist: RateLimiter,
    pub notes: RateLimiter,
}

impl RateLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        let trust = config.trust_forwarded_for;
        Self {
            general: RateLimiter::new(
                config.general.clone(),
                "Too many requests from this IP, please try again later.",
                trust,
            ),
            auth: RateLimiter::new(
                config.auth.clone(),
                "Too many authentication attempts, please try again after 15 minutes.",
                trust,
            ),
            playlist: RateLimiter::new(
                config.playlist.clone(),
                "Too many playlist operations, please slow down.",
                trust,
            ),
            notes: RateLimiter::new(
                config.notes.clone(),
                "Too many note operations, please slow down.",
                trust,
            ),
        }
    }
}
