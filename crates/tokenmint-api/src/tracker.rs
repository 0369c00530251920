//! Health bookkeeping for token issuance.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

/// More consecutive failures than this marks the service degraded.
pub const MAX_CONSECUTIVE_FAILURES: u64 = 5;

/// A success rate below this marks the service degraded.
pub const MIN_SUCCESS_RATE: f64 = 0.8;

const NO_SUCCESS: i64 = i64::MIN;

/// Overall service status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    /// Reserved for a missing signing identity; never derived from counters.
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Process-wide token issuance counters.
///
/// Owned by the application state and shared by every request handler.
#[derive(Debug)]
pub struct HealthTracker {
    started_at: DateTime<Utc>,
    started: Instant,
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    consecutive_failures: AtomicU64,
    last_success_millis: AtomicI64,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            consecutive_failures: AtomicU64::new(0),
            last_success_millis: AtomicI64::new(NO_SUCCESS),
        }
    }
}

impl HealthTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Count an authenticated token request before it is attempted.
    pub fn record_attempt_start(&self) {
        self.total_requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Record the outcome of an attempt started with
    /// [`record_attempt_start`](Self::record_attempt_start).
    pub fn record_result(&self, success: bool) {
        if success {
            self.successful_requests.fetch_add(1, Ordering::SeqCst);
            self.consecutive_failures.store(0, Ordering::SeqCst);
            self.last_success_millis
                .store(Utc::now().timestamp_millis(), Ordering::SeqCst);
        } else {
            self.consecutive_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// A consistent-enough view of the counters.
    pub fn snapshot(&self) -> HealthSnapshot {
        // Successes are read before attempts: every counted success had its
        // attempt counted earlier, so the snapshot never shows more
        // successes than attempts.
        let successful_requests = self.successful_requests.load(Ordering::SeqCst);
        let total_requests = self.total_requests.load(Ordering::SeqCst);
        let consecutive_failures = self.consecutive_failures.load(Ordering::SeqCst);
        let last_success = match self.last_success_millis.load(Ordering::SeqCst) {
            NO_SUCCESS => None,
            millis => Utc.timestamp_millis_opt(millis).single(),
        };

        HealthSnapshot {
            started_at: self.started_at,
            uptime_seconds: self.uptime_seconds(),
            total_requests,
            successful_requests,
            consecutive_failures,
            last_success,
        }
    }

    pub fn status(&self) -> HealthStatus {
        self.snapshot().status()
    }
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub consecutive_failures: u64,
    pub last_success: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Fraction of attempts that succeeded, if any were made.
    pub fn success_rate(&self) -> Option<f64> {
        (self.total_requests > 0)
            .then(|| self.successful_requests as f64 / self.total_requests as f64)
    }

    pub fn status(&self) -> HealthStatus {
        if self.issues().is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        }
    }

    /// Human-readable reasons for a degraded status.
    pub fn issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.consecutive_failures > MAX_CONSECUTIVE_FAILURES {
            issues.push(format!(
                "{} consecutive token requests failed",
                self.consecutive_failures
            ));
        }
        if let Some(rate) = self.success_rate() {
            if rate < MIN_SUCCESS_RATE {
                issues.push(format!(
                    "success rate {:.1}% is below {:.0}%",
                    rate * 100.0,
                    MIN_SUCCESS_RATE * 100.0
                ));
            }
        }
        issues
    }
}
