// ============================
// mdwiki-backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for login attempts.

use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct AttemptEntry {
    /// Consecutive failed attempts since the last success
    failures: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// Set while the client is locked out
    locked_until: Option<Instant>,
}

/// Rate limiter for login attempts, keyed by client IP
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<IpAddr, AttemptEntry>>,
    max_attempts: u32,
    lockout: Duration,
}

impl AuthRateLimiter {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout,
        }
    }

    /// Record a failed login attempt
    pub fn record_failure(&self, ip: IpAddr) {
        let now = Instant::now();
        let mut entry = self.attempts.entry(ip).or_insert_with(|| AttemptEntry {
            failures: 0,
            last_failure: now,
            locked_until: None,
        });

        if let Some(until) = entry.locked_until {
            if now >= until {
                entry.failures = 0;
                entry.locked_until = None;
            }
        }

        entry.failures += 1;
        entry.last_failure = now;

        if entry.failures >= self.max_attempts {
            entry.locked_until = Some(now + self.lockout);
            tracing::warn!(%ip, "login attempts locked out");
        }
    }

    /// Record a successful login, clearing the failure history
    pub fn record_success(&self, ip: IpAddr) {
        self.attempts.remove(&ip);
    }

    /// Whether the client may attempt a login right now
    pub fn check(&self, ip: IpAddr) -> bool {
        match self.attempts.get(&ip) {
            Some(entry) => match entry.locked_until {
                Some(until) => Instant::now() >= until,
                None => true,
            },
            None => true,
        }
    }

    /// Drop expired lockouts and stale failure history
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.attempts.retain(|_, entry| {
            if let Some(until) = entry.locked_until {
                return now < until;
            }
            now.duration_since(entry.last_failure) < Duration::from_secs(24 * 60 * 60)
        });
    }
}
