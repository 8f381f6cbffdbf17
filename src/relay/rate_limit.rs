//! Per-caller request quota over a rolling window.
//!
//! Each caller keeps a log of request instants inside the window. A request
//! is admitted while the log is shorter than the ceiling.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use super::config::RateLimitConfig;

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: usize,
    pub remaining: usize,
    /// Time until the oldest counted request leaves the window
    pub reset: Duration,
}

pub struct RateLimiter {
    limit: usize,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            limit: config.max_requests,
            window: config.window(),
            hits: DashMap::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, caller: &str) -> Decision {
        self.check_at(caller, Instant::now())
    }

    /// Count a request from `caller` at `now` if it fits the quota.
    ///
    /// Rejected requests are not counted.
    pub fn check_at(&self, caller: &str, now: Instant) -> Decision {
        let mut log = self.hits.entry(caller.to_string()).or_default();
        evict(&mut log, now, self.window);

        let allowed = log.len() < self.limit;
        if allowed {
            log.push_back(now);
        }

        let reset = log
            .front()
            .map(|oldest| self.window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(self.window);

        Decision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(log.len()),
            reset,
        }
    }

    /// Drop callers with no requests left in the window. Returns how many.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.hits.len();
        self.hits.retain(|_, log| {
            evict(log, now, self.window);
            !log.is_empty()
        });
        before - self.hits.len()
    }

    pub fn tracked_callers(&self) -> usize {
        self.hits.len()
    }
}

fn evict(log: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = log.front() {
        if now.saturating_duration_since(*oldest) >= window {
            log.pop_front();
        } else {
            break;
        }
    }
}
