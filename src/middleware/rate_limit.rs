use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::{Duration, Instant},
};

use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

/// Sliding-window limiter keyed by client address.
///
/// Process-local: counts reset on restart and are not shared between
/// instances. Stale entries are pruned on every check.
pub struct RateLimiter {
    max_hits: usize,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_hits: usize, window: Duration) -> Self {
        Self {
            max_hits,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records a hit for `key` and returns 429 once the window is full.
    pub fn check(&self, key: &str) -> Result<(), (StatusCode, Json<Value>)> {
        if self.record(key, Instant::now()) {
            Ok(())
        } else {
            tracing::warn!(key, "rate limit exceeded");
            Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Too many requests. Please try again in a few minutes." })),
            ))
        }
    }

    fn record(&self, key: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let window = self.window;

        hits.retain(|_, stamps| {
            while stamps
                .front()
                .is_some_and(|t| now.saturating_duration_since(*t) >= window)
            {
                stamps.pop_front();
            }
            !stamps.is_empty()
        });

        let stamps = hits.entry(key.to_string()).or_default();
        if stamps.len() >= self.max_hits {
            return false;
        }
        stamps.push_back(now);
        true
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.hits.lock().map(|h| h.len()).unwrap_or(0)
    }
}

/// Client address as forwarded by the reverse proxy.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("X-Forwarded-For")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
        })
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
