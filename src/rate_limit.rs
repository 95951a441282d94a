// Cooperative Rate Limiting
// Sliding-window limiter applied at the HTTP boundary only. Exceeding the
// window maps to the 429 problem shape with a retry-after hint; retrying is
// the caller's responsibility, the server never retries on its own.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    max_keys: usize,
}

impl RateLimiter {
    pub fn new(window: Duration, max_keys: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            window,
            max_keys,
        }
    }

    /// Record one request for `key` and report whether it fits the window.
    /// A zero limit disables the limiter entirely.
    pub fn check(&self, key: &str, limit: u32) -> Decision {
        if limit == 0 {
            return Decision::Allowed;
        }

        let now = Instant::now();
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let events = inner.entry(key.to_string()).or_default();
        drop_expired(events, now, self.window);

        if events.len() >= limit as usize {
            // Hint: seconds until the oldest event leaves the window.
            let retry_after = events
                .front()
                .map(|oldest| {
                    self.window
                        .saturating_sub(now.duration_since(*oldest))
                        .as_secs()
                        .max(1)
                })
                .unwrap_or(1);
            return Decision::Limited {
                retry_after_secs: retry_after,
            };
        }
        events.push_back(now);

        // Keep the key table bounded; idle keys are cheapest to shed.
        if inner.len() > self.max_keys {
            inner.retain(|_, events| {
                drop_expired(events, now, self.window);
                !events.is_empty()
            });
            if inner.len() > self.max_keys {
                let excess = inner.len() - self.max_keys;
                let victims: Vec<String> = inner.keys().take(excess).cloned().collect();
                for victim in victims {
                    inner.remove(&victim);
                }
            }
        }

        Decision::Allowed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

fn drop_expired(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(front) = events.front() {
        if now.duration_since(*front) > window {
            events.pop_front();
        } else {
            break;
        }
    }
}
