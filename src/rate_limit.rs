//! Request pacing for NCBI API compliance
//!
//! NCBI allows 3 requests/second without an API key and 10/second with one;
//! sustained violations can lead to IP blocking. A token bucket paces every
//! outgoing request, independently of the 429 backoff in [`crate::retry`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

/// Token-bucket rate limiter shared by all requests of one client
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<Mutex<TokenBucket>>,
}

struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }

    fn try_take(&mut self) -> Option<Duration> {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            Some(Duration::from_secs_f64(
                (1.0 - self.tokens) / self.refill_rate,
            ))
        }
    }
}

impl RateLimiter {
    /// Create a rate limiter allowing `rate` requests per second
    pub fn new(rate: f64) -> Self {
        let capacity = rate.max(1.0);
        Self {
            bucket: Arc::new(Mutex::new(TokenBucket {
                tokens: capacity,
                capacity,
                refill_rate: rate,
                last_refill: Instant::now(),
            })),
        }
    }

    /// Take a token, sleeping until one becomes available
    pub async fn acquire(&self) {
        loop {
            let wait = self.bucket.lock().await.try_take();
            match wait {
                None => return,
                Some(duration) => {
                    debug!(
                        wait_ms = duration.as_millis() as u64,
                        "Waiting for rate limit token"
                    );
                    sleep(duration).await;
                }
            }
        }
    }
}
