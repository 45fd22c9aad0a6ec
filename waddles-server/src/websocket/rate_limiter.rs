use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_tokens: u32,
    pub refill_rate: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_tokens: 30,                          // Burst of 30 requests
            refill_rate: Duration::from_millis(500), // One token back every 500ms
        }
    }
}

/// Token bucket guarding one connection
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_rate: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::from_config(RateLimitConfig::default())
    }

    pub fn from_config(config: RateLimitConfig) -> Self {
        Self {
            tokens: config.max_tokens, // Start with full bucket
            max_tokens: config.max_tokens,
            refill_rate: config.refill_rate.max(Duration::from_millis(1)),
            last_refill: Instant::now(),
        }
    }

    pub fn check_rate_limit(&mut self) -> bool {
        self.refill_tokens(Instant::now());

        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill_tokens(&mut self, now: Instant) {
        let elapsed = now.duration_since(self.last_refill);
        let earned = elapsed.as_millis() / self.refill_rate.as_millis();
        let earned = u32::try_from(earned).unwrap_or(u32::MAX);
        if earned == 0 {
            return;
        }

        if self.tokens.saturating_add(earned) >= self.max_tokens {
            self.tokens = self.max_tokens;
            self.last_refill = now;
        } else {
            self.tokens += earned;
            // Keep the partial interval so slow trickles still earn tokens
            self.last_refill += self.refill_rate * earned;
        }
    }

    pub fn remaining_tokens(&mut self) -> u32 {
        self.refill_tokens(Instant::now());
        self.tokens
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
