//! Retry schedule for outbound prediction calls.
//!
//! Exponential doubling with deterministic jitter: the jitter is derived
//! from a SHA-256 digest of the seed and attempt number, so the full
//! schedule is a pure function and testable without a clock.

use sha2::{Digest, Sha256};
use std::time::Duration;

use heron_core::config::RetryConfig;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub jitter_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts,
            base_delay_ms: cfg.base_delay_ms,
            jitter_ms: cfg.jitter_ms,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before the given attempt (1-based). The exponent is
    /// capped at 10 doublings to keep the arithmetic bounded.
    pub fn delay_for(&self, attempt: u32, seed: &str) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(10);
        let base = self.base_delay_ms.saturating_mul(1u64 << exponent);
        if self.jitter_ms == 0 {
            return Duration::from_millis(base);
        }

        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(attempt.to_le_bytes());
        let digest = hasher.finalize();
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        let jitter = u64::from_le_bytes(seed_bytes) % self.jitter_ms.saturating_add(1);
        Duration::from_millis(base.saturating_add(jitter))
    }
}
