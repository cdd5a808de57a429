//! Pacing abstraction for upstream politeness delays.
//!
//! Multi-record scans hammer the upstream API with one or more requests per
//! record, so successive records are separated by a pause. The pause is
//! injected as a trait so tests run with [`NoopPacer`] and production wires
//! a [`FixedDelayPacer`] from configuration.

use async_trait::async_trait;
use std::time::Duration;

/// Inter-record pause inserted between successive upstream scans.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait out one pacing interval.
    async fn pause(&self);
}

/// Pacer sleeping a fixed interval.
#[derive(Debug, Clone)]
pub struct FixedDelayPacer {
    delay: Duration,
}

impl FixedDelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }
}

#[async_trait]
impl Pacer for FixedDelayPacer {
    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Pacer that never waits, for tests and zero-delay configurations.
#[derive(Debug, Clone, Default)]
pub struct NoopPacer;

#[async_trait]
impl Pacer for NoopPacer {
    async fn pause(&self) {}
}

#[cfg(test)]
#[path = "pacing_tests.rs"]
mod tests;
