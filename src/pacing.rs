//! Fixed-interval pacing between API page requests.
//!
//! The photo API tolerates only a couple of page calls per second, so the
//! pager owns a gate and waits on it before each fetch instead of scattering
//! ad-hoc sleeps through the loop. The gate runs on `tokio::time`, which
//! lets tests drive it under the paused clock.

use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum interval between successive passages.
///
/// The first [`wait`](Self::wait) returns immediately; every later one
/// sleeps until at least `interval` has elapsed since the previous passage.
#[derive(Debug)]
pub struct FixedIntervalGate {
    interval: Duration,
    last_pass: Option<Instant>,
}

impl FixedIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_pass: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(last) = self.last_pass {
            let due = last + self.interval;
            if due > Instant::now() {
                tokio::time::sleep_until(due).await;
            }
        }
        self.last_pass = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HALF_SECOND: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn first_passage_is_immediate() {
        let mut gate = FixedIntervalGate::new(HALF_SECOND);
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_passages_are_spaced() {
        let mut gate = FixedIntervalGate::new(HALF_SECOND);
        let start = Instant::now();
        gate.wait().await;
        gate.wait().await;
        assert_eq!(start.elapsed(), HALF_SECOND);
        gate.wait().await;
        assert_eq!(start.elapsed(), HALF_SECOND * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_interval_passes_without_sleeping() {
        let mut gate = FixedIntervalGate::new(HALF_SECOND);
        gate.wait().await;
        tokio::time::advance(Duration::from_millis(700)).await;
        let before = Instant::now();
        gate.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_never_blocks() {
        let mut gate = FixedIntervalGate::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            gate.wait().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
