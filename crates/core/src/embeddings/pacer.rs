use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_PACE_EVERY: usize = 10;
pub const DEFAULT_PACE_DELAY: Duration = Duration::from_millis(500);

/// Process-wide throttle in front of the embedding provider: after every
/// `every` requests the next caller sleeps for `delay`. The counter lives
/// behind one lock so concurrent workers share a single budget, and the
/// sleeping caller holds it so nobody overtakes the pause.
#[derive(Debug)]
pub struct Pacer {
    every: usize,
    delay: Duration,
    issued: Mutex<usize>,
}

impl Pacer {
    pub fn new(every: usize, delay: Duration) -> Self {
        Self {
            every,
            delay,
            issued: Mutex::new(0),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub async fn acquire(&self) {
        let mut issued = self.issued.lock().await;
        if self.every > 0 && *issued > 0 && *issued % self.every == 0 && !self.delay.is_zero() {
            tracing::debug!(
                issued = *issued,
                delay_ms = self.delay.as_millis() as u64,
                "pacing embedding requests"
            );
            tokio::time::sleep(self.delay).await;
        }
        *issued += 1;
    }

    pub async fn issued(&self) -> usize {
        *self.issued.lock().await
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_PACE_EVERY, DEFAULT_PACE_DELAY)
    }
}
