use std::time::Duration;

use tokio::time::Instant;

/// "Looking at the second monitor" hysteresis, owned by one monitoring
/// session. An upward glance sets it; it stays set for the grace window
/// after the most recent upward glance.
#[derive(Debug, Clone, Default)]
pub struct SecondMonitorLatch {
    expires_at: Option<Instant>,
}

impl SecondMonitorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_up(&mut self, now: Instant, grace: Duration) {
        self.expires_at = Some(now + grace);
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expiry| now <= expiry)
    }
}
