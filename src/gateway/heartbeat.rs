use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Tracks the last sign of life from a client. Any inbound frame counts,
/// not just explicit `heartbeat` events.
#[derive(Debug)]
pub struct Liveness {
    last_seen: Instant,
    timeout: Duration,
}

impl Liveness {
    pub fn new(timeout: Duration) -> Self {
        Self {
            last_seen: Instant::now(),
            timeout,
        }
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn expired(&self) -> bool {
        self.last_seen.elapsed() > self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_timeout() {
        let liveness = Liveness::new(Duration::from_secs(5));
        assert!(!liveness.expired());
        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(liveness.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_touch_resets_deadline() {
        let mut liveness = Liveness::new(Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(4)).await;
        liveness.touch();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(!liveness.expired());
    }
}
