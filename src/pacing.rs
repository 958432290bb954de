use std::thread;
use std::time::Duration;

/// Delay applied after every esummary chunk attempt.
pub const CHUNK_DELAY: Duration = Duration::from_millis(400);
/// Constant wait between failed attempts of the same chunk.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Fixed sleeps at the two esummary call sites. Taxonomy, count and page
/// searches are not paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub chunk_delay: Duration,
    pub retry_backoff: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            chunk_delay: CHUNK_DELAY,
            retry_backoff: RETRY_BACKOFF,
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            chunk_delay: Duration::ZERO,
            retry_backoff: Duration::ZERO,
        }
    }

    pub fn after_chunk(&self) {
        pause(self.chunk_delay);
    }

    pub fn before_retry(&self) {
        pause(self.retry_backoff);
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
