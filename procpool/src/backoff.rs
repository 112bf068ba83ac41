//! Restart rate limiting for crash-looping pool workers.
//!
//! Restarting a crashed pool worker unconditionally lets a worker script
//! that crashes on startup spawn processes in a tight loop. This tracks
//! restarts in a sliding time window per pool and hands back an
//! exponential backoff delay, without changing the restart *policy* itself
//! (pool workers are still always restarted; this only paces it).

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Sliding-window restart tracker with exponential backoff.
///
/// `delay = base_delay * 2^min(restart_count, 10)`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct RestartBackoff {
    max_restarts: u32,
    restart_window: Duration,
    history: VecDeque<DateTime<Utc>>,
    base_delay: Duration,
    max_delay: Duration,
}

impl RestartBackoff {
    pub fn new(max_restarts: u32, restart_window: Duration) -> Self {
        Self {
            max_restarts,
            restart_window,
            history: VecDeque::new(),
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(60),
        }
    }

    /// Records a restart attempt at the current time.
    pub fn record_restart(&mut self) {
        self.history.push_front(Utc::now());
    }

    /// `true` once the window holds `max_restarts` or more recent restarts.
    pub fn is_limit_exceeded(&mut self) -> bool {
        self.cleanup_expired();
        self.history.len() >= self.max_restarts as usize
    }

    /// Delay to wait before the next restart attempt.
    pub fn calculate_delay(&mut self) -> Duration {
        self.cleanup_expired();
        let capped_count = (self.history.len() as u32).min(10);
        let multiplier = 2u64.pow(capped_count);
        let delay_ms = self.base_delay.as_millis() as u64 * multiplier;
        Duration::from_millis(delay_ms).min(self.max_delay)
    }

    fn cleanup_expired(&mut self) {
        let Ok(window) = chrono::Duration::from_std(self.restart_window) else {
            return;
        };
        let window_start = Utc::now() - window;
        while let Some(&oldest) = self.history.back() {
            if oldest < window_start {
                self.history.pop_back();
            } else {
                break;
            }
        }
    }
}

impl Default for RestartBackoff {
    /// 5 restarts per 60 seconds, matching the framework-wide supervisor
    /// default this was adapted from.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}
