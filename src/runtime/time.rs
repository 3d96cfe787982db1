//! Monotonic session clock
//!
//! Threat timestamps are milliseconds since the monitor was created, read
//! from `performance.now()` on wasm32 through `web_time::Instant`.

use web_time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    origin: Instant,
}

impl SessionClock {
    /// Start a clock at zero
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Milliseconds since `start()`
    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}

/// Wall-clock milliseconds since the Unix epoch, used only for seeding.
pub fn wallclock_ms() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let clock = SessionClock::start();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn test_wallclock_is_after_2020() {
        assert!(wallclock_ms() > 1_577_836_800_000);
    }
}
