use embassy_time::{Duration, Instant};

/// Monotonic time source for the retry gate.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Reads the embassy time driver installed by the firmware.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Elapsed-time gate shared by link and messaging attempts.
///
/// Attempts are gated by wall time, not by call count, so an infrequently
/// polled manager delays attempts instead of bunching them up.
#[derive(Clone, Copy, Debug)]
pub struct RetryTimer {
    interval: Duration,
    last_attempt: Option<Instant>,
}

impl RetryTimer {
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_attempt: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_attempt {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_attempt = Some(now);
    }

    /// Lets the next check pass regardless of elapsed time.
    pub fn force_ready(&mut self) {
        self.last_attempt = None;
    }
}
