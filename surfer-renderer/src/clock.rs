use std::{fmt, time::Instant};

/// Source of frame timestamps.
pub trait Clock {
    type Instant: fmt::Debug + Copy;

    fn now(&self) -> Self::Instant;
    fn seconds_elapsed(&self, start: Self::Instant, end: Self::Instant) -> f32;
}

/// Wall-clock time from [`std::time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn seconds_elapsed(&self, start: Instant, end: Instant) -> f32 {
        end.saturating_duration_since(start).as_secs_f32()
    }
}
