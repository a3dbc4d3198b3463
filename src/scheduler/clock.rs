//! Monotonic frame clock.

use std::{cell::Cell, rc::Rc, time::Duration, time::Instant};

/// Where the clock reads time from.
pub trait TimeSource {
    /// Time since some fixed origin.
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct InstantSource {
    origin: Instant,
}

impl InstantSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for InstantSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for InstantSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time, for tests and offline rendering.
///
/// Clones share the same time, so one handle can stay with the caller while
/// another drives the clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<Duration>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Timing of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Time since the clock started.
    pub elapsed: Duration,
    /// Time since the previous tick; zero on the first one.
    pub delta: Duration,
    /// Zero-based tick index.
    pub frame: u64,
}

impl FrameTime {
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

pub struct Clock {
    source: Box<dyn TimeSource>,
    start: Duration,
    last: Option<Duration>,
    frame: u64,
}

impl Clock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        let start = source.now();
        Self {
            source,
            start,
            last: None,
            frame: 0,
        }
    }

    pub fn realtime() -> Self {
        Self::new(Box::new(InstantSource::new()))
    }

    /// Reads the source once. Elapsed never goes backwards, even if the
    /// source does.
    pub fn sample(&mut self) -> FrameTime {
        let raw = self.source.now().saturating_sub(self.start);
        let elapsed = match self.last {
            Some(last) if raw < last => last,
            _ => raw,
        };
        let delta = self.last.map_or(Duration::ZERO, |last| elapsed - last);
        let frame = self.frame;

        self.last = Some(elapsed);
        self.frame += 1;

        FrameTime {
            elapsed,
            delta,
            frame,
        }
    }

    /// Elapsed time at the last sample.
    pub fn elapsed(&self) -> Duration {
        self.last.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let time = ManualTime::new();
        time.set(Duration::from_millis(500));
        let mut clock = Clock::new(Box::new(time.clone()));

        let first = clock.sample();
        assert_eq!(first.elapsed, Duration::ZERO);
        assert_eq!(first.delta, Duration::ZERO);

        time.advance(Duration::from_millis(16));
        let second = clock.sample();
        assert_eq!(second.elapsed, Duration::from_millis(16));
        assert_eq!(second.delta, Duration::from_millis(16));
        assert_eq!(second.frame, 1);

        time.set(Duration::from_millis(505));
        let third = clock.sample();
        assert_eq!(third.elapsed, Duration::from_millis(16));
        assert_eq!(third.delta, Duration::ZERO);
    }

    #[test]
    fn test_coarse_source_repeats_elapsed() {
        let time = ManualTime::new();
        let mut clock = Clock::new(Box::new(time.clone()));
        clock.sample();
        let a = clock.sample();
        let b = clock.sample();
        assert_eq!(a.elapsed, b.elapsed);
        assert_eq!(b.frame, 2);
    }
}
