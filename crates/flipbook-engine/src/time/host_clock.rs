use std::time::{Duration, Instant};

/// Monotonic wall clock that paces a real-time host loop.
///
/// Stands in for a display's refresh signal on hosts without one: each call to
/// [`HostClock::wait_for_next_frame`] sleeps until the next refresh boundary
/// and returns the elapsed time since the clock's origin, in milliseconds,
/// ready to be fed to a [`ManualHost`](super::ManualHost).
#[derive(Debug, Clone)]
pub struct HostClock {
    origin: Instant,
    refresh: Duration,
    next_frame: Instant,
    frame_index: u64,
}

impl HostClock {
    /// Creates a clock whose origin is now.
    ///
    /// A zero `refresh` is raised to one millisecond.
    pub fn new(refresh: Duration) -> Self {
        let refresh = refresh.max(Duration::from_millis(1));
        let origin = Instant::now();
        Self {
            origin,
            refresh,
            next_frame: origin + refresh,
            frame_index: 0,
        }
    }

    /// Creates a clock refreshing `hz` times per second.
    pub fn with_refresh_rate(hz: u32) -> Self {
        let hz = hz.max(1);
        Self::new(Duration::from_nanos(1_000_000_000 / u64::from(hz)))
    }

    /// Milliseconds since the origin.
    pub fn elapsed_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// Number of frames handed out so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    /// Sleeps until the next refresh boundary and returns the elapsed time.
    ///
    /// When the caller overran one or more boundaries, the schedule is rebased
    /// on the present instead of bursting to catch up.
    pub fn wait_for_next_frame(&mut self) -> f64 {
        let now = Instant::now();
        if let Some(remaining) = self.next_frame.checked_duration_since(now) {
            std::thread::sleep(remaining);
            self.next_frame += self.refresh;
        } else {
            self.next_frame = now + self.refresh;
        }

        self.frame_index = self.frame_index.wrapping_add(1);
        self.elapsed_ms()
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::with_refresh_rate(60)
    }
}
