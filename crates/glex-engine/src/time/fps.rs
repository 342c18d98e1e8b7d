use std::time::{Duration, Instant};

/// Target interval between frame starts for `fps` frames per second.
///
/// Uses whole milliseconds (`1000 / fps`); `fps` below 1 is treated as 1.
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_millis(1000 / u64::from(fps.max(1)))
}

/// Remaining sleep after spending `spent` of a frame's `interval`.
///
/// Returns `None` when the frame already used up its budget.
pub fn sleep_budget(interval: Duration, spent: Duration) -> Option<Duration> {
    interval.checked_sub(spent).filter(|d| !d.is_zero())
}

/// Rolling frame-rate estimate over windows of at least one second.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_start: Instant,
    frames: u32,
    current: f32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            current: 0.0,
        }
    }

    /// Counts one presented frame.
    ///
    /// Returns the new estimate when a window closes.
    pub fn record(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }

        self.current = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(self.current)
    }

    /// Last published estimate; `0.0` until the first window closes.
    pub fn current(&self) -> f32 {
        self.current
    }
}
