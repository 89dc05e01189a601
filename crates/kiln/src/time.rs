//! Frame timing.
//!
//! [`Time`] is ticked once per redraw. Besides the per-frame delta it keeps
//! a one-second FPS window: [`Time::tick`] returns a [`FrameRate`] each time
//! a full second has been counted, which is when the window title is
//! refreshed.

use std::time::{Duration, Instant};

/// Length of the FPS averaging window.
const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Frames counted over one FPS window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate {
    pub fps: f32,
    /// Average frame time over the window, in milliseconds.
    pub frame_ms: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct Time {
    startup: Instant,
    frame_start: Instant,
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
    window_start: Instant,
    window_frames: u32,
    last_rate: Option<FrameRate>,
}

impl Time {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self {
            startup: now,
            frame_start: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            window_start: now,
            window_frames: 0,
            last_rate: None,
        }
    }

    /// Start a new frame now.
    pub fn tick(&mut self) -> Option<FrameRate> {
        self.tick_at(Instant::now())
    }

    /// Start a new frame at `now`. Returns the frame rate when an FPS
    /// window closes.
    pub fn tick_at(&mut self, now: Instant) -> Option<FrameRate> {
        self.delta = now.saturating_duration_since(self.frame_start);
        self.frame_start = now;
        self.elapsed = now.saturating_duration_since(self.startup);
        self.frame_count += 1;
        self.window_frames += 1;

        let window = now.saturating_duration_since(self.window_start);
        if window < FPS_WINDOW {
            return None;
        }
        let secs = window.as_secs_f32();
        let rate = FrameRate {
            fps: self.window_frames as f32 / secs,
            frame_ms: secs * 1000.0 / self.window_frames as f32,
        };
        self.window_start = now;
        self.window_frames = 0;
        self.last_rate = Some(rate);
        Some(rate)
    }

    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The most recent closed FPS window, if one has closed yet.
    pub fn frame_rate(&self) -> Option<FrameRate> {
        self.last_rate
    }

    /// Instantaneous FPS from the last delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_and_elapsed_follow_ticks() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        time.tick_at(start + Duration::from_millis(16));
        time.tick_at(start + Duration::from_millis(50));
        assert_eq!(time.delta(), Duration::from_millis(34));
        assert!((time.elapsed_secs() - 0.05).abs() < 1e-6);
        assert_eq!(time.frame_count(), 2);
    }

    #[test]
    fn frame_rate_reported_once_per_window() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        let mut reports = Vec::new();
        for i in 1..=120 {
            if let Some(rate) = time.tick_at(start + Duration::from_millis(i * 20)) {
                reports.push(rate);
            }
        }
        assert_eq!(reports.len(), 2, "2.4 s of frames closes two windows");
        assert!((reports[0].fps - 50.0).abs() < 0.01, "got {:?}", reports[0]);
        assert!((reports[0].frame_ms - 20.0).abs() < 0.01);
        assert_eq!(time.frame_rate(), Some(reports[1]));
    }

    #[test]
    fn first_frame_has_no_rate() {
        let start = Instant::now();
        let mut time = Time::starting_at(start);
        assert!(time.tick_at(start + Duration::from_millis(5)).is_none());
        assert!(time.frame_rate().is_none());
        assert!((time.fps() - 200.0).abs() < 0.5);
    }
}
