//! Frame pacing for the host loop.
//!
//! [`FrameClock`] decides when a new frame is due at a target rate and how
//! much time the simulation should advance by. It takes the current instant
//! as an argument so hosts with their own time source (and tests) can drive
//! it directly.
//!
//! # Example
//!
//! ```ignore
//! use sparkburst::time::FrameClock;
//!
//! let mut clock = FrameClock::new(60.0);
//!
//! // In your event loop:
//! if let Some(delta_ms) = clock.tick(Instant::now()) {
//!     engine.update(delta_ms);
//!     renderer.render_frame(engine.particles(), engine.turbulence(), &camera)?;
//! }
//! ```

use std::time::{Duration, Instant};

use crate::config::DEFAULT_FPS;

/// Fixed-rate frame gate.
///
/// A tick fires once more than one frame interval has passed since the
/// anchor. The anchor is then moved to `now - elapsed % interval`, so time
/// that overshot the interval is carried into the next frame instead of
/// drifting.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// Target interval between frames.
    interval: Duration,
    /// Anchor of the current frame; `None` until the first tick.
    last: Option<Instant>,
    /// Frames fired since creation.
    frame_count: u64,
    paused: bool,
}

impl FrameClock {
    /// Create a clock firing at `fps` frames per second.
    ///
    /// Non-positive or non-finite rates fall back to the default of 60.
    pub fn new(fps: f32) -> Self {
        Self {
            interval: interval_for(fps),
            last: None,
            frame_count: 0,
            paused: false,
        }
    }

    /// Advance the clock to `now`.
    ///
    /// Returns the milliseconds elapsed since the previous frame when a new
    /// frame is due, and `None` otherwise. The first tick only anchors the
    /// clock.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        if self.paused {
            return None;
        }

        let Some(last) = self.last else {
            self.last = Some(now);
            return None;
        };

        let elapsed = now.saturating_duration_since(last);
        if elapsed <= self.interval {
            return None;
        }

        let overshoot = Duration::from_nanos(
            (elapsed.as_nanos() % self.interval.as_nanos()) as u64,
        );
        self.last = Some(now - overshoot);
        self.frame_count += 1;

        Some(elapsed.as_secs_f32() * 1000.0)
    }

    /// Change the target rate. Takes effect from the next tick.
    pub fn set_fps(&mut self, fps: f32) {
        self.interval = interval_for(fps);
    }

    /// Target frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        1.0 / self.interval.as_secs_f32()
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total frames fired.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop firing frames.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after [`pause`](Self::pause).
    ///
    /// The next tick re-anchors, so the paused span is never handed to the
    /// simulation as one huge step.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last = None;
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_FPS)
    }
}

fn interval_for(fps: f32) -> Duration {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        DEFAULT_FPS
    };
    Duration::from_secs_f64(1.0 / fps as f64).max(Duration::from_nanos(1))
}
