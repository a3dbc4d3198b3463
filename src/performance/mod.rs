//! # Frame Statistics
//!
//! Rolling frame-time statistics fed by the frame scheduler.
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//! use thistle::performance::FrameStats;
//!
//! let mut stats = FrameStats::new();
//! stats.record(Duration::from_millis(16));
//! stats.record(Duration::from_millis(17));
//!
//! let metrics = stats.metrics();
//! assert!(metrics.fps > 55.0 && metrics.fps < 65.0);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

/// Frame metrics over the current window of samples
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetrics {
    /// Frames per second derived from the average frame time
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    /// Minimum frame time in the current window
    pub min_frame_time_ms: f32,
    /// Maximum frame time in the current window
    pub max_frame_time_ms: f32,
    /// Nodes whose world transform was recomputed in the last frame
    pub nodes_updated: usize,
    /// Update hooks that failed in the last frame
    pub hook_failures: usize,
}

impl Default for FrameMetrics {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            nodes_updated: 0,
            hook_failures: 0,
        }
    }
}

/// Ring buffer of recent frame deltas
#[derive(Debug, Clone)]
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    frames: u64,
    current: FrameMetrics,
}

impl FrameStats {
    /// Keeps roughly two seconds of history at 60 fps
    pub fn new() -> Self {
        Self::with_capacity(120)
    }

    pub fn with_capacity(max_samples: usize) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
            frames: 0,
            current: FrameMetrics::default(),
        }
    }

    /// Add a frame delta and refresh the metrics
    pub fn record(&mut self, delta: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta);
        self.frames += 1;
        self.update_metrics();
    }

    fn update_metrics(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time = total_time / self.frame_times.len() as u32;
        let avg_frame_time_ms = avg_frame_time.as_secs_f32() * 1000.0;

        self.current.frame_time_ms = avg_frame_time_ms;
        self.current.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.current.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.current.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    /// Update per-frame scene counters
    pub fn update_scene_stats(&mut self, nodes_updated: usize, hook_failures: usize) {
        self.current.nodes_updated = nodes_updated;
        self.current.hook_failures = hook_failures;
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.current
    }

    /// Total frames recorded since creation or the last reset
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame time history in milliseconds, oldest first
    pub fn frame_time_history(&self) -> Vec<f32> {
        self.frame_times
            .iter()
            .map(|duration| duration.as_secs_f32() * 1000.0)
            .collect()
    }

    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.frames = 0;
        self.current = FrameMetrics::default();
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_drops_oldest_samples() {
        let mut stats = FrameStats::with_capacity(2);
        stats.record(Duration::from_millis(100));
        stats.record(Duration::from_millis(10));
        stats.record(Duration::from_millis(20));

        let metrics = stats.metrics();
        assert_eq!(stats.frames(), 3);
        assert_eq!(stats.frame_time_history().len(), 2);
        assert!((metrics.frame_time_ms - 15.0).abs() < 1e-3);
        assert!((metrics.min_frame_time_ms - 10.0).abs() < 1e-3);
        assert!((metrics.max_frame_time_ms - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_deltas_report_zero_fps() {
        let mut stats = FrameStats::new();
        stats.record(Duration::ZERO);
        assert_eq!(stats.metrics().fps, 0.0);

        stats.reset();
        assert_eq!(stats.frames(), 0);
        assert_eq!(stats.metrics(), &FrameMetrics::default());
    }
}
