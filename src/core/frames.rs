//! Frame sets and the frame ranges they are built from.

use serde::{Deserialize, Serialize};

use super::TimeSampling;
use crate::util::{Error, Result};

/// Ordered, non-empty set of transform-sampling frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSet {
    frames: Vec<f64>,
}

impl FrameSet {
    /// Build from arbitrary frames; duplicates are merged.
    pub fn new(frames: impl IntoIterator<Item = f64>) -> Result<Self> {
        let mut frames: Vec<f64> = frames.into_iter().collect();
        if let Some(bad) = frames.iter().find(|f| !f.is_finite()) {
            return Err(Error::config(format!("frame {} is not finite", bad)));
        }
        frames.sort_by(f64::total_cmp);
        frames.dedup();
        if frames.is_empty() {
            return Err(Error::config("frame set is empty"));
        }
        Ok(Self { frames })
    }

    /// Frame that triggers setup.
    pub fn first(&self) -> f64 {
        self.frames[0]
    }

    /// Frame that triggers finalization.
    pub fn last(&self) -> f64 {
        self.frames[self.frames.len() - 1]
    }

    /// Exact membership test.
    pub fn contains(&self, frame: f64) -> bool {
        self.frames.binary_search_by(|f| f.total_cmp(&frame)).is_ok()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().copied()
    }
}

/// A frame range with a step and per-step relative sample offsets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    /// Offsets added to every stepped frame, e.g. `[-0.2, 0.0, 0.2]`.
    pub relative_samples: Vec<f64>,
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: 1.0,
            end: 1.0,
            step: 1.0,
            relative_samples: vec![0.0],
        }
    }
}

impl FrameRange {
    /// Single-sample range `start..=end` stepping by one frame.
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            ..Self::default()
        }
    }

    /// Reject ranges that cannot produce a frame set.
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::config("frame range bounds must be finite"));
        }
        if self.end < self.start {
            return Err(Error::config(format!(
                "frame range end {} is before start {}",
                self.end, self.start
            )));
        }
        if !(self.step > 0.0) {
            return Err(Error::config(format!("frame step {} must be positive", self.step)));
        }
        if self.relative_samples.is_empty() {
            return Err(Error::config("at least one relative sample is required"));
        }
        if let Some(s) = self
            .relative_samples
            .iter()
            .find(|s| !(s.abs() < self.step))
        {
            return Err(Error::config(format!(
                "relative sample {} must lie strictly within one step ({})",
                s, self.step
            )));
        }
        Ok(())
    }

    fn sorted_samples(&self) -> Vec<f64> {
        let mut samples = self.relative_samples.clone();
        samples.sort_by(f64::total_cmp);
        samples.dedup();
        samples
    }

    /// Expand into the frames to sample.
    pub fn frames(&self) -> Result<FrameSet> {
        self.validate()?;
        let samples = self.sorted_samples();
        // Tolerate float noise so that `end` is reached for fractional steps.
        let steps = ((self.end - self.start) / self.step + 1e-9).floor() as usize;
        let frames = (0..=steps).flat_map(|i| {
            let base = self.start + i as f64 * self.step;
            samples.iter().map(move |s| base + s)
        });
        FrameSet::new(frames)
    }

    /// Time sampling matching [`FrameRange::frames`] at `fps`.
    pub fn time_sampling(&self, fps: f64) -> Result<TimeSampling> {
        self.validate()?;
        if !(fps > 0.0) {
            return Err(Error::config(format!("frames per second {} must be positive", fps)));
        }
        let spf = 1.0 / fps;
        let samples = self.sorted_samples();
        if samples == [0.0] {
            return Ok(TimeSampling::uniform(self.step * spf, self.start * spf));
        }
        let times = samples.iter().map(|s| (self.start + s) * spf).collect();
        Ok(TimeSampling::cyclic(self.step * spf, times))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_set_bounds() {
        let set = FrameSet::new([5.0, 1.0, 3.0, 3.0]).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.first(), 1.0);
        assert_eq!(set.last(), 5.0);
        assert!(set.contains(3.0));
        assert!(!set.contains(2.0));
    }

    #[test]
    fn test_empty_frame_set_rejected() {
        assert!(matches!(FrameSet::new([]), Err(Error::Config(_))));
        assert!(FrameSet::new([f64::NAN]).is_err());
    }

    #[test]
    fn test_range_frames() {
        let range = FrameRange { start: 1.0, end: 5.0, step: 2.0, ..Default::default() };
        let frames: Vec<f64> = range.frames().unwrap().iter().collect();
        assert_eq!(frames, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_range_relative_samples() {
        let range = FrameRange {
            start: 1.0,
            end: 2.0,
            step: 1.0,
            relative_samples: vec![0.25, -0.25, 0.0],
        };
        let frames: Vec<f64> = range.frames().unwrap().iter().collect();
        assert_eq!(frames, vec![0.75, 1.0, 1.25, 1.75, 2.0, 2.25]);

        let spf = 1.0 / 24.0;
        let ts = range.time_sampling(24.0).unwrap();
        assert_eq!(ts, TimeSampling::cyclic(spf, vec![0.75 * spf, 1.0 * spf, 1.25 * spf]));
    }

    #[test]
    fn test_range_uniform_sampling() {
        let ts = FrameRange::new(10.0, 20.0).time_sampling(25.0).unwrap();
        let spf = 1.0 / 25.0;
        assert_eq!(ts, TimeSampling::uniform(spf, 10.0 * spf));
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(FrameRange::new(5.0, 1.0).frames().is_err());
        let zero_step = FrameRange { step: 0.0, ..FrameRange::new(1.0, 2.0) };
        assert!(zero_step.frames().is_err());
        let wide = FrameRange { relative_samples: vec![1.0], ..FrameRange::new(1.0, 2.0) };
        assert!(wide.frames().is_err());
        assert!(FrameRange::new(1.0, 2.0).time_sampling(0.0).is_err());
    }
}
