//! Time sampling descriptors registered with an archive.
//!
//! Every time-varying property references one of these by index; index 0
//! is always the identity (static) sampling.

use serde::{Deserialize, Serialize};

use crate::util::Chrono;

/// Type of time sampling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeSamplingType {
    /// Single static sample at time 0.
    Identity,

    /// `start_time + index * time_per_cycle`
    Uniform {
        time_per_cycle: Chrono,
        start_time: Chrono,
    },

    /// Repeating pattern of sample times, shifted by `time_per_cycle` each cycle.
    Cyclic {
        time_per_cycle: Chrono,
        times: Vec<Chrono>,
    },
}

/// Time sampling information for a property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSampling {
    #[serde(flatten)]
    pub sampling_type: TimeSamplingType,
}

impl TimeSampling {
    /// Identity time sampling (single sample at time 0).
    pub const IDENTITY: Self = Self {
        sampling_type: TimeSamplingType::Identity,
    };

    /// Create uniform time sampling.
    pub fn uniform(time_per_cycle: Chrono, start_time: Chrono) -> Self {
        Self {
            sampling_type: TimeSamplingType::Uniform {
                time_per_cycle,
                start_time,
            },
        }
    }

    /// Create cyclic time sampling.
    pub fn cyclic(time_per_cycle: Chrono, times: Vec<Chrono>) -> Self {
        Self {
            sampling_type: TimeSamplingType::Cyclic {
                time_per_cycle,
                times,
            },
        }
    }

    /// Check if this is identity (static) sampling.
    #[inline]
    pub fn is_identity(&self) -> bool {
        matches!(self.sampling_type, TimeSamplingType::Identity)
    }

    /// Get the time for a specific sample index.
    pub fn sample_time(&self, index: usize) -> Chrono {
        match &self.sampling_type {
            TimeSamplingType::Identity => 0.0,
            TimeSamplingType::Uniform { time_per_cycle, start_time } => {
                *start_time + (index as Chrono) * *time_per_cycle
            }
            TimeSamplingType::Cyclic { time_per_cycle, times } => {
                if times.is_empty() {
                    return 0.0;
                }
                let cycle = index / times.len();
                let local_idx = index % times.len();
                times[local_idx] + (cycle as Chrono) * *time_per_cycle
            }
        }
    }
}

impl Default for TimeSampling {
    fn default() -> Self {
        Self::IDENTITY
    }
}
