//! Core layer - sampling and metadata types shared by archives and jobs.
//!
//! - [`TimeSampling`] - Time sampling for animated properties
//! - [`MetaData`] - Key-value metadata storage
//! - [`FrameSet`] / [`FrameRange`] - Frames an export job samples

mod frames;
mod metadata;
mod time_sampling;

pub use frames::{FrameRange, FrameSet};
pub use metadata::{has_reserved_chars, MetaData};
pub use time_sampling::{TimeSampling, TimeSamplingType};
