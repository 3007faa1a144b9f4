//! Utility types and functions.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`DagPath`] and namespace stripping
//! - Math type re-exports from glam plus [`BBox3d`]
//! - `%g`-style number formatting for callback templates

mod error;
mod format;
mod math;
mod path;

pub use error::*;
pub use format::*;
pub use math::*;
pub use path::*;
