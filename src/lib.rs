//! # abc-bullet
//!
//! Frame-sequenced export of a live scene hierarchy, including rigid-body
//! solver results, into a hierarchical time-sampled archive.
//!
//! An [`export::ExportJob`] is evaluated once per frame. The first frame
//! walks the requested roots and creates one writer per exported transform
//! and per solver collection; every later sampled frame replays those
//! writers; the last frame writes the job statistics and flushes.
//!
//! ## Modules
//!
//! - [`util`] - Errors, DAG paths, math and number formatting
//! - [`core`] - Time sampling, metadata and frame sets
//! - [`archive`] - Archive writer trait and the JSON-backed [`archive::OArchive`]
//! - [`scene`] - Scene graph trait and the JSON-backed [`scene::MemoryScene`]
//! - [`export`] - Export job, writers and callbacks
//!
//! ## Example
//!
//! ```ignore
//! use abc_bullet::prelude::*;
//!
//! let mut scene = MemoryScene::load("scene.json")?;
//! let mut args = JobArgs::new("out.json");
//! args.dag_paths = vec![DagPath::parse("|grp")];
//! args.frame_range = FrameRange::new(1.0, 24.0);
//!
//! let mut job: ExportJob<OArchive> = ExportJob::from_args(args)?;
//! let mut evaluator = RecordingEvaluator::new();
//! for frame in job.frames().clone().iter() {
//!     scene.set_frame(frame);
//!     job.eval(frame, &scene, &mut evaluator)?;
//! }
//! ```

pub mod util;
pub mod core;
pub mod archive;
pub mod scene;
pub mod export;

// Re-export commonly used types
pub use util::{DagPath, Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::archive::{ArchiveDocument, ArchiveWriter, OArchive};
    pub use crate::core::{FrameRange, FrameSet, TimeSampling};
    pub use crate::export::{ExportJob, JobArgs, RecordingEvaluator, ScriptDialect, ScriptEvaluator};
    pub use crate::scene::{MemoryScene, SceneGraph};
    pub use crate::util::{DagPath, Error, Result};
}
