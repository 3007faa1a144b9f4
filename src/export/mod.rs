//! Export job and the writers it drives.
//!
//! - [`ExportJob`] - per-frame state machine owning the archive
//! - [`TransformWriter`] / [`CollectionWriter`] - object writers
//! - [`AttributesWriter`] - user attribute properties
//! - [`check_no_duplicates`] - root name collision check
//! - [`dispatch`] - callback template expansion and execution
//! - [`ensure_path`] - ancestor chain materialization

mod args;
mod attributes;
mod callback;
mod collection;
mod dedup;
mod hierarchy;
mod job;
mod stats;
mod transform;

pub use args::{JobArgs, DEFAULT_FPS};
pub use attributes::AttributesWriter;
pub use callback::{dispatch, expand_tokens, RecordingEvaluator, ScriptDialect, ScriptEvaluator};
pub use collection::{CollectionLeaf, CollectionWriter};
pub use dedup::check_no_duplicates;
pub use hierarchy::ensure_path;
pub use job::{ExportJob, JobPhase, BOUNDS_PROPERTY, STATISTICS_PROPERTY};
pub use stats::JobStatistics;
pub use transform::{TransformWriter, XFORM_PROPERTY, XFORM_SCHEMA};
