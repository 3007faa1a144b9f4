//! Frame-sequenced export job.
//!
//! The host calls [`ExportJob::eval`] once per frame in increasing order,
//! after moving scene time to that frame. The first frame of the job's
//! [`FrameSet`] walks the requested roots and creates every writer; later
//! frames in the set replay the recorded writers; the last frame writes the
//! job summary and flushes the archive.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::archive::{ArchiveInfo, ArchiveWriter, ObjectId, PropertyId, PropertyType, PropertyValue};
use crate::core::{FrameSet, TimeSampling};
use crate::scene::{NodeKind, SceneGraph};
use crate::util::{translation_of, BBox3d, DVec3, DagPath, Error, Result};

use super::callback::{dispatch, ScriptDialect, ScriptEvaluator};
use super::dedup::check_no_duplicates;
use super::{AttributesWriter, CollectionWriter, JobArgs, JobStatistics, TransformWriter};

/// Name of the archive bounds property.
pub const BOUNDS_PROPERTY: &str = ".childBnds";

/// Name of the statistics property.
pub const STATISTICS_PROPERTY: &str = "statistics";

/// Where a job is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobPhase {
    /// Waiting for the first frame.
    Uninitialized,
    /// Archive open, writers recorded.
    Sampling,
    /// Last frame written.
    Finalized,
}

/// Everything setup produces; threaded through the traversal by `&mut`.
#[derive(Debug)]
struct JobState<A> {
    archive: A,
    ts_index: u32,
    bounds_prop: PropertyId,
    /// Active selection plus ancestors, when filtering by selection.
    /// Membership is exact: descendants of a selected node are not implied.
    selection: Option<HashSet<DagPath>>,
    transforms: Vec<TransformWriter>,
    transform_attrs: Vec<AttributesWriter>,
    collections: Vec<CollectionWriter>,
    collection_attrs: Vec<AttributesWriter>,
    /// Every exported scene transform, for bounds.
    exported: Vec<DagPath>,
    stats: JobStatistics,
    bounds: BBox3d,
}

/// One archive written over a sequence of frames.
#[derive(Debug)]
pub struct ExportJob<A: ArchiveWriter> {
    file: PathBuf,
    frames: FrameSet,
    time_sampling: TimeSampling,
    args: JobArgs,
    phase: JobPhase,
    trans_samples: u32,
    state: Option<JobState<A>>,
}

impl<A: ArchiveWriter> ExportJob<A> {
    /// A job writing `file` at `frames`, sampled with `time_sampling`.
    pub fn new(file: impl Into<PathBuf>, frames: FrameSet, time_sampling: TimeSampling, args: JobArgs) -> Self {
        Self {
            file: file.into(),
            frames,
            time_sampling,
            args,
            phase: JobPhase::Uninitialized,
            trans_samples: 1,
            state: None,
        }
    }

    /// Validate `args` and derive the frames and time sampling from them.
    pub fn from_args(args: JobArgs) -> Result<Self> {
        args.validate()?;
        let frames = args.frames()?;
        let time_sampling = args.time_sampling()?;
        Ok(Self::new(args.file.clone(), frames, time_sampling, args))
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn frames(&self) -> &FrameSet {
        &self.frames
    }

    pub fn args(&self) -> &JobArgs {
        &self.args
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// Transform samples written so far, setup included.
    pub fn trans_samples(&self) -> u32 {
        self.trans_samples
    }

    /// The archive, once setup has run.
    pub fn archive(&self) -> Option<&A> {
        self.state.as_ref().map(|s| &s.archive)
    }

    /// Take the archive out of a finished job.
    pub fn into_archive(self) -> Option<A> {
        self.state.map(|s| s.archive)
    }

    /// Counters gathered during setup.
    pub fn statistics(&self) -> Option<JobStatistics> {
        self.state.as_ref().map(|s| s.stats)
    }

    /// Time sampling index the job registered; 0 until setup.
    pub fn time_sampling_index(&self) -> u32 {
        self.state.as_ref().map_or(0, |s| s.ts_index)
    }

    /// Bounds written for the most recent sample.
    pub fn bounds(&self) -> BBox3d {
        self.state.as_ref().map_or(BBox3d::EMPTY, |s| s.bounds)
    }

    /// Process one frame. Returns `true` once the last frame is written.
    ///
    /// Frames outside the job's set are no-ops. A frame of the set that
    /// arrives before the first one, a repeated first frame and any frame
    /// after finalization are rejected.
    pub fn eval(
        &mut self,
        frame: f64,
        scene: &dyn SceneGraph,
        evaluator: &mut dyn ScriptEvaluator,
    ) -> Result<bool> {
        match self.phase {
            JobPhase::Finalized => {
                return Err(Error::InvalidState(format!(
                    "frame {} evaluated after the job finished",
                    frame
                )));
            }
            // Frames outside the set are ignored until setup has run.
            JobPhase::Uninitialized if !self.frames.contains(frame) => return Ok(false),
            JobPhase::Uninitialized if frame != self.frames.first() => {
                return Err(Error::InvalidState(format!(
                    "frame {} evaluated before setup frame {}",
                    frame,
                    self.frames.first()
                )));
            }
            JobPhase::Sampling if frame == self.frames.first() => {
                return Err(Error::InvalidState(format!("setup frame {} evaluated twice", frame)));
            }
            _ => {}
        }

        if self.phase == JobPhase::Uninitialized {
            let state = self.setup(scene)?;
            self.state = Some(state);
            self.phase = JobPhase::Sampling;
            let bounds = self.write_bounds(scene)?;
            self.per_frame_callbacks(frame, &bounds, evaluator);
        } else if self.frames.contains(frame) {
            self.sample(frame, scene)?;
            let bounds = self.write_bounds(scene)?;
            self.per_frame_callbacks(frame, &bounds, evaluator);
        }

        if frame == self.frames.last() {
            self.finalize(frame, evaluator)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn state_mut(&mut self) -> Result<&mut JobState<A>> {
        self.state
            .as_mut()
            .ok_or_else(|| Error::InvalidState("job has not been set up".to_string()))
    }

    /// Resolve the roots to export and, when filtering, the selection set.
    fn roots(&self, scene: &dyn SceneGraph) -> (Vec<DagPath>, Option<HashSet<DagPath>>) {
        let mut roots = Vec::new();
        for path in &self.args.dag_paths {
            if !roots.contains(path) {
                roots.push(path.clone());
            }
        }
        if !self.args.use_selection_list {
            return (roots, None);
        }

        let seed = roots.is_empty();
        let mut selection = HashSet::new();
        for selected in scene.active_selection() {
            for len in 1..=selected.len() {
                selection.insert(selected.prefix(len));
            }
            if seed && !selected.is_empty() {
                let top = selected.prefix(1);
                if !roots.contains(&top) {
                    roots.push(top);
                }
            }
        }
        (roots, Some(selection))
    }

    fn setup(&self, scene: &dyn SceneGraph) -> Result<JobState<A>> {
        let (roots, selection) = self.roots(scene);
        if roots.is_empty() {
            return Err(Error::config("no root nodes to export"));
        }
        check_no_duplicates(&roots, self.args.strip_namespace)?;

        let info = ArchiveInfo::new(scene.host_name(), scene.host_version(), scene.current_file());
        let mut archive = A::create(&self.file, &info)?;
        let ts_index = archive.add_time_sampling(self.time_sampling.clone());
        let top = archive.top();
        let bounds_prop = archive.create_property(top, BOUNDS_PROPERTY, PropertyType::Box3d, ts_index)?;

        let mut state = JobState {
            archive,
            ts_index,
            bounds_prop,
            selection,
            transforms: Vec::new(),
            transform_attrs: Vec::new(),
            collections: Vec::new(),
            collection_attrs: Vec::new(),
            exported: Vec::new(),
            stats: JobStatistics::default(),
            bounds: BBox3d::EMPTY,
        };

        for root in &roots {
            setup_node(&mut state, scene, root, None, &self.args)?;
        }

        tracing::info!(
            "{}: {} animated transforms, {} collections, sampling index {}",
            self.file.display(),
            state.transforms.len(),
            state.collections.len(),
            ts_index
        );
        Ok(state)
    }

    fn sample(&mut self, frame: f64, scene: &dyn SceneGraph) -> Result<()> {
        self.trans_samples += 1;
        let state = self.state_mut()?;
        let archive = &mut state.archive;

        for t in &state.transforms {
            t.write(archive, scene)?;
        }
        for a in &state.transform_attrs {
            a.write(archive, scene)?;
        }
        for c in &mut state.collections {
            c.write(archive, scene, frame)?;
        }
        for a in &state.collection_attrs {
            a.write(archive, scene)?;
        }

        tracing::debug!("frame {}: sample {}", frame, self.trans_samples);
        Ok(())
    }

    fn write_bounds(&mut self, scene: &dyn SceneGraph) -> Result<BBox3d> {
        let state = self.state_mut()?;
        let mut bounds = BBox3d::EMPTY;
        for path in &state.exported {
            if let Ok(world) = scene.world_matrix(path) {
                bounds.expand_by_point(translation_of(&world));
            }
        }
        for c in &state.collections {
            for p in c.live_positions() {
                bounds.expand_by_point(p);
            }
        }
        state.bounds = bounds;

        // Empty bounds are stored as a zero box.
        let sample = if bounds.is_empty() {
            BBox3d::new(DVec3::ZERO, DVec3::ZERO)
        } else {
            bounds
        };
        state.archive.set_sample(state.bounds_prop, PropertyValue::Box3d(sample))?;
        Ok(bounds)
    }

    fn per_frame_callbacks(&self, frame: f64, bounds: &BBox3d, evaluator: &mut dyn ScriptEvaluator) {
        dispatch(&self.args.mel_per_frame_callback, ScriptDialect::Mel, frame, bounds, evaluator);
        dispatch(&self.args.python_per_frame_callback, ScriptDialect::Python, frame, bounds, evaluator);
    }

    fn finalize(&mut self, frame: f64, evaluator: &mut dyn ScriptEvaluator) -> Result<()> {
        let trans_samples = self.trans_samples;
        let state = self.state_mut()?;
        let top = state.archive.top();

        let summary = state.stats.summary();
        if !summary.is_empty() {
            let prop = state.archive.create_property(top, STATISTICS_PROPERTY, PropertyType::String, 0)?;
            state.archive.set_sample(prop, PropertyValue::String(summary))?;
        }

        if state.ts_index != 0 {
            let name = format!("{}.samples", state.ts_index);
            let prop = state.archive.create_property(top, &name, PropertyType::UInt32, 0)?;
            state.archive.set_sample(prop, PropertyValue::UInt32(trans_samples))?;
        }

        state.archive.flush()?;
        let bounds = state.bounds;
        self.phase = JobPhase::Finalized;

        dispatch(&self.args.mel_post_callback, ScriptDialect::Mel, frame, &bounds, evaluator);
        dispatch(&self.args.python_post_callback, ScriptDialect::Python, frame, &bounds, evaluator);
        tracing::info!("{}: finished at frame {} ({} samples)", self.file.display(), frame, trans_samples);
        Ok(())
    }
}

/// Export `path` and, for transforms, its subtree.
///
/// Node-level failures are logged and the branch skipped; only archive
/// errors propagate.
fn setup_node<A: ArchiveWriter>(
    state: &mut JobState<A>,
    scene: &dyn SceneGraph,
    path: &DagPath,
    parent: Option<ObjectId>,
    args: &JobArgs,
) -> Result<()> {
    if let Some(selection) = &state.selection {
        if !selection.contains(path) {
            return Ok(());
        }
    }

    let kind = match scene.node_kind(path) {
        Ok(kind) => kind,
        Err(e) => {
            tracing::warn!("Initialize node {} failed, skipping: {}", path, e);
            return Ok(());
        }
    };
    let solved_state = kind == NodeKind::Collection;

    if scene.is_intermediate(path) && !solved_state {
        return Ok(());
    }
    if args.exclude_invisible && !scene.is_renderable(path) {
        return Ok(());
    }

    let ts_index = state.ts_index;
    match kind {
        NodeKind::Collection => {
            let top = state.archive.top();
            match CollectionWriter::new(&mut state.archive, top, scene, path, ts_index, args) {
                Ok(mut col) => {
                    if let Some(attrs) = col.take_attrs() {
                        if ts_index != 0 && attrs.is_animated() {
                            state.collection_attrs.push(attrs);
                        }
                    }
                    state.collections.push(col);
                    state.stats.trans_col_num += 1;
                }
                Err(e) => {
                    tracing::warn!("Initialize transform collection node {} failed, skipping: {}", path, e);
                }
            }
        }
        NodeKind::Transform => {
            let parent = parent.unwrap_or_else(|| state.archive.top());
            let mut trans = match TransformWriter::new(&mut state.archive, parent, scene, path, ts_index, args) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Initialize transform node {} failed, skipping: {}", path, e);
                    return Ok(());
                }
            };
            let object = trans.object();
            state.exported.push(path.clone());

            if let Some(attrs) = trans.take_attrs() {
                if ts_index != 0 && attrs.is_animated() {
                    state.transform_attrs.push(attrs);
                }
            }
            if trans.is_animated() && ts_index != 0 {
                state.transforms.push(trans);
                state.stats.trans_anim_num += 1;
            } else {
                state.stats.trans_static_num += 1;
            }

            for child in scene.children(path) {
                setup_node(state, scene, &child, Some(object), args)?;
            }
        }
        NodeKind::Unsupported { type_name } => {
            tracing::warn!("{} is an unsupported type of {}", path, type_name);
        }
    }
    Ok(())
}
