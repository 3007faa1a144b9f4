//! Solver collection export.
//!
//! A collection node reports a flat list of solved rigid bodies, each with
//! the live path of the transform it drives and a world matrix. Every
//! element becomes an animated leaf grafted under its own ancestor chain,
//! starting at the object the collection is parented to.

use crate::archive::{ArchiveWriter, ObjectId};
use crate::scene::SceneGraph;
use crate::util::{strip_namespaces, translation_of, DMat4, DVec3, DagPath, Error, EulerRot, Result};

use super::hierarchy::ensure_path;
use super::{AttributesWriter, JobArgs, TransformWriter};

/// One solved element as tracked across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectionLeaf {
    name: String,
    inverse_parent: DMat4,
    world: DMat4,
    local: DMat4,
    index: usize,
}

impl CollectionLeaf {
    /// A leaf whose parent world matrix inverse is `inverse_parent`.
    pub fn new(name: impl Into<String>, index: usize, inverse_parent: DMat4) -> Self {
        Self {
            name: name.into(),
            inverse_parent,
            world: DMat4::IDENTITY,
            local: DMat4::IDENTITY,
            index,
        }
    }

    /// Take a new world matrix and derive the local one.
    pub fn sample(&mut self, world: DMat4) {
        self.world = world;
        self.local = self.inverse_parent * world;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position in the solver's result list.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn inverse_parent(&self) -> DMat4 {
        self.inverse_parent
    }

    pub fn world(&self) -> DMat4 {
        self.world
    }

    pub fn local(&self) -> DMat4 {
        self.local
    }
}

#[derive(Debug)]
struct LeafRecord {
    leaf: CollectionLeaf,
    writer: TransformWriter,
}

/// Writes every solved element of one collection node.
#[derive(Debug)]
pub struct CollectionWriter {
    source: DagPath,
    records: Vec<LeafRecord>,
    leaf_attrs: Vec<AttributesWriter>,
    attrs: Option<AttributesWriter>,
    live: usize,
    verbose: bool,
}

impl CollectionWriter {
    /// Pull the solver results of `path` and build the leaf hierarchy under
    /// `parent`.
    ///
    /// Fails when the solver or an element's parent cannot be resolved. A
    /// leaf that cannot be created is skipped with a warning.
    pub fn new<A: ArchiveWriter + ?Sized>(
        archive: &mut A,
        parent: ObjectId,
        scene: &dyn SceneGraph,
        path: &DagPath,
        ts_index: u32,
        args: &JobArgs,
    ) -> Result<Self> {
        let elements = scene.solved_elements(path)?;
        let mut records = Vec::with_capacity(elements.len());
        let mut leaf_attrs = Vec::new();

        for (i, element) in elements.iter().enumerate() {
            let live = &element.path;
            if !scene.exists(live) {
                return Err(Error::node(format!("{} element {} resolves to missing {}", path, i, live)));
            }
            let inverse_parent = match live.parent() {
                Some(p) => scene.world_matrix(&p)?.inverse(),
                None => DMat4::IDENTITY,
            };
            let mut leaf = CollectionLeaf::new(live.leaf_name(), i, inverse_parent);
            leaf.sample(element.world_matrix);

            let attach = ensure_path(archive, parent, live, args.strip_namespace, |ar, current, prefix| {
                TransformWriter::new(ar, current, scene, prefix, ts_index, args).map(|w| w.object())
            })?;

            match TransformWriter::new_leaf(archive, attach, scene, &leaf, live, ts_index, args) {
                Ok(mut writer) => {
                    if let Some(a) = writer.take_attrs() {
                        if ts_index != 0 && a.is_animated() {
                            leaf_attrs.push(a);
                        }
                    }
                    records.push(LeafRecord { leaf, writer });
                }
                Err(e) => tracing::warn!("Skipping solved element {} of {}: {}", live, path, e),
            }
        }

        let solver_name = strip_namespaces(path.leaf_name(), args.strip_namespace);
        let top = archive.top();
        let attrs = AttributesWriter::new(
            archive,
            top,
            scene,
            path,
            &format!("{}.", solver_name),
            ts_index,
            args,
        )?;

        tracing::debug!("collection {}: {} leaves", path, records.len());
        Ok(Self {
            source: path.clone(),
            live: records.len(),
            records,
            leaf_attrs,
            attrs: Some(attrs),
            verbose: args.verbose,
        })
    }

    /// Solver results are re-pulled every frame.
    pub fn is_animated(&self) -> bool {
        true
    }

    /// Number of exported leaves.
    pub fn num_leaves(&self) -> usize {
        self.records.len()
    }

    /// Leaves in export order.
    pub fn leaves(&self) -> impl Iterator<Item = &CollectionLeaf> + '_ {
        self.records.iter().map(|r| &r.leaf)
    }

    /// Archive object of the leaf at `index` in export order.
    pub fn leaf_object(&self, index: usize) -> Option<ObjectId> {
        self.records.get(index).map(|r| r.writer.object())
    }

    /// Hand the solver attribute writer to the caller.
    pub fn take_attrs(&mut self) -> Option<AttributesWriter> {
        self.attrs.take()
    }

    /// World positions of the leaves sampled on the last write.
    pub fn live_positions(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.records[..self.live].iter().map(|r| translation_of(&r.leaf.world()))
    }

    /// Resample every leaf still reported by the solver.
    ///
    /// Leaves past the end of a shrunken result list are skipped.
    pub fn write<A: ArchiveWriter + ?Sized>(
        &mut self,
        archive: &mut A,
        scene: &dyn SceneGraph,
        frame: f64,
    ) -> Result<()> {
        let elements = scene.solved_elements(&self.source)?;
        let count = self.records.len().min(elements.len());
        let mut live = 0;

        for record in &mut self.records {
            let Some(element) = elements.get(record.leaf.index()) else {
                continue;
            };
            if live >= count {
                break;
            }
            record.leaf.sample(element.world_matrix);
            record.writer.write_matrix(archive, record.leaf.local())?;
            live += 1;

            if self.verbose {
                log_sample(frame, &record.leaf);
            }
        }
        self.live = live;

        for attrs in &self.leaf_attrs {
            attrs.write(archive, scene)?;
        }
        Ok(())
    }
}

fn log_sample(frame: f64, leaf: &CollectionLeaf) {
    let (_, rotation, translation) = leaf.local().to_scale_rotation_translation();
    let (rx, ry, rz) = rotation.to_euler(EulerRot::XYZ);
    tracing::info!(
        "sample={}, node={}, translation=[{}, {}, {}], eulerRot=[{}, {}, {}] degreesRot=[{}, {}, {}]",
        frame,
        leaf.name(),
        translation.x,
        translation.y,
        translation.z,
        rx,
        ry,
        rz,
        rx.to_degrees(),
        ry.to_degrees(),
        rz.to_degrees()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveInfo, OArchive};
    use crate::core::TimeSampling;
    use crate::scene::{MemoryScene, NodeDesc, SceneDesc, SolvedDesc, TrsKey};
    use tempfile::TempDir;

    #[test]
    fn test_leaf_local_matrix() {
        let parent = crate::util::compose_trs([0.0, 1.0, 0.0], [0.0; 3], [1.0; 3]);
        let mut leaf = CollectionLeaf::new("ball", 0, parent.inverse());
        leaf.sample(crate::util::compose_trs([2.0, 3.0, 0.0], [0.0; 3], [1.0; 3]));
        assert_eq!(translation_of(&leaf.local()), DVec3::new(2.0, 2.0, 0.0));
        assert_eq!(leaf.inverse_parent(), parent.inverse());
    }

    fn scene() -> MemoryScene {
        let solved = vec![
            SolvedDesc::new("|grp|a", vec![TrsKey::translate(1.0, [0.0, 1.0, 0.0])]),
            SolvedDesc::new("|grp|b", vec![TrsKey::translate(1.0, [0.0, 2.0, 0.0])]),
            SolvedDesc::new("|c", vec![TrsKey::translate(1.0, [0.0, 3.0, 0.0])]),
        ];
        let desc = SceneDesc {
            nodes: vec![
                NodeDesc::transform("grp")
                    .with_translate([0.0, 1.0, 0.0])
                    .with_children(vec![NodeDesc::transform("a"), NodeDesc::transform("b")]),
                NodeDesc::transform("c"),
                NodeDesc::collection("solver", solved),
            ],
            ..SceneDesc::default()
        };
        MemoryScene::from_desc(desc).unwrap()
    }

    #[test]
    fn test_builds_leaf_hierarchy() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ar = OArchive::create(&dir.path().join("c.json"), &ArchiveInfo::default())?;
        let ts = ar.add_time_sampling(TimeSampling::uniform(1.0, 1.0));
        let top = ar.top();
        let sc = scene();

        let col = CollectionWriter::new(&mut ar, top, &sc, &DagPath::parse("|solver"), ts, &JobArgs::new("c.json"))?;
        assert_eq!(col.num_leaves(), 3);
        assert!(col.is_animated());
        assert!(ar.find("/grp/a").is_some());
        assert!(ar.find("/grp/b").is_some());
        assert!(ar.find("/c").is_some());

        let a = col.leaves().next().unwrap();
        assert_eq!(translation_of(&a.local()), DVec3::ZERO);
        Ok(())
    }

    #[test]
    fn test_shrinking_result_list() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ar = OArchive::create(&dir.path().join("c.json"), &ArchiveInfo::default())?;
        let ts = ar.add_time_sampling(TimeSampling::uniform(1.0, 1.0));
        let top = ar.top();
        let mut sc = scene();
        let solver = DagPath::parse("|solver");

        let mut col = CollectionWriter::new(&mut ar, top, &sc, &solver, ts, &JobArgs::new("c.json"))?;
        sc.solved_mut(&solver).unwrap().truncate(1);
        col.write(&mut ar, &sc, 2.0)?;

        let count = |ar: &OArchive, obj| {
            let p = ar.property_by_name(obj, ".xform").unwrap();
            ar.samples(p).len()
        };
        assert_eq!(count(&ar, col.leaf_object(0).unwrap()), 2);
        assert_eq!(count(&ar, col.leaf_object(1).unwrap()), 1);
        assert_eq!(count(&ar, col.leaf_object(2).unwrap()), 1);
        assert_eq!(col.live_positions().count(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_element_fails() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ar = OArchive::create(&dir.path().join("c.json"), &ArchiveInfo::default())?;
        let top = ar.top();
        let mut sc = scene();
        let solver = DagPath::parse("|solver");
        sc.solved_mut(&solver).unwrap().push(SolvedDesc::new("|gone", vec![]));

        let res = CollectionWriter::new(&mut ar, top, &sc, &solver, 0, &JobArgs::new("c.json"));
        assert!(matches!(res, Err(Error::NodeAccess(_))));
        Ok(())
    }
}
