//! Transform object writer.

use crate::archive::{ArchiveWriter, ObjectId, PropertyId, PropertyType, PropertyValue};
use crate::core::MetaData;
use crate::scene::SceneGraph;
use crate::util::{strip_namespaces, DMat4, DagPath, Result};

use super::{AttributesWriter, CollectionLeaf, JobArgs};

/// Schema title of transform objects.
pub const XFORM_SCHEMA: &str = "AbcGeom_Xform_v3";

/// Name of the matrix property on transform objects.
pub const XFORM_PROPERTY: &str = ".xform";

fn xform_meta_data() -> MetaData {
    let mut meta = MetaData::new();
    meta.set(MetaData::SCHEMA_KEY, XFORM_SCHEMA);
    meta.set("schemaObjTitle", format!("{}:{}", XFORM_SCHEMA, XFORM_PROPERTY));
    meta
}

/// One transform object and its local matrix property.
///
/// The first sample is written on construction.
#[derive(Debug)]
pub struct TransformWriter {
    object: ObjectId,
    xform: PropertyId,
    source: DagPath,
    animated: bool,
    attrs: Option<AttributesWriter>,
}

impl TransformWriter {
    /// Export the scene transform at `path` under `parent`.
    pub fn new<A: ArchiveWriter + ?Sized>(
        archive: &mut A,
        parent: ObjectId,
        scene: &dyn SceneGraph,
        path: &DagPath,
        ts_index: u32,
        args: &JobArgs,
    ) -> Result<Self> {
        let animated = scene.is_animated(path);
        let local = scene.local_matrix(path)?;
        let name = strip_namespaces(path.leaf_name(), args.strip_namespace);
        Self::create(archive, parent, name, scene, path, local, animated, ts_index, args)
    }

    /// Export a solved collection leaf under `parent`.
    ///
    /// Always animated; samples come from [`TransformWriter::write_matrix`].
    pub fn new_leaf<A: ArchiveWriter + ?Sized>(
        archive: &mut A,
        parent: ObjectId,
        scene: &dyn SceneGraph,
        leaf: &CollectionLeaf,
        live_path: &DagPath,
        ts_index: u32,
        args: &JobArgs,
    ) -> Result<Self> {
        let name = strip_namespaces(leaf.name(), args.strip_namespace);
        Self::create(archive, parent, name, scene, live_path, leaf.local(), true, ts_index, args)
    }

    #[allow(clippy::too_many_arguments)]
    fn create<A: ArchiveWriter + ?Sized>(
        archive: &mut A,
        parent: ObjectId,
        name: &str,
        scene: &dyn SceneGraph,
        source: &DagPath,
        first: DMat4,
        animated: bool,
        ts_index: u32,
        args: &JobArgs,
    ) -> Result<Self> {
        let object = archive.create_child(parent, name, xform_meta_data())?;
        let prop_ts = if animated { ts_index } else { 0 };
        let xform = archive.create_property(object, XFORM_PROPERTY, PropertyType::Matrix44d, prop_ts)?;
        archive.set_sample(xform, PropertyValue::Matrix44d(first))?;
        let attrs = AttributesWriter::new(archive, object, scene, source, "", ts_index, args)?;

        Ok(Self {
            object,
            xform,
            source: source.clone(),
            animated,
            attrs: Some(attrs),
        })
    }

    /// The archive object.
    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn is_animated(&self) -> bool {
        self.animated
    }

    /// Hand the attribute writer to the caller.
    pub fn take_attrs(&mut self) -> Option<AttributesWriter> {
        self.attrs.take()
    }

    /// Resample the local matrix from the scene.
    pub fn write<A: ArchiveWriter + ?Sized>(&self, archive: &mut A, scene: &dyn SceneGraph) -> Result<()> {
        let local = scene.local_matrix(&self.source)?;
        self.write_matrix(archive, local)
    }

    /// Write a supplied local matrix.
    pub fn write_matrix<A: ArchiveWriter + ?Sized>(&self, archive: &mut A, local: DMat4) -> Result<()> {
        archive.set_sample(self.xform, PropertyValue::Matrix44d(local))
    }
}
