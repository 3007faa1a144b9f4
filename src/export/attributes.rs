//! User attribute export.

use crate::archive::{ArchiveWriter, ObjectId, PropertyId, PropertyType};
use crate::scene::SceneGraph;
use crate::util::{DagPath, Result};

use super::JobArgs;

#[derive(Debug)]
struct AttrProperty {
    name: String,
    prop: PropertyId,
    ty: PropertyType,
    animated: bool,
}

/// Writes the selected user attributes of one scene node as properties.
#[derive(Debug)]
pub struct AttributesWriter {
    source: DagPath,
    props: Vec<AttrProperty>,
}

impl AttributesWriter {
    /// Create one property per selected attribute on `owner`, named
    /// `<prefix><attribute>`, and write the current values.
    pub fn new<A: ArchiveWriter + ?Sized>(
        archive: &mut A,
        owner: ObjectId,
        scene: &dyn SceneGraph,
        source: &DagPath,
        prefix: &str,
        ts_index: u32,
        args: &JobArgs,
    ) -> Result<Self> {
        let mut props = Vec::new();
        for attr in scene.user_attributes(source) {
            if !args.exports_attribute(&attr.name) {
                continue;
            }
            let ty = attr.value.property_type();
            let animated = attr.animated && ts_index != 0;
            let name = format!("{}{}", prefix, attr.name);
            let prop = archive.create_property(owner, &name, ty, if animated { ts_index } else { 0 })?;
            archive.set_sample(prop, attr.value.to_property_value())?;
            props.push(AttrProperty {
                name: attr.name,
                prop,
                ty,
                animated,
            });
        }
        Ok(Self {
            source: source.clone(),
            props,
        })
    }

    /// Any exported attribute changes over time.
    pub fn is_animated(&self) -> bool {
        self.props.iter().any(|p| p.animated)
    }

    /// Number of exported attributes.
    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Resample the animated attributes.
    pub fn write<A: ArchiveWriter + ?Sized>(&self, archive: &mut A, scene: &dyn SceneGraph) -> Result<()> {
        for p in self.props.iter().filter(|p| p.animated) {
            match scene.attribute(&self.source, &p.name) {
                Some(value) if value.property_type() == p.ty => {
                    archive.set_sample(p.prop, value.to_property_value())?;
                }
                _ => tracing::warn!("{}.{} could not be sampled", self.source, p.name),
            }
        }
        Ok(())
    }
}
