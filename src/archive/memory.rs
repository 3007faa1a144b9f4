//! In-memory archive persisted as JSON.
//!
//! Objects and properties live in flat arenas addressed by handle. The file
//! is created (and checked for writability) when the archive is created and
//! rewritten on every [`ArchiveWriter::flush`]; dropping an archive with
//! unflushed changes writes what it has.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::document::{ArchiveDocument, ObjectDocument, PropertyDocument, TimeSamplingEntry};
use super::{ArchiveInfo, ArchiveWriter, ObjectId, PropertyId, PropertyType, PropertyValue};
use crate::core::{MetaData, TimeSampling};
use crate::util::{Error, Result};

/// Name of the root object.
const TOP_NAME: &str = "ABC";

#[derive(Debug)]
struct ObjectData {
    name: String,
    full_name: String,
    meta_data: MetaData,
    children: Vec<ObjectId>,
    properties: Vec<PropertyId>,
}

#[derive(Debug)]
struct PropertyData {
    name: String,
    ty: PropertyType,
    time_sampling: u32,
    samples: Vec<PropertyValue>,
}

/// Archive writer backed by arenas, serialized to a JSON document.
#[derive(Debug)]
pub struct OArchive {
    path: PathBuf,
    name: String,
    meta_data: MetaData,
    time_samplings: Vec<TimeSampling>,
    max_samples: Vec<u32>,
    objects: Vec<ObjectData>,
    properties: Vec<PropertyData>,
    dirty: bool,
}

impl OArchive {
    fn object(&self, id: ObjectId) -> Result<&ObjectData> {
        self.objects.get(id.0).ok_or(Error::InvalidObject(id.0))
    }

    fn property(&self, id: PropertyId) -> Result<&PropertyData> {
        self.properties.get(id.0).ok_or(Error::InvalidProperty(id.0))
    }

    /// Archive metadata.
    pub fn meta_data(&self) -> &MetaData {
        &self.meta_data
    }

    /// Number of objects, root included.
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }

    /// Number of registered time samplings, identity included.
    pub fn num_time_samplings(&self) -> usize {
        self.time_samplings.len()
    }

    /// Largest sample count written against time sampling `index`.
    pub fn max_samples(&self, index: u32) -> Option<u32> {
        self.max_samples.get(index as usize).copied()
    }

    /// Object name.
    pub fn object_name(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(id.0).map(|o| o.name.as_str())
    }

    /// Object full name (`/a/b`).
    pub fn full_name(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(id.0).map(|o| o.full_name.as_str())
    }

    /// Object metadata.
    pub fn object_meta_data(&self, id: ObjectId) -> Option<&MetaData> {
        self.objects.get(id.0).map(|o| &o.meta_data)
    }

    /// Direct children in creation order.
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.objects.get(id.0).map(|o| o.children.as_slice()).unwrap_or(&[])
    }

    /// Resolve a `/a/b` style path from the root.
    pub fn find(&self, path: &str) -> Option<ObjectId> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self.top(), |cur, name| self.child_by_name(cur, name))
    }

    /// Property on `obj` by name.
    pub fn property_by_name(&self, obj: ObjectId, name: &str) -> Option<PropertyId> {
        let object = self.objects.get(obj.0)?;
        object
            .properties
            .iter()
            .copied()
            .find(|p| self.properties[p.0].name == name)
    }

    /// Property names on `obj` in creation order.
    pub fn property_names(&self, obj: ObjectId) -> Vec<&str> {
        self.objects
            .get(obj.0)
            .map(|o| {
                o.properties
                    .iter()
                    .map(|p| self.properties[p.0].name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Samples written to a property.
    pub fn samples(&self, prop: PropertyId) -> &[PropertyValue] {
        self.properties
            .get(prop.0)
            .map(|p| p.samples.as_slice())
            .unwrap_or(&[])
    }

    /// Time sampling index a property is bound to.
    pub fn property_time_sampling(&self, prop: PropertyId) -> Option<u32> {
        self.properties.get(prop.0).map(|p| p.time_sampling)
    }

    /// Snapshot the archive as a serializable document.
    pub fn to_document(&self) -> ArchiveDocument {
        ArchiveDocument {
            name: self.name.clone(),
            meta_data: self.meta_data.clone(),
            time_samplings: self
                .time_samplings
                .iter()
                .zip(&self.max_samples)
                .map(|(ts, &max)| TimeSamplingEntry {
                    sampling: ts.clone(),
                    max_samples: max,
                })
                .collect(),
            root: self.object_document(self.top()),
        }
    }

    fn object_document(&self, id: ObjectId) -> ObjectDocument {
        let object = &self.objects[id.0];
        ObjectDocument {
            name: object.name.clone(),
            meta_data: object.meta_data.clone(),
            properties: object
                .properties
                .iter()
                .map(|p| {
                    let prop = &self.properties[p.0];
                    PropertyDocument {
                        name: prop.name.clone(),
                        data_type: prop.ty,
                        time_sampling: prop.time_sampling,
                        samples: prop.samples.clone(),
                    }
                })
                .collect(),
            children: object
                .children
                .iter()
                .map(|c| self.object_document(*c))
                .collect(),
        }
    }
}

impl ArchiveWriter for OArchive {
    fn create(path: &Path, info: &ArchiveInfo) -> Result<Self> {
        if path.as_os_str().is_empty() {
            return Err(Error::ArchiveCreation {
                path: path.to_path_buf(),
                reason: "empty file name".to_string(),
            });
        }
        // Fail early if the location is not writable.
        File::create(path).map_err(|e| Error::ArchiveCreation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let top = ObjectData {
            name: TOP_NAME.to_string(),
            full_name: "/".to_string(),
            meta_data: MetaData::new(),
            children: Vec::new(),
            properties: Vec::new(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            name: path.to_string_lossy().to_string(),
            meta_data: info.to_metadata(),
            time_samplings: vec![TimeSampling::IDENTITY],
            max_samples: vec![0],
            objects: vec![top],
            properties: Vec::new(),
            dirty: true,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn add_time_sampling(&mut self, ts: TimeSampling) -> u32 {
        if ts.is_identity() {
            return 0;
        }
        if let Some(pos) = self.time_samplings.iter().position(|t| *t == ts) {
            return pos as u32;
        }
        self.time_samplings.push(ts);
        self.max_samples.push(0);
        self.dirty = true;
        (self.time_samplings.len() - 1) as u32
    }

    fn time_sampling(&self, index: u32) -> Option<&TimeSampling> {
        self.time_samplings.get(index as usize)
    }

    fn top(&self) -> ObjectId {
        ObjectId(0)
    }

    fn is_valid(&self, obj: ObjectId) -> bool {
        obj.0 < self.objects.len()
    }

    fn child_by_name(&self, parent: ObjectId, name: &str) -> Option<ObjectId> {
        let parent = self.objects.get(parent.0)?;
        parent
            .children
            .iter()
            .copied()
            .find(|c| self.objects[c.0].name == name)
    }

    fn create_child(&mut self, parent: ObjectId, name: &str, meta: MetaData) -> Result<ObjectId> {
        let parent_full = self.object(parent)?.full_name.clone();
        if name.is_empty() || name.contains('/') {
            return Err(Error::HierarchyCreation {
                component: name.to_string(),
            });
        }
        if self.child_by_name(parent, name).is_some() {
            return Err(Error::DuplicateChild {
                parent: parent_full,
                name: name.to_string(),
            });
        }

        let full_name = if parent_full == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent_full, name)
        };
        let id = ObjectId(self.objects.len());
        self.objects.push(ObjectData {
            name: name.to_string(),
            full_name,
            meta_data: meta,
            children: Vec::new(),
            properties: Vec::new(),
        });
        self.objects[parent.0].children.push(id);
        self.dirty = true;
        Ok(id)
    }

    fn create_property(
        &mut self,
        owner: ObjectId,
        name: &str,
        ty: PropertyType,
        ts_index: u32,
    ) -> Result<PropertyId> {
        let object_full = self.object(owner)?.full_name.clone();
        if ts_index as usize >= self.time_samplings.len() {
            return Err(Error::InvalidTimeSampling(ts_index));
        }
        if self.property_by_name(owner, name).is_some() {
            return Err(Error::DuplicateProperty {
                object: object_full,
                name: name.to_string(),
            });
        }

        let id = PropertyId(self.properties.len());
        self.properties.push(PropertyData {
            name: name.to_string(),
            ty,
            time_sampling: ts_index,
            samples: Vec::new(),
        });
        self.objects[owner.0].properties.push(id);
        self.dirty = true;
        Ok(id)
    }

    fn set_sample(&mut self, prop: PropertyId, value: PropertyValue) -> Result<()> {
        let data = self.property(prop)?;
        if value.property_type() != data.ty {
            return Err(Error::TypeMismatch {
                property: data.name.clone(),
                expected: data.ty.name(),
                actual: value.property_type().name(),
            });
        }

        let data = &mut self.properties[prop.0];
        data.samples.push(value);
        let count = data.samples.len() as u32;
        let max = &mut self.max_samples[data.time_sampling as usize];
        *max = (*max).max(count);
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.to_document())?;
        self.dirty = false;
        tracing::debug!("flushed archive {}", self.name);
        Ok(())
    }
}

impl Drop for OArchive {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.flush() {
                tracing::warn!("failed to write archive {}: {}", self.name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::DMat4;
    use tempfile::TempDir;

    fn archive(dir: &TempDir) -> OArchive {
        let info = ArchiveInfo::new("Test", "1", "scene.ma");
        OArchive::create(&dir.path().join("out.json"), &info).expect("create archive")
    }

    #[test]
    fn test_create_children() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ar = archive(&dir);
        let top = ar.top();

        let a = ar.create_child(top, "a", MetaData::new())?;
        let b = ar.create_child(a, "b", MetaData::new())?;

        assert_eq!(ar.child_by_name(top, "a"), Some(a));
        assert_eq!(ar.full_name(b), Some("/a/b"));
        assert_eq!(ar.find("/a/b"), Some(b));
        assert_eq!(ar.find("/a/c"), None);
        assert!(ar.is_valid(b));
        assert!(!ar.is_valid(ObjectId(99)));

        let dup = ar.create_child(top, "a", MetaData::new());
        assert!(matches!(dup, Err(Error::DuplicateChild { .. })));
        Ok(())
    }

    #[test]
    fn test_time_sampling_registration() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ar = archive(&dir);

        assert_eq!(ar.add_time_sampling(TimeSampling::IDENTITY), 0);
        let ts = TimeSampling::uniform(1.0 / 24.0, 0.0);
        assert_eq!(ar.add_time_sampling(ts.clone()), 1);
        assert_eq!(ar.add_time_sampling(ts.clone()), 1);
        assert_eq!(ar.time_sampling(1), Some(&ts));
        assert_eq!(ar.num_time_samplings(), 2);
        Ok(())
    }

    #[test]
    fn test_samples_and_types() -> Result<()> {
        let dir = TempDir::new()?;
        let mut ar = archive(&dir);
        let ts = ar.add_time_sampling(TimeSampling::uniform(1.0, 0.0));
        let top = ar.top();

        let prop = ar.create_property(top, ".xform", PropertyType::Matrix44d, ts)?;
        ar.set_sample(prop, PropertyValue::Matrix44d(DMat4::IDENTITY))?;
        ar.set_sample(prop, PropertyValue::Matrix44d(DMat4::IDENTITY))?;
        assert_eq!(ar.samples(prop).len(), 2);
        assert_eq!(ar.max_samples(ts), Some(2));

        let bad = ar.set_sample(prop, PropertyValue::UInt32(1));
        assert!(matches!(bad, Err(Error::TypeMismatch { .. })));

        assert!(ar.create_property(top, ".xform", PropertyType::Bool, 0).is_err());
        assert!(matches!(
            ar.create_property(top, "x", PropertyType::Bool, 7),
            Err(Error::InvalidTimeSampling(7))
        ));
        Ok(())
    }

    #[test]
    fn test_flush_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("out.json");
        {
            let mut ar = archive(&dir);
            let top = ar.top();
            let child = ar.create_child(top, "child", MetaData::new())?;
            let prop = ar.create_property(child, "note", PropertyType::String, 0)?;
            ar.set_sample(prop, PropertyValue::String("hello".into()))?;
            ar.flush()?;
        }

        let doc = ArchiveDocument::open(&path)?;
        let child = doc.find("/child").expect("child written");
        assert_eq!(child.properties[0].samples, vec![PropertyValue::String("hello".into())]);
        assert_eq!(
            doc.meta_data.get(MetaData::DESCRIPTION_KEY),
            Some("Exported from: scene.ma")
        );
        Ok(())
    }

    #[test]
    fn test_create_rejects_missing_dir() {
        let info = ArchiveInfo::default();
        let res = OArchive::create(Path::new("/nonexistent-dir/for/sure/out.json"), &info);
        assert!(matches!(res, Err(Error::ArchiveCreation { .. })));
        let res = OArchive::create(Path::new(""), &info);
        assert!(matches!(res, Err(Error::ArchiveCreation { .. })));
    }
}
