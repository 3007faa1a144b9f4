//! Serialized archive layout.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use super::{PropertyType, PropertyValue};
use crate::core::{MetaData, TimeSampling};
use crate::util::{Chrono, Result};

/// A whole archive as written to disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchiveDocument {
    pub name: String,
    pub meta_data: MetaData,
    pub time_samplings: Vec<TimeSamplingEntry>,
    pub root: ObjectDocument,
}

/// A registered time sampling and the most samples written against it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSamplingEntry {
    #[serde(flatten)]
    pub sampling: TimeSampling,
    pub max_samples: u32,
}

impl TimeSamplingEntry {
    /// Times of the first and last written samples, if any were written.
    pub fn time_range(&self) -> Option<(Chrono, Chrono)> {
        let last = self.max_samples.checked_sub(1)?;
        Some((self.sampling.sample_time(0), self.sampling.sample_time(last as usize)))
    }
}

/// One object and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDocument {
    pub name: String,
    pub meta_data: MetaData,
    pub properties: Vec<PropertyDocument>,
    pub children: Vec<ObjectDocument>,
}

/// One scalar property and its samples.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyDocument {
    pub name: String,
    pub data_type: PropertyType,
    pub time_sampling: u32,
    pub samples: Vec<PropertyValue>,
}

impl ArchiveDocument {
    /// Read a document written by [`super::OArchive`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Resolve a `/a/b` style path from the root.
    pub fn find(&self, path: &str) -> Option<&ObjectDocument> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(&self.root, |cur, name| cur.child(name))
    }

    /// Total number of objects below the root.
    pub fn num_objects(&self) -> usize {
        fn count(o: &ObjectDocument) -> usize {
            o.children.len() + o.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Print archive info and the object hierarchy.
    pub fn print_tree(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Archive: {}", self.name)?;
        writeln!(out, "Metadata: {}", self.meta_data.serialize())?;
        for (i, ts) in self.time_samplings.iter().enumerate() {
            writeln!(out, "TimeSampling {}: {:?} ({} samples)", i, ts.sampling.sampling_type, ts.max_samples)?;
        }
        print_object(out, &self.root, 0)
    }
}

impl ObjectDocument {
    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&ObjectDocument> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDocument> {
        self.properties.iter().find(|p| p.name == name)
    }
}

fn print_object(out: &mut impl Write, obj: &ObjectDocument, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    match obj.meta_data.schema() {
        Some(schema) => writeln!(out, "{}{} [{}]", indent, obj.name, schema)?,
        None => writeln!(out, "{}{}", indent, obj.name)?,
    }
    for prop in &obj.properties {
        writeln!(
            out,
            "{}  .{} {} ts={} samples={}",
            indent,
            prop.name.trim_start_matches('.'),
            prop.data_type.name(),
            prop.time_sampling,
            prop.samples.len()
        )?;
    }
    for child in &obj.children {
        print_object(out, child, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ArchiveDocument {
        let leaf = ObjectDocument {
            name: "leaf".into(),
            meta_data: MetaData::new(),
            properties: vec![PropertyDocument {
                name: ".xform".into(),
                data_type: PropertyType::Matrix44d,
                time_sampling: 1,
                samples: vec![],
            }],
            children: vec![],
        };
        let grp = ObjectDocument {
            name: "grp".into(),
            meta_data: MetaData::new(),
            properties: vec![],
            children: vec![leaf],
        };
        ArchiveDocument {
            name: "out.json".into(),
            meta_data: MetaData::new(),
            time_samplings: vec![TimeSamplingEntry { sampling: TimeSampling::IDENTITY, max_samples: 0 }],
            root: ObjectDocument {
                name: "ABC".into(),
                meta_data: MetaData::new(),
                properties: vec![],
                children: vec![grp],
            },
        }
    }

    #[test]
    fn test_find_and_count() {
        let d = doc();
        assert_eq!(d.num_objects(), 2);
        assert_eq!(d.find("/grp/leaf").map(|o| o.name.as_str()), Some("leaf"));
        assert!(d.find("/leaf").is_none());
        assert!(d.find("/grp/leaf").unwrap().property(".xform").is_some());
    }

    #[test]
    fn test_time_range() {
        let entry = TimeSamplingEntry {
            sampling: TimeSampling::uniform(0.5, 1.0),
            max_samples: 3,
        };
        assert_eq!(entry.time_range(), Some((1.0, 2.0)));

        let entry = TimeSamplingEntry {
            sampling: TimeSampling::cyclic(1.0, vec![-0.25, 0.25]),
            max_samples: 0,
        };
        assert_eq!(entry.time_range(), None);
    }

    #[test]
    fn test_print_tree() {
        let mut out = Vec::new();
        doc().print_tree(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  grp\n"));
        assert!(text.contains("    leaf\n"));
        assert!(text.contains(".xform matrix44d ts=1 samples=0"));
    }
}
