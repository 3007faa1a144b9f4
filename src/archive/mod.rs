//! Output archive interface.
//!
//! An export job only needs a narrow slice of an archive library: create an
//! object or property, append a sample, look up a child by name and check a
//! handle for validity. [`ArchiveWriter`] captures exactly that; [`OArchive`]
//! is the in-memory implementation persisted as a JSON [`ArchiveDocument`].
//!
//! The archive exclusively owns every object and property. Writers keep the
//! copyable [`ObjectId`] / [`PropertyId`] handles and never a copy of the
//! structure itself.

mod document;
mod memory;

pub use document::{ArchiveDocument, ObjectDocument, PropertyDocument, TimeSamplingEntry};
pub use memory::OArchive;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::{has_reserved_chars, MetaData, TimeSampling};
use crate::util::{BBox3d, DMat4, Result};

/// Handle to an object owned by an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    /// Arena index of the object.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle to a property owned by an archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropertyId(pub(crate) usize);

/// Scalar property data types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Bool,
    Int32,
    UInt32,
    Float64,
    String,
    Vec3d,
    Box3d,
    Matrix44d,
}

impl PropertyType {
    /// Short type name used in messages and tree listings.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::UInt32 => "uint32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Vec3d => "vec3d",
            Self::Box3d => "box3d",
            Self::Matrix44d => "matrix44d",
        }
    }
}

/// One scalar property sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Float64(f64),
    String(String),
    Vec3d([f64; 3]),
    Box3d(BBox3d),
    Matrix44d(DMat4),
}

impl PropertyValue {
    /// Data type of this value.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::UInt32(_) => PropertyType::UInt32,
            Self::Float64(_) => PropertyType::Float64,
            Self::String(_) => PropertyType::String,
            Self::Vec3d(_) => PropertyType::Vec3d,
            Self::Box3d(_) => PropertyType::Box3d,
            Self::Matrix44d(_) => PropertyType::Matrix44d,
        }
    }
}

/// Archive-level metadata written at creation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArchiveInfo {
    /// `"<host> <version> <exporter> v<exporter-version>"`
    pub application_writer: String,
    /// `"Exported from: <source file>"`, or empty.
    pub user_description: String,
}

impl ArchiveInfo {
    /// Build the writer tag and source note.
    ///
    /// The note is dropped when the source file name contains characters
    /// that are structural in serialized metadata.
    pub fn new(host: &str, host_version: &str, source_file: &str) -> Self {
        let application_writer = format!(
            "{} {} {} v{}",
            host,
            host_version,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );
        let mut user_description = format!("Exported from: {}", source_file);
        if has_reserved_chars(&user_description) {
            user_description.clear();
        }
        Self {
            application_writer,
            user_description,
        }
    }

    /// Metadata entries for the archive header.
    pub fn to_metadata(&self) -> MetaData {
        let mut md = MetaData::new();
        md.set(MetaData::APPLICATION_KEY, self.application_writer.as_str());
        if !self.user_description.is_empty() {
            md.set(MetaData::DESCRIPTION_KEY, self.user_description.as_str());
        }
        md
    }
}

/// Writer interface for an output archive.
pub trait ArchiveWriter {
    /// Create a new archive at `path`.
    fn create(path: &Path, info: &ArchiveInfo) -> Result<Self>
    where
        Self: Sized;

    /// Get the archive name/path.
    fn name(&self) -> &str;

    /// Register a time sampling and return its index (never 0 for non-identity).
    fn add_time_sampling(&mut self, ts: TimeSampling) -> u32;

    /// Get a time sampling by index.
    fn time_sampling(&self, index: u32) -> Option<&TimeSampling>;

    /// The root object.
    fn top(&self) -> ObjectId;

    /// Whether `obj` refers to a live object of this archive.
    fn is_valid(&self, obj: ObjectId) -> bool;

    /// Look up a direct child by name.
    fn child_by_name(&self, parent: ObjectId, name: &str) -> Option<ObjectId>;

    /// Create a child object; sibling names must be unique.
    fn create_child(&mut self, parent: ObjectId, name: &str, meta: MetaData) -> Result<ObjectId>;

    /// Create a scalar property on `owner` bound to time sampling `ts_index`.
    fn create_property(
        &mut self,
        owner: ObjectId,
        name: &str,
        ty: PropertyType,
        ts_index: u32,
    ) -> Result<PropertyId>;

    /// Append a sample.
    fn set_sample(&mut self, prop: PropertyId, value: PropertyValue) -> Result<()>;

    /// Persist everything written so far.
    fn flush(&mut self) -> Result<()>;
}
