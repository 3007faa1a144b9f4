//! Host scene-graph interface.
//!
//! The exporter only reads the live scene: child enumeration, node kind
//! classification, matrix queries, solver results and user attributes.
//! [`SceneGraph`] is that read-only surface; [`MemoryScene`] implements it
//! over a JSON scene description.

mod desc;
mod memory;

pub use desc::{AttrKey, AttributeDesc, NodeDesc, SceneDesc, SolvedDesc, Trs, TrsKey};
pub use memory::MemoryScene;

use serde::{Deserialize, Serialize};

use crate::archive::{PropertyType, PropertyValue};
use crate::util::{DMat4, DagPath, Result};

/// Host type name of rigid-body solver output nodes.
pub const SOLVED_STATE_TYPE: &str = "bulletRigidCollection";

/// Host type name of transform nodes.
pub const TRANSFORM_TYPE: &str = "transform";

/// How the exporter treats a node, resolved once per node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A plain transform; exported and recursed into.
    Transform,
    /// A solver node reporting a flat list of world-space results.
    Collection,
    /// Anything else; skipped with a warning.
    Unsupported { type_name: String },
}

impl NodeKind {
    /// Classify a host type name.
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            TRANSFORM_TYPE => Self::Transform,
            SOLVED_STATE_TYPE => Self::Collection,
            other => Self::Unsupported {
                type_name: other.to_string(),
            },
        }
    }
}

/// One element of a solver's result list.
#[derive(Clone, Debug, PartialEq)]
pub struct SolvedElement {
    /// Live full path of the solved transform.
    pub path: DagPath,
    /// Current world-space matrix.
    pub world_matrix: DMat4,
}

/// A user attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
    Double3([f64; 3]),
}

impl AttrValue {
    /// Archive type this value is stored as.
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Bool(_) => PropertyType::Bool,
            Self::Int(_) => PropertyType::Int32,
            Self::Double(_) => PropertyType::Float64,
            Self::String(_) => PropertyType::String,
            Self::Double3(_) => PropertyType::Vec3d,
        }
    }

    /// Convert to an archive sample.
    pub fn to_property_value(&self) -> PropertyValue {
        match self {
            Self::Bool(v) => PropertyValue::Bool(*v),
            Self::Int(v) => PropertyValue::Int32(*v),
            Self::Double(v) => PropertyValue::Float64(*v),
            Self::String(v) => PropertyValue::String(v.clone()),
            Self::Double3(v) => PropertyValue::Vec3d(*v),
        }
    }
}

/// A user-defined attribute on a node.
#[derive(Clone, Debug, PartialEq)]
pub struct UserAttribute {
    pub name: String,
    pub value: AttrValue,
    pub animated: bool,
}

/// Read-only view of the live host scene.
pub trait SceneGraph {
    /// Host application name, e.g. `Maya`.
    fn host_name(&self) -> &str;

    /// Host application version.
    fn host_version(&self) -> &str;

    /// Scene file currently open in the host.
    fn current_file(&self) -> &str;

    /// Whether `path` resolves to a node.
    fn exists(&self, path: &DagPath) -> bool;

    /// Direct children of `path`; the world root lists top-level nodes.
    fn children(&self, path: &DagPath) -> Vec<DagPath>;

    /// Classify a node. Fails when the host cannot resolve it.
    fn node_kind(&self, path: &DagPath) -> Result<NodeKind>;

    /// Construction-history-only node.
    fn is_intermediate(&self, path: &DagPath) -> bool;

    /// Visible to renders.
    fn is_renderable(&self, path: &DagPath) -> bool;

    /// The node's local transform changes over time.
    fn is_animated(&self, path: &DagPath) -> bool;

    /// Local matrix at the current time.
    fn local_matrix(&self, path: &DagPath) -> Result<DMat4>;

    /// World matrix at the current time (parent world times local).
    fn world_matrix(&self, path: &DagPath) -> Result<DMat4> {
        let mut m = DMat4::IDENTITY;
        for len in 1..=path.len() {
            m = m * self.local_matrix(&path.prefix(len))?;
        }
        Ok(m)
    }

    /// Pull the current solver results of a collection node.
    fn solved_elements(&self, path: &DagPath) -> Result<Vec<SolvedElement>>;

    /// User attributes declared on a node.
    fn user_attributes(&self, path: &DagPath) -> Vec<UserAttribute>;

    /// Current value of one attribute.
    fn attribute(&self, path: &DagPath, name: &str) -> Option<AttrValue>;

    /// Interactive selection, in selection order.
    fn active_selection(&self) -> Vec<DagPath>;
}
