//! JSON scene description consumed by [`super::MemoryScene`].
//!
//! ```json
//! {
//!   "file": "/shots/drop.ma",
//!   "nodes": [
//!     { "name": "grp", "translate": [0, 1, 0], "children": [
//!       { "name": "ball", "keys": [
//!         { "frame": 1, "translate": [0, 0, 0] },
//!         { "frame": 10, "translate": [0, 5, 0] } ] } ] },
//!     { "name": "solver", "type": "bulletRigidCollection", "solved": [
//!       { "path": "|grp|ball", "keys": [ { "frame": 1, "translate": [0, 2, 0] } ] } ] }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::{AttrValue, TRANSFORM_TYPE};
use crate::util::{compose_trs, DMat4, DagPath};

/// Whole scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    pub host: String,
    pub host_version: String,
    /// Scene file the host reports as open.
    pub file: String,
    /// Interactive selection.
    pub selection: Vec<DagPath>,
    /// Top-level nodes.
    pub nodes: Vec<NodeDesc>,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            host: "Maya".to_string(),
            host_version: "2016".to_string(),
            file: String::new(),
            selection: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

/// Translate, rotate (degrees, XYZ) and scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Trs {
    pub translate: [f64; 3],
    pub rotate: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for Trs {
    fn default() -> Self {
        Self {
            translate: [0.0; 3],
            rotate: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Trs {
    /// Pure translation.
    pub fn translation(t: [f64; 3]) -> Self {
        Self {
            translate: t,
            ..Self::default()
        }
    }

    /// Compose into a matrix.
    pub fn matrix(&self) -> DMat4 {
        compose_trs(self.translate, self.rotate, self.scale)
    }

    fn lerp(&self, other: &Self, t: f64) -> Self {
        let mix = |a: [f64; 3], b: [f64; 3]| {
            [
                a[0] + (b[0] - a[0]) * t,
                a[1] + (b[1] - a[1]) * t,
                a[2] + (b[2] - a[2]) * t,
            ]
        };
        Self {
            translate: mix(self.translate, other.translate),
            rotate: mix(self.rotate, other.rotate),
            scale: mix(self.scale, other.scale),
        }
    }
}

/// A transform key.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrsKey {
    pub frame: f64,
    #[serde(flatten)]
    pub trs: Trs,
}

impl TrsKey {
    /// Key holding only a translation.
    pub fn translate(frame: f64, t: [f64; 3]) -> Self {
        Self {
            frame,
            trs: Trs::translation(t),
        }
    }
}

/// Evaluate keys at `frame`: linear between keys, held outside them.
///
/// `keys` must be sorted by frame and non-empty.
pub(crate) fn evaluate_keys(keys: &[TrsKey], frame: f64) -> Trs {
    let first = &keys[0];
    if frame <= first.frame {
        return first.trs;
    }
    for pair in keys.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if frame <= b.frame {
            let span = b.frame - a.frame;
            let t = if span > 0.0 { (frame - a.frame) / span } else { 1.0 };
            return a.trs.lerp(&b.trs, t);
        }
    }
    keys[keys.len() - 1].trs
}

/// A key on a numeric attribute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttrKey {
    pub frame: f64,
    pub value: f64,
}

/// A user attribute; numeric attributes may carry keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeDesc {
    pub name: String,
    pub value: AttrValue,
    #[serde(default)]
    pub keys: Vec<AttrKey>,
}

/// One element of a solver's result list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolvedDesc {
    /// Full path of the solved transform in the scene.
    pub path: DagPath,
    /// World transform when no keys are given.
    #[serde(flatten, default)]
    pub world: Trs,
    /// Keyed world transform.
    #[serde(default)]
    pub keys: Vec<TrsKey>,
    /// Last frame at which the solver still reports this element.
    #[serde(default)]
    pub until: Option<f64>,
}

impl SolvedDesc {
    /// Element with keyed world translations.
    pub fn new(path: &str, keys: Vec<TrsKey>) -> Self {
        Self {
            path: DagPath::parse(path),
            world: Trs::default(),
            keys,
            until: None,
        }
    }
}

/// One scene node and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDesc {
    pub name: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub intermediate: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(flatten, default)]
    pub transform: Trs,
    #[serde(default)]
    pub keys: Vec<TrsKey>,
    #[serde(default)]
    pub attributes: Vec<AttributeDesc>,
    #[serde(default)]
    pub solved: Vec<SolvedDesc>,
    #[serde(default)]
    pub children: Vec<NodeDesc>,
}

fn default_node_type() -> String {
    TRANSFORM_TYPE.to_string()
}

fn default_true() -> bool {
    true
}

impl NodeDesc {
    /// A static transform at the origin.
    pub fn transform(name: &str) -> Self {
        Self {
            name: name.to_string(),
            node_type: default_node_type(),
            intermediate: false,
            visible: true,
            transform: Trs::default(),
            keys: Vec::new(),
            attributes: Vec::new(),
            solved: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A solver node reporting `solved`.
    pub fn collection(name: &str, solved: Vec<SolvedDesc>) -> Self {
        Self {
            node_type: super::SOLVED_STATE_TYPE.to_string(),
            solved,
            ..Self::transform(name)
        }
    }

    /// Override the host type name.
    pub fn with_type(mut self, node_type: &str) -> Self {
        self.node_type = node_type.to_string();
        self
    }

    /// Static translation.
    pub fn with_translate(mut self, t: [f64; 3]) -> Self {
        self.transform.translate = t;
        self
    }

    /// Transform keys.
    pub fn with_keys(mut self, keys: Vec<TrsKey>) -> Self {
        self.keys = keys;
        self
    }

    /// Child nodes.
    pub fn with_children(mut self, children: Vec<NodeDesc>) -> Self {
        self.children = children;
        self
    }

    /// Add a user attribute.
    pub fn with_attribute(mut self, name: &str, value: AttrValue, keys: Vec<AttrKey>) -> Self {
        self.attributes.push(AttributeDesc {
            name: name.to_string(),
            value,
            keys,
        });
        self
    }

    /// Mark as intermediate.
    pub fn intermediate(mut self) -> Self {
        self.intermediate = true;
        self
    }

    /// Mark as not renderable.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_keys() {
        let keys = vec![
            TrsKey::translate(1.0, [0.0, 0.0, 0.0]),
            TrsKey::translate(3.0, [2.0, 4.0, 0.0]),
        ];
        assert_eq!(evaluate_keys(&keys, 0.0).translate, [0.0, 0.0, 0.0]);
        assert_eq!(evaluate_keys(&keys, 2.0).translate, [1.0, 2.0, 0.0]);
        assert_eq!(evaluate_keys(&keys, 9.0).translate, [2.0, 4.0, 0.0]);
    }

    #[test]
    fn test_node_json_defaults() {
        let node: NodeDesc = serde_json::from_str(r#"{ "name": "grp", "translate": [1, 2, 3] }"#).unwrap();
        assert_eq!(node.node_type, "transform");
        assert!(node.visible);
        assert!(!node.intermediate);
        assert_eq!(node.transform.translate, [1.0, 2.0, 3.0]);
        assert_eq!(node.transform.scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_solved_json() {
        let solved: SolvedDesc = serde_json::from_str(
            r#"{ "path": "|grp|ball", "until": 4, "keys": [ { "frame": 1, "translate": [0, 1, 0] } ] }"#,
        )
        .unwrap();
        assert_eq!(solved.path.to_string(), "|grp|ball");
        assert_eq!(solved.until, Some(4.0));
        assert_eq!(solved.keys[0].trs.translate, [0.0, 1.0, 0.0]);
    }
}
