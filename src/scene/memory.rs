//! In-memory scene graph built from a [`SceneDesc`].

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::desc::{evaluate_keys, AttrKey, AttributeDesc, NodeDesc, SceneDesc, SolvedDesc};
use super::{AttrValue, NodeKind, SceneGraph, SolvedElement, UserAttribute};
use crate::util::{DMat4, DagPath, Error, Result};

#[derive(Debug)]
struct SceneNode {
    path: DagPath,
    kind: NodeKind,
    intermediate: bool,
    visible: bool,
    desc_transform: super::Trs,
    keys: Vec<super::TrsKey>,
    attributes: Vec<AttributeDesc>,
    solved: Vec<SolvedDesc>,
    children: Vec<usize>,
}

/// A scene graph held in memory, evaluated at a settable frame.
#[derive(Debug)]
pub struct MemoryScene {
    host: String,
    host_version: String,
    file: String,
    selection: Vec<DagPath>,
    nodes: Vec<SceneNode>,
    top_level: Vec<usize>,
    index: HashMap<DagPath, usize>,
    frame: f64,
}

impl MemoryScene {
    /// Build a scene; sibling names must be unique.
    pub fn from_desc(desc: SceneDesc) -> Result<Self> {
        let mut scene = Self {
            host: desc.host,
            host_version: desc.host_version,
            file: desc.file,
            selection: desc.selection,
            nodes: Vec::new(),
            top_level: Vec::new(),
            index: HashMap::new(),
            frame: 0.0,
        };
        for node in desc.nodes {
            let id = scene.insert(&DagPath::root(), node)?;
            scene.top_level.push(id);
        }
        Ok(scene)
    }

    /// Parse a JSON scene description.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_desc(serde_json::from_str(json)?)
    }

    /// Load a JSON scene description from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let desc: SceneDesc = serde_json::from_reader(BufReader::new(file))?;
        Self::from_desc(desc)
    }

    fn insert(&mut self, parent: &DagPath, node: NodeDesc) -> Result<usize> {
        if node.name.is_empty() || node.name.contains(crate::util::PATH_SEPARATOR) {
            return Err(Error::config(format!("invalid node name '{}'", node.name)));
        }
        let path = parent.child(&node.name);
        if self.index.contains_key(&path) {
            return Err(Error::config(format!("duplicate node {}", path)));
        }

        let mut keys = node.keys;
        keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        let mut solved = node.solved;
        for s in &mut solved {
            s.keys.sort_by(|a, b| a.frame.total_cmp(&b.frame));
        }

        let id = self.nodes.len();
        self.nodes.push(SceneNode {
            path: path.clone(),
            kind: NodeKind::from_type_name(&node.node_type),
            intermediate: node.intermediate,
            visible: node.visible,
            desc_transform: node.transform,
            keys,
            attributes: node.attributes,
            solved,
            children: Vec::new(),
        });
        self.index.insert(path.clone(), id);

        for child in node.children {
            let child_id = self.insert(&path, child)?;
            self.nodes[id].children.push(child_id);
        }
        Ok(id)
    }

    fn node(&self, path: &DagPath) -> Option<&SceneNode> {
        self.index.get(path).map(|&i| &self.nodes[i])
    }

    fn require(&self, path: &DagPath) -> Result<&SceneNode> {
        self.node(path)
            .ok_or_else(|| Error::node(format!("no node at {}", path)))
    }

    /// Move scene time.
    pub fn set_frame(&mut self, frame: f64) {
        self.frame = frame;
    }

    /// Current scene time.
    pub fn frame(&self) -> f64 {
        self.frame
    }

    /// Replace the interactive selection.
    pub fn set_selection(&mut self, selection: Vec<DagPath>) {
        self.selection = selection;
    }

    /// Solver results of a collection node, for editing between frames.
    pub fn solved_mut(&mut self, path: &DagPath) -> Option<&mut Vec<SolvedDesc>> {
        let id = *self.index.get(path)?;
        Some(&mut self.nodes[id].solved)
    }

    fn solved_world(&self, s: &SolvedDesc) -> DMat4 {
        if s.keys.is_empty() {
            s.world.matrix()
        } else {
            evaluate_keys(&s.keys, self.frame).matrix()
        }
    }

    fn attribute_value(&self, attr: &AttributeDesc) -> AttrValue {
        if attr.keys.is_empty() {
            return attr.value.clone();
        }
        let v = evaluate_scalar(&attr.keys, self.frame);
        match attr.value {
            AttrValue::Int(_) => AttrValue::Int(v.round() as i32),
            AttrValue::Bool(_) => AttrValue::Bool(v != 0.0),
            AttrValue::Double(_) => AttrValue::Double(v),
            ref other => other.clone(),
        }
    }
}

fn evaluate_scalar(keys: &[AttrKey], frame: f64) -> f64 {
    let mut sorted = keys.to_vec();
    sorted.sort_by(|a, b| a.frame.total_cmp(&b.frame));
    let first = sorted[0];
    if frame <= first.frame {
        return first.value;
    }
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if frame <= b.frame {
            let span = b.frame - a.frame;
            let t = if span > 0.0 { (frame - a.frame) / span } else { 1.0 };
            return a.value + (b.value - a.value) * t;
        }
    }
    sorted[sorted.len() - 1].value
}

impl SceneGraph for MemoryScene {
    fn host_name(&self) -> &str {
        &self.host
    }

    fn host_version(&self) -> &str {
        &self.host_version
    }

    fn current_file(&self) -> &str {
        &self.file
    }

    fn exists(&self, path: &DagPath) -> bool {
        self.index.contains_key(path)
    }

    fn children(&self, path: &DagPath) -> Vec<DagPath> {
        let ids = if path.is_empty() {
            &self.top_level
        } else {
            match self.node(path) {
                Some(n) => &n.children,
                None => return Vec::new(),
            }
        };
        ids.iter().map(|&i| self.nodes[i].path.clone()).collect()
    }

    fn node_kind(&self, path: &DagPath) -> Result<NodeKind> {
        Ok(self.require(path)?.kind.clone())
    }

    fn is_intermediate(&self, path: &DagPath) -> bool {
        self.node(path).map(|n| n.intermediate).unwrap_or(false)
    }

    fn is_renderable(&self, path: &DagPath) -> bool {
        self.node(path).map(|n| n.visible).unwrap_or(false)
    }

    fn is_animated(&self, path: &DagPath) -> bool {
        self.node(path).map(|n| n.keys.len() > 1).unwrap_or(false)
    }

    fn local_matrix(&self, path: &DagPath) -> Result<DMat4> {
        let node = self.require(path)?;
        Ok(if node.keys.is_empty() {
            node.desc_transform.matrix()
        } else {
            evaluate_keys(&node.keys, self.frame).matrix()
        })
    }

    fn solved_elements(&self, path: &DagPath) -> Result<Vec<SolvedElement>> {
        let node = self.require(path)?;
        if node.kind != NodeKind::Collection {
            return Err(Error::node(format!("{} is not a solver node", path)));
        }
        Ok(node
            .solved
            .iter()
            .filter(|s| s.until.map_or(true, |until| self.frame <= until))
            .map(|s| SolvedElement {
                path: s.path.clone(),
                world_matrix: self.solved_world(s),
            })
            .collect())
    }

    fn user_attributes(&self, path: &DagPath) -> Vec<UserAttribute> {
        let Some(node) = self.node(path) else {
            return Vec::new();
        };
        node.attributes
            .iter()
            .map(|a| UserAttribute {
                name: a.name.clone(),
                value: self.attribute_value(a),
                animated: a.keys.len() > 1,
            })
            .collect()
    }

    fn attribute(&self, path: &DagPath, name: &str) -> Option<AttrValue> {
        let node = self.node(path)?;
        node.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| self.attribute_value(a))
    }

    fn active_selection(&self) -> Vec<DagPath> {
        self.selection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::TrsKey;
    use crate::util::translation_of;

    fn scene() -> MemoryScene {
        let desc = SceneDesc {
            nodes: vec![
                NodeDesc::transform("grp").with_translate([0.0, 1.0, 0.0]).with_children(vec![
                    NodeDesc::transform("ball").with_keys(vec![
                        TrsKey::translate(1.0, [0.0, 0.0, 0.0]),
                        TrsKey::translate(5.0, [4.0, 0.0, 0.0]),
                    ]),
                    NodeDesc::transform("mesh").with_type("mesh"),
                ]),
                NodeDesc::collection(
                    "solver",
                    vec![SolvedDesc::new("|grp|ball", vec![TrsKey::translate(1.0, [0.0, 2.0, 0.0])])],
                )
                .with_attribute("mass", AttrValue::Double(1.0), vec![
                    AttrKey { frame: 1.0, value: 1.0 },
                    AttrKey { frame: 3.0, value: 3.0 },
                ]),
            ],
            ..SceneDesc::default()
        };
        MemoryScene::from_desc(desc).unwrap()
    }

    #[test]
    fn test_children_and_kinds() {
        let s = scene();
        let top = s.children(&DagPath::root());
        assert_eq!(top, vec![DagPath::parse("|grp"), DagPath::parse("|solver")]);
        assert_eq!(s.children(&DagPath::parse("|grp")).len(), 2);
        assert_eq!(s.node_kind(&DagPath::parse("|solver")).unwrap(), NodeKind::Collection);
        assert!(matches!(
            s.node_kind(&DagPath::parse("|grp|mesh")).unwrap(),
            NodeKind::Unsupported { .. }
        ));
        assert!(matches!(s.node_kind(&DagPath::parse("|nope")), Err(Error::NodeAccess(_))));
    }

    #[test]
    fn test_matrices_follow_frame() {
        let mut s = scene();
        let ball = DagPath::parse("|grp|ball");
        assert!(s.is_animated(&ball));
        assert!(!s.is_animated(&DagPath::parse("|grp")));

        s.set_frame(3.0);
        let world = s.world_matrix(&ball).unwrap();
        let t = translation_of(&world);
        assert_eq!((t.x, t.y, t.z), (2.0, 1.0, 0.0));
    }

    #[test]
    fn test_attribute_keys() {
        let mut s = scene();
        let solver = DagPath::parse("|solver");
        s.set_frame(2.0);
        assert_eq!(s.attribute(&solver, "mass"), Some(AttrValue::Double(2.0)));
        assert!(s.user_attributes(&solver)[0].animated);
    }

    #[test]
    fn test_solved_until() {
        let mut s = scene();
        let solver = DagPath::parse("|solver");
        s.solved_mut(&solver).unwrap()[0].until = Some(2.0);
        s.set_frame(2.0);
        assert_eq!(s.solved_elements(&solver).unwrap().len(), 1);
        s.set_frame(3.0);
        assert!(s.solved_elements(&solver).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_siblings_rejected() {
        let desc = SceneDesc {
            nodes: vec![NodeDesc::transform("a"), NodeDesc::transform("a")],
            ..SceneDesc::default()
        };
        assert!(matches!(MemoryScene::from_desc(desc), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_json() {
        let s = MemoryScene::from_json(
            r#"{ "file": "shot.ma", "nodes": [ { "name": "a", "children": [ { "name": "b", "visible": false } ] } ] }"#,
        )
        .unwrap();
        assert_eq!(s.current_file(), "shot.ma");
        assert_eq!(s.host_name(), "Maya");
        assert!(!s.is_renderable(&DagPath::parse("|a|b")));
        assert!(s.exists(&DagPath::parse("|a|b")));
    }
}
