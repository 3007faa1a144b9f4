//! Hierarchical DAG paths and namespace stripping.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between DAG path components.
pub const PATH_SEPARATOR: char = '|';

/// Separator between namespace qualifiers inside a component.
pub const NAMESPACE_SEPARATOR: char = ':';

/// A full DAG path, stored as components ordered root to leaf.
///
/// The textual form is `|grp|ns:child|leaf`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DagPath {
    components: Vec<String>,
}

impl DagPath {
    /// The world root (no components).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `|a|b|c`; a missing leading separator is accepted.
    pub fn parse(path: &str) -> Self {
        Self {
            components: path
                .split(PATH_SEPARATOR)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Path components, root first.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True for the world root.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Last component, empty for the world root.
    pub fn leaf_name(&self) -> &str {
        self.components.last().map(String::as_str).unwrap_or("")
    }

    /// The parent path, `None` for top-level nodes and the world root.
    pub fn parent(&self) -> Option<DagPath> {
        if self.components.len() < 2 {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Path to the child named `name`.
    pub fn child(&self, name: &str) -> DagPath {
        let mut components = self.components.clone();
        components.push(name.to_string());
        Self { components }
    }

    /// The first `len` components.
    pub fn prefix(&self, len: usize) -> DagPath {
        Self {
            components: self.components[..len.min(self.components.len())].to_vec(),
        }
    }

    /// `|a|b|c`
    pub fn full_path_name(&self) -> String {
        let mut s = String::new();
        for c in &self.components {
            s.push(PATH_SEPARATOR);
            s.push_str(c);
        }
        s
    }

    /// True if `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &DagPath) -> bool {
        self.components.starts_with(&other.components)
    }
}

impl fmt::Display for DagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path_name())
    }
}

impl From<String> for DagPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&str> for DagPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<DagPath> for String {
    fn from(p: DagPath) -> Self {
        p.full_path_name()
    }
}

/// Strip up to `depth` leading namespace qualifiers from a single component.
///
/// The node name itself is never removed: `a:b:node` at depth 5 is `node`.
pub fn strip_namespaces(name: &str, depth: u32) -> &str {
    let mut rest = name;
    for _ in 0..depth {
        match rest.find(NAMESPACE_SEPARATOR) {
            Some(pos) => rest = &rest[pos + 1..],
            None => break,
        }
    }
    rest
}

/// Strip namespaces from every component of a `|`-separated path string.
pub fn strip_path_namespaces(path: &str, depth: u32) -> String {
    if depth == 0 {
        return path.to_string();
    }
    path.split(PATH_SEPARATOR)
        .map(|c| strip_namespaces(c, depth))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let p = DagPath::parse("|grp|ns:child|leaf");
        assert_eq!(p.len(), 3);
        assert_eq!(p.leaf_name(), "leaf");
        assert_eq!(p.to_string(), "|grp|ns:child|leaf");
        assert_eq!(p.parent().unwrap().to_string(), "|grp|ns:child");
        assert_eq!(DagPath::parse("grp").to_string(), "|grp");
        assert!(DagPath::parse("|grp").parent().is_none());
    }

    #[test]
    fn test_prefix_and_child() {
        let p = DagPath::parse("|a|b|c");
        assert_eq!(p.prefix(2), DagPath::parse("|a|b"));
        assert_eq!(p.prefix(2).child("c"), p);
        assert!(p.starts_with(&DagPath::parse("|a")));
        assert!(!p.starts_with(&DagPath::parse("|b")));
    }

    #[test]
    fn test_strip_namespaces() {
        assert_eq!(strip_namespaces("ns:node", 0), "ns:node");
        assert_eq!(strip_namespaces("ns:node", 1), "node");
        assert_eq!(strip_namespaces("a:b:node", 1), "b:node");
        assert_eq!(strip_namespaces("a:b:node", 5), "node");
        assert_eq!(strip_namespaces("node", 2), "node");
    }

    #[test]
    fn test_strip_path_namespaces() {
        assert_eq!(strip_path_namespaces("a:grp|a:obj", 1), "grp|obj");
        assert_eq!(strip_path_namespaces("a:grp|a:obj", 0), "a:grp|a:obj");
    }
}
