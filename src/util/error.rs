//! Error types for export jobs.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Job arguments rejected before the job runs
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Two requested roots map onto the same archive path
    #[error("{}", duplicate_root_message(.path_a, .path_b, .stripped))]
    DuplicateRoot {
        path_a: String,
        path_b: String,
        /// The paths only collide once namespaces are stripped.
        stripped: bool,
    },

    /// Archive file could not be created
    #[error("Unable to create archive {path}: {reason}")]
    ArchiveCreation { path: PathBuf, reason: String },

    /// An ancestor object could not be materialized
    #[error("Unable to create hierarchy at component '{component}'")]
    HierarchyCreation { component: String },

    /// Object handle does not refer to a live object
    #[error("Invalid object handle: {0}")]
    InvalidObject(usize),

    /// Property handle does not refer to a live property
    #[error("Invalid property handle: {0}")]
    InvalidProperty(usize),

    /// A sibling with the same name already exists
    #[error("Object '{name}' already exists under '{parent}'")]
    DuplicateChild { parent: String, name: String },

    /// A property with the same name already exists on the object
    #[error("Property '{name}' already exists on '{object}'")]
    DuplicateProperty { object: String, name: String },

    /// Time sampling index was never registered
    #[error("Unknown time sampling index: {0}")]
    InvalidTimeSampling(u32),

    /// Sample value does not match the property type
    #[error("Type mismatch on property '{property}': expected {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Host could not resolve or initialize a node
    #[error("Node not accessible: {0}")]
    NodeAccess(String),

    /// `eval` called out of order
    #[error("Invalid job state: {0}")]
    InvalidState(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn duplicate_root_message(a: &str, b: &str, stripped: &bool) -> String {
    if *stripped {
        format!(
            "Conflicting root node names specified: {} {} with namespace stripping enabled",
            a, b
        )
    } else {
        format!("Conflicting root node names specified: {} {}", a, b)
    }
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a node access error.
    pub fn node(msg: impl Into<String>) -> Self {
        Self::NodeAccess(msg.into())
    }
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_root_display() {
        let e = Error::DuplicateRoot {
            path_a: "|a|obj".into(),
            path_b: "|b|obj".into(),
            stripped: false,
        };
        let msg = e.to_string();
        assert!(msg.contains("|a|obj"));
        assert!(msg.contains("|b|obj"));
        assert!(!msg.contains("namespace"));

        let e = Error::DuplicateRoot {
            path_a: "|ns1:obj".into(),
            path_b: "|ns2:obj".into(),
            stripped: true,
        };
        assert!(e.to_string().contains("namespace stripping"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
