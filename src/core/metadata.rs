//! Key-value metadata attached to archives and objects.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Metadata storage - ordered key-value pairs of strings.
///
/// Uses SmallVec optimization for the common case of few entries.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct MetaData {
    entries: SmallVec<[(String, String); 4]>,
}

impl MetaData {
    /// Application writer key.
    pub const APPLICATION_KEY: &'static str = "_ai_Application";

    /// User description key.
    pub const DESCRIPTION_KEY: &'static str = "_ai_Description";

    /// Schema title key.
    pub const SCHEMA_KEY: &'static str = "schema";

    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata value, replacing an existing one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize to `key=value;key2=value2`.
    ///
    /// `=` and `;` are structural; values containing them are escaped.
    pub fn serialize(&self) -> String {
        let mut result = String::new();
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                result.push(';');
            }
            result.push_str(&escape_metadata_string(k));
            result.push('=');
            result.push_str(&escape_metadata_string(v));
        }
        result
    }

    /// Schema title, if any.
    pub fn schema(&self) -> Option<&str> {
        self.get(Self::SCHEMA_KEY)
    }
}

/// True if `s` contains a character that is structural in serialized metadata.
pub fn has_reserved_chars(s: &str) -> bool {
    s.contains('=') || s.contains(';')
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl From<Vec<(String, String)>> for MetaData {
    fn from(entries: Vec<(String, String)>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<MetaData> for Vec<(String, String)> {
    fn from(md: MetaData) -> Self {
        md.entries.into_vec()
    }
}

impl FromIterator<(String, String)> for MetaData {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut meta = Self::new();
        for (k, v) in iter {
            meta.set(k, v);
        }
        meta
    }
}

fn escape_metadata_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            '=' => result.push_str("\\="),
            _ => result.push(c),
        }
    }
    result
}
