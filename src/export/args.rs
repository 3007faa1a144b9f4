//! Export job arguments.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::core::{FrameRange, FrameSet, TimeSampling};
use crate::util::{DagPath, Error, Result};

/// Default frames per second.
pub const DEFAULT_FPS: f64 = 24.0;

/// Everything a single export job needs to know up front.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobArgs {
    /// Output archive path.
    pub file: PathBuf,
    /// Root nodes to export.
    pub dag_paths: Vec<DagPath>,
    /// Restrict export to the active selection and its ancestors.
    pub use_selection_list: bool,
    pub frame_range: FrameRange,
    pub fps: f64,
    /// Skip nodes that are not renderable, with their subtrees.
    pub exclude_invisible: bool,
    /// Namespace qualifiers stripped from every output name.
    pub strip_namespace: u32,
    pub mel_per_frame_callback: String,
    pub python_per_frame_callback: String,
    pub mel_post_callback: String,
    pub python_post_callback: String,
    /// Log every solved leaf sample.
    pub verbose: bool,
    /// User attributes exported by exact name.
    pub attributes: Vec<String>,
    /// User attributes exported by name prefix.
    pub attr_prefixes: Vec<String>,
}

impl Default for JobArgs {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            dag_paths: Vec::new(),
            use_selection_list: false,
            frame_range: FrameRange::default(),
            fps: DEFAULT_FPS,
            exclude_invisible: false,
            strip_namespace: 0,
            mel_per_frame_callback: String::new(),
            python_per_frame_callback: String::new(),
            mel_post_callback: String::new(),
            python_post_callback: String::new(),
            verbose: false,
            attributes: Vec::new(),
            attr_prefixes: Vec::new(),
        }
    }
}

impl JobArgs {
    /// Arguments writing to `file`.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Load arguments from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Reject arguments a job cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(Error::config("no output file given"));
        }
        self.frame_range.validate()?;
        if !(self.fps > 0.0) {
            return Err(Error::config(format!("frames per second {} must be positive", self.fps)));
        }
        let templates = [
            ("melPerFrameCallback", &self.mel_per_frame_callback),
            ("pythonPerFrameCallback", &self.python_per_frame_callback),
            ("melPostCallback", &self.mel_post_callback),
            ("pythonPostCallback", &self.python_post_callback),
        ];
        for (name, template) in templates {
            if template.contains('\0') {
                return Err(Error::config(format!("{} contains a NUL byte", name)));
            }
        }
        Ok(())
    }

    /// Frames the job samples.
    pub fn frames(&self) -> Result<FrameSet> {
        self.frame_range.frames()
    }

    /// Time sampling matching [`JobArgs::frames`].
    pub fn time_sampling(&self) -> Result<TimeSampling> {
        self.frame_range.time_sampling(self.fps)
    }

    /// Whether a user attribute is selected for export.
    pub fn exports_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
            || self.attr_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let args: JobArgs = serde_json::from_str(
            r#"{ "file": "out.json", "dag_paths": ["|grp"], "frame_range": { "start": 1, "end": 10 } }"#,
        )
        .unwrap();
        assert_eq!(args.fps, DEFAULT_FPS);
        assert_eq!(args.frame_range.step, 1.0);
        assert_eq!(args.dag_paths, vec![DagPath::parse("|grp")]);
        assert!(args.validate().is_ok());
        assert_eq!(args.frames().unwrap().len(), 10);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(matches!(JobArgs::default().validate(), Err(Error::Config(_))));

        let mut args = JobArgs::new("out.json");
        args.python_post_callback = "print(1)\0".into();
        assert!(args.validate().is_err());

        let mut args = JobArgs::new("out.json");
        args.fps = 0.0;
        assert!(args.validate().is_err());

        let mut args = JobArgs::new("out.json");
        args.frame_range = FrameRange::new(10.0, 1.0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_attribute_filter() {
        let mut args = JobArgs::new("out.json");
        args.attributes = vec!["mass".into()];
        args.attr_prefixes = vec!["bt_".into()];
        assert!(args.exports_attribute("mass"));
        assert!(args.exports_attribute("bt_friction"));
        assert!(!args.exports_attribute("massive"));
    }
}
