//! User callback templates.
//!
//! A template is a script snippet with optional `#FRAME#`, `#BOUNDS#` and
//! `#BOUNDSARRAY#` markers. Only the first occurrence of each marker is
//! replaced, in that order.

use crate::util::{format_general, BBox3d, F32_DIGITS, F64_DIGITS};

const FRAME_TOKEN: &str = "#FRAME#";
const BOUNDS_TOKEN: &str = "#BOUNDS#";
const BOUNDS_ARRAY_TOKEN: &str = "#BOUNDSARRAY#";

/// Scripting language a callback is written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptDialect {
    Mel,
    Python,
}

impl ScriptDialect {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mel => "mel",
            Self::Python => "python",
        }
    }
}

/// Host-side script execution.
///
/// Fire-and-forget: implementations report their own failures.
pub trait ScriptEvaluator {
    fn execute(&mut self, dialect: ScriptDialect, command: &str);
}

/// Collects commands instead of running them.
#[derive(Clone, Debug, Default)]
pub struct RecordingEvaluator {
    pub commands: Vec<(ScriptDialect, String)>,
}

impl RecordingEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands issued in one dialect.
    pub fn commands_for(&self, dialect: ScriptDialect) -> Vec<&str> {
        self.commands
            .iter()
            .filter(|(d, _)| *d == dialect)
            .map(|(_, c)| c.as_str())
            .collect()
    }
}

impl ScriptEvaluator for RecordingEvaluator {
    fn execute(&mut self, dialect: ScriptDialect, command: &str) {
        self.commands.push((dialect, command.to_string()));
    }
}

/// Substitute frame and bounds markers in `template`.
pub fn expand_tokens(template: &str, dialect: ScriptDialect, frame: f64, bbox: &BBox3d) -> String {
    let mut command = template.to_string();
    let extents = bbox.extents();

    if command.contains(FRAME_TOKEN) {
        command = command.replacen(FRAME_TOKEN, &format_general(frame, F64_DIGITS), 1);
    }

    if command.contains(BOUNDS_TOKEN) {
        let mut bounds = String::new();
        for v in extents {
            bounds.push(' ');
            bounds.push_str(&format_general(v, F32_DIGITS));
        }
        command = command.replacen(BOUNDS_TOKEN, &bounds, 1);
    }

    if command.contains(BOUNDS_ARRAY_TOKEN) {
        let values: Vec<String> = extents.iter().map(|v| format_general(*v, F32_DIGITS)).collect();
        let array = match dialect {
            ScriptDialect::Mel => format!(" {{{}}} ", values.join(",")),
            ScriptDialect::Python => format!(" [{}] ", values.join(",")),
        };
        command = command.replacen(BOUNDS_ARRAY_TOKEN, &array, 1);
    }

    command
}

/// Expand `template` and hand it to `evaluator`. Empty templates do nothing.
pub fn dispatch(
    template: &str,
    dialect: ScriptDialect,
    frame: f64,
    bbox: &BBox3d,
    evaluator: &mut dyn ScriptEvaluator,
) {
    if template.is_empty() {
        return;
    }
    let command = expand_tokens(template, dialect, frame, bbox);
    tracing::debug!("{} callback at frame {}: {}", dialect.name(), frame, command);
    evaluator.execute(dialect, &command);
}
