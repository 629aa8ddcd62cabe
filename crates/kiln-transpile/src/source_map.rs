//! Mapping Python tracebacks from generated code back to source positions.
//!
//! Generated text carries `# kiln-src: <path>:<line>` markers. A traceback
//! frame at generated line `N` belongs to the nearest marker at or above `N`;
//! a `# kiln-src: -` marker (or none at all) means the line has no source.

use crate::output::{MARKER_PREFIX, UNMAPPED_MARKER};
use crate::preprocess::SourcePos;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Path reported for frames in generated-only code.
pub const GENERATED_PATH: &str = "<generated>";

const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

fn frame_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*File "(.+)", line (\d+)(?:, in (.+))?$"#).expect("valid frame pattern")
    })
}

fn overload_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"__ov\d+$").expect("valid overload suffix pattern"))
}

/// One frame of a failure, innermost first in a [`Report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub path: String,
    pub line: usize,
    /// Source-level member name; constructors are `<init>`.
    pub function: String,
}

/// A translated failure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub frames: Vec<Frame>,
    /// Final line of the traceback: exception type and message.
    pub cause: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            writeln!(f, "at {}:{} (in {})", frame.path, frame.line, frame.function)?;
        }
        write!(f, "cause: {}", self.cause)
    }
}

/// Position of every generated line, indexed by 1-based line number.
struct MarkerTable {
    positions: Vec<Option<SourcePos>>,
}

impl MarkerTable {
    fn new(generated: &str) -> Self {
        let mut current: Option<SourcePos> = None;
        let mut positions = vec![None];
        for line in generated.lines() {
            if let Some(payload) = line.trim_start().strip_prefix(MARKER_PREFIX) {
                current = parse_marker(payload.trim());
            }
            positions.push(current.clone());
        }
        Self { positions }
    }

    fn lookup(&self, line: usize) -> Option<&SourcePos> {
        self.positions.get(line).and_then(Option::as_ref)
    }
}

fn parse_marker(payload: &str) -> Option<SourcePos> {
    if payload == UNMAPPED_MARKER {
        return None;
    }
    let (path, line) = payload.rsplit_once(':')?;
    Some(SourcePos {
        path: path.to_string(),
        line: line.parse().ok()?,
    })
}

/// Source-level name of a generated function.
fn demangle(function: &str) -> String {
    let base = overload_suffix().replace(function, "");
    match base.as_ref() {
        "__init__" | "_init" => "<init>".to_string(),
        "__str__" => "toString".to_string(),
        other => other.to_string(),
    }
}

fn is_script(file: &str, script_name: &str) -> bool {
    std::path::Path::new(file)
        .file_name()
        .is_some_and(|name| name == script_name)
}

/// Split interpreter stderr into the program's own output and the failure text.
pub fn split_stderr(stderr: &str) -> (&str, Option<&str>) {
    let mut offset = 0;
    for line in stderr.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == TRACEBACK_HEADER || (line.starts_with("  File \"") && frame_line().is_match(trimmed)) {
            return (&stderr[..offset], Some(&stderr[offset..]));
        }
        offset += line.len();
    }
    (stderr, None)
}

/// Translate a Python traceback raised by `generated` (run as a file named
/// `script_name`) into a source-level report.
///
/// Frames outside the script, module-level frames and runtime helper frames
/// are dropped. When chained tracebacks are present the last one is used.
pub fn map_traceback(generated: &str, script_name: &str, traceback: &str) -> Option<Report> {
    let last = traceback
        .rfind(TRACEBACK_HEADER)
        .map_or(traceback, |idx| &traceback[idx + TRACEBACK_HEADER.len()..]);
    let cause = last
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty() && !l.starts_with(char::is_whitespace))?
        .trim()
        .to_string();

    let table = MarkerTable::new(generated);
    let mut mapped = Vec::new();
    let mut unmapped = Vec::new();
    for line in last.lines() {
        let Some(caps) = frame_line().captures(line.trim_end()) else {
            continue;
        };
        if !is_script(&caps[1], script_name) {
            continue;
        }
        let Ok(number) = caps[2].parse::<usize>() else {
            continue;
        };
        let function = caps.get(3).map_or("<module>", |m| m.as_str());
        if function.starts_with("_kiln_") {
            continue;
        }
        match table.lookup(number) {
            Some(pos) => mapped.push(Frame {
                path: pos.path.clone(),
                line: pos.line,
                function: demangle(function),
            }),
            None if function == "<module>" => {}
            None => unmapped.push(Frame {
                path: GENERATED_PATH.to_string(),
                line: number,
                function: demangle(function),
            }),
        }
    }
    let mut frames = if mapped.is_empty() { unmapped } else { mapped };
    frames.reverse();
    tracing::debug!(frames = frames.len(), %cause, "mapped traceback");
    Some(Report { frames, cause })
}
