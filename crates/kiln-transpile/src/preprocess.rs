//! Comment/import stripping and the file-mark table.
//!
//! The engine receives one concatenated blob in which every original file is
//! introduced by a `FILE-MARK: <relative-path>` line. Normalization removes
//! comments and `package`/`import` lines while keeping every newline, so a line
//! number counted inside a file's normalized text equals its original line.

use crate::scan::literal_end;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Prefix of the line that introduces each aggregated file.
pub const FILE_MARK_PREFIX: &str = "FILE-MARK:";

/// Path reported for text that precedes any file mark.
pub const UNMARKED_PATH: &str = "<source>";

/// A resolved original position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePos {
    pub path: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
struct FileMark {
    offset: usize,
    path: String,
}

/// Offsets in the normalized text at which each original file's content starts.
///
/// Marks are sorted by offset; the owning file of a position is the mark with
/// the greatest offset not after it.
#[derive(Debug, Clone, Default)]
pub struct FileMarks {
    marks: Vec<FileMark>,
}

impl FileMarks {
    fn push(&mut self, offset: usize, path: String) {
        debug_assert!(self.marks.last().is_none_or(|m| m.offset <= offset));
        self.marks.push(FileMark { offset, path });
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Map an absolute offset in `text` back to `(path, line)`.
    pub fn locate(&self, text: &str, pos: usize) -> SourcePos {
        let idx = self.marks.partition_point(|m| m.offset <= pos);
        let (start, path) = match idx.checked_sub(1).map(|i| &self.marks[i]) {
            Some(mark) => (mark.offset, mark.path.as_str()),
            None => (0, UNMARKED_PATH),
        };
        let pos = pos.min(text.len());
        let line = text.as_bytes()[start..pos]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1;
        SourcePos {
            path: path.to_string(),
            line,
        }
    }
}

/// Normalized source plus the table mapping it back to files.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    pub marks: FileMarks,
}

impl Normalized {
    pub fn locate(&self, pos: usize) -> SourcePos {
        self.marks.locate(&self.text, pos)
    }
}

/// Strip comments and declarative lines from every marked file and build the mark table.
pub fn normalize(source: &str) -> Normalized {
    let mut segments: Vec<(Option<String>, String)> = vec![(None, String::new())];
    for line in source.split_inclusive('\n') {
        if let Some(path) = line.trim_start().strip_prefix(FILE_MARK_PREFIX) {
            segments.push((Some(path.trim().to_string()), String::new()));
            continue;
        }
        if let Some((_, body)) = segments.last_mut() {
            body.push_str(line);
        }
    }

    let mut text = String::with_capacity(source.len());
    let mut marks = FileMarks::default();
    for (path, body) in segments {
        if path.is_none() && body.trim().is_empty() {
            continue;
        }
        if let Some(path) = path {
            marks.push(text.len(), path);
        }
        text.push_str(&strip_declarations(&strip_comments(&body)));
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }
    tracing::debug!(files = marks.len(), bytes = text.len(), "normalized source");
    Normalized { text, marks }
}

/// Remove `//` and `/* */` comments outside literals, keeping newlines.
pub fn strip_comments(code: &str) -> String {
    let bytes = code.as_bytes();
    let mut out = String::with_capacity(code.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = literal_end(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&code[copied..i]);
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                copied = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&code[copied..i]);
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    if bytes[i] == b'\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                copied = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&code[copied.min(code.len())..]);
    out
}

fn declaration_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:package|import)\s+[^;]+;\s*$").expect("valid declaration pattern")
    })
}

/// Blank out `package` and `import` lines.
fn strip_declarations(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if declaration_line().is_match(content) {
            out.push_str(&line[content.len()..]);
        } else {
            out.push_str(line);
        }
    }
    out
}
