//! Python writer for the generated block tree.
//!
//! Besides indentation, the writer owns position markers: an inert comment
//! `# kiln-src: <path>:<line>` is written whenever the originating position of
//! the next statement differs from the last one written, and
//! `# kiln-src: -` whenever generated-only code follows mapped code.

use crate::ir::{Module, Stmt};
use crate::preprocess::SourcePos;

/// Runtime helpers every generated module starts with.
pub const PRELUDE: &str = include_str!("prelude.py");

/// Prefix of every position marker line.
pub const MARKER_PREFIX: &str = "# kiln-src: ";

/// Marker payload for code with no originating position.
pub const UNMAPPED_MARKER: &str = "-";

/// Prints a [`Module`] as Python source.
pub struct PythonWriter {
    output: String,
    indent: usize,
    markers: bool,
    current: Option<SourcePos>,
}

impl PythonWriter {
    pub fn new(markers: bool) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            markers,
            current: None,
        }
    }

    /// Emit a module to Python source.
    pub fn emit(module: &Module, markers: bool) -> String {
        let mut writer = Self::new(markers);
        writer.write_module(module);
        writer.output
    }

    fn write_module(&mut self, module: &Module) {
        self.output.push_str(&module.prelude);
        if !module.prelude.is_empty() {
            self.output.push_str("\n\n");
        }
        for stmt in &module.body {
            self.write_stmt(stmt);
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn write_marker(&mut self, origin: Option<&SourcePos>) {
        if !self.markers || self.current.as_ref() == origin {
            return;
        }
        self.write_indent();
        self.output.push_str(MARKER_PREFIX);
        match origin {
            Some(pos) => {
                self.output.push_str(&pos.path);
                self.output.push(':');
                self.output.push_str(&pos.line.to_string());
            }
            None => self.output.push_str(UNMAPPED_MARKER),
        }
        self.output.push('\n');
        self.current = origin.cloned();
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Blank => self.output.push('\n'),
            Stmt::Line { text, origin } => {
                self.write_marker(origin.as_ref());
                self.write_indent();
                self.output.push_str(text);
                self.output.push('\n');
            }
            Stmt::Block {
                header,
                body,
                origin,
            } => {
                self.write_marker(origin.as_ref());
                self.write_indent();
                self.output.push_str(header);
                self.output.push_str(":\n");
                self.indent += 1;
                self.write_block_body(body);
                self.indent -= 1;
            }
        }
    }

    fn write_block_body(&mut self, body: &[Stmt]) {
        if body.iter().all(|s| matches!(s, Stmt::Blank)) {
            self.write_indent();
            self.output.push_str("pass\n");
            return;
        }
        for stmt in body {
            self.write_stmt(stmt);
        }
    }
}
