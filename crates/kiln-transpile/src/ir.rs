//! Block tree for generated Python.
//!
//! Lowering builds this tree; [`crate::output::PythonWriter`] prints it. Nothing
//! in the tree knows about indentation.

use crate::preprocess::SourcePos;

/// One generated statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// A single line of Python.
    Line {
        text: String,
        origin: Option<SourcePos>,
    },
    /// A compound statement: `header:` followed by an indented body.
    Block {
        header: String,
        body: Vec<Stmt>,
        origin: Option<SourcePos>,
    },
    /// An empty separator line.
    Blank,
}

impl Stmt {
    pub fn line(text: impl Into<String>, origin: Option<SourcePos>) -> Self {
        Stmt::Line {
            text: text.into(),
            origin,
        }
    }

    /// A line with no originating source position.
    pub fn generated(text: impl Into<String>) -> Self {
        Stmt::line(text, None)
    }

    pub fn block(header: impl Into<String>, body: Vec<Stmt>, origin: Option<SourcePos>) -> Self {
        Stmt::Block {
            header: header.into(),
            body,
            origin,
        }
    }
}

/// A whole generated module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    /// Verbatim text emitted before the body (imports and runtime helpers).
    pub prelude: String,
    pub body: Vec<Stmt>,
}
