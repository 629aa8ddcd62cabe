//! Output writers - print the block tree as source code.

pub mod python;

pub use python::{MARKER_PREFIX, PRELUDE, PythonWriter, UNMAPPED_MARKER};
