//! Transpiler from a bounded class-based curly-brace dialect to Python 3.
//!
//! The pipeline, leaves first:
//!
//! 1. [`preprocess`] strips comments and declarative lines and records where
//!    each aggregated file starts.
//! 2. [`extract`] recovers classes, members and fields by brace matching.
//! 3. [`translate`] rewrites single statements and expressions.
//! 4. [`lower`] turns member bodies into a block tree, control flow included.
//! 5. [`qualify`] gives bare field and method references their receiver.
//! 6. [`codegen`] emits classes, overload dispatchers and the launcher.
//! 7. [`output`] prints the tree with position markers that [`source_map`]
//!    later uses to map Python tracebacks back to source lines.
//!
//! ```
//! let src = "class Main { static void main(String[] args) { System.out.println(1 + 2); } }";
//! let py = kiln_transpile::transpile(src).unwrap();
//! assert!(py.contains("print(_kiln_str(_kiln_plus(1, 2)))"));
//! assert!(py.ends_with("    Main.main(sys.argv[1:])\n"));
//! ```

pub mod codegen;
pub mod error;
pub mod extract;
pub mod ir;
pub mod lower;
pub mod output;
pub mod preprocess;
pub mod qualify;
mod scan;
pub mod source_map;
pub mod translate;

pub use error::TranspileError;
pub use extract::{ClassSpec, FieldSpec, MemberSpec, Param, extract_classes};
pub use ir::{Module, Stmt};
pub use output::{MARKER_PREFIX, PythonWriter};
pub use preprocess::{FILE_MARK_PREFIX, Normalized, SourcePos, normalize};
pub use source_map::{Frame, Report, map_traceback};

/// Knobs for one transpile call.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// Class whose static `main` is launched. Defaults to `Main`, then the
    /// first class declaring one.
    pub entry_class: Option<String>,
    /// Write `# kiln-src:` position markers into the output.
    pub markers: bool,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            entry_class: None,
            markers: true,
        }
    }
}

/// Transpile aggregated source text with default options.
pub fn transpile(source: &str) -> Result<String, TranspileError> {
    transpile_with(source, &TranspileOptions::default())
}

/// Transpile aggregated source text.
pub fn transpile_with(source: &str, options: &TranspileOptions) -> Result<String, TranspileError> {
    let normalized = normalize(source);
    let classes = extract_classes(&normalized)?;
    let module = codegen::generate(&classes, options.entry_class.as_deref())?;
    Ok(PythonWriter::emit(&module, options.markers))
}
