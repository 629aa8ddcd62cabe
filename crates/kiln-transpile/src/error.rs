//! Errors raised while transpiling.

/// Error that can occur when turning source text into generated code.
#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    #[error("no classes found; define at least one class with a static main method")]
    NoClasses,

    #[error("no static main method found; expected `static void main(String[] args) {{ ... }}`")]
    NoMain,

    #[error("{path}:{line}: class `{name}` has no matching closing brace")]
    UnbalancedClass {
        name: String,
        path: String,
        line: usize,
    },

    #[error("{path}:{line}: member `{name}` has no matching closing brace")]
    UnbalancedMember {
        name: String,
        path: String,
        line: usize,
    },

    #[error("entry class `{0}` does not declare a static main method")]
    EntryNotFound(String),
}
