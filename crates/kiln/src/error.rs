//! Errors raised by the `kiln` host.

use kiln_transpile::{Report, TranspileError};
use std::path::PathBuf;

/// Exit code for a missing path or entry file.
pub const EXIT_AGGREGATION: i32 = 2;
/// Exit code for source that could not be transpiled.
pub const EXIT_TRANSPILE: i32 = 3;
/// Exit code for a failure while the generated program ran.
pub const EXIT_RUNTIME: i32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum KilnError {
    #[error("path not found: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("no {entry} file with extension {} under {}", .extensions.join(" or "), .root.display())]
    EntryNotFound {
        entry: String,
        extensions: Vec<String>,
        root: PathBuf,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Transpile(#[from] TranspileError),

    #[error("failed to start `{python}`: {source}")]
    Spawn {
        python: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The program raised an uncaught failure; displayed as the mapped report.
    #[error("{0}")]
    Runtime(Report),
}

impl KilnError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingPath(_) | Self::EntryNotFound { .. } | Self::Read { .. } => {
                EXIT_AGGREGATION
            }
            Self::Transpile(_) => EXIT_TRANSPILE,
            Self::Spawn { .. } | Self::Io(_) | Self::Runtime(_) => EXIT_RUNTIME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_transpile::Frame;

    #[test]
    fn exit_codes_by_stage() {
        assert_eq!(KilnError::MissingPath("x".into()).exit_code(), 2);
        assert_eq!(KilnError::Transpile(TranspileError::NoMain).exit_code(), 3);
        let report = Report {
            frames: vec![Frame {
                path: "Main.java".to_string(),
                line: 4,
                function: "main".to_string(),
            }],
            cause: "ValueError: bad".to_string(),
        };
        let err = KilnError::Runtime(report);
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_string(), "at Main.java:4 (in main)\ncause: ValueError: bad");
    }

    #[test]
    fn entry_not_found_lists_extensions() {
        let err = KilnError::EntryNotFound {
            entry: "Main".to_string(),
            extensions: vec!["kiln".to_string(), "java".to_string()],
            root: "proj".into(),
        };
        assert_eq!(err.to_string(), "no Main file with extension kiln or java under proj");
    }
}
