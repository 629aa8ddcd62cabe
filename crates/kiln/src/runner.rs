//! Running generated code in a child interpreter.

use crate::error::KilnError;
use kiln_transpile::Report;
use kiln_transpile::source_map::{map_traceback, split_stderr};
use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

/// File name the generated module is written under. Traceback frames are
/// matched against it.
pub const SCRIPT_NAME: &str = "__kiln_main__.py";

/// Run `generated` with `python`, passing `args` to the program.
///
/// The program's stdin and stdout are inherited. Its stderr is captured so an
/// uncaught failure can be mapped back to source positions; anything it wrote
/// to stderr itself is forwarded first. Returns the program's exit code.
pub fn run(generated: &str, python: &str, args: &[String]) -> Result<i32, KilnError> {
    let dir = tempfile::Builder::new().prefix("kiln-").tempdir()?;
    let script = dir.path().join(SCRIPT_NAME);
    std::fs::write(&script, generated)?;
    tracing::debug!(script = %script.display(), python, "running generated program");

    let child = Command::new(python)
        .arg(&script)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| KilnError::Spawn {
            python: python.to_string(),
            source,
        })?;
    let output = child.wait_with_output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    finish(generated, output.status, &stderr)
}

fn finish(generated: &str, status: ExitStatus, stderr: &str) -> Result<i32, KilnError> {
    let Some(code) = status.code() else {
        forward(stderr)?;
        return Err(KilnError::Runtime(Report {
            frames: Vec::new(),
            cause: describe_abnormal(status),
        }));
    };
    if status.success() {
        forward(stderr)?;
        return Ok(code);
    }
    let (own, traceback) = split_stderr(stderr);
    let report = traceback.and_then(|t| map_traceback(generated, SCRIPT_NAME, t));
    match report {
        Some(report) => {
            forward(own)?;
            Err(KilnError::Runtime(report))
        }
        None => {
            forward(stderr)?;
            Ok(code)
        }
    }
}

fn forward(text: &str) -> std::io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let mut err = std::io::stderr().lock();
    err.write_all(text.as_bytes())?;
    err.flush()
}

#[cfg(unix)]
fn describe_abnormal(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(signal) => format!("interpreter terminated by signal {signal}"),
        None => "interpreter terminated abnormally".to_string(),
    }
}

#[cfg(not(unix))]
fn describe_abnormal(_status: ExitStatus) -> String {
    "interpreter terminated abnormally".to_string()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    const GENERATED: &str = "\
import sys
class Main:
    # kiln-src: app/Main.java:2
    @staticmethod
    def main(args):
        # kiln-src: app/Main.java:3
        raise ValueError('bad')
";

    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    #[test]
    fn traceback_becomes_runtime_report() {
        let stderr = "Traceback (most recent call last):\n  File \"/tmp/kiln-1/__kiln_main__.py\", line 7, in main\n    raise ValueError('bad')\nValueError: bad\n";
        let err = finish(GENERATED, exited(1), stderr).unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.to_string(), "at app/Main.java:3 (in main)\ncause: ValueError: bad");
    }

    #[test]
    fn plain_exit_codes_pass_through() {
        assert_eq!(finish(GENERATED, exited(0), "").unwrap(), 0);
        assert_eq!(finish(GENERATED, exited(7), "").unwrap(), 7);
    }

    #[test]
    fn signals_are_runtime_failures() {
        let err = finish(GENERATED, ExitStatus::from_raw(9), "").unwrap_err();
        let KilnError::Runtime(report) = err else {
            panic!("expected a runtime report");
        };
        assert!(report.frames.is_empty());
        assert_eq!(report.cause, "interpreter terminated by signal 9");
    }
}
