//! Binary-level tests for `kiln`.
//!
//! Tests that run generated code skip themselves when no `python3` is on PATH.

use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

fn have_python() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// `kiln` with the global config pointed at an empty directory.
fn kiln(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home).env_remove("KILN_LOG");
    cmd
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, text) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }
    dir
}

const HELLO: &str = "class Main {\n    public static void main(String[] args) {\n        System.out.println(\"hello \" + args.length);\n    }\n}\n";

#[test]
fn test_help_lists_options() {
    let home = TempDir::new().unwrap();
    let output = kiln(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    for flag in ["--emit", "--no-markers", "--python", "--entry", "--json-report", "--verbose"] {
        assert!(help.contains(flag), "missing {flag} in:\n{help}");
    }
}

#[test]
fn test_emit_prints_generated_code() {
    let home = TempDir::new().unwrap();
    let dir = project(&[("src/Main.java", HELLO)]);
    let output = kiln(home.path())
        .arg(dir.path())
        .arg("--emit")
        .output()
        .unwrap();
    assert!(output.status.success());
    let py = String::from_utf8_lossy(&output.stdout);
    assert!(py.contains("# kiln-src: src/Main.java:2"));
    assert!(py.contains("class Main:"));
    assert!(py.ends_with("    Main.main(sys.argv[1:])\n"));
}

#[test]
fn test_project_config_disables_markers() {
    let home = TempDir::new().unwrap();
    let dir = project(&[("Main.java", HELLO), ("kiln.toml", "[emit]\nmarkers = false\n")]);
    let output = kiln(home.path())
        .arg(dir.path())
        .arg("--emit")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("# kiln-src:"));
}

#[test]
fn test_missing_path_exits_2() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    let output = kiln(home.path())
        .arg(dir.path().join("missing"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("path not found"));
}

#[test]
fn test_missing_entry_exits_2() {
    let home = TempDir::new().unwrap();
    let dir = project(&[("Other.java", "class Other {}\n")]);
    let output = kiln(home.path()).arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no Main file"));
}

#[test]
fn test_transpile_error_exits_3() {
    let home = TempDir::new().unwrap();
    let dir = project(&[("Main.java", "class Main {\n    void run() { }\n}\n")]);
    let output = kiln(home.path())
        .arg(dir.path())
        .arg("--emit")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("transpile error: no static main"));
}

#[test]
fn test_run_passes_arguments() {
    if !have_python() {
        eprintln!("skipping: python3 not found");
        return;
    }
    let home = TempDir::new().unwrap();
    let dir = project(&[("Main.java", HELLO)]);
    let output = kiln(home.path())
        .arg(dir.path())
        .args(["--", "a", "b"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello 2\n");
}

#[test]
fn test_runtime_failure_reports_source_position() {
    if !have_python() {
        eprintln!("skipping: python3 not found");
        return;
    }
    let home = TempDir::new().unwrap();
    let dir = project(&[
        (
            "Main.java",
            "class Main {\n    public static void main(String[] args) {\n        Helper.check(-1);\n    }\n}\n",
        ),
        (
            "util/Helper.java",
            "class Helper {\n    static void check(int n) {\n        if (n < 0) {\n            throw new IllegalArgumentException(\"negative\");\n        }\n    }\n}\n",
        ),
    ]);
    let output = kiln(home.path()).arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at util/Helper.java:4 (in check)"), "{stderr}");
    assert!(stderr.contains("at Main.java:3 (in main)"), "{stderr}");
    assert!(stderr.contains("cause: ValueError: negative"), "{stderr}");
}

#[test]
fn test_json_report() {
    if !have_python() {
        eprintln!("skipping: python3 not found");
        return;
    }
    let home = TempDir::new().unwrap();
    let dir = project(&[(
        "Main.java",
        "class Main {\n    public static void main(String[] args) {\n        int[] xs = new int[1];\n        xs[0] = 10 / 0;\n    }\n}\n",
    )]);
    let output = kiln(home.path())
        .arg(dir.path())
        .arg("--json-report")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let report: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(report["frames"][0]["path"], "Main.java");
    assert_eq!(report["frames"][0]["line"], 4);
    assert_eq!(report["frames"][0]["function"], "main");
    assert_eq!(report["cause"], "ArithmeticError: / by zero");
}

#[test]
fn test_exit_status_propagates() {
    if !have_python() {
        eprintln!("skipping: python3 not found");
        return;
    }
    let home = TempDir::new().unwrap();
    let dir = project(&[(
        "Main.java",
        "class Main {\n    public static void main(String[] args) {\n        System.err.println(\"leaving\");\n        System.exit(5);\n    }\n}\n",
    )]);
    let output = kiln(home.path()).arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(String::from_utf8_lossy(&output.stderr), "leaving\n");
}
