//! Finding the entry file and aggregating a project into one source text.

use crate::error::KilnError;
use kiln_transpile::FILE_MARK_PREFIX;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A located program: the directory aggregated and its entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub entry: PathBuf,
}

/// Resolve `path` to a project.
///
/// A directory is searched recursively for `<entry>.<ext>`, trying extensions
/// in order and taking the first match in relative-path order. A file is its
/// own entry and its parent directory is the root.
pub fn locate(path: &Path, entry: &str, extensions: &[String]) -> Result<Project, KilnError> {
    if path.is_file() {
        let root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        return Ok(Project {
            root,
            entry: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(KilnError::MissingPath(path.to_path_buf()));
    }
    for ext in extensions {
        let wanted = format!("{entry}.{ext}");
        let found = source_files(path)
            .into_iter()
            .find(|f| f.file_name().is_some_and(|n| n == wanted.as_str()));
        if let Some(entry) = found {
            tracing::debug!(entry = %entry.display(), "found entry file");
            return Ok(Project {
                root: path.to_path_buf(),
                entry,
            });
        }
    }
    Err(KilnError::EntryNotFound {
        entry: entry.to_string(),
        extensions: extensions.to_vec(),
        root: path.to_path_buf(),
    })
}

/// Every regular file under `root`, hidden directories skipped, in
/// relative-path order.
fn source_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort_by(|a, b| relative(root, a).cmp(&relative(root, b)));
    files
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x == e))
}

/// `/`-separated path of `path` below `root`.
fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Concatenate the project's sources, each preceded by a file mark.
///
/// The entry file is always included, even when its extension is not one of
/// `extensions`.
pub fn aggregate(project: &Project, extensions: &[String]) -> Result<String, KilnError> {
    let mut files: Vec<PathBuf> = source_files(&project.root)
        .into_iter()
        .filter(|f| has_extension(f, extensions))
        .collect();
    let entry_rel = relative(&project.root, &project.entry);
    if !files.iter().any(|f| relative(&project.root, f) == entry_rel) {
        files.push(project.entry.clone());
        files.sort_by(|a, b| relative(&project.root, a).cmp(&relative(&project.root, b)));
    }

    let mut out = String::new();
    for file in &files {
        let text = std::fs::read_to_string(file).map_err(|source| KilnError::Read {
            path: file.clone(),
            source,
        })?;
        out.push_str(FILE_MARK_PREFIX);
        out.push(' ');
        out.push_str(&relative(&project.root, file));
        out.push('\n');
        out.push_str(&text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
    tracing::debug!(files = files.len(), root = %project.root.display(), "aggregated sources");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["kiln".to_string(), "java".to_string()]
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn directory_search_prefers_extension_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b/Main.java", "class Main {}");
        write(dir.path(), "a/Main.java", "class Main {}");
        write(dir.path(), "z/Main.kiln", "class Main {}");
        let project = locate(dir.path(), "Main", &exts()).unwrap();
        assert_eq!(project.entry, dir.path().join("z/Main.kiln"));

        let java_only = locate(dir.path(), "Main", &["java".to_string()]).unwrap();
        assert_eq!(java_only.entry, dir.path().join("a/Main.java"));
    }

    #[test]
    fn file_path_uses_its_parent() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/App.java", "class App {}");
        let file = dir.path().join("src/App.java");
        let project = locate(&file, "Main", &exts()).unwrap();
        assert_eq!(project.root, dir.path().join("src"));
        assert_eq!(project.entry, file);
    }

    #[test]
    fn missing_entry_and_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Other.java", "class Other {}");
        let err = locate(dir.path(), "Main", &exts()).unwrap_err();
        assert!(matches!(err, KilnError::EntryNotFound { .. }));
        assert_eq!(err.exit_code(), 2);

        let err = locate(&dir.path().join("nope"), "Main", &exts()).unwrap_err();
        assert!(matches!(err, KilnError::MissingPath(_)));
    }

    #[test]
    fn aggregation_is_sorted_and_marked() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Main.java", "class Main {}");
        write(dir.path(), "lib/Util.java", "class Util {}\n");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), ".hidden/Secret.java", "class Secret {}");
        let project = locate(dir.path(), "Main", &exts()).unwrap();
        let text = aggregate(&project, &exts()).unwrap();
        assert_eq!(
            text,
            "FILE-MARK: Main.java\nclass Main {}\nFILE-MARK: lib/Util.java\nclass Util {}\n"
        );
    }

    #[test]
    fn entry_with_other_extension_is_included() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "prog.txt", "class Main {}\n");
        write(dir.path(), "A.java", "class A {}\n");
        let project = locate(&dir.path().join("prog.txt"), "Main", &exts()).unwrap();
        let text = aggregate(&project, &exts()).unwrap();
        assert_eq!(text, "FILE-MARK: A.java\nclass A {}\nFILE-MARK: prog.txt\nclass Main {}\n");
    }
}
