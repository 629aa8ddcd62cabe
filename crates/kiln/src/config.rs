//! Configuration for kiln.
//!
//! Loads config from:
//! 1. Global: ~/.config/kiln/config.toml (or `$XDG_CONFIG_HOME/kiln/config.toml`)
//! 2. Per-project: kiln.toml in the source root (overrides global)
//!
//! Example kiln.toml:
//! ```toml
//! [run]
//! python = "python3.12"
//!
//! [sources]
//! extensions = ["kiln"]
//! entry = "App"
//!
//! [emit]
//! markers = false
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the per-project config file.
pub const PROJECT_CONFIG: &str = "kiln.toml";

const DEFAULT_PYTHON: &str = "python3";
const DEFAULT_ENTRY: &str = "Main";
const DEFAULT_EXTENSIONS: [&str; 2] = ["kiln", "java"];

/// Execution settings.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Interpreter used to run generated code.
    pub python: Option<String>,
}

/// Source discovery settings.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct SourcesConfig {
    /// File extensions aggregated into one program, without the dot.
    pub extensions: Option<Vec<String>>,
    /// Stem of the entry file searched for when given a directory.
    pub entry: Option<String>,
}

/// Output settings.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EmitConfig {
    /// Write position markers into generated code.
    pub markers: Option<bool>,
}

/// Root configuration structure.
///
/// Every key is optional so a project file only overrides what it sets.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct KilnConfig {
    pub run: RunConfig,
    pub sources: SourcesConfig,
    pub emit: EmitConfig,
}

impl KilnConfig {
    /// Load the global config merged with the project config under `root`.
    pub fn load(root: &Path) -> Self {
        let mut config = Self::default();

        if let Some(global) = Self::global_config_path().and_then(|p| Self::load_file(&p)) {
            config = config.merge(global);
        }

        if let Some(project) = Self::load_file(&root.join(PROJECT_CONFIG)) {
            config = config.merge(project);
        }

        config
    }

    fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("kiln").join("config.toml"))
    }

    /// Load config from a file path. Unreadable files are skipped silently;
    /// malformed ones with a warning.
    fn load_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded config");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                None
            }
        }
    }

    /// Keys set in `other` win.
    fn merge(self, other: Self) -> Self {
        Self {
            run: RunConfig {
                python: other.run.python.or(self.run.python),
            },
            sources: SourcesConfig {
                extensions: other.sources.extensions.or(self.sources.extensions),
                entry: other.sources.entry.or(self.sources.entry),
            },
            emit: EmitConfig {
                markers: other.emit.markers.or(self.emit.markers),
            },
        }
    }

    pub fn python(&self) -> &str {
        self.run.python.as_deref().unwrap_or(DEFAULT_PYTHON)
    }

    pub fn entry(&self) -> &str {
        self.sources.entry.as_deref().unwrap_or(DEFAULT_ENTRY)
    }

    pub fn extensions(&self) -> Vec<String> {
        match &self.sources.extensions {
            Some(exts) => exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
            None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn markers(&self) -> bool {
        self.emit.markers.unwrap_or(true)
    }
}
