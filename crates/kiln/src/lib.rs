//! Host for the kiln transpiler: configuration, source aggregation and
//! execution of the generated program.

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod sources;

pub use cli::Cli;
pub use config::KilnConfig;
pub use error::KilnError;

use kiln_transpile::TranspileOptions;
use std::path::Path;

/// Directory whose `kiln.toml` applies to `path`.
fn config_root(path: &Path) -> &Path {
    if path.is_dir() {
        return path;
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Settings after applying command-line overrides to the loaded config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub python: String,
    pub entry: String,
    pub extensions: Vec<String>,
    pub options: TranspileOptions,
}

impl Settings {
    pub fn resolve(cli: &Cli, config: &KilnConfig) -> Self {
        let explicit_entry = cli.entry.clone().or_else(|| config.sources.entry.clone());
        Self {
            python: cli.python.clone().unwrap_or_else(|| config.python().to_string()),
            entry: explicit_entry.clone().unwrap_or_else(|| config.entry().to_string()),
            extensions: config.extensions(),
            options: TranspileOptions {
                entry_class: explicit_entry,
                markers: !cli.no_markers && config.markers(),
            },
        }
    }
}

/// Aggregate and transpile the program at `path`.
pub fn generate(path: &Path, settings: &Settings) -> Result<String, KilnError> {
    let project = sources::locate(path, &settings.entry, &settings.extensions)?;
    let source = sources::aggregate(&project, &settings.extensions)?;
    let generated = kiln_transpile::transpile_with(&source, &settings.options)?;
    Ok(generated)
}

/// Carry out one invocation, returning the process exit code on success.
pub fn run(cli: &Cli) -> Result<i32, KilnError> {
    let config = KilnConfig::load(config_root(&cli.path));
    let settings = Settings::resolve(cli, &config);
    let generated = generate(&cli.path, &settings)?;
    if cli.emit {
        print!("{generated}");
        return Ok(0);
    }
    runner::run(&generated, &settings.python, &cli.args)
}
