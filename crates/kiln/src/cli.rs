//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Run a class-based curly-brace program by transpiling it to Python.
#[derive(Parser, Debug)]
#[command(name = "kiln", version)]
pub struct Cli {
    /// Entry file, or a directory searched for the entry file
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Print the generated Python instead of running it
    #[arg(long)]
    pub emit: bool,

    /// Leave source position markers out of the generated code
    #[arg(long)]
    pub no_markers: bool,

    /// Python interpreter used to run the program
    #[arg(long, value_name = "BIN")]
    pub python: Option<String>,

    /// Entry file stem and the class whose static main is launched
    #[arg(long, value_name = "NAME")]
    pub entry: Option<String>,

    /// Print runtime failure reports as JSON
    #[arg(long)]
    pub json_report: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Arguments passed to the program
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}
