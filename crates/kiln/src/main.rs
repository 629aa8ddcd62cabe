use clap::Parser;
use kiln::{Cli, KilnError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding a log filter directive.
const LOG_ENV: &str = "KILN_LOG";

/// Logs go to stderr so emitted code on stdout stays clean.
fn setup_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    tracing_subscriber::registry()
        .with(formatter)
        .with(filter)
        .init();
}

/// Reset SIGPIPE to default behavior so piping `--emit` to `head` doesn't panic.
#[cfg(unix)]
fn reset_sigpipe() {
    // SAFETY: only changes the signal disposition back to the POSIX default.
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}

fn report(err: &KilnError, json: bool) {
    match err {
        KilnError::Runtime(report) if json => match serde_json::to_string_pretty(report) {
            Ok(text) => eprintln!("{text}"),
            Err(_) => eprintln!("{report}"),
        },
        KilnError::Runtime(report) => eprintln!("{report}"),
        KilnError::Transpile(e) => eprintln!("kiln: transpile error: {e}"),
        other => eprintln!("kiln: {other}"),
    }
}

fn main() {
    reset_sigpipe();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match kiln::run(&cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            report(&e, cli.json_report);
            std::process::exit(e.exit_code());
        }
    }
}
