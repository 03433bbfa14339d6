use clap::Parser;
use mecha::cli::{self, args::MechaArgs};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; `RUST_LOG` overrides the level picked by `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("mecha={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = MechaArgs::parse();
    init_logging(args.verbose);
    cli::run(args);
}
