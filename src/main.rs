use flattener::cli;
use flattener::spill::CleanupGuard;

/// Logs go to stderr. Default level is `warn`; override with `RUST_LOG`
/// (e.g. `RUST_LOG=flattener=trace` to see helper dispatch).
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();
    let cleanup = CleanupGuard;
    let command_line_interface = cli::CommandLineInterface::load();
    if let Err(error) = command_line_interface.run() {
        eprintln!("error: {error:#}");
        drop(cleanup);
        std::process::exit(1);
    }
}
