//! DriveSense command-line front end
//!
//! Wires the monitoring engine to recordings, the simulated motion source,
//! and log-based dispatchers.

pub mod replay;
pub mod settings;
pub mod simulate;
pub mod sinks;

pub use replay::{replay, ReplayRecord, ReplayReport};
pub use settings::{LoggingSettings, Settings};
pub use simulate::{run_simulation, scripted_face};
pub use sinks::log_dispatchers;

use tracing_subscriber::EnvFilter;

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the `verbose` default.
pub fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}
