//! Logger setup shared by the command-line tools.

use env_logger::Builder;
use log::LevelFilter;
use std::env;

/// Level for this crate's messages at a given `-v` count.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger.
///
/// Other crates only log warnings. `RUST_LOG`, when set, is applied on top.
pub fn init_logging(verbosity: u8) {
    let mut builder = Builder::new();
    builder
        .filter(None, LevelFilter::Warn)
        .filter(Some("repo_shuttle"), level_for(verbosity))
        .format_timestamp_secs();

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    // A logger may already be installed when embedded in a larger program.
    let _ = builder.try_init();
}
