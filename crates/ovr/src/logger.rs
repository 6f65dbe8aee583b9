//! Stderr logging for the ovr binary.
use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging to stderr.
///
/// The `--debug` flag raises the default filter; an explicit `RUST_LOG`
/// still takes precedence over both defaults.
pub fn init(debug: bool) {
    let default = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    Builder::new()
        .filter_level(default)
        .parse_default_env()
        .init();
}
