use env_logger::Env;
use log::{error, info, log_enabled, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// The filter defaults to `info` and can be overridden through `RUST_LOG`,
/// e.g. `RUST_LOG=tin_bus=debug` to see every transmitted and forwarded frame.
pub fn init_logger() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Like [`init_logger`], but tolerates a logger that is already installed.
///
/// Useful in tests, where every test may try to initialise logging.
pub fn try_init_logger() -> Result<(), log::SetLoggerError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init()
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
