//! Logger setup: `-v` occurrence count maps to a level, stderr target.

use flexi_logger::{LogTarget, Logger};

pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    Logger::with_str(level)
        .log_target(LogTarget::StdErr)
        .start()
        .unwrap_or_else(|e| panic!("logger initialization failed: {e}"));
}
