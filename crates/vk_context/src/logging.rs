//! Logging setup
//!
//! Lines look like `[1760900000 DEBUG] vk_context::instance: message`.

use std::io::Write;

pub use log::{debug, error, info, trace, warn};

/// Keeps the process logger alive for a scope and flushes it on drop
#[must_use = "dropping the guard flushes the logger immediately"]
#[derive(Debug)]
pub struct LogGuard {
    installed: bool,
}

impl LogGuard {
    /// Whether this guard installed the process logger
    pub const fn installed(&self) -> bool {
        self.installed
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        log::logger().flush();
    }
}

/// Initialize the logging system
///
/// `RUST_LOG` overrides the default level (`debug` in debug builds, `info`
/// otherwise). A logger installed earlier is left in place.
pub fn init() -> LogGuard {
    let default_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let installed = env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .is_ok();

    if !installed {
        log::debug!("Logger already installed, keeping it");
    }

    LogGuard { installed }
}
