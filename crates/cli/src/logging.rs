use std::path::Path;

use anyhow::Result;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming};

/// Start the global logger.
///
/// The level spec comes from `RUST_LOG`, then `spec`, then "info". With a
/// directory, output goes to size-rotated files there instead of stderr.
pub fn setup_logging(spec: Option<&str>, directory: Option<&Path>) -> Result<LoggerHandle> {
    let logger = Logger::try_with_env_or_str(spec.unwrap_or("info"))?;
    let logger = match directory {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir))
            .format(flexi_logger::detailed_format)
            .rotate(
                Criterion::Size(10 * 1024 * 1024),
                Naming::Numbers,
                Cleanup::KeepLogFiles(7),
            ),
        None => logger.format(flexi_logger::colored_default_format),
    };
    Ok(logger.start()?)
}
