//! Logger setup for the demo binaries

use std::path::Path;
use std::time::Instant;

use log::info;

use crate::common::SimResult;

pub use log::LevelFilter;

/// Install a fern logger writing to stdout and, optionally, to `log_file`.
///
/// Records are prefixed with the seconds elapsed since initialisation. Debug
/// and trace records also carry their target module.
///
/// Must only be called once per process.
pub fn init_logger(min_level: LevelFilter, log_file: Option<&Path>) -> SimResult<()> {
    let start = Instant::now();

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let elapsed = start.elapsed().as_secs_f64();
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    elapsed,
                    level_to_str(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!("[{:10.6} {}] {}", elapsed, level_to_str(record.level()), message))
            }
        })
        .level(min_level)
        .level_for("gnuplot", LevelFilter::Warn)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;

    info!("Logging initialised");
    info!("    Log level: {:?}", min_level);
    if let Some(path) = log_file {
        info!("    Log file path: {:?}", path);
    }
    Ok(())
}

fn level_to_str(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}
