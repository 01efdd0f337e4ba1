use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

/// Initialize the logger for the sniffer.
///
/// Logs always go to stderr; stdout carries the frame reports. Records from
/// other crates are capped at `warn` unless tracing everything.
pub fn init_logger(level: LevelFilter) {
    let dependencies = if level == LevelFilter::Trace {
        LevelFilter::Trace
    } else {
        level.min(LevelFilter::Warn)
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .filter(None, dependencies)
        .filter(Some(env!("CARGO_CRATE_NAME")), level)
        .init();
}

/// Parse a `--log-level` value, case-insensitively; unknown names mean `info`
pub fn get_log_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}
