// 🪵 Logging - tracing to a daily rolling file, optionally mirrored to stderr
// The terminal UI owns stdout, so the file is the primary sink.

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

pub const CLI_PREFIX: &str = "cli";
pub const SERVER_PREFIX: &str = "server";

/// Targets the filter applies to: the library and both binaries
const TARGETS: [&str; 2] = ["life_tracker", "tracker_server"];

pub fn enable_logging(
    prefix: &str,
    log_dir: &Path,
    log_level: Option<LevelFilter>,
    show_std: bool,
) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(prefix)
        .build(log_dir)?;

    let stderr = std::io::stderr.with_filter(move |_| show_std);

    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(log_level, from_env.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(stderr.and(appender))
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}

/// `--log` wins, then a valid `RUST_LOG` taken as the whole filter, then `info` for our targets
fn build_filter(log_level: Option<LevelFilter>, from_env: Option<&str>) -> EnvFilter {
    if log_level.is_none() {
        if let Some(filter) = from_env.and_then(|raw| EnvFilter::try_new(raw).ok()) {
            return filter;
        }
    }

    let level = log_level.unwrap_or(LevelFilter::INFO);
    let directives = TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::new(directives)
}
