//! Log output of the readout binary
//!
//! The library crates log through the `log` facade; this module installs a
//! `tracing-subscriber` registry that picks those records up and writes them
//! to stderr and, optionally, to an append-only log file.

use crate::config::LogConfig;
use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Local timestamp followed by the process id, e.g. `2024-03-15 12:30:00 - 4711:`
#[derive(Debug, Clone, Copy, Default)]
pub struct PidTimer;

impl FormatTime for PidTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(
            w,
            "{} - {}:",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            std::process::id()
        )
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr = config.to_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let file = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(PidTimer),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_timer_format() {
        let mut line = String::new();
        PidTimer.format_time(&mut Writer::new(&mut line)).unwrap();

        let (timestamp, pid) = line.split_once(" - ").unwrap();
        assert_eq!(timestamp.len(), "2024-03-15 12:30:00".len());
        assert_eq!(pid, format!("{}:", std::process::id()));
    }
}
