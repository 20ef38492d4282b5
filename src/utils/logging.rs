use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::Config;

pub const TIMING_TARGET: &str = "look.timing";
pub const EVENTS_TARGET: &str = "look.events";

/// Keeps the non-blocking writers flushing; drop only at shutdown.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn daily_writer(dir: &Path, file_name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
    guards.push(guard);
    writer
}

/// General records: everything at `level` except timing, with event mirroring only
/// surfacing its warnings, and the HTTP stack capped at WARN.
fn general_targets(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target(EVENTS_TARGET, LevelFilter::WARN)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
}

fn only_target(target: &str) -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(target, LevelFilter::INFO)
}

/// Installs the global subscriber: stdout plus daily `looks.log`/`looks.jsonl`,
/// `timing.log`/`timing.jsonl` and `events.jsonl` under the configured log directory.
pub fn init_logging(config: &Config) -> LoggingGuards {
    let logs_dir = config.log_dir.as_path();
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory {}: {err}", logs_dir.display());
    }

    let mut guards = Vec::with_capacity(5);
    let general = general_targets(parse_log_level(&config.log_level));
    let timing = only_target(TIMING_TARGET);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(general.clone());
    let looks_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(logs_dir, "looks.log", &mut guards))
        .with_ansi(false)
        .with_filter(general.clone());
    let looks_json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(daily_writer(logs_dir, "looks.jsonl", &mut guards))
        .with_filter(general);
    let timing_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(logs_dir, "timing.log", &mut guards))
        .with_ansi(false)
        .with_filter(timing.clone());
    let timing_json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(daily_writer(logs_dir, "timing.jsonl", &mut guards))
        .with_filter(timing);
    // Event lines are already JSON; write them bare.
    let events_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(logs_dir, "events.jsonl", &mut guards))
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(only_target(EVENTS_TARGET));

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(looks_layer)
        .with(looks_json_layer)
        .with(timing_layer)
        .with(timing_json_layer)
        .with(events_layer)
        .init();

    LoggingGuards { _guards: guards }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn unknown_levels_default_to_info() {
        assert_eq!(parse_log_level("Warning"), LevelFilter::WARN);
        assert_eq!(parse_log_level(" debug "), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("verbose"), LevelFilter::INFO);
    }

    #[test]
    fn general_stream_excludes_timing_and_quiets_event_mirror() {
        let general = general_targets(LevelFilter::DEBUG);
        assert!(general.would_enable("look.pipeline", &Level::DEBUG));
        assert!(!general.would_enable(TIMING_TARGET, &Level::INFO));
        assert!(!general.would_enable(EVENTS_TARGET, &Level::INFO));
        assert!(general.would_enable(EVENTS_TARGET, &Level::WARN));
        assert!(!general.would_enable("reqwest::connect", &Level::INFO));

        let events = only_target(EVENTS_TARGET);
        assert!(events.would_enable(EVENTS_TARGET, &Level::INFO));
        assert!(!events.would_enable("look.applicator", &Level::INFO));
    }
}
