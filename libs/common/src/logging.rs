//! Logging bootstrap for installation services
//!
//! Console output always, plus an optional daily-rolling file in plain or JSON format.
//! `RUST_LOG` overrides the configured level when set.

use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter producing `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] Serial opened on /dev/ttyACM0`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.3fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m",
                Level::DEBUG => "\x1b[34m",
                Level::INFO => "\x1b[32m",
                Level::WARN => "\x1b[33m",
                Level::ERROR => "\x1b[31m",
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Keeps the non-blocking file writer flushing until process exit
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name, used as the log file prefix
    pub service_name: String,
    /// Level when `RUST_LOG` is not set
    pub level: Level,
    /// Directory for daily log files; console only when `None`
    pub log_dir: Option<PathBuf>,
    /// JSON lines in the log file instead of bracketed text
    pub enable_json: bool,
    /// ANSI colours on the console
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_string(),
            level: Level::INFO,
            log_dir: None,
            enable_json: false,
            ansi: true,
        }
    }
}

/// Parse a level name, falling back to INFO
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn filter_directive(config: &LogConfig) -> String {
    std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| config.level.as_str().to_lowercase())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_with_config(config: &LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(filter_directive(config))?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let console_layer = fmt::layer()
        .with_ansi(config.ansi)
        .event_format(BracketedLevelFormat)
        .boxed();

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", config.service_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            if FILE_GUARD.set(guard).is_err() {
                return Err("file logging already initialised".into());
            }

            let layer = if config.enable_json {
                fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .event_format(BracketedLevelFormat)
                    .boxed()
            };
            Some(layer)
        },
        None => None,
    };

    registry.with(console_layer).with(file_layer).try_init()?;

    tracing::info!(
        "Logging: {} @ {}",
        config.service_name,
        config
            .log_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "console".to_string())
    );

    Ok(())
}
