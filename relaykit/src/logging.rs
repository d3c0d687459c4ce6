// Logging System for relaykit
//
// A thin setup layer over the `tracing` ecosystem. Components in this crate
// only emit events and spans; the host decides whether and how to install a
// subscriber, either itself or through one of the `init*` helpers below.
//
// # Usage Examples
//
// ```rust
// use relaykit::logging;
//
// // INFO level, human-readable console output
// logging::init(logging::LogConfig::default());
//
// // Or take the level and format from the loaded configuration
// let config = relaykit::config::RelayConfig::default();
// logging::init(logging::LogConfig::from(&config.logging));
//
// // Per-task span, entered automatically by the pool's workers
// let span = relaykit::task_span!("ingest-0", 7u64);
// let _guard = span.enter();
// relaykit::log_task!("ingest-0", "started");
// ```

use std::io;
use std::str::FromStr;
use std::sync::Once;

use tracing::{Level, Subscriber};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter, Layer};

use crate::config::LoggingSection;

/// Configuration for the relaykit logging setup
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to use JSON format for logs
    pub json_format: bool,
    /// Whether to include file and line information
    pub show_file_line: bool,
    /// Whether to include thread name/id
    pub show_thread_info: bool,
    /// Whether to include timestamps
    pub show_time: bool,
    /// Target filter expressions (format: "target=level,target2=level2,...")
    pub target_filters: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_file_line: true,
            show_thread_info: true,
            show_time: true,
            target_filters: None,
        }
    }
}

impl From<&LoggingSection> for LogConfig {
    fn from(section: &LoggingSection) -> Self {
        Self {
            level: Level::from_str(&section.level).unwrap_or(Level::INFO),
            json_format: section.json_format,
            target_filters: section.target_filters.clone(),
            ..Default::default()
        }
    }
}

// Initialization guard to ensure we only initialize once
static INIT: Once = Once::new();

fn env_filter(config: &LogConfig) -> EnvFilter {
    let mut env_filter =
        EnvFilter::from_default_env().add_directive(LevelFilter::from_level(config.level).into());

    if let Some(filters) = &config.target_filters {
        for filter in filters.split(',') {
            if let Ok(directive) = filter.trim().parse() {
                env_filter = env_filter.add_directive(directive);
            }
        }
    }
    env_filter
}

/// Initialize the logging system with the given configuration
///
/// Sets the global tracing subscriber. Safe to call more than once; only the
/// first call in the process takes effect.
pub fn init(config: LogConfig) {
    INIT.call_once(|| {
        let filter = env_filter(&config);

        let fmt_layer = if config.json_format {
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_thread_names(config.show_thread_info)
                .boxed()
        } else {
            let layer = fmt::layer()
                .with_ansi(atty::is(atty::Stream::Stdout))
                .with_file(config.show_file_line)
                .with_line_number(config.show_file_line)
                .with_thread_names(config.show_thread_info)
                .with_thread_ids(config.show_thread_info);
            if config.show_time {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        };

        let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
        set_global_subscriber(subscriber);
    });
}

// Helper function to set the global subscriber
fn set_global_subscriber<S>(subscriber: S)
where
    S: Subscriber + Send + Sync + 'static,
{
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error setting global tracing subscriber: {}", err);
    }
}

/// Opens `path` in append mode for use as a log writer.
///
/// # Errors
/// Returns an error if the file cannot be opened or created
pub fn file_writer(path: &str) -> io::Result<Box<dyn io::Write + Send + Sync + 'static>> {
    use std::fs::OpenOptions;

    let file = OpenOptions::new().create(true).append(true).open(path)?;

    Ok(Box::new(file))
}

/// Initialize logging with both console and file output
///
/// Console output respects the ansi color setting, while file output is always
/// plain. The file is opened up front so a bad path is reported to the caller.
pub fn init_with_file(config: LogConfig, log_file: &str) -> Result<(), io::Error> {
    // Fail early on unwritable paths
    file_writer(log_file)?;

    INIT.call_once(|| {
        let filter = env_filter(&config);

        let console_layer = fmt::layer()
            .with_ansi(atty::is(atty::Stream::Stdout))
            .with_file(config.show_file_line)
            .with_line_number(config.show_file_line)
            .with_thread_names(config.show_thread_info)
            .with_thread_ids(config.show_thread_info);

        let log_file_path = log_file.to_string();
        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || -> Box<dyn io::Write + Send + Sync> {
                match file_writer(&log_file_path) {
                    Ok(writer) => writer,
                    Err(_) => Box::new(io::stderr()),
                }
            })
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_thread_ids(true);

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer);

        set_global_subscriber(subscriber);
    });

    Ok(())
}

/// DEBUG level, colored output with file/line info, TRACE for the pool.
pub fn init_development() {
    init(LogConfig {
        level: Level::DEBUG,
        json_format: false,
        show_file_line: true,
        show_thread_info: true,
        show_time: true,
        target_filters: Some("relaykit=debug,relaykit::pool=trace".to_string()),
    });
}

/// Initialize logging optimized for production environments
///
/// JSON output for log aggregators, no file/line information, thread names
/// kept for diagnostics.
pub fn init_production() {
    init(LogConfig {
        level: Level::INFO,
        json_format: true,
        show_file_line: false,
        show_thread_info: true,
        show_time: true,
        target_filters: None,
    });
}

/// Initialize logging for testing
///
/// Only warnings and errors, no thread info or timestamps, to keep test
/// output compact.
pub fn init_test() {
    init(LogConfig {
        level: Level::WARN,
        json_format: false,
        show_file_line: true,
        show_thread_info: false,
        show_time: false,
        target_filters: None,
    });
}

/// Create a span covering one execution of a named task
///
/// ```rust
/// let span = relaykit::task_span!("crawler-3", 42u64);
/// let _guard = span.enter();
/// ```
#[macro_export]
macro_rules! task_span {
    ($name:expr, $ticket:expr) => {
        tracing::info_span!("task", name = %$name, ticket = $ticket)
    };
    ($name:expr, $ticket:expr, $($fields:tt)*) => {
        tracing::info_span!("task", name = %$name, ticket = $ticket, $($fields)*)
    };
}

/// Create a span for stream hub operations
#[macro_export]
macro_rules! hub_span {
    ($operation:expr) => {
        tracing::debug_span!("hub", operation = $operation)
    };
    ($operation:expr, $($fields:tt)*) => {
        tracing::debug_span!("hub", operation = $operation, $($fields)*)
    };
}

/// Log task lifecycle events (submitted, completed, released, ...)
#[macro_export]
macro_rules! log_task {
    ($name:expr, $event:expr) => {
        tracing::debug!(task = %$name, event = $event);
    };
    ($name:expr, $event:expr, $($fields:tt)*) => {
        tracing::debug!(task = %$name, event = $event, $($fields)*);
    };
}

/// Log subscriber lifecycle events (subscribed, unsubscribed, ...)
#[macro_export]
macro_rules! log_hub {
    ($channel:expr, $event:expr) => {
        tracing::debug!(channel = %$channel, event = $event);
    };
    ($channel:expr, $event:expr, $($fields:tt)*) => {
        tracing::debug!(channel = %$channel, event = $event, $($fields)*);
    };
}

/// Log a failure with its cause in the `error` field
///
/// ```rust
/// let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
/// relaykit::log_error!(err, "write failed");
/// ```
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {
        tracing::error!(error = %$error);
    };
    ($error:expr, $($fields:tt)*) => {
        tracing::error!(error = %$error, $($fields)*);
    };
}
