//! Logger module
//!
//! Structured logging sink for the ingress:
//! - One JSON object per line, with `level` and `time` fields
//! - debug/info records go to the access target, warn/error to the error target
//! - Fire-and-forget: a failure to log never reaches the caller

mod record;
mod writer;

pub use record::{ErrorRecord, RequestFinished, RequestLine, RequestStarted, RouteRecord};

use crate::config::{Config, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, OnceLock};
use writer::{LogTarget, LogWriter};

/// Global logger instance, installed once at startup
static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Record severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Clonable handle to a log writer
#[derive(Clone)]
pub struct Logger {
    level: Level,
    writer: Arc<LogWriter>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("level", &self.level).finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct LogLine<'a, T: Serialize> {
    level: Level,
    time: String,
    #[serde(flatten)]
    record: &'a T,
}

#[derive(Serialize)]
struct Message<'a> {
    message: &'a str,
}

impl Logger {
    /// Build a logger from configuration, opening log files if configured
    pub fn from_config(config: &LoggingConfig) -> std::io::Result<Self> {
        let writer = LogWriter {
            access: LogTarget::open(config.access_log_file.as_deref(), LogTarget::Stdout)?,
            error: LogTarget::open(config.error_log_file.as_deref(), LogTarget::Stderr)?,
        };
        Ok(Self {
            level: config.level,
            writer: Arc::new(writer),
        })
    }

    /// Logger writing to stdout/stderr
    pub fn stdout(level: Level) -> Self {
        Self {
            level,
            writer: Arc::new(LogWriter {
                access: LogTarget::Stdout,
                error: LogTarget::Stderr,
            }),
        }
    }

    /// Logger collecting every line into a shared buffer, for embedding and tests
    pub fn in_memory(level: Level) -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            level,
            writer: Arc::new(LogWriter {
                access: LogTarget::Memory(Arc::clone(&lines)),
                error: LogTarget::Memory(Arc::clone(&lines)),
            }),
        };
        (logger, lines)
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    /// Emit one structured record
    pub fn record<T: Serialize>(&self, level: Level, record: &T) {
        if !self.enabled(level) {
            return;
        }
        let line = LogLine {
            level,
            time: timestamp(),
            record,
        };
        match serde_json::to_string(&line) {
            Ok(json) => match level {
                Level::Debug | Level::Info => self.writer.access.write_line(&json),
                Level::Warn | Level::Error => self.writer.error.write_line(&json),
            },
            Err(e) => self
                .writer
                .error
                .write_line(&format!("[logger] dropped unserializable record: {e}")),
        }
    }

    pub fn info(&self, message: &str) {
        self.record(Level::Info, &Message { message });
    }

    pub fn warn(&self, message: &str) {
        self.record(Level::Warn, &Message { message });
    }

    pub fn error(&self, message: &str) {
        self.record(Level::Error, &Message { message });
    }
}

/// Current time as ISO-8601 UTC with millisecond precision
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Initialize the global logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> std::io::Result<()> {
    let logger = Logger::from_config(config)?;
    GLOBAL.set(logger).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "Logger already initialized",
        )
    })
}

/// Get the global logger, falling back to stdout/stderr at info level
pub fn global() -> &'static Logger {
    GLOBAL.get_or_init(|| Logger::stdout(Level::Info))
}

pub fn log_error(message: &str) {
    global().error(message);
}

pub fn log_warning(message: &str) {
    global().warn(message);
}

pub fn log_info(message: &str) {
    global().info(message);
}

#[derive(Serialize)]
struct ServerStarted<'a> {
    #[serde(rename = "Server")]
    server: &'a str,
    #[serde(rename = "Listen on")]
    listen_on: String,
    #[serde(rename = "Asset root")]
    asset_root: String,
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    global().record(
        Level::Info,
        &ServerStarted {
            server: "Started",
            listen_on: format!("http://{addr}"),
            asset_root: config.assets.root.display().to_string(),
        },
    );
}
