//! Log writer module
//!
//! Provides thread-safe log writing to files, stdout/stderr or memory.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Log output target
pub(super) enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(Mutex<File>),
    /// Collect lines in memory
    Memory(Arc<Mutex<Vec<String>>>),
}

impl LogTarget {
    /// File target if a path is given, otherwise the fallback stream
    pub(super) fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(fallback),
        }
    }

    pub(super) fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => {
                emit(io::stdout().lock(), message);
            }
            Self::Stderr => {
                emit(io::stderr().lock(), message);
            }
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    if !emit(&mut *f, message) {
                        emit(io::stderr().lock(), "[logger] failed to write log line");
                    }
                }
            }
            Self::Memory(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(message.to_string());
                }
            }
        }
    }
}

/// Write one line; a closed or broken sink drops it instead of panicking
fn emit(mut sink: impl Write, message: &str) -> bool {
    writeln!(sink, "{message}").is_ok()
}

/// Thread-safe log writer with separate access and error targets
pub(super) struct LogWriter {
    /// Receives debug and info records
    pub(super) access: LogTarget,
    /// Receives warn and error records
    pub(super) error: LogTarget,
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}
