//! Logging setup.
//!
//! Routes the `log` macros through a `fern` dispatch into an in-memory
//! [`LogBuffer`] and, when enabled, into a log file.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use log::LevelFilter;
use once_cell::sync::OnceCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::LoggingConfig;
use crate::constants::{APP_DIR_NAME, LOG_BUFFER_CAPACITY, LOG_FILE_NAME};

static LOG_BUFFER: OnceCell<LogBuffer> = OnceCell::new();

/// Bounded buffer of recent log lines, shared across the application
#[derive(Clone)]
pub struct LogBuffer {
    logs: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(LOG_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logs: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Add a log entry, dropping the oldest one when full
    pub fn log(&self, message: String) {
        let timestamp = Utc::now().format("%H:%M:%S%.3f").to_string();
        let formatted_message = format!("[{}] {}", timestamp, message);

        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() == self.capacity {
                logs.pop_front();
            }
            logs.push_back(formatted_message);
        }
    }

    /// Get all logs, newest first
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            logs.iter().rev().cloned().collect()
        } else {
            Vec::new()
        }
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.logs.lock().map(|logs| logs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the global logger. Can only succeed once per process.
///
/// # Errors
/// Returns error if:
/// - Logging was already initialized
/// - The level is not a valid log level
/// - The log file cannot be created
pub fn init_logging(config: &LoggingConfig) -> Result<LogBuffer> {
    if LOG_BUFFER.get().is_some() {
        bail!("Logging already initialized");
    }

    let level: LevelFilter = config
        .level
        .parse()
        .map_err(|_| anyhow!("Invalid logging level '{}'", config.level))?;

    let buffer = LogBuffer::new();
    let sink = buffer.clone();

    let mut dispatch = fern::Dispatch::new()
        .level(level)
        .level_for("sqlx", LevelFilter::Warn)
        .level_for("sea_orm", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| out.finish(format_args!("{:<5} {}", record.level(), message)))
                .chain(fern::Output::call(move |record| sink.log(record.args().to_string()))),
        );

    if config.enabled {
        let path = get_log_file_path(config)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }
        let file = fern::log_file(&path).with_context(|| format!("Failed to open log file: {}", path.display()))?;
        dispatch = dispatch.chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} {:<5} {}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file),
        );
    }

    dispatch.apply().context("Failed to install logger")?;
    LOG_BUFFER
        .set(buffer.clone())
        .map_err(|_| anyhow!("Logging already initialized"))?;

    Ok(buffer)
}

/// Buffer of the installed logger, if any
pub fn log_buffer() -> Option<LogBuffer> {
    LOG_BUFFER.get().cloned()
}

/// Log file location: the configured path, or `<data dir>/sitekeeper/sitekeeper.log`
pub fn get_log_file_path(config: &LoggingConfig) -> Result<PathBuf> {
    if !config.file.is_empty() {
        return Ok(PathBuf::from(&config.file));
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(LOG_FILE_NAME))
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}
