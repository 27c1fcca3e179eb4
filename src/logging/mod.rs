//! Structured log sink for the Reef library.
//!
//! Four severities flow through the sink: debug, info, error, fatal.
//! Console output goes through `tracing`: debug-and-above in dev mode,
//! info-and-above in prod. Error-and-above records are additionally handed
//! to every registered [`ErrorForwarder`] (an external error-reporting
//! endpoint) and, when configured, persisted through a [`LogStore`] as
//! JSON rows. `fatal` terminates the process after emission.

use std::process;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LogConfig;
use crate::error::ReefResult;

/// Log severity. Only the four levels the sink distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Error,
    Fatal,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

/// A log row as persisted by a [`LogStore`]: the relational shape is
/// `(level, message, time, fields)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
    /// RFC 3339 timestamp.
    pub time: String,
    /// Structured key-value context, JSON-encoded.
    pub fields: serde_json::Value,
}

/// Forwards error-and-above records to an external reporting endpoint.
pub trait ErrorForwarder: Send + Sync {
    fn forward(&self, record: &LogRecord);
}

/// Persists error-and-above records as relational rows.
pub trait LogStore: Send + Sync {
    fn persist(&self, record: &LogRecord) -> ReefResult<()>;
}

/// A forwarder that re-emits through `tracing`; the default wiring when
/// no external endpoint is configured.
#[derive(Debug, Default)]
pub struct TracingForwarder;

impl ErrorForwarder for TracingForwarder {
    fn forward(&self, record: &LogRecord) {
        tracing::error!(
            level = %record.level,
            time = %record.time,
            fields = %record.fields,
            "{}",
            record.message
        );
    }
}

/// Installs the global console subscriber for `config`.
///
/// Dev mode prints debug-and-above, prod info-and-above; an existing
/// subscriber (set by the host application or an earlier call) is left in
/// place.
pub fn init(config: &LogConfig) {
    let filter = if config.mode == "dev" { "debug" } else { "info" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false);
    if config.json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// The log sink: console plus optional forwarding and persistence.
pub struct Sink {
    config: LogConfig,
    forwarders: Vec<Arc<dyn ErrorForwarder>>,
    store: Option<Arc<dyn LogStore>>,
}

impl Sink {
    /// Creates a sink for `config` with no forwarders or store attached.
    pub fn new(config: LogConfig) -> Self {
        Self {
            config,
            forwarders: Vec::new(),
            store: None,
        }
    }

    /// Registers a forwarder for error-and-above records.
    pub fn with_forwarder(mut self, forwarder: Arc<dyn ErrorForwarder>) -> Self {
        self.forwarders.push(forwarder);
        self
    }

    /// Registers the store that persists error-and-above records.
    pub fn with_store(mut self, store: Arc<dyn LogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Emits at debug severity; console only.
    pub fn debug(&self, message: &str, fields: serde_json::Value) {
        self.emit(Level::Debug, message, fields);
    }

    /// Emits at info severity; console only.
    pub fn info(&self, message: &str, fields: serde_json::Value) {
        self.emit(Level::Info, message, fields);
    }

    /// Emits at error severity: console, forwarders, and the store.
    pub fn error(&self, message: &str, fields: serde_json::Value) {
        self.emit(Level::Error, message, fields);
    }

    /// Emits at fatal severity, then terminates the process.
    pub fn fatal(&self, message: &str, fields: serde_json::Value) -> ! {
        self.emit(Level::Fatal, message, fields);
        process::exit(1);
    }

    fn emit(&self, level: Level, message: &str, fields: serde_json::Value) {
        match level {
            Level::Debug => tracing::debug!(fields = %fields, "{message}"),
            Level::Info => tracing::info!(fields = %fields, "{message}"),
            Level::Error | Level::Fatal => tracing::error!(fields = %fields, "{message}"),
        }

        if level < Level::Error {
            return;
        }

        let record = LogRecord {
            level: level.as_str().to_string(),
            message: message.to_string(),
            time: chrono::Utc::now().to_rfc3339(),
            fields,
        };

        if self.config.forward_errors {
            for forwarder in &self.forwarders {
                forwarder.forward(&record);
            }
        }
        if self.config.persist_errors {
            if let Some(store) = &self.store {
                if let Err(err) = store.persist(&record) {
                    tracing::error!(error = %err, "failed to persist log record");
                }
            }
        }
    }
}
