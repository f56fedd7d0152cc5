//! Structured Logging with Sensitive Data Redaction
//!
//! Provides safe logging that automatically redacts:
//! - Private keys
//! - Recovery phrases and seeds
//! - Full addresses (partial redaction)
//!
//! Entries are emitted as `tracing` events, so the host decides where they go.

use std::fmt;
use tracing_subscriber::{fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{PlutusError, PlutusResult};

/// Install a stderr subscriber filtered by `RUST_LOG`, falling back to `default_level`
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(default_level: &str) -> PlutusResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    Registry::default()
        .with(filter)
        .with(subscriber_fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
        .map_err(|e| PlutusError::config(format!("Failed to install logger: {}", e)))
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured log entry
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the log entry (auto-redacts sensitive data)
    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let value_str = value.to_string();
        let redacted = redact_if_sensitive(key, &value_str);
        self.fields.push((key, redacted));
        self
    }

    /// Render the message and fields as one line
    pub fn render(&self) -> String {
        if self.fields.is_empty() {
            return self.message.clone();
        }

        let fields_str = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");

        format!("{} | {}", self.message, fields_str)
    }

    /// Log the entry
    pub fn log(self) {
        let line = self.render();
        match self.level {
            LogLevel::Debug => tracing::debug!(module = self.module, "{}", line),
            LogLevel::Info => tracing::info!(module = self.module, "{}", line),
            LogLevel::Warn => tracing::warn!(module = self.module, "{}", line),
            LogLevel::Error => tracing::error!(module = self.module, "{}", line),
        }
    }
}

/// Redact a value if the key suggests it's sensitive
fn redact_if_sensitive(key: &str, value: &str) -> String {
    let key_lower = key.to_lowercase();
    
    // Keys that should always be fully redacted
    let fully_redacted_keys = [
        "private_key", "privatekey", "secret", "seed", "mnemonic",
        "phrase", "words", "passphrase", "private", "signing_key",
        "api_key",
    ];
    
    for sensitive_key in &fully_redacted_keys {
        if key_lower.contains(sensitive_key) {
            return redact_value(value);
        }
    }
    
    // Keys that should be partially redacted (addresses)
    let address_keys = ["address", "public_key", "owner", "wallet"];
    for addr_key in &address_keys {
        if key_lower.contains(addr_key) {
            return redact_address(value);
        }
    }
    
    value.to_string()
}

/// Fully redact a sensitive value
fn redact_value(value: &str) -> String {
    match value.chars().count() {
        0 => "[EMPTY]".to_string(),
        n if n <= 4 => "[REDACTED]".to_string(),
        n => format!("[REDACTED:{}chars]", n),
    }
}

/// Keep the head and tail of an address so log lines stay correlatable
fn redact_address(address: &str) -> String {
    let chars: Vec<char> = address.trim().chars().collect();

    let prefix_len = if chars.starts_with(&['0', 'x']) { 8 } else { 6 };
    let suffix_len = 4;

    if chars.len() <= prefix_len + suffix_len + 3 {
        return redact_value(address.trim());
    }

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[chars.len() - suffix_len..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __plutus_log {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg,
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Debug-level entry: `log_debug!("module", "message", key = value, ...)`
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)+) => { $crate::__plutus_log!(Debug, $($args)+) };
}

/// Info-level entry
#[macro_export]
macro_rules! log_info {
    ($($args:tt)+) => { $crate::__plutus_log!(Info, $($args)+) };
}

/// Warning-level entry
#[macro_export]
macro_rules! log_warn {
    ($($args:tt)+) => { $crate::__plutus_log!(Warn, $($args)+) };
}

/// Error-level entry
#[macro_export]
macro_rules! log_error {
    ($($args:tt)+) => { $crate::__plutus_log!(Error, $($args)+) };
}
