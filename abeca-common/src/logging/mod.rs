// Logging utilities for the abeca key stack
//
// This module provides:
// - Component-based structured logging
// - Instance id tracking through logger inheritance (which CA emitted a line)
// - Operation tracing for resolution and generation calls
// - A small configuration type that installs the env_logger backend

use log::{debug, error, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Arguments, Display, Formatter};

/// Predefined components for logging categorization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Component {
    Ca,
    Keys,
    KeyStore,
    Signer,
    Cpabe,
    Config,
    Custom(&'static str),
}

impl Component {
    /// Get the string representation of the component
    pub fn as_str(&self) -> &str {
        match self {
            Component::Ca => "CA",
            Component::Keys => "Keys",
            Component::KeyStore => "KeyStore",
            Component::Signer => "Signer",
            Component::Cpabe => "CPABE",
            Component::Config => "Config",
            Component::Custom(name) => name,
        }
    }
}

// Display helpers so the *_args variants never allocate a prefix String
struct ComponentPrefixDisplay {
    parent: Option<Component>,
    component: Component,
}

impl Display for ComponentPrefixDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) if parent != Component::Ca => {
                write!(f, "{}.{}", parent.as_str(), self.component.as_str())
            }
            _ => write!(f, "{}", self.component.as_str()),
        }
    }
}

struct MaybeOperationDisplay<'a>(Option<&'a str>);

impl Display for MaybeOperationDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(op) = self.0 {
            write!(f, "|op={op}")
        } else {
            Ok(())
        }
    }
}

/// A helper for creating component-specific loggers with instance id tracking
#[derive(Clone, Debug)]
pub struct Logger {
    /// Component this logger is for
    component: Component,
    /// Identifier of the CA instance that owns this logger
    instance_id: String,
    /// Parent component for hierarchical logging (if any)
    parent_component: Option<Component>,
    /// Operation being traced (e.g. `signer.resolve`)
    operation: Option<String>,
}

impl Logger {
    /// Create a new root logger for a specific component and CA instance id
    pub fn new_root(component: Component, instance_id: &str) -> Self {
        Self {
            component,
            instance_id: instance_id.to_string(),
            parent_component: None,
            operation: None,
        }
    }

    /// Create a child logger with the same instance id but different component
    pub fn with_component(&self, component: Component) -> Self {
        Self {
            component,
            instance_id: self.instance_id.clone(),
            parent_component: Some(self.component),
            operation: self.operation.clone(),
        }
    }

    /// Create a logger that tags every line with an operation name
    pub fn with_operation(&self, operation: impl Into<String>) -> Self {
        Self {
            component: self.component,
            instance_id: self.instance_id.clone(),
            parent_component: self.parent_component,
            operation: Some(operation.into()),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn component(&self) -> Component {
        self.component
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    fn is_root_ca(&self) -> bool {
        self.component == Component::Ca && self.parent_component.is_none()
    }

    fn prefix(&self) -> ComponentPrefixDisplay {
        ComponentPrefixDisplay {
            parent: self.parent_component,
            component: self.component,
        }
    }

    /// Log a debug message
    pub fn debug(&self, message: impl Into<String>) {
        if log::log_enabled!(log::Level::Debug) {
            self.debug_args(format_args!("{}", message.into()));
        }
    }

    /// Log a debug message using fmt::Arguments (avoids allocating message String)
    pub fn debug_args(&self, args: Arguments) {
        if log::log_enabled!(log::Level::Debug) {
            if self.is_root_ca() {
                debug!("[{}] {}", self.instance_id, args);
            } else {
                debug!(
                    "[{}][{}{}] {}",
                    self.instance_id,
                    self.prefix(),
                    MaybeOperationDisplay(self.operation()),
                    args
                );
            }
        }
    }

    /// Log an info message
    pub fn info(&self, message: impl Into<String>) {
        if log::log_enabled!(log::Level::Info) {
            self.info_args(format_args!("{}", message.into()));
        }
    }

    pub fn info_args(&self, args: Arguments) {
        if log::log_enabled!(log::Level::Info) {
            if self.is_root_ca() {
                info!("[{}] {}", self.instance_id, args);
            } else {
                info!(
                    "[{}][{}{}] {}",
                    self.instance_id,
                    self.prefix(),
                    MaybeOperationDisplay(self.operation()),
                    args
                );
            }
        }
    }

    /// Log a warning message
    pub fn warn(&self, message: impl Into<String>) {
        if log::log_enabled!(log::Level::Warn) {
            self.warn_args(format_args!("{}", message.into()));
        }
    }

    pub fn warn_args(&self, args: Arguments) {
        if log::log_enabled!(log::Level::Warn) {
            if self.is_root_ca() {
                warn!("[{}] {}", self.instance_id, args);
            } else {
                warn!(
                    "[{}][{}{}] {}",
                    self.instance_id,
                    self.prefix(),
                    MaybeOperationDisplay(self.operation()),
                    args
                );
            }
        }
    }

    /// Log an error message
    pub fn error(&self, message: impl Into<String>) {
        if log::log_enabled!(log::Level::Error) {
            self.error_args(format_args!("{}", message.into()));
        }
    }

    pub fn error_args(&self, args: Arguments) {
        if log::log_enabled!(log::Level::Error) {
            if self.is_root_ca() {
                error!("[{}] {}", self.instance_id, args);
            } else {
                error!(
                    "[{}][{}{}] {}",
                    self.instance_id,
                    self.prefix(),
                    MaybeOperationDisplay(self.operation()),
                    args
                );
            }
        }
    }
}

/// Log verbosity accepted in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

/// Backend configuration for the `log` facade
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
    /// Route output through the test harness capture
    #[serde(default)]
    pub is_test: bool,
}

impl LoggingConfig {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            is_test: false,
        }
    }

    /// Install env_logger with this level. Calling it more than once is harmless;
    /// the first installed backend wins.
    pub fn apply(&self) {
        let _ = env_logger::builder()
            .is_test(self.is_test)
            .filter_level(self.level.to_level_filter())
            .try_init();
    }
}
