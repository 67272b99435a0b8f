//! # procsensor-core
//!
//! Shared plumbing for the procsensor crates: reading kernel pseudo-files
//! line by line, the common error type, RON configuration and small text
//! rendering helpers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procsensor_core::lines::{FsLineSource, LineSource};
//! use std::path::Path;
//!
//! let source = FsLineSource;
//! let first = source.read_window(Path::new("/proc/stat"), 0, Some(1))?;
//! println!("{}", first[0]);
//! # Ok::<(), procsensor_core::SensorError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub mod lines;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SensorError>;

/// Default location of the CPU time-accounting table.
pub const PROC_STAT_PATH: &str = "/proc/stat";

/// Default location of the per-processor descriptor listing.
pub const PROC_CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Global configuration loaded from ~/.config/procsensor/config.ron
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Locations of the kernel files to read
    #[serde(default)]
    pub sources: SourcePaths,
    /// Report one row per logical processor instead of the aggregate row
    #[serde(default)]
    pub per_cpu: bool,
    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

/// Paths of the two pseudo-files the parsers consume.
///
/// Overriding these is mostly useful for containers that mount the host's
/// `/proc` elsewhere, and for tests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourcePaths {
    /// Time-accounting table
    #[serde(default = "default_stat_path")]
    pub stat: PathBuf,
    /// Processor descriptor listing
    #[serde(default = "default_cpuinfo_path")]
    pub cpuinfo: PathBuf,
}

fn default_stat_path() -> PathBuf {
    PathBuf::from(PROC_STAT_PATH)
}

fn default_cpuinfo_path() -> PathBuf {
    PathBuf::from(PROC_CPUINFO_PATH)
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            stat: default_stat_path(),
            cpuinfo: default_cpuinfo_path(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            sources: SourcePaths::default(),
            per_cpu: false,
            pretty: false,
        }
    }
}

impl GlobalConfig {
    /// Load configuration from the standard config file location.
    ///
    /// Searches for config in:
    /// 1. ~/.config/procsensor/config.ron
    /// 2. ~/.procsensor/config.ron (fallback)
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::find_config_file() {
            Self::load_from_file(&config_path)
        } else {
            tracing::debug!("no config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: GlobalConfig = ron::from_str(&content).map_err(|e| {
            SensorError::config_with_value(
                format!("Failed to parse config file: {}", e),
                path.display().to_string(),
            )
        })?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Find the config file in standard locations.
    pub fn find_config_file() -> Option<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_path = config_dir.join("procsensor").join("config.ron");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".procsensor").join("config.ron");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        None
    }

    /// Get the default config file path for writing.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("procsensor").join("config.ron"))
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SensorError::serialization(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Save example configuration with documentation to a file.
    pub fn save_example_config_to_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = r##"// procsensor Configuration File
// =============================
// Copy this to ~/.config/procsensor/config.ron and customize as needed.
//
// Note: Command line arguments override these settings.

(
    // Kernel files read by the CPU sensor. Point these at a bind-mounted
    // host /proc when running inside a container.
    sources: (
        stat: "/proc/stat",
        cpuinfo: "/proc/cpuinfo",
    ),

    // Report one row per logical processor instead of the aggregate row
    per_cpu: false,

    // Pretty-print JSON output
    pretty: false,
)
"##;

        std::fs::write(path, template)?;
        Ok(())
    }
}

/// Text rendering helpers shared by the sensors.
pub mod format {
    /// Render a value with exactly two decimals.
    #[must_use]
    pub fn fixed2(value: f64) -> String {
        format!("{:.2}", value)
    }

    /// Render key/value pairs as a single-line object whose values are all
    /// quoted strings, e.g. `{"cpu":"all","user":"5.00"}`.
    ///
    /// Keys are emitted in the given order.
    #[must_use]
    pub fn quoted_object(pairs: &[(&str, String)]) -> String {
        let body: Vec<String> = pairs
            .iter()
            .map(|(key, value)| format!("{}:{}", quote(key), quote(value)))
            .collect();
        format!("{{{}}}", body.join(","))
    }

    fn quote(text: &str) -> String {
        // Serializing a &str cannot fail.
        serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
    }
}

/// Error type shared by the procsensor crates.
///
/// Per-line problems in the time-accounting table are reported as
/// [`SensorError::MalformedLine`] and are swallowed by the caller; a bad
/// descriptor field is a [`SensorError::MalformedField`] and aborts the parse.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The backing kernel file could not be opened or read.
    #[error("Source unavailable: {}: {}", path.display(), source)]
    SourceUnavailable {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A line did not have the expected shape.
    #[error("Malformed line: {message}")]
    MalformedLine {
        /// What was wrong with the line
        message: String,
        /// The offending line
        line: String,
    },

    /// A typed field could not be converted.
    #[error("Malformed field `{key}`: {value:?}")]
    MalformedField {
        /// Label of the field
        key: String,
        /// Raw text that failed to convert
        value: String,
        /// Conversion failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration error (invalid settings, unreadable config file, etc.).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration issue
        message: String,
        /// The invalid configuration value if applicable
        value: Option<String>,
    },

    /// Config could not be rendered as RON.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the failure
        message: String,
    },

    /// I/O error outside of the kernel sources (config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SensorError {
    /// Create a source-unavailable error for `path`.
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed-line error.
    pub fn malformed_line<S: Into<String>, L: Into<String>>(message: S, line: L) -> Self {
        Self::MalformedLine {
            message: message.into(),
            line: line.into(),
        }
    }

    /// Create a malformed-field error from a conversion failure.
    pub fn malformed_field<K, V, E>(key: K, value: V, source: E) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::MalformedField {
            key: key.into(),
            value: value.into(),
            source: source.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
            value: None,
        }
    }

    /// Create a new configuration error with the invalid value.
    pub fn config_with_value<S: Into<String>, V: Into<String>>(message: S, value: V) -> Self {
        Self::Config {
            message: message.into(),
            value: Some(value.into()),
        }
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the error only voids a single unit of input (a line) rather
    /// than the whole call.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedLine { .. })
    }

    /// Short category name for logging.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source",
            Self::MalformedLine { .. } => "line",
            Self::MalformedField { .. } => "field",
            Self::Config { .. } => "config",
            Self::Serialization { .. } => "serialization",
            Self::Io(_) => "io",
        }
    }
}

impl fmt::Display for SourcePaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stat={} cpuinfo={}", self.stat.display(), self.cpuinfo.display())
    }
}
