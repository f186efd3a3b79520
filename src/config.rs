//! Console configuration loaded from TOML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//!
//! ```toml
//! [console]
//! operator_id = "agent-42"
//! template_label = "[Template: {{ name }}] {{ values | join(', ') }}"
//! page_size = 50
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::conversation::{
    domain::OperatorId,
    ports::SessionFilter,
    services::{DEFAULT_TEMPLATE_LABEL, TemplateLabel},
};

/// Errors raised while loading or interpreting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// No operator identity is configured.
    #[error("console.operator_id is not set")]
    MissingOperator,

    /// The configured operator identity is invalid.
    #[error("invalid console.operator_id: {0}")]
    InvalidOperator(String),

    /// The template label format does not render.
    #[error("invalid console.template_label: {0}")]
    InvalidTemplateLabel(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Operator console settings.
    #[serde(default)]
    pub console: ConsoleSettings,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Operator console settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Identity of the signed-in operator.
    pub operator_id: Option<String>,
    /// `minijinja` format for sent template content.
    pub template_label: String,
    /// Sessions fetched per page.
    pub page_size: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            operator_id: None,
            template_label: DEFAULT_TEMPLATE_LABEL.to_owned(),
            page_size: 50,
        }
    }
}

/// Output style of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Single-line events.
    #[default]
    Compact,
    /// Multi-line, human-oriented events.
    Pretty,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// Output style.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Compact,
        }
    }
}

impl ConsoleConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown shapes.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Returns the validated operator identity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingOperator`] when unset and
    /// [`ConfigError::InvalidOperator`] when malformed.
    pub fn operator_id(&self) -> Result<OperatorId, ConfigError> {
        let raw = self
            .console
            .operator_id
            .as_deref()
            .ok_or(ConfigError::MissingOperator)?;
        OperatorId::new(raw).map_err(|error| ConfigError::InvalidOperator(error.to_string()))
    }

    /// Returns the compiled template label.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTemplateLabel`] when the format does
    /// not render.
    pub fn template_label(&self) -> Result<TemplateLabel, ConfigError> {
        TemplateLabel::new(self.console.template_label.clone())
            .map_err(|error| ConfigError::InvalidTemplateLabel(error.to_string()))
    }

    /// Filter for the first page of sessions.
    #[must_use]
    pub const fn first_page(&self) -> SessionFilter {
        SessionFilter {
            status: None,
            agent_id: None,
            limit: Some(self.console.page_size),
            offset: Some(0),
        }
    }
}
