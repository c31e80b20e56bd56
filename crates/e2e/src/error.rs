//! Error types for the E2E harness

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Test data error in {path}: {reason}")]
    DataSource { path: PathBuf, reason: String },

    #[error("Unknown locator key: {0}")]
    UnknownLocatorKey(String),

    #[error("Locator '{key}' needs a value for placeholder '{{{placeholder}}}'")]
    MissingSubstitution { key: String, placeholder: String },

    #[error("Test case is missing required field '{0}'")]
    MissingField(String),

    #[error("Field '{field}' has invalid value '{value}': {reason}")]
    InvalidField {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Interaction rejected: {0}")]
    InteractionError(String),

    #[error("WebDriver error: {0}")]
    WebDriver(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl E2eError {
    pub(crate) fn data_source(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        E2eError::DataSource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_field(field: &str, value: &str, reason: impl ToString) -> Self {
        E2eError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Errors that stop the whole run rather than a single test case.
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, E2eError::DataSource { .. } | E2eError::Config(_))
    }

    /// Lookup and interaction failures raised by the browser.
    pub fn is_element_error(&self) -> bool {
        matches!(
            self,
            E2eError::ElementNotFound(_) | E2eError::InteractionError(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
