//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Application unreachable at {url} after {attempts} attempts")]
    Unreachable { url: String, attempts: u32 },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timed out after {timeout_ms} ms waiting for {what}: {last}")]
    Timeout {
        what: String,
        timeout_ms: u64,
        last: String,
    },

    #[error("Uncaught exception in page: {0}")]
    UncaughtException(String),

    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Test not found: {0}")]
    TestNotFound(String),

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
}

impl From<chromiumoxide::error::CdpError> for E2eError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        E2eError::Browser(e.to_string())
    }
}

impl E2eError {
    /// Whether the error came from an expected-state check rather than the
    /// harness itself.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            E2eError::AssertionFailed(_) | E2eError::Timeout { .. } | E2eError::UncaughtException(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
