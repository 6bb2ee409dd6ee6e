//! Suite configuration
//!
//! Loaded once at suite start: TOML file (optional) → environment → CLI flags.

use hrm_common::Credentials;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{E2eError, E2eResult};

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "HRM_BASE_URL";

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "hrm-e2e.toml";

/// Suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Base address of the application under test
    pub base_url: String,

    /// Browser viewport
    pub viewport: Viewport,

    /// Per-phase timeouts
    pub timeouts: Timeouts,

    /// Whole-test retry counts per run mode
    pub retries: RetryConfig,

    /// Default login credentials
    pub credentials: Credentials,

    /// Where screenshots are written
    pub screenshots_dir: PathBuf,

    /// Where the JSON and HTML reports are written
    pub reports_dir: PathBuf,

    /// Root directory searched for declarative spec files
    pub spec_root: PathBuf,

    /// File-name suffix marking a declarative spec file
    pub spec_suffix: String,

    /// Capture a screenshot when a test attempt fails
    pub screenshot_on_failure: bool,

    /// Fixed delay after the loading spinner disappears
    pub settle_delay_ms: u64,

    /// Interval between polls of a pending assertion
    pub poll_interval_ms: u64,

    /// Title of the HTML report
    pub report_title: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opensource-demo.orangehrmlive.com".to_string(),
            viewport: Viewport::default(),
            timeouts: Timeouts::default(),
            retries: RetryConfig::default(),
            credentials: Credentials::default(),
            screenshots_dir: PathBuf::from("target/hrm-e2e/screenshots"),
            reports_dir: PathBuf::from("target/hrm-e2e/reports"),
            spec_root: PathBuf::from("crates/e2e/specs"),
            spec_suffix: ".spec.yaml".to_string(),
            screenshot_on_failure: true,
            settle_delay_ms: 500,
            poll_interval_ms: 100,
            report_title: "Orange HRM Test Report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Timeouts in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Retry-until-timeout budget of every element query and assertion
    pub default_command_ms: u64,
    pub page_load_ms: u64,
    pub request_ms: u64,
    pub response_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default_command_ms: 10_000,
            page_load_ms: 60_000,
            request_ms: 10_000,
            response_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries in headless run mode
    pub run_mode: u32,
    /// Retries in interactive open mode
    pub open_mode: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            run_mode: 1,
            open_mode: 0,
        }
    }
}

/// How the suite is being run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Headless, unattended
    #[default]
    Run,
    /// Headed, interactive
    Open,
}

impl SuiteConfig {
    /// Load configuration from file; a missing file yields defaults.
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `HRM_BASE_URL`, `HRM_USERNAME` and `HRM_PASSWORD` when set.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = non_empty(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(username) = non_empty(hrm_common::USERNAME_ENV) {
            self.credentials.username = username;
        }
        if let Some(password) = non_empty(hrm_common::PASSWORD_ENV) {
            self.credentials.password = password;
        }
        self
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> E2eResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(E2eError::Config(format!("base_url must be an http(s) URL, got '{}'", self.base_url)));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(E2eError::Config("viewport dimensions must be non-zero".into()));
        }
        if self.timeouts.default_command_ms == 0 || self.poll_interval_ms == 0 {
            return Err(E2eError::Config("command timeout and poll interval must be non-zero".into()));
        }
        Ok(())
    }

    /// Whole-test retry count for the given run mode.
    pub fn retries_for(&self, mode: RunMode) -> u32 {
        match mode {
            RunMode::Run => self.retries.run_mode,
            RunMode::Open => self.retries.open_mode,
        }
    }

    /// Absolute URL for an application route.
    pub fn url_for(&self, route: &str) -> String {
        if route.starts_with("http://") || route.starts_with("https://") {
            return route.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.default_command_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.page_load_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}
