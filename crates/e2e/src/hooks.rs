//! Suite-wide hooks: default network stubs and the uncaught-exception policy
//!
//! A [`SuitePolicy`] is built once at suite start and applied to every test
//! session before the test body runs. Suites and single tests derive local
//! variants with `with_allowed` / `with_stub` without touching the shared one.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::E2eResult;
use crate::intercept::{HttpMethod, StubResponse, StubRule};
use crate::session::Session;

/// Messages treated as known-benign application noise
pub const DEFAULT_ALLOWED_EXCEPTIONS: &[&str] = &[
    "ResizeObserver",
    "Cannot read properties of null",
    "Cannot read properties of undefined",
    "addEventListener",
    "uncaught exception",
    "reading 'response'",
];

/// Alias of the default leave-periods stub
pub const LEAVE_PERIODS_ALIAS: &str = "globalLeavePeriods";

/// Endpoint neutralised by the default stub
pub const LEAVE_PERIODS_URL: &str = "**/api/v2/leave/leave-periods**";

/// Current policy layout version
pub const POLICY_VERSION: u32 = 1;

/// What to do with an uncaught in-page exception
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionVerdict {
    /// Matched the allow-list; the test continues
    Suppressed { pattern: String },
    /// Unknown; the current test fails
    Fatal,
}

/// Substring allow-list for uncaught in-page exceptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionPolicy {
    pub allowed: Vec<String>,
}

impl Default for ExceptionPolicy {
    fn default() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_EXCEPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExceptionPolicy {
    /// Policy that fails on every exception.
    pub fn strict() -> Self {
        Self { allowed: Vec::new() }
    }

    pub fn verdict(&self, message: &str) -> ExceptionVerdict {
        self.allowed
            .iter()
            .find(|p| message.contains(p.as_str()))
            .map(|p| ExceptionVerdict::Suppressed { pattern: p.clone() })
            .unwrap_or(ExceptionVerdict::Fatal)
    }
}

/// Versioned suite-wide preconditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitePolicy {
    pub version: u32,
    pub exceptions: ExceptionPolicy,
    pub stubs: Vec<StubRule>,
}

impl SuitePolicy {
    /// The standard policy: default allow-list and the leave-periods stub.
    pub fn standard() -> E2eResult<Self> {
        let leave_periods = StubRule::new(
            LEAVE_PERIODS_ALIAS,
            HttpMethod::Get,
            LEAVE_PERIODS_URL,
            StubResponse::json(200, serde_json::json!({ "data": [] })),
        )?;

        Ok(Self {
            version: POLICY_VERSION,
            exceptions: ExceptionPolicy::default(),
            stubs: vec![leave_periods],
        })
    }

    /// No stubs, every exception fatal.
    pub fn empty() -> Self {
        Self {
            version: POLICY_VERSION,
            exceptions: ExceptionPolicy::strict(),
            stubs: Vec::new(),
        }
    }

    pub fn with_allowed(mut self, pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if !self.exceptions.allowed.contains(&pattern) {
            self.exceptions.allowed.push(pattern);
        }
        self
    }

    /// Add a stub, replacing any existing stub with the same alias.
    pub fn with_stub(mut self, rule: StubRule) -> Self {
        self.stubs.retain(|s| s.alias != rule.alias);
        self.stubs.push(rule);
        self
    }

    /// Install this policy's stubs on a fresh session.
    pub async fn apply(&self, session: &Session) -> E2eResult<()> {
        debug!(version = self.version, stubs = self.stubs.len(), "Applying suite policy");
        for rule in &self.stubs {
            session.intercept(rule).await?;
            info!(alias = %rule.alias, method = rule.method.as_str(), url = %rule.url, "Stub installed");
        }
        Ok(())
    }
}
