//! Browser driver seam
//!
//! The primitive browser actions the orchestration layer is built on. The
//! production implementation talks to Chromium over the DevTools protocol;
//! unit tests use an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::E2eResult;
use crate::intercept::StubRule;
use crate::locator::Locator;

pub mod cdp;
#[cfg(test)]
pub(crate) mod fake;

pub use cdp::{CdpBrowser, CdpDriver, LaunchOptions};

/// Snapshot of one matched element at query time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Trimmed text content
    pub text: String,
    /// Rendered with a non-zero box and not hidden by style
    pub visible: bool,
    /// Current value for form controls
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementState {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// One browser tab bound to a single test
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to an absolute URL and wait for the load event.
    async fn visit(&self, url: &str) -> E2eResult<()>;

    async fn reload(&self) -> E2eResult<()>;

    async fn current_url(&self) -> E2eResult<String>;

    /// Every element currently matching the locator. Never waits.
    async fn query(&self, locator: &Locator) -> E2eResult<Vec<ElementState>>;

    /// Click the first element matching the locator. `force` skips the
    /// visibility requirement.
    async fn click(&self, locator: &Locator, force: bool) -> E2eResult<()>;

    /// Empty a form control.
    async fn clear(&self, locator: &Locator) -> E2eResult<()>;

    /// Type into a form control with real key events.
    async fn type_text(&self, locator: &Locator, text: &str) -> E2eResult<()>;

    async fn set_viewport(&self, width: u32, height: u32) -> E2eResult<()>;

    /// Write a PNG screenshot of the viewport.
    async fn screenshot(&self, path: &Path) -> E2eResult<()>;

    /// Answer matching requests with the rule's canned response from now on.
    async fn install_stub(&self, rule: &StubRule) -> E2eResult<()>;

    /// How many requests the stub with this alias has answered.
    fn stub_hits(&self, alias: &str) -> usize;

    /// Uncaught in-page exception messages captured since the last call.
    fn drain_exceptions(&self) -> Vec<String>;

    async fn close(&self) -> E2eResult<()>;
}

/// Opens an isolated driver per test attempt
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn Driver>>;

    async fn shutdown(&self) -> E2eResult<()>;
}
