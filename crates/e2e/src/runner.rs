//! Test runner: sessions, hooks, retries and result collection

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::{RunMode, SuiteConfig};
use crate::driver::DriverFactory;
use crate::error::{E2eError, E2eResult};
use crate::hooks::SuitePolicy;
use crate::intercept::StubRule;
use crate::session::Session;
use crate::spec::{SuiteSpec, TestStep};

/// A test body written in Rust
pub type TestFn = for<'a> fn(&'a Session) -> BoxFuture<'a, E2eResult<()>>;

#[derive(Clone)]
pub enum TestBody {
    Native(TestFn),
    Steps(Vec<TestStep>),
}

#[derive(Clone)]
pub struct TestCase {
    pub name: String,
    pub tags: Vec<String>,
    /// Exception patterns tolerated by this test only
    pub allow_exceptions: Vec<String>,
    pub body: TestBody,
}

impl TestCase {
    pub fn native(name: impl Into<String>, body: TestFn) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            allow_exceptions: Vec::new(),
            body: TestBody::Native(body),
        }
    }

    pub fn steps(name: impl Into<String>, steps: Vec<TestStep>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            allow_exceptions: Vec::new(),
            body: TestBody::Steps(steps),
        }
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    pub fn allowing(mut self, pattern: impl Into<String>) -> Self {
        self.allow_exceptions.push(pattern.into());
        self
    }
}

/// A named group of tests sharing setup
#[derive(Clone)]
pub struct Suite {
    pub name: String,
    pub tags: Vec<String>,
    pub allow_exceptions: Vec<String>,
    /// Stubs installed on top of the suite policy
    pub stubs: Vec<StubRule>,
    pub before_each: Option<TestBody>,
    pub cases: Vec<TestCase>,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            allow_exceptions: Vec::new(),
            stubs: Vec::new(),
            before_each: None,
            cases: Vec::new(),
        }
    }

    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }

    pub fn before_each(mut self, body: TestFn) -> Self {
        self.before_each = Some(TestBody::Native(body));
        self
    }

    pub fn allowing(mut self, pattern: impl Into<String>) -> Self {
        self.allow_exceptions.push(pattern.into());
        self
    }

    pub fn with_stub(mut self, rule: StubRule) -> Self {
        self.stubs.push(rule);
        self
    }

    pub fn case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// The policy one test of this suite runs under.
    pub fn policy_for(&self, base: &SuitePolicy, case: &TestCase) -> SuitePolicy {
        let mut policy = base.clone();
        for pattern in self.allow_exceptions.iter().chain(&case.allow_exceptions) {
            policy = policy.with_allowed(pattern.clone());
        }
        for rule in &self.stubs {
            policy = policy.with_stub(rule.clone());
        }
        policy
    }

    fn selects(&self, case: &TestCase, options: &RunnerConfig) -> bool {
        let tag_ok = options
            .tag
            .as_ref()
            .map_or(true, |tag| self.tags.iter().chain(&case.tags).any(|t| t == tag));
        let name_ok = options.name_filter.as_ref().map_or(true, |needle| {
            case.name.contains(needle.as_str()) || self.name.contains(needle.as_str())
        });
        tag_ok && name_ok
    }
}

impl From<SuiteSpec> for Suite {
    fn from(spec: SuiteSpec) -> Self {
        let before_each = (!spec.before_each.is_empty()).then(|| TestBody::Steps(spec.before_each));
        Self {
            name: spec.name,
            tags: spec.tags,
            allow_exceptions: spec.allow_exceptions,
            stubs: spec.stubs,
            before_each,
            cases: spec
                .tests
                .into_iter()
                .map(|t| TestCase {
                    name: t.name,
                    tags: t.tags,
                    allow_exceptions: Vec::new(),
                    body: TestBody::Steps(t.steps),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    /// Passed after at least one failed attempt
    Flaky,
    Failed,
}

/// One attempt of one test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt: u32,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
    /// Step that failed, for declarative tests
    pub failed_step: Option<String>,
    pub screenshot: Option<PathBuf>,
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub attempts: Vec<AttemptResult>,
    pub error: Option<String>,
}

impl TestResult {
    pub fn success(&self) -> bool {
        self.status != TestStatus::Failed
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub title: String,
    pub base_url: String,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub flaky: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Run options
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    pub mode: RunMode,
    /// Only tests carrying this tag (on the test or its suite)
    pub tag: Option<String>,
    /// Only tests whose name or suite name contains this
    pub name_filter: Option<String>,
}

pub struct TestRunner {
    config: Arc<SuiteConfig>,
    factory: Arc<dyn DriverFactory>,
    policy: SuitePolicy,
    options: RunnerConfig,
}

impl TestRunner {
    pub fn new(config: SuiteConfig, factory: Arc<dyn DriverFactory>, policy: SuitePolicy, options: RunnerConfig) -> Self {
        Self {
            config: Arc::new(config),
            factory,
            policy,
            options,
        }
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Run every selected test of every suite, sequentially.
    pub async fn run(&self, suites: &[Suite]) -> E2eResult<TestSuiteResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let retries = self.config.retries_for(self.options.mode);
        let mut results = Vec::new();
        let mut skipped = 0;

        let selected: usize = suites
            .iter()
            .map(|s| s.cases.iter().filter(|c| s.selects(c, &self.options)).count())
            .sum();
        if selected == 0 {
            let filter = self
                .options
                .name_filter
                .clone()
                .or_else(|| self.options.tag.clone())
                .unwrap_or_default();
            return Err(E2eError::TestNotFound(filter));
        }

        info!("Running {} test(s) against {} (retries: {})", selected, self.config.base_url, retries);

        for suite in suites {
            let cases: Vec<&TestCase> = suite.cases.iter().filter(|c| suite.selects(c, &self.options)).collect();
            skipped += suite.cases.len() - cases.len();
            if cases.is_empty() {
                continue;
            }

            info!("▶ {} ({} test(s))", suite.name, cases.len());
            for case in cases {
                let result = self.run_case(suite, case, retries).await;
                match result.status {
                    TestStatus::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                    TestStatus::Flaky => warn!(
                        "~ {} passed on attempt {} ({} ms)",
                        result.name,
                        result.attempts.len(),
                        result.duration_ms
                    ),
                    TestStatus::Failed => error!(
                        "✗ {} - {}",
                        result.name,
                        result.error.as_deref().unwrap_or("unknown error")
                    ),
                }
                results.push(result);
            }
            info!("■ {}", suite.name);
        }

        let count = |status| results.iter().filter(|r: &&TestResult| r.status == status).count();
        let (passed, flaky, failed) = (
            count(TestStatus::Passed),
            count(TestStatus::Flaky),
            count(TestStatus::Failed),
        );
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} flaky, {} failed, {} skipped ({} ms)",
            passed, flaky, failed, skipped, duration_ms
        );

        Ok(TestSuiteResult {
            title: self.config.report_title.clone(),
            base_url: self.config.base_url.clone(),
            started_at,
            total: results.len(),
            passed,
            flaky,
            failed,
            skipped,
            duration_ms,
            results,
        })
    }

    /// Run one test with whole-test retries.
    pub async fn run_case(&self, suite: &Suite, case: &TestCase, retries: u32) -> TestResult {
        let start = Instant::now();
        let policy = suite.policy_for(&self.policy, case);
        let mut attempts = Vec::new();

        for attempt in 1..=retries + 1 {
            let outcome = self.run_attempt(suite, case, &policy, attempt).await;
            let success = outcome.success;
            attempts.push(outcome);
            if success {
                break;
            }
            if attempt <= retries {
                warn!(test = %case.name, attempt, "Attempt failed, retrying");
            }
        }

        let passed_on = attempts.iter().position(|a| a.success);
        let status = match passed_on {
            Some(0) => TestStatus::Passed,
            Some(_) => TestStatus::Flaky,
            None => TestStatus::Failed,
        };
        let error = match status {
            TestStatus::Failed => attempts.last().and_then(|a| a.error.clone()),
            _ => None,
        };

        TestResult {
            suite: suite.name.clone(),
            name: case.name.clone(),
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            attempts,
            error,
        }
    }

    async fn run_attempt(&self, suite: &Suite, case: &TestCase, policy: &SuitePolicy, attempt: u32) -> AttemptResult {
        let start = Instant::now();
        debug!(suite = %suite.name, test = %case.name, attempt, "Starting attempt");

        let driver = match self.factory.open().await {
            Ok(driver) => driver,
            Err(e) => {
                return AttemptResult {
                    attempt,
                    success: false,
                    duration_ms: start.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                    failed_step: None,
                    screenshot: None,
                }
            }
        };
        let session = Session::new(driver, self.config.clone(), policy.clone());

        let outcome = match policy.apply(&session).await {
            Ok(()) => self.run_bodies(suite, case, &session).await,
            Err(e) => Err((Some("apply suite policy".to_string()), e)),
        };
        // Exceptions raised after the last checked step still fail the attempt
        let outcome = outcome.and_then(|()| session.check_exceptions().map_err(|e| (None, e)));

        let (error, failed_step, screenshot) = match outcome {
            Ok(()) => (None, None, None),
            Err((step, e)) => {
                if !e.is_assertion() {
                    warn!(test = %case.name, attempt, "Attempt aborted by harness error: {}", e);
                }
                let screenshot = if self.config.screenshot_on_failure {
                    self.capture_failure(&session, suite, case, attempt).await
                } else {
                    None
                };
                (Some(e.to_string()), step, screenshot)
            }
        };

        if let Err(e) = session.close().await {
            warn!("Failed to close session: {}", e);
        }

        AttemptResult {
            attempt,
            success: error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            error,
            failed_step,
            screenshot,
        }
    }

    async fn run_bodies(&self, suite: &Suite, case: &TestCase, session: &Session) -> Result<(), (Option<String>, E2eError)> {
        if let Some(before) = &suite.before_each {
            run_body(before, session).await?;
        }
        run_body(&case.body, session).await
    }

    async fn capture_failure(&self, session: &Session, suite: &Suite, case: &TestCase, attempt: u32) -> Option<PathBuf> {
        let name = format!("{}-failed-attempt-{}", slug(&case.name), attempt);
        let name = hrm_common::screenshot_name(&name, Some(&slug(&suite.name)), Utc::now().timestamp_millis());
        match session.capture(&name).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failure screenshot not captured: {}", e);
                None
            }
        }
    }
}

async fn run_body(body: &TestBody, session: &Session) -> Result<(), (Option<String>, E2eError)> {
    match body {
        TestBody::Native(f) => f(session).await.map_err(|e| (None, e)),
        TestBody::Steps(steps) => {
            for (index, step) in steps.iter().enumerate() {
                debug!(step = index + 1, "{}", step);
                step.execute(session)
                    .await
                    .map_err(|e| (Some(format!("#{} {}", index + 1, step)), e))?;
            }
            Ok(())
        }
    }
}

/// File-system friendly form of a test or suite name.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::HrmCommands;
    use crate::driver::fake::{FakeDriver, FakeElement, FakeFactory};
    use crate::hooks::LEAVE_PERIODS_ALIAS;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn runner(factory: Arc<FakeFactory>, dir: &std::path::Path, options: RunnerConfig) -> TestRunner {
        let mut config = SuiteConfig::default();
        config.screenshots_dir = dir.join("screenshots");
        config.reports_dir = dir.join("reports");
        TestRunner::new(config, factory, SuitePolicy::standard().unwrap(), options)
    }

    fn passes(_: &Session) -> BoxFuture<'_, E2eResult<()>> {
        async { Ok(()) }.boxed()
    }

    fn fails(_: &Session) -> BoxFuture<'_, E2eResult<()>> {
        async { Err(E2eError::AssertionFailed("breadcrumb missing".into())) }.boxed()
    }

    static FLAKY_CALLS: AtomicU32 = AtomicU32::new(0);

    fn fails_once(_: &Session) -> BoxFuture<'_, E2eResult<()>> {
        async {
            if FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(E2eError::AssertionFailed("first attempt".into()))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_pass_fail_and_flaky() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(FakeDriver::new));
        let suite = Suite::new("Auth")
            .case(TestCase::native("passes", passes))
            .case(TestCase::native("fails", fails))
            .case(TestCase::native("flaky", fails_once));

        let result = runner(factory.clone(), dir.path(), RunnerConfig::default())
            .run(&[suite])
            .await
            .unwrap();

        assert_eq!((result.passed, result.failed, result.flaky), (1, 1, 1));
        assert!(!result.success());
        let failed = &result.results[1];
        assert_eq!(failed.attempts.len(), 2);
        assert_eq!(failed.error.as_deref(), Some("Assertion failed: breadcrumb missing"));
        assert_eq!(result.results[2].status, TestStatus::Flaky);

        // One fresh driver per attempt: 1 + 2 + 2
        let opened = factory.opened();
        assert_eq!(opened.len(), 5);
        assert!(opened.iter().all(|d| d.is_closed()));
        assert!(opened
            .iter()
            .all(|d| d.installed_stubs() == vec![LEAVE_PERIODS_ALIAS.to_string()]));
    }

    fn ends_with_screenshot(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
        async move { session.screenshot_with_timestamp("end").await.map(|_| ()) }.boxed()
    }

    fn reads_url(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
        async move { session.current_url().await.map(|_| ()) }.boxed()
    }

    #[tokio::test]
    async fn test_unknown_exception_before_final_screenshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(|| {
            let driver = FakeDriver::new();
            driver.throw("ReferenceError: hrmApp is not defined");
            driver
        }));
        let suite = Suite::new("Dashboard").case(TestCase::native("ends on screenshot", ends_with_screenshot));

        let result = runner(factory, dir.path(), RunnerConfig::default())
            .run(&[suite])
            .await
            .unwrap();
        let test = &result.results[0];
        assert_eq!(test.status, TestStatus::Failed);
        assert!(test.error.as_deref().unwrap().contains("hrmApp"));
    }

    #[tokio::test]
    async fn test_exception_after_last_step_fails_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(|| {
            let driver = FakeDriver::new();
            driver.on_url_read(|view| view.throw("ReferenceError: hrmApp is not defined"));
            driver
        }));
        let suite = Suite::new("Dashboard").case(TestCase::native("reads url", reads_url));

        let result = runner(factory.clone(), dir.path(), RunnerConfig::default())
            .run(&[suite])
            .await
            .unwrap();
        let test = &result.results[0];
        assert_eq!(test.status, TestStatus::Failed);
        assert_eq!(test.attempts.len(), 2);
        assert!(test.attempts.iter().all(|a| a.failed_step.is_none() && a.screenshot.is_some()));
        assert!(test.error.as_deref().unwrap().contains("hrmApp"));

        // Same body on a quiet page passes
        let quiet = Arc::new(FakeFactory::new(FakeDriver::new));
        let suite = Suite::new("Dashboard").case(TestCase::native("reads url", reads_url));
        let result = runner(quiet, dir.path(), RunnerConfig::default()).run(&[suite]).await.unwrap();
        assert_eq!(result.results[0].status, TestStatus::Passed);
    }

    #[tokio::test]
    async fn test_open_mode_does_not_retry() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(FakeDriver::new));
        let options = RunnerConfig {
            mode: RunMode::Open,
            ..Default::default()
        };
        let suite = Suite::new("Auth").case(TestCase::native("fails", fails));

        let result = runner(factory.clone(), dir.path(), options).run(&[suite]).await.unwrap();
        assert_eq!(result.results[0].attempts.len(), 1);
        assert_eq!(factory.opened().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_screenshot_is_captured() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(FakeDriver::new));
        let suite = Suite::new("Dashboard - Overview").case(TestCase::native("should show widgets", fails));

        let result = runner(factory, dir.path(), RunnerConfig::default())
            .run(&[suite])
            .await
            .unwrap();

        let shot = result.results[0].attempts[0].screenshot.clone().unwrap();
        assert!(shot.exists());
        assert!(shot.starts_with(dir.path().join("screenshots/dashboard-overview")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_step_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(|| {
            let driver = FakeDriver::new();
            driver.add(FakeElement::new(".oxd-topbar-body-nav").text("Apply"));
            driver
        }));
        let steps: Vec<TestStep> = serde_yaml::from_str(
            r#"
- { action: assert, selector: .oxd-topbar-body-nav, text_contains: Apply }
- { action: assert, selector: .oxd-table, visible: true }
"#,
        )
        .unwrap();
        let suite = Suite::new("Leave").case(TestCase::steps("list", steps));

        let result = runner(factory, dir.path(), RunnerConfig::default())
            .run(&[suite])
            .await
            .unwrap();
        let attempt = &result.results[0].attempts[0];
        assert_eq!(attempt.failed_step.as_deref(), Some("#2 assert .oxd-table"));
    }

    #[tokio::test]
    async fn test_tag_and_name_filters() {
        let dir = tempfile::tempdir().unwrap();
        let factory = Arc::new(FakeFactory::new(FakeDriver::new));
        let suites = [
            Suite::new("Auth")
                .tagged(&["auth"])
                .case(TestCase::native("login ok", passes))
                .case(TestCase::native("logout ok", passes).tagged(&["smoke"])),
            Suite::new("PIM").case(TestCase::native("list", passes)),
        ];

        let by_tag = RunnerConfig {
            tag: Some("smoke".into()),
            ..Default::default()
        };
        let result = runner(factory.clone(), dir.path(), by_tag).run(&suites).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.skipped, 2);

        let by_name = RunnerConfig {
            name_filter: Some("Auth".into()),
            ..Default::default()
        };
        let result = runner(factory.clone(), dir.path(), by_name).run(&suites).await.unwrap();
        assert_eq!(result.total, 2);

        let none = RunnerConfig {
            tag: Some("admin".into()),
            ..Default::default()
        };
        let err = runner(factory, dir.path(), none).run(&suites).await.unwrap_err();
        assert!(matches!(err, E2eError::TestNotFound(_)));
    }

    #[test]
    fn test_policy_for_layers_local_overrides() {
        let base = SuitePolicy::standard().unwrap();
        let suite = Suite::new("Logout").allowing("ChunkLoadError");
        let case = TestCase::native("t", passes).allowing("NetworkError");

        let policy = suite.policy_for(&base, &case);
        assert!(policy.exceptions.allowed.contains(&"ChunkLoadError".to_string()));
        assert!(policy.exceptions.allowed.contains(&"NetworkError".to_string()));
        assert!(!base.exceptions.allowed.contains(&"ChunkLoadError".to_string()));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Authentication - Login Flow"), "authentication-login-flow");
        assert_eq!(slug("should add (new) employee!"), "should-add-new-employee");
    }
}
