//! Per-test browser session
//!
//! Wraps one [`Driver`] with the suite configuration, the wait policy and the
//! suite policy. Every query and assertion polls through the [`WaitPolicy`];
//! every primitive drains captured in-page exceptions before and after it runs
//! and fails the test on any exception the policy does not allow.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SuiteConfig;
use crate::driver::{Driver, ElementState};
use crate::error::{E2eError, E2eResult};
use crate::hooks::{ExceptionVerdict, SuitePolicy};
use crate::intercept::StubRule;
use crate::locator::Locator;
use crate::wait::{Check, WaitPolicy};

pub struct Session {
    driver: Box<dyn Driver>,
    config: Arc<SuiteConfig>,
    wait: WaitPolicy,
    policy: SuitePolicy,
    /// Stub hits already consumed by `wait_for_stub`, per alias
    awaited: Mutex<HashMap<String, usize>>,
}

impl Session {
    pub fn new(driver: Box<dyn Driver>, config: Arc<SuiteConfig>, policy: SuitePolicy) -> Self {
        let wait = WaitPolicy::new(config.command_timeout(), config.poll_interval());
        Self {
            driver,
            config,
            wait,
            policy,
            awaited: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(driver: impl Driver + 'static) -> Self {
        Self::new(
            Box::new(driver),
            Arc::new(SuiteConfig::default()),
            SuitePolicy::standard().expect("standard policy"),
        )
    }

    pub fn with_wait(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    pub fn policy(&self) -> &SuitePolicy {
        &self.policy
    }

    /// Apply the exception policy to everything captured since the last check.
    pub fn check_exceptions(&self) -> E2eResult<()> {
        for message in self.driver.drain_exceptions() {
            match self.policy.exceptions.verdict(&message) {
                ExceptionVerdict::Suppressed { pattern } => {
                    warn!(%pattern, %message, "Suppressed uncaught exception");
                }
                ExceptionVerdict::Fatal => return Err(E2eError::UncaughtException(message)),
            }
        }
        Ok(())
    }

    async fn guarded<T>(&self, action: impl Future<Output = E2eResult<T>>) -> E2eResult<T> {
        self.check_exceptions()?;
        let outcome = action.await;
        self.check_exceptions()?;
        outcome
    }

    async fn poll_locator<T>(
        &self,
        wait: WaitPolicy,
        locator: &Locator,
        what: &str,
        check: impl Fn(Vec<ElementState>) -> Check<T>,
    ) -> E2eResult<T> {
        let description = format!("{} {}", locator, what);
        self.guarded(wait.until(&description, || async {
            self.check_exceptions()?;
            let found = self.driver.query(locator).await?;
            Ok(check(found))
        }))
        .await
    }

    /// Navigate to an application route (or absolute URL).
    pub async fn visit(&self, route: &str) -> E2eResult<()> {
        let url = self.config.url_for(route);
        debug!(%url, "visit");
        self.guarded(self.driver.visit(&url)).await
    }

    pub async fn reload(&self) -> E2eResult<()> {
        self.guarded(self.driver.reload()).await
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        self.driver.current_url().await
    }

    /// Wait until at least one element matches.
    pub async fn should_exist(&self, locator: impl Into<Locator>) -> E2eResult<Vec<ElementState>> {
        self.poll_locator(self.wait, &locator.into(), "to exist", |found| {
            if found.is_empty() {
                Check::fail("no matching element")
            } else {
                Check::Pass(found)
            }
        })
        .await
    }

    /// Wait until the first match is visible.
    pub async fn should_be_visible(&self, locator: impl Into<Locator>) -> E2eResult<ElementState> {
        self.poll_locator(self.wait, &locator.into(), "to be visible", first_visible)
            .await
    }

    /// Wait until nothing matches or the first match is hidden.
    pub async fn should_not_be_visible(&self, locator: impl Into<Locator>) -> E2eResult<()> {
        self.poll_locator(self.wait, &locator.into(), "to not be visible", |found| match found.first() {
            Some(el) if el.visible => Check::fail("element is visible"),
            _ => Check::Pass(()),
        })
        .await
    }

    /// Current matches, without waiting.
    pub async fn query_now(&self, locator: impl Into<Locator>) -> E2eResult<Vec<ElementState>> {
        let locator = locator.into();
        self.guarded(self.driver.query(&locator)).await
    }

    pub async fn should_not_exist(&self, locator: impl Into<Locator>) -> E2eResult<()> {
        self.should_not_exist_within(locator, self.wait.timeout).await
    }

    /// `should_not_exist` with its own budget.
    pub async fn should_not_exist_within(&self, locator: impl Into<Locator>, timeout: Duration) -> E2eResult<()> {
        self.poll_locator(self.wait.with_timeout(timeout), &locator.into(), "to not exist", |found| {
            if found.is_empty() {
                Check::Pass(())
            } else {
                Check::fail(format!("{} element(s) still present", found.len()))
            }
        })
        .await
    }

    /// Wait until some match contains `text`.
    pub async fn should_contain_text(&self, locator: impl Into<Locator>, text: &str) -> E2eResult<()> {
        let what = format!("to contain text {:?}", text);
        self.poll_locator(self.wait, &locator.into(), &what, |found| {
            if found.iter().any(|el| el.text.contains(text)) {
                Check::Pass(())
            } else if found.is_empty() {
                Check::fail("no matching element")
            } else {
                Check::fail(format!("text was {:?}", found[0].text))
            }
        })
        .await
    }

    pub async fn should_have_value(&self, locator: impl Into<Locator>, value: &str) -> E2eResult<()> {
        let what = format!("to have value {:?}", value);
        self.poll_locator(self.wait, &locator.into(), &what, |found| match found.first() {
            Some(el) if el.value.as_deref() == Some(value) => Check::Pass(()),
            Some(el) => Check::fail(format!("value was {:?}", el.value)),
            None => Check::fail("no matching element"),
        })
        .await
    }

    pub async fn should_have_attr(&self, locator: impl Into<Locator>, name: &str, value: &str) -> E2eResult<()> {
        let what = format!("to have {}={:?}", name, value);
        self.poll_locator(self.wait, &locator.into(), &what, |found| match found.first() {
            Some(el) if el.attr(name) == Some(value) => Check::Pass(()),
            Some(el) => Check::fail(format!("{} was {:?}", name, el.attr(name))),
            None => Check::fail("no matching element"),
        })
        .await
    }

    pub async fn should_have_count_at_least(&self, locator: impl Into<Locator>, min: usize) -> E2eResult<usize> {
        let what = format!("to match at least {} element(s)", min);
        self.poll_locator(self.wait, &locator.into(), &what, |found| {
            if found.len() >= min {
                Check::Pass(found.len())
            } else {
                Check::fail(format!("found {}", found.len()))
            }
        })
        .await
    }

    pub async fn url_should_include(&self, fragment: &str) -> E2eResult<String> {
        let what = format!("url to include {:?}", fragment);
        self.guarded(self.wait.until(&what, || async {
            self.check_exceptions()?;
            let url = self.driver.current_url().await?;
            Ok(if url.contains(fragment) {
                Check::Pass(url)
            } else {
                Check::fail(format!("url was {}", url))
            })
        }))
        .await
    }

    pub async fn url_should_not_include(&self, fragment: &str) -> E2eResult<()> {
        let what = format!("url to not include {:?}", fragment);
        self.guarded(self.wait.until(&what, || async {
            self.check_exceptions()?;
            let url = self.driver.current_url().await?;
            Ok(if url.contains(fragment) {
                Check::fail(format!("url was {}", url))
            } else {
                Check::Pass(())
            })
        }))
        .await
    }

    /// Click once the first match is visible.
    pub async fn click(&self, locator: impl Into<Locator>) -> E2eResult<()> {
        let locator = locator.into();
        self.poll_locator(self.wait, &locator, "to be clickable", first_visible)
            .await?;
        self.guarded(self.driver.click(&locator, false)).await
    }

    /// Click without the visibility requirement.
    pub async fn click_force(&self, locator: impl Into<Locator>) -> E2eResult<()> {
        let locator = locator.into();
        self.should_exist(locator.clone()).await?;
        self.guarded(self.driver.click(&locator, true)).await
    }

    pub async fn type_into(&self, locator: impl Into<Locator>, text: &str) -> E2eResult<()> {
        let locator = locator.into();
        self.poll_locator(self.wait, &locator, "to accept input", first_visible)
            .await?;
        self.guarded(self.driver.type_text(&locator, text)).await
    }

    pub async fn clear_and_type(&self, locator: impl Into<Locator>, text: &str) -> E2eResult<()> {
        let locator = locator.into();
        self.poll_locator(self.wait, &locator, "to accept input", first_visible)
            .await?;
        self.guarded(async {
            self.driver.clear(&locator).await?;
            self.driver.type_text(&locator, text).await
        })
        .await
    }

    pub async fn set_viewport(&self, width: u32, height: u32) -> E2eResult<()> {
        self.guarded(self.driver.set_viewport(width, height)).await
    }

    pub async fn sleep(&self, duration: Duration) -> E2eResult<()> {
        self.guarded(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }

    /// Capture `<screenshots_dir>/<name>.png`.
    pub async fn screenshot(&self, name: &str) -> E2eResult<PathBuf> {
        self.guarded(self.capture(name)).await
    }

    /// Screenshot without the exception checks, for failure evidence.
    pub(crate) async fn capture(&self, name: &str) -> E2eResult<PathBuf> {
        let path = self.config.screenshots_dir.join(format!("{}.png", name));
        self.driver.screenshot(&path).await?;
        debug!(path = %path.display(), "Screenshot saved");
        Ok(path)
    }

    pub async fn intercept(&self, rule: &StubRule) -> E2eResult<()> {
        self.guarded(self.driver.install_stub(rule)).await
    }

    /// Wait for the next request answered by the stub `alias`.
    pub async fn wait_for_stub(&self, alias: &str) -> E2eResult<()> {
        let timeout = Duration::from_millis(self.config.timeouts.request_ms);
        self.wait_for_stub_within(alias, timeout).await
    }

    pub async fn wait_for_stub_within(&self, alias: &str, timeout: Duration) -> E2eResult<()> {
        let consumed = self.awaited.lock().get(alias).copied().unwrap_or(0);
        let wait = self.wait.with_timeout(timeout);
        let what = format!("request to @{}", alias);

        self.guarded(wait.until(&what, || async {
            self.check_exceptions()?;
            Ok(if self.driver.stub_hits(alias) > consumed {
                Check::Pass(())
            } else {
                Check::fail("no matching request yet")
            })
        }))
        .await?;

        self.awaited.lock().insert(alias.to_string(), consumed + 1);
        Ok(())
    }

    pub async fn close(&self) -> E2eResult<()> {
        self.driver.close().await
    }
}

fn first_visible(found: Vec<ElementState>) -> Check<ElementState> {
    match found.into_iter().next() {
        Some(el) if el.visible => Check::Pass(el),
        Some(_) => Check::fail("element is hidden"),
        None => Check::fail("no matching element"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakeElement};
    use crate::intercept::{HttpMethod, StubResponse};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_should_not_exist_waits_for_element_to_vanish() {
        let driver = FakeDriver::new();
        driver.add(FakeElement::new(".oxd-loading-spinner").vanish_after(3));
        let session = Session::for_test(driver);

        let start = Instant::now();
        session.should_not_exist(".oxd-loading-spinner").await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_on_hidden_element_times_out() {
        let driver = FakeDriver::new();
        driver.add(FakeElement::new("button").hidden());
        let session = Session::for_test(driver.clone());

        let err = session.click("button").await.unwrap_err();
        assert!(matches!(err, E2eError::Timeout { ref last, .. } if last == "element is hidden"));
        assert!(driver.clicks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_and_type_replaces_value() {
        let driver = FakeDriver::new();
        let input = driver.add(FakeElement::input("input[name=\"username\"]").value("stale"));
        let session = Session::for_test(driver.clone());

        session.clear_and_type("input[name=\"username\"]", "Admin").await.unwrap();
        assert_eq!(driver.value_of(input).as_deref(), Some("Admin"));
        session.should_have_value("input[name=\"username\"]", "Admin").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_and_scope_filtering() {
        let driver = FakeDriver::new();
        let card = driver.add(FakeElement::new(".oxd-table-card").text("Paul Collings"));
        driver.add(FakeElement::new(".bi-trash").child_of(card));
        driver.add(FakeElement::new(".bi-trash"));
        let session = Session::for_test(driver);

        session
            .should_contain_text(".oxd-table-card", "Collings")
            .await
            .unwrap();
        let scoped = Locator::css(".oxd-table-card").first().find(".bi-trash");
        assert_eq!(session.should_have_count_at_least(scoped, 1).await.unwrap(), 1);
        assert_eq!(session.should_have_count_at_least(".bi-trash", 2).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowed_exception_is_suppressed() {
        let driver = FakeDriver::new();
        driver.add(FakeElement::new(".orangehrm-login-logo"));
        driver.throw("ResizeObserver loop completed with undelivered notifications.");
        let session = Session::for_test(driver);

        session.should_be_visible(".orangehrm-login-logo").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_exception_fails_next_primitive() {
        let driver = FakeDriver::new();
        driver.add(FakeElement::new(".orangehrm-login-logo"));
        let session = Session::for_test(driver.clone());

        session.visit("/web/index.php/auth/login").await.unwrap();
        driver.throw("ReferenceError: hrmApp is not defined");
        let err = session.should_be_visible(".orangehrm-login-logo").await.unwrap_err();
        assert!(matches!(err, E2eError::UncaughtException(ref m) if m.contains("hrmApp")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_screenshot_and_intercept_check_exceptions() {
        let driver = FakeDriver::new();
        let session = Session::for_test(driver.clone());

        driver.throw("ReferenceError: hrmApp is not defined");
        let err = session.screenshot("end").await.unwrap_err();
        assert!(matches!(err, E2eError::UncaughtException(_)));
        assert!(driver.screenshots().is_empty());

        driver.throw("TypeError: menu.items is not iterable");
        let rule = StubRule::new("users", HttpMethod::Get, "**/users", StubResponse::json(200, serde_json::json!([])))
            .unwrap();
        let err = session.intercept(&rule).await.unwrap_err();
        assert!(matches!(err, E2eError::UncaughtException(ref m) if m.contains("not iterable")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_stub_consumes_one_hit_per_wait() {
        let driver = FakeDriver::new();
        let session = Session::for_test(driver.clone());
        let rule = StubRule::new("users", HttpMethod::Get, "**/users", StubResponse::json(200, serde_json::json!([])))
            .unwrap();
        session.intercept(&rule).await.unwrap();

        driver.hit("users");
        session.wait_for_stub("users").await.unwrap();

        let err = session.wait_for_stub("users").await.unwrap_err();
        assert!(matches!(err, E2eError::Timeout { .. }));

        driver.hit("users");
        session.wait_for_stub("users").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_visit_resolves_route_against_base_url() {
        let driver = FakeDriver::new();
        let session = Session::for_test(driver.clone());
        session.visit("/web/index.php/pim/viewEmployeeList").await.unwrap();
        assert_eq!(
            driver.visits(),
            vec!["https://opensource-demo.orangehrmlive.com/web/index.php/pim/viewEmployeeList".to_string()]
        );
        session.url_should_include("/pim/").await.unwrap();
    }
}
