//! Chromium driver over the DevTools protocol

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FulfillRequestParams, HeaderEntry, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::{EnableParams as RuntimeEnableParams, EventExceptionThrown};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Driver, DriverFactory, ElementState};
use crate::config::{RunMode, SuiteConfig, Viewport};
use crate::error::{E2eError, E2eResult};
use crate::intercept::StubRule;
use crate::locator::Locator;

/// Attribute used to hand a resolved element from page JS to the protocol
const TARGET_ATTR: &str = "data-hrm-target";

/// Resolves a locator spec (`LOC`) to an element array (`found`).
const RESOLVE_JS: &str = r#"
  const resolve = (loc) => {
    const roots = loc.scope ? resolve(loc.scope) : [document];
    let found = [];
    for (const root of roots) {
      for (const el of root.querySelectorAll(loc.css)) {
        if (!found.includes(el)) found.push(el);
      }
    }
    if (loc.text != null) {
      found = found.filter((el) => (el.textContent || '').includes(loc.text));
    }
    if (loc.index != null) {
      found = found[loc.index] ? [found[loc.index]] : [];
    }
    return found;
  };
  const isVisible = (el) => {
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
      && style.visibility !== 'hidden' && style.display !== 'none';
  };
  const isField = (el) => el instanceof HTMLInputElement
    || el instanceof HTMLTextAreaElement || el instanceof HTMLSelectElement;
  const found = resolve(LOC);
"#;

/// Browser launch options
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub viewport: Viewport,
    pub request_timeout: Duration,
    pub page_load_timeout: Duration,
    /// Chrome binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,
    /// Attach to a running browser instead of launching one
    pub remote_debugging_url: Option<String>,
}

impl LaunchOptions {
    pub fn from_config(config: &SuiteConfig, mode: RunMode) -> Self {
        Self {
            headless: mode == RunMode::Run,
            viewport: config.viewport,
            request_timeout: Duration::from_millis(config.timeouts.request_ms),
            page_load_timeout: config.page_load_timeout(),
            chrome_executable: None,
            remote_debugging_url: None,
        }
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::from_config(&SuiteConfig::default(), RunMode::Run)
    }
}

/// A launched (or attached) Chromium instance
pub struct CdpBrowser {
    browser: tokio::sync::Mutex<Browser>,
    handler: JoinHandle<()>,
    options: LaunchOptions,
}

impl CdpBrowser {
    pub async fn launch(options: LaunchOptions) -> E2eResult<Self> {
        let (browser, mut handler) = match &options.remote_debugging_url {
            Some(url) => {
                info!("Connecting to remote Chrome instance at {}", url);
                Browser::connect(url)
                    .await
                    .map_err(|e| E2eError::BrowserLaunch(format!("connect {}: {}", url, e)))?
            }
            None => {
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .window_size(options.viewport.width, options.viewport.height)
                    .request_timeout(options.request_timeout)
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage");
                if !options.headless {
                    builder = builder.with_head();
                }
                if let Some(path) = &options.chrome_executable {
                    builder = builder.chrome_executable(path);
                }
                let config = builder.build().map_err(E2eError::BrowserLaunch)?;

                info!(headless = options.headless, "Launching Chromium");
                Browser::launch(config)
                    .await
                    .map_err(|e| E2eError::BrowserLaunch(e.to_string()))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self {
            browser: tokio::sync::Mutex::new(browser),
            handler,
            options,
        })
    }
}

#[async_trait]
impl DriverFactory for CdpBrowser {
    async fn open(&self) -> E2eResult<Box<dyn Driver>> {
        let page = self.browser.lock().await.new_page("about:blank").await?;
        let driver = CdpDriver::attach(page, &self.options).await?;
        Ok(Box::new(driver))
    }

    async fn shutdown(&self) -> E2eResult<()> {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        let _ = browser.wait().await;
        self.handler.abort();
        Ok(())
    }
}

/// One tab, exclusively owned by a test attempt
pub struct CdpDriver {
    page: Page,
    page_load_timeout: Duration,
    exceptions: Arc<Mutex<Vec<String>>>,
    stubs: Arc<Mutex<Vec<StubRule>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
    intercepting: AtomicBool,
    next_target: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl CdpDriver {
    pub async fn attach(page: Page, options: &LaunchOptions) -> E2eResult<Self> {
        page.execute(ClearBrowserCookiesParams::default()).await?;
        page.execute(RuntimeEnableParams::default()).await?;

        let exceptions = Arc::new(Mutex::new(Vec::new()));
        let mut thrown = page.event_listener::<EventExceptionThrown>().await?;
        let sink = exceptions.clone();
        let listener = tokio::spawn(async move {
            while let Some(event) = thrown.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|obj| obj.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                debug!(%message, "Uncaught exception captured");
                sink.lock().push(message);
            }
        });

        let driver = Self {
            page,
            page_load_timeout: options.page_load_timeout,
            exceptions,
            stubs: Arc::new(Mutex::new(Vec::new())),
            hits: Arc::new(Mutex::new(HashMap::new())),
            intercepting: AtomicBool::new(false),
            next_target: AtomicU64::new(0),
            tasks: Mutex::new(vec![listener]),
        };
        driver
            .set_viewport(options.viewport.width, options.viewport.height)
            .await?;
        Ok(driver)
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> E2eResult<T> {
        let result = self.page.evaluate(script).await?;
        result
            .into_value::<T>()
            .map_err(|e| E2eError::Browser(format!("unexpected script result: {}", e)))
    }

    /// Tag the first element matching `locator` so the protocol can address it.
    async fn mark(&self, locator: &Locator, require_visible: bool) -> E2eResult<String> {
        let token = self.next_target.fetch_add(1, Ordering::Relaxed).to_string();
        let script = format!(
            r#"(() => {{
  const LOC = {loc};
  {resolve}
  const el = found[0];
  if (!el) return 'missing';
  if ({require_visible} && !isVisible(el)) return 'hidden';
  el.scrollIntoView({{ block: 'center', inline: 'center' }});
  el.setAttribute('{attr}', '{token}');
  return 'ok';
}})()"#,
            loc = serde_json::to_string(locator)?,
            resolve = RESOLVE_JS,
            require_visible = require_visible,
            attr = TARGET_ATTR,
            token = token,
        );

        match self.eval::<String>(script).await?.as_str() {
            "ok" => Ok(format!("[{}='{}']", TARGET_ATTR, token)),
            "hidden" => Err(E2eError::AssertionFailed(format!("{} is not visible", locator))),
            _ => Err(E2eError::AssertionFailed(format!("{} not found", locator))),
        }
    }

    async fn unmark(&self, selector: &str) {
        let script = format!(
            "document.querySelectorAll(\"{sel}\").forEach((el) => el.removeAttribute('{attr}'))",
            sel = selector.replace('"', "\\\""),
            attr = TARGET_ATTR,
        );
        // The click may already have navigated away.
        let _ = self.page.evaluate(script).await;
    }

    async fn enable_interception(&self) -> E2eResult<()> {
        let patterns: Vec<RequestPattern> = self
            .stubs
            .lock()
            .iter()
            .map(|rule| {
                RequestPattern::builder()
                    .url_pattern(rule.url.to_cdp_pattern())
                    .request_stage(RequestStage::Request)
                    .build()
            })
            .collect();

        if !self.intercepting.swap(true, Ordering::SeqCst) {
            let mut paused = self.page.event_listener::<EventRequestPaused>().await?;
            let page = self.page.clone();
            let stubs = self.stubs.clone();
            let hits = self.hits.clone();

            let task = tokio::spawn(async move {
                while let Some(event) = paused.next().await {
                    // Most recently installed rule wins
                    let rule = stubs
                        .lock()
                        .iter()
                        .rev()
                        .find(|r| r.matches(&event.request.method, &event.request.url))
                        .cloned();

                    let outcome = match rule {
                        Some(rule) => {
                            *hits.lock().entry(rule.alias.clone()).or_insert(0) += 1;
                            debug!(alias = %rule.alias, url = %event.request.url, "Stubbed request");
                            fulfill(&page, &event, &rule).await
                        }
                        None => page
                            .execute(ContinueRequestParams::new(event.request_id.clone()))
                            .await
                            .map(|_| ())
                            .map_err(E2eError::from),
                    };
                    if let Err(e) = outcome {
                        warn!(url = %event.request.url, "Interception failed: {}", e);
                    }
                }
            });
            self.tasks.lock().push(task);
        }

        self.page
            .execute(FetchEnableParams::builder().patterns(patterns).build())
            .await?;
        Ok(())
    }
}

async fn fulfill(page: &Page, event: &EventRequestPaused, rule: &StubRule) -> E2eResult<()> {
    let headers: Vec<HeaderEntry> = rule
        .response
        .headers
        .iter()
        .map(|(name, value)| HeaderEntry::new(name.clone(), value.clone()))
        .collect();

    let params = FulfillRequestParams::builder()
        .request_id(event.request_id.clone())
        .response_code(i64::from(rule.response.status))
        .response_headers(headers)
        .body(BASE64.encode(rule.response.body_bytes()))
        .build()
        .map_err(E2eError::Browser)?;

    page.execute(params).await?;
    Ok(())
}

#[derive(Deserialize)]
struct Location {
    href: String,
}

#[async_trait]
impl Driver for CdpDriver {
    async fn visit(&self, url: &str) -> E2eResult<()> {
        debug!(url, "visit");
        tokio::time::timeout(self.page_load_timeout, self.page.goto(url))
            .await
            .map_err(|_| E2eError::Timeout {
                what: format!("page load of {}", url),
                timeout_ms: self.page_load_timeout.as_millis() as u64,
                last: "load event not fired".to_string(),
            })??;
        Ok(())
    }

    async fn reload(&self) -> E2eResult<()> {
        self.page.reload().await?;
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let location: Location = self
            .eval("({ href: window.location.href })".to_string())
            .await?;
        Ok(location.href)
    }

    async fn query(&self, locator: &Locator) -> E2eResult<Vec<ElementState>> {
        let script = format!(
            r#"(() => {{
  const LOC = {loc};
  {resolve}
  return found.map((el) => ({{
    text: (el.textContent || '').replace(/\s+/g, ' ').trim(),
    visible: isVisible(el),
    value: isField(el) ? String(el.value) : null,
    attributes: Object.fromEntries(Array.from(el.attributes).map((a) => [a.name, a.value])),
  }}));
}})()"#,
            loc = serde_json::to_string(locator)?,
            resolve = RESOLVE_JS,
        );
        self.eval(script).await
    }

    async fn click(&self, locator: &Locator, force: bool) -> E2eResult<()> {
        let target = self.mark(locator, !force).await?;
        if force {
            let script = format!("document.querySelector(\"{}\").click()", target.replace('"', "\\\""));
            self.page.evaluate(script).await?;
        } else {
            self.page.find_element(target.as_str()).await?.click().await?;
        }
        self.unmark(&target).await;
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> E2eResult<()> {
        let target = self.mark(locator, true).await?;
        let script = format!(
            r#"(() => {{
  const el = document.querySelector("{sel}");
  el.focus();
  const setter = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value').set;
  setter.call(el, '');
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  el.dispatchEvent(new Event('change', {{ bubbles: true }}));
  return true;
}})()"#,
            sel = target.replace('"', "\\\""),
        );
        self.page.evaluate(script).await?;
        self.unmark(&target).await;
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        let target = self.mark(locator, true).await?;
        let element = self.page.find_element(target.as_str()).await?;
        element.focus().await?;
        element.type_str(text).await?;
        self.unmark(&target).await;
        Ok(())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> E2eResult<()> {
        let params = SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(1.0)
            .mobile(false)
            .build()
            .map_err(E2eError::Browser)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> E2eResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn install_stub(&self, rule: &StubRule) -> E2eResult<()> {
        {
            let mut stubs = self.stubs.lock();
            stubs.retain(|s| s.alias != rule.alias);
            stubs.push(rule.clone());
        }
        self.enable_interception().await
    }

    fn stub_hits(&self, alias: &str) -> usize {
        self.hits.lock().get(alias).copied().unwrap_or(0)
    }

    fn drain_exceptions(&self) -> Vec<String> {
        std::mem::take(&mut *self.exceptions.lock())
    }

    async fn close(&self) -> E2eResult<()> {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        self.page.clone().close().await?;
        Ok(())
    }
}

impl Drop for CdpDriver {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}
