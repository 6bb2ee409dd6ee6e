//! Declarative YAML suites
//!
//! A spec file describes one suite: optional suite-local exception patterns
//! and stubs, `before_each` steps, and named tests made of steps. Steps map
//! one-to-one onto [`Session`] primitives and [`HrmCommands`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::commands::HrmCommands;
use crate::error::{E2eError, E2eResult};
use crate::intercept::StubRule;
use crate::locator::Locator;
use crate::session::Session;

/// A suite parsed from one YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSpec {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags applied to every test of the suite
    #[serde(default)]
    pub tags: Vec<String>,

    /// Extra exception patterns tolerated by this suite only
    #[serde(default)]
    pub allow_exceptions: Vec<String>,

    /// Extra stubs for this suite, installed before `before_each`
    #[serde(default)]
    pub stubs: Vec<StubRule>,

    #[serde(default)]
    pub before_each: Vec<TestStep>,

    pub tests: Vec<CaseSpec>,

    /// File the suite was loaded from
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseSpec {
    pub name: String,

    #[serde(default)]
    pub tags: Vec<String>,

    pub steps: Vec<TestStep>,
}

/// Element target as written in YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub selector: String,

    /// Keep matches whose text contains this
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,

    /// Selector of the enclosing element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub within: Option<String>,
}

impl From<&Target> for Locator {
    fn from(target: &Target) -> Self {
        let mut locator = Locator::css(target.selector.as_str());
        if let Some(text) = &target.contains {
            locator = locator.with_text(text.as_str());
        }
        if let Some(index) = target.index {
            locator = locator.nth(index);
        }
        if let Some(parent) = &target.within {
            locator = locator.within(Locator::css(parent.as_str()));
        }
        locator
    }
}

/// A single step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a route (relative to the base URL)
    Visit { url: String },

    Reload,

    Click {
        #[serde(flatten)]
        target: Target,
        /// Skip the visibility requirement
        #[serde(default)]
        force: bool,
    },

    /// Replace the value of an input
    Fill {
        #[serde(flatten)]
        target: Target,
        value: String,
    },

    /// Type without clearing first
    Type {
        #[serde(flatten)]
        target: Target,
        text: String,
    },

    /// Assert on the element(s) matching a target
    Assert {
        #[serde(flatten)]
        target: Target,
        #[serde(default)]
        visible: Option<bool>,
        #[serde(default)]
        exists: Option<bool>,
        #[serde(default)]
        text_contains: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        attribute: Option<AttributeAssertion>,
        #[serde(default)]
        min_count: Option<usize>,
    },

    AssertUrl {
        #[serde(default)]
        contains: Option<String>,
        #[serde(default)]
        not_contains: Option<String>,
    },

    /// Fixed delay (use sparingly)
    Sleep { ms: u64 },

    Viewport { width: u32, height: u32 },

    Screenshot {
        name: String,
        /// Append a millisecond timestamp to the name
        #[serde(default)]
        timestamped: bool,
    },

    Log { message: String },

    Login {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },

    Logout,

    NavigateToMenu { name: String },

    WaitForPageLoad,

    FillByPlaceholder { placeholder: String, value: String },

    VerifyToast { message: String },

    /// Install a stub for the rest of the test
    Intercept { stub: StubRule },

    /// Wait for the next request answered by a stub
    WaitForStub {
        alias: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAssertion {
    pub name: String,
    pub value: String,
}

impl fmt::Display for TestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStep::Visit { url } => write!(f, "visit {}", url),
            TestStep::Reload => write!(f, "reload"),
            TestStep::Click { target, force } => {
                write!(f, "click {}{}", Locator::from(target), if *force { " (force)" } else { "" })
            }
            TestStep::Fill { target, .. } => write!(f, "fill {}", Locator::from(target)),
            TestStep::Type { target, .. } => write!(f, "type into {}", Locator::from(target)),
            TestStep::Assert { target, .. } => write!(f, "assert {}", Locator::from(target)),
            TestStep::AssertUrl { contains, not_contains } => match (contains, not_contains) {
                (Some(c), _) => write!(f, "assert url includes {}", c),
                (None, Some(n)) => write!(f, "assert url excludes {}", n),
                (None, None) => write!(f, "assert url"),
            },
            TestStep::Sleep { ms } => write!(f, "sleep {} ms", ms),
            TestStep::Viewport { width, height } => write!(f, "viewport {}x{}", width, height),
            TestStep::Screenshot { name, .. } => write!(f, "screenshot {}", name),
            TestStep::Log { message } => write!(f, "log {}", message),
            TestStep::Login { username, .. } => {
                write!(f, "login as {}", username.as_deref().unwrap_or("<default>"))
            }
            TestStep::Logout => write!(f, "logout"),
            TestStep::NavigateToMenu { name } => write!(f, "navigate to {}", name),
            TestStep::WaitForPageLoad => write!(f, "wait for page load"),
            TestStep::FillByPlaceholder { placeholder, .. } => write!(f, "fill [{}]", placeholder),
            TestStep::VerifyToast { message } => write!(f, "verify toast {}", message),
            TestStep::Intercept { stub } => write!(f, "intercept {} {} as @{}", stub.method.as_str(), stub.url, stub.alias),
            TestStep::WaitForStub { alias, .. } => write!(f, "wait for @{}", alias),
        }
    }
}

impl TestStep {
    /// Run the step against a live session.
    pub async fn execute(&self, session: &Session) -> E2eResult<()> {
        match self {
            TestStep::Visit { url } => session.visit(url).await,
            TestStep::Reload => session.reload().await,
            TestStep::Click { target, force } => {
                if *force {
                    session.click_force(target).await
                } else {
                    session.click(target).await
                }
            }
            TestStep::Fill { target, value } => session.clear_and_type(target, value).await,
            TestStep::Type { target, text } => session.type_into(target, text).await,
            TestStep::Assert {
                target,
                visible,
                exists,
                text_contains,
                value,
                attribute,
                min_count,
            } => {
                match exists {
                    Some(false) => return session.should_not_exist(target).await,
                    Some(true) => {
                        session.should_exist(target).await?;
                    }
                    None => {}
                }
                match visible {
                    Some(true) => {
                        session.should_be_visible(target).await?;
                    }
                    Some(false) => session.should_not_be_visible(target).await?,
                    None => {}
                }
                if let Some(text) = text_contains {
                    session.should_contain_text(target, text).await?;
                }
                if let Some(value) = value {
                    session.should_have_value(target, value).await?;
                }
                if let Some(attr) = attribute {
                    session.should_have_attr(target, &attr.name, &attr.value).await?;
                }
                if let Some(min) = min_count {
                    session.should_have_count_at_least(target, *min).await?;
                }
                Ok(())
            }
            TestStep::AssertUrl { contains, not_contains } => {
                if let Some(fragment) = contains {
                    session.url_should_include(fragment).await?;
                }
                if let Some(fragment) = not_contains {
                    session.url_should_not_include(fragment).await?;
                }
                Ok(())
            }
            TestStep::Sleep { ms } => session.sleep(Duration::from_millis(*ms)).await,
            TestStep::Viewport { width, height } => session.set_viewport(*width, *height).await,
            TestStep::Screenshot { name, timestamped } => {
                if *timestamped {
                    session.screenshot_with_timestamp(name).await?;
                } else {
                    session.screenshot(name).await?;
                }
                Ok(())
            }
            TestStep::Log { message } => {
                hrm_common::utils::log_step(message);
                Ok(())
            }
            TestStep::Login { username, password } => {
                session.login(username.as_deref(), password.as_deref()).await
            }
            TestStep::Logout => session.logout().await,
            TestStep::NavigateToMenu { name } => session.navigate_to_menu(name).await,
            TestStep::WaitForPageLoad => session.wait_for_page_load().await,
            TestStep::FillByPlaceholder { placeholder, value } => {
                session.fill_by_placeholder(placeholder, value).await
            }
            TestStep::VerifyToast { message } => session.verify_toast(message).await,
            TestStep::Intercept { stub } => session.intercept(stub).await,
            TestStep::WaitForStub { alias, timeout_ms } => match timeout_ms {
                Some(ms) => session.wait_for_stub_within(alias, Duration::from_millis(*ms)).await,
                None => session.wait_for_stub(alias).await,
            },
        }
    }
}

impl SuiteSpec {
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml).map_err(E2eError::from)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut spec = Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))?;
        spec.source = Some(path.to_path_buf());
        Ok(spec)
    }

    /// Load every file under `dir` whose name ends with `suffix`, in path order.
    pub fn load_all(dir: &Path, suffix: &str) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        let specs = paths
            .iter()
            .map(|p| Self::from_file(p))
            .collect::<E2eResult<Vec<_>>>()?;
        info!("Loaded {} spec file(s) from {}", specs.len(), dir.display());
        Ok(specs)
    }

    /// Suites with at least one test carrying `tag`, trimmed to those tests.
    pub fn filter_by_tag(specs: &[Self], tag: &str) -> Vec<Self> {
        specs
            .iter()
            .filter_map(|suite| {
                let tests: Vec<CaseSpec> = suite
                    .tests
                    .iter()
                    .filter(|t| suite.tags.iter().chain(&t.tags).any(|x| x == tag))
                    .cloned()
                    .collect();
                (!tests.is_empty()).then(|| Self { tests, ..suite.clone() })
            })
            .collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.tests.is_empty() {
            return Err(E2eError::SpecParse(format!("suite '{}' has no tests", self.name)));
        }
        let mut seen = std::collections::HashSet::new();
        for test in &self.tests {
            if !seen.insert(test.name.as_str()) {
                return Err(E2eError::SpecParse(format!(
                    "suite '{}' has duplicate test '{}'",
                    self.name, test.name
                )));
            }
        }
        Ok(())
    }
}
