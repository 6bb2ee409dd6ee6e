//! OrangeHRM E2E Test Framework
//!
//! This crate drives a Chromium browser over the DevTools protocol against a
//! running OrangeHRM instance and:
//! - Wraps every test in a fresh browser session with suite-wide stubs and an
//!   uncaught-exception allow-list
//! - Exposes retrying assertions, custom login/navigation commands and page objects
//! - Runs native Rust suites and declarative YAML suites side by side
//! - Retries whole tests, captures failure screenshots and writes JSON/HTML reports
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── DriverFactory::open() -> Box<dyn Driver>   (per try) │
//! │    ├── SuitePolicy::apply(session)   stubs + exceptions     │
//! │    ├── before_each, body  (TestFn | [TestStep])             │
//! │    └── screenshot on failure, retry, TestResult             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session                                                    │
//! │    ├── primitives: visit, click, type_into, screenshot      │
//! │    ├── should_*: polled until WaitPolicy timeout            │
//! │    └── HrmCommands: login, logout, navigate_to_menu, ...    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pages: Login, Dashboard, Pim, Leave                        │
//! │  SuiteSpec (YAML): name, tags, stubs, before_each, tests    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod hooks;
pub mod intercept;
pub mod locator;
pub mod pages;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod session;
pub mod spec;
pub mod suites;
pub mod wait;

pub use commands::HrmCommands;
pub use config::{RunMode, SuiteConfig};
pub use driver::{CdpBrowser, Driver, DriverFactory, LaunchOptions};
pub use error::{E2eError, E2eResult};
pub use hooks::SuitePolicy;
pub use locator::Locator;
pub use preflight::Preflight;
pub use runner::{RunnerConfig, Suite, TestCase, TestRunner, TestSuiteResult};
pub use session::Session;
pub use spec::{SuiteSpec, TestStep};
