//! Built-in suites
//!
//! Authentication, dashboard, PIM and leave scenarios are written in Rust
//! against the page objects. Admin scenarios live as declarative files under
//! the configured spec root and are loaded by [`load`].

use crate::config::SuiteConfig;
use crate::error::E2eResult;
use crate::runner::Suite;
use crate::spec::SuiteSpec;

pub mod auth;
pub mod dashboard;
pub mod leave;
pub mod pim;

/// The native suites, in run order.
pub fn native() -> E2eResult<Vec<Suite>> {
    Ok(vec![
        auth::login_suite(),
        auth::logout_suite(),
        dashboard::suite(),
        pim::suite(),
        leave::suite()?,
    ])
}

/// Native suites followed by every declarative suite under the spec root.
pub fn load(config: &SuiteConfig) -> E2eResult<Vec<Suite>> {
    let mut suites = native()?;
    let specs = SuiteSpec::load_all(&config.spec_root, &config.spec_suffix)?;
    suites.extend(specs.into_iter().map(Suite::from));
    Ok(suites)
}
