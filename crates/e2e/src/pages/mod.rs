//! Page objects
//!
//! Each page borrows the [`Session`] of the running test and owns a private
//! table of selectors. Shared behaviour comes from small capability traits
//! rather than a base page.

use async_trait::async_trait;

use crate::commands::{LOADING_SPINNER, SPINNER_TIMEOUT};
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::session::Session;

pub mod dashboard;
pub mod leave;
pub mod login;
pub mod pim;

pub use dashboard::DashboardPage;
pub use leave::{LeavePage, LeaveTab};
pub use login::LoginPage;
pub use pim::PimPage;

/// A routable screen of the application
#[async_trait]
pub trait Screen: Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Route relative to the base URL
    fn route(&self) -> &'static str;

    fn session(&self) -> &Session;

    async fn visit(&self) -> E2eResult<()> {
        tracing::debug!(page = self.name(), "visit");
        self.session().visit(self.route()).await
    }
}

/// Screens that show the global loading spinner while fetching
#[async_trait]
pub trait HasLoadingIndicator: Screen {
    async fn wait_for_load(&self) -> E2eResult<()> {
        self.session()
            .should_not_exist_within(LOADING_SPINNER, SPINNER_TIMEOUT)
            .await
    }
}

/// Screens with a primary form submit button
#[async_trait]
pub trait HasSubmitAction: Screen {
    fn submit_button(&self) -> Locator {
        Locator::css("button[type=\"submit\"]")
    }

    async fn submit(&self) -> E2eResult<()> {
        self.session().click(self.submit_button()).await
    }
}
