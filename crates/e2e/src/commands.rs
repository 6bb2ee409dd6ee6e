//! Application-specific commands layered on [`Session`]

use async_trait::async_trait;
use hrm_common::timestamped;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::error::E2eResult;
use crate::locator::Locator;
use crate::session::Session;

pub const LOGIN_ROUTE: &str = "/web/index.php/auth/login";
pub const LOGOUT_HREF: &str = "/web/index.php/auth/logout";

const USERNAME_INPUT: &str = "input[name=\"username\"]";
const PASSWORD_INPUT: &str = "input[name=\"password\"]";
const SUBMIT_BUTTON: &str = "button[type=\"submit\"]";
const BREADCRUMB: &str = ".oxd-topbar-header-breadcrumb";
const MAIN_MENU: &str = ".oxd-main-menu";
const MAIN_MENU_ITEM: &str = ".oxd-main-menu-item";
const USER_DROPDOWN: &str = ".oxd-userdropdown-tab";
const LOGOUT_LINK: &str = "a[href=\"/web/index.php/auth/logout\"]";
pub const LOADING_SPINNER: &str = ".oxd-loading-spinner";
const TOAST: &str = ".oxd-toast-content";

/// Budget for the loading spinner to disappear
pub const SPINNER_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait HrmCommands {
    /// Log in through the form; missing values fall back to the configured
    /// credentials. Succeeds only once the dashboard is reached.
    async fn login(&self, username: Option<&str>, password: Option<&str>) -> E2eResult<()>;

    async fn logout(&self) -> E2eResult<()>;

    /// Click a main-menu entry by its visible label, then wait for the page.
    async fn navigate_to_menu(&self, name: &str) -> E2eResult<()>;

    /// Wait for the loading spinner to go away, then settle.
    async fn wait_for_page_load(&self) -> E2eResult<()>;

    async fn screenshot_with_timestamp(&self, name: &str) -> E2eResult<PathBuf>;

    /// Replace the value of the input whose placeholder contains `placeholder`.
    async fn fill_by_placeholder(&self, placeholder: &str, value: &str) -> E2eResult<()>;

    async fn verify_toast(&self, message: &str) -> E2eResult<()>;
}

#[async_trait]
impl HrmCommands for Session {
    async fn login(&self, username: Option<&str>, password: Option<&str>) -> E2eResult<()> {
        let defaults = &self.config().credentials;
        let username = username.unwrap_or(&defaults.username);
        let password = password.unwrap_or(&defaults.password);
        info!(%username, "login");

        self.visit(LOGIN_ROUTE).await?;
        self.clear_and_type(USERNAME_INPUT, username).await?;
        self.clear_and_type(PASSWORD_INPUT, password).await?;
        self.click(SUBMIT_BUTTON).await?;
        self.url_should_include("/dashboard").await?;
        self.should_be_visible(BREADCRUMB).await?;
        Ok(())
    }

    async fn logout(&self) -> E2eResult<()> {
        info!("logout");
        self.click(USER_DROPDOWN).await?;
        self.click(LOGOUT_LINK).await?;
        self.url_should_include("/auth/login").await?;
        Ok(())
    }

    async fn navigate_to_menu(&self, name: &str) -> E2eResult<()> {
        info!(menu = name, "navigate");
        let entry = Locator::css(MAIN_MENU).find(MAIN_MENU_ITEM).with_text(name);
        self.click(entry).await?;
        self.wait_for_page_load().await
    }

    async fn wait_for_page_load(&self) -> E2eResult<()> {
        self.should_not_exist_within(LOADING_SPINNER, SPINNER_TIMEOUT).await?;
        self.sleep(self.config().settle_delay()).await
    }

    async fn screenshot_with_timestamp(&self, name: &str) -> E2eResult<PathBuf> {
        self.screenshot(&timestamped(name)).await
    }

    async fn fill_by_placeholder(&self, placeholder: &str, value: &str) -> E2eResult<()> {
        let input = format!("input[placeholder*=\"{}\"]", placeholder);
        self.clear_and_type(input, value).await
    }

    async fn verify_toast(&self, message: &str) -> E2eResult<()> {
        self.should_contain_text(TOAST, message).await
    }
}
