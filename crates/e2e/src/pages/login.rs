use async_trait::async_trait;

use super::{HasSubmitAction, Screen};
use crate::commands::LOGIN_ROUTE;
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::session::Session;

struct Selectors {
    username: &'static str,
    password: &'static str,
    submit: &'static str,
    forgot_password: &'static str,
    logo: &'static str,
    branding: &'static str,
    error_alert: &'static str,
    validation: &'static str,
    input_group: &'static str,
}

const SELECTORS: Selectors = Selectors {
    username: "input[name=\"username\"]",
    password: "input[name=\"password\"]",
    submit: "button[type=\"submit\"]",
    forgot_password: ".orangehrm-login-forgot",
    logo: ".orangehrm-login-logo",
    branding: ".orangehrm-login-branding",
    error_alert: ".oxd-alert-content",
    validation: ".oxd-text--span",
    input_group: ".oxd-input-group",
};

pub struct LoginPage<'a> {
    session: &'a Session,
}

impl<'a> LoginPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn fill_username(&self, username: &str) -> E2eResult<()> {
        self.session.clear_and_type(SELECTORS.username, username).await
    }

    pub async fn fill_password(&self, password: &str) -> E2eResult<()> {
        self.session.clear_and_type(SELECTORS.password, password).await
    }

    pub async fn click_submit(&self) -> E2eResult<()> {
        self.submit().await
    }

    /// Fill and submit the form without asserting the outcome.
    pub async fn login(&self, username: &str, password: &str) -> E2eResult<()> {
        self.fill_username(username).await?;
        self.fill_password(password).await?;
        self.click_submit().await
    }

    pub async fn should_show_error_message(&self, message: &str) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.error_alert).await?;
        self.session.should_contain_text(SELECTORS.error_alert, message).await
    }

    pub async fn should_show_validation_error(&self) -> E2eResult<()> {
        self.session.should_contain_text(SELECTORS.validation, "Required").await
    }

    /// At least `fields` "Required" markers.
    pub async fn should_show_validation_errors(&self, fields: usize) -> E2eResult<()> {
        let required = Locator::contains(SELECTORS.validation, "Required");
        self.session.should_have_count_at_least(required, fields).await.map(|_| ())
    }

    /// "Required" under the n-th input group (0 = username, 1 = password).
    pub async fn should_show_validation_error_at(&self, field: usize) -> E2eResult<()> {
        let message = Locator::css(SELECTORS.input_group).nth(field).find(SELECTORS.validation);
        self.session.should_contain_text(message, "Required").await
    }

    pub async fn should_redirect_to_dashboard(&self) -> E2eResult<()> {
        self.session.url_should_include("/dashboard").await.map(|_| ())
    }

    pub async fn should_show_branding(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.logo).await?;
        self.session.should_be_visible(SELECTORS.branding).await?;
        Ok(())
    }

    pub async fn should_show_forgot_password_link(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.forgot_password).await?;
        self.session
            .should_contain_text(SELECTORS.forgot_password, "Forgot your password")
            .await
    }

    /// Placeholders name the fields and the password is masked.
    pub async fn should_have_safe_inputs(&self) -> E2eResult<()> {
        self.session.should_have_attr(SELECTORS.username, "placeholder", "Username").await?;
        self.session.should_have_attr(SELECTORS.password, "placeholder", "Password").await?;
        self.session.should_have_attr(SELECTORS.password, "type", "password").await
    }

    pub async fn should_have_empty_inputs(&self) -> E2eResult<()> {
        self.session.should_have_value(SELECTORS.username, "").await?;
        self.session.should_have_value(SELECTORS.password, "").await
    }

    pub async fn should_show_form(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.username).await?;
        self.session.should_be_visible(SELECTORS.password).await?;
        Ok(())
    }
}

impl Screen for LoginPage<'_> {
    fn name(&self) -> &'static str {
        "login"
    }

    fn route(&self) -> &'static str {
        LOGIN_ROUTE
    }

    fn session(&self) -> &Session {
        self.session
    }
}

#[async_trait]
impl HasSubmitAction for LoginPage<'_> {
    fn submit_button(&self) -> Locator {
        Locator::css(SELECTORS.submit)
    }
}
