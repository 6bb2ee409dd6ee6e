use super::{HasLoadingIndicator, Screen};
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::session::Session;

struct Selectors {
    breadcrumb: &'static str,
    main_menu: &'static str,
    main_menu_item: &'static str,
    user_dropdown: &'static str,
    user_name: &'static str,
    user_link: &'static str,
    widget: &'static str,
    widget_name: &'static str,
    widget_body: &'static str,
    layout: &'static str,
    alert: &'static str,
}

const SELECTORS: Selectors = Selectors {
    breadcrumb: ".oxd-topbar-header-breadcrumb",
    main_menu: ".oxd-main-menu",
    main_menu_item: ".oxd-main-menu-item",
    user_dropdown: ".oxd-userdropdown-tab",
    user_name: ".oxd-userdropdown-name",
    user_link: ".oxd-userdropdown-link",
    widget: ".orangehrm-dashboard-widget",
    widget_name: ".orangehrm-dashboard-widget-name",
    widget_body: ".orangehrm-dashboard-widget-body",
    layout: ".oxd-layout-context",
    alert: ".oxd-alert",
};

/// Widgets rendered for the admin user
pub const WIDGETS: &[&str] = &["Time at Work", "My Actions", "Quick Launch", "Employee Distribution"];

/// Entries of the user menu
pub const USER_MENU_LINKS: &[&str] = &["About", "Support", "Change Password", "Logout"];

pub struct DashboardPage<'a> {
    session: &'a Session,
}

impl<'a> DashboardPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// On the dashboard route with the breadcrumb reading "Dashboard".
    pub async fn should_be_visible(&self) -> E2eResult<()> {
        self.session.url_should_include("/dashboard").await?;
        self.session.should_contain_text(SELECTORS.breadcrumb, "Dashboard").await
    }

    /// Layout rendered and no error alert shown.
    pub async fn should_render_cleanly(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.layout).await?;
        self.session.should_not_exist(SELECTORS.alert).await
    }

    pub async fn navigate_to_module(&self, module: &str) -> E2eResult<()> {
        let entry = self.menu_entry(module);
        self.session.click(entry).await?;
        self.wait_for_load().await
    }

    pub async fn should_show_module(&self, module: &str) -> E2eResult<()> {
        self.session.should_be_visible(self.menu_entry(module)).await.map(|_| ())
    }

    pub async fn open_user_dropdown(&self) -> E2eResult<()> {
        self.session.click(SELECTORS.user_dropdown).await
    }

    pub async fn should_show_user_name(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.user_name).await.map(|_| ())
    }

    /// Every link in `links` is visible in the open user menu.
    pub async fn should_show_user_links(&self, links: &[&str]) -> E2eResult<()> {
        self.session.should_have_count_at_least(SELECTORS.user_link, 1).await?;
        for link in links {
            self.session
                .should_be_visible(Locator::contains(SELECTORS.user_link, *link))
                .await?;
        }
        Ok(())
    }

    pub async fn should_hide_user_links(&self) -> E2eResult<()> {
        self.session.should_not_be_visible(SELECTORS.user_link).await
    }

    pub async fn should_show_widgets(&self) -> E2eResult<()> {
        self.session.should_have_count_at_least(SELECTORS.widget, 1).await.map(|_| ())
    }

    pub async fn should_show_widget(&self, name: &str) -> E2eResult<()> {
        self.session
            .should_be_visible(Locator::contains(SELECTORS.widget_name, name))
            .await
            .map(|_| ())
    }

    /// The body of the widget titled `name` is rendered.
    pub async fn should_show_widget_body(&self, name: &str) -> E2eResult<()> {
        let body = Locator::contains(SELECTORS.widget, name).first().find(SELECTORS.widget_body);
        self.session.should_be_visible(body).await.map(|_| ())
    }

    pub async fn should_show_breadcrumb(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.breadcrumb).await.map(|_| ())
    }

    fn menu_entry(&self, module: &str) -> Locator {
        Locator::css(SELECTORS.main_menu)
            .find(SELECTORS.main_menu_item)
            .with_text(module)
    }
}

impl Screen for DashboardPage<'_> {
    fn name(&self) -> &'static str {
        "dashboard"
    }

    fn route(&self) -> &'static str {
        "/web/index.php/dashboard/index"
    }

    fn session(&self) -> &Session {
        self.session
    }
}

impl HasLoadingIndicator for DashboardPage<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakeElement};

    fn dashboard() -> FakeDriver {
        let driver = FakeDriver::new();
        driver.add(FakeElement::new(SELECTORS.breadcrumb).text("Dashboard"));
        for name in WIDGETS {
            let widget = driver.add(FakeElement::new(SELECTORS.widget).text(name));
            driver.add(FakeElement::new(SELECTORS.widget_name).text(name).child_of(widget));
            driver.add(FakeElement::new(SELECTORS.widget_body).child_of(widget));
        }
        let menu = driver.add(FakeElement::new(SELECTORS.main_menu));
        for module in ["Admin", "PIM", "Leave", "Time"] {
            driver.add(FakeElement::new(SELECTORS.main_menu_item).text(module).child_of(menu));
        }
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn test_widgets_and_modules_visible() {
        let session = Session::for_test(dashboard());
        let page = DashboardPage::new(&session);

        page.should_show_widgets().await.unwrap();
        for name in WIDGETS {
            page.should_show_widget(name).await.unwrap();
        }
        page.should_show_widget_body("Quick Launch").await.unwrap();
        page.should_show_module("Leave").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_widget_times_out() {
        let session = Session::for_test(dashboard());
        let page = DashboardPage::new(&session);
        assert!(page.should_show_widget("Buzz Latest Posts").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_dropdown_links() {
        let driver = dashboard();
        let tab = driver.add(FakeElement::new(SELECTORS.user_dropdown));
        driver.on_click(tab, |view| {
            for link in USER_MENU_LINKS {
                view.add(FakeElement::new(SELECTORS.user_link).text(link));
            }
        });
        let session = Session::for_test(driver);
        let page = DashboardPage::new(&session);

        page.open_user_dropdown().await.unwrap();
        page.should_show_user_links(USER_MENU_LINKS).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_to_module_waits_for_spinner() {
        let driver = dashboard();
        driver.add(FakeElement::new(".oxd-loading-spinner").vanish_after(2));
        let session = Session::for_test(driver.clone());
        let page = DashboardPage::new(&session);

        page.navigate_to_module("PIM").await.unwrap();
        assert_eq!(driver.clicks(), vec![".oxd-main-menu >> .oxd-main-menu-item:contains(\"PIM\")".to_string()]);
    }
}
