//! Dashboard overview, widgets and navigation

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::commands::HrmCommands;
use crate::config::Viewport;
use crate::error::E2eResult;
use crate::pages::dashboard::{USER_MENU_LINKS, WIDGETS};
use crate::pages::DashboardPage;
use crate::runner::{Suite, TestCase};
use crate::session::Session;

/// Device presets the layout is checked under
pub const RESPONSIVE_VIEWPORTS: &[(&str, Viewport)] = &[
    ("ipad-2", Viewport { width: 768, height: 1024 }),
    ("iphone-x", Viewport { width: 375, height: 812 }),
];

/// Modules every admin sees in the side menu
pub const SIDEBAR_MODULES: &[&str] = &["Admin", "PIM", "Leave", "Time"];

pub fn suite() -> Suite {
    let mut suite = Suite::new("Dashboard - Overview & Widgets")
        .tagged(&["dashboard"])
        .before_each(login_to_dashboard)
        .case(TestCase::native("should display dashboard page with all core elements", core_elements).tagged(&["smoke"]))
        .case(TestCase::native("should load without errors", loads_cleanly));

    for (name, body) in WIDGETS.iter().zip(WIDGET_CHECKS) {
        suite = suite.case(TestCase::native(format!("should display {} widget", name), *body));
    }

    suite
        .case(TestCase::native("should have quick launch action buttons", quick_launch_body))
        .case(TestCase::native("should navigate to different modules from sidebar", sidebar_modules))
        .case(TestCase::native("should highlight current page in navigation", menu_items))
        .case(TestCase::native("should display user profile in header", user_profile))
        .case(TestCase::native("should display user dropdown menu", user_dropdown))
        .case(TestCase::native("should adapt to different viewport sizes", responsive))
}

fn login_to_dashboard(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.login(None, None).await?;
        session.url_should_include("/dashboard").await.map(|_| ())
    }
    .boxed()
}

fn core_elements(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.wait_for_page_load().await?;
        let dashboard = DashboardPage::new(session);
        dashboard.should_be_visible().await?;
        session.should_be_visible(".oxd-layout-context").await?;
        session.screenshot_with_timestamp("dashboard-loaded").await?;
        Ok(())
    }
    .boxed()
}

fn loads_cleanly(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.wait_for_page_load().await?;
        DashboardPage::new(session).should_render_cleanly().await
    }
    .boxed()
}

// One entry per name in WIDGETS
const WIDGET_CHECKS: &[crate::runner::TestFn] = &[time_at_work, my_actions, quick_launch, employee_distribution];

async fn widget_visible(session: &Session, name: &str) -> E2eResult<()> {
    session.wait_for_page_load().await?;
    DashboardPage::new(session).should_show_widget(name).await
}

fn time_at_work(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    widget_visible(session, "Time at Work").boxed()
}

fn my_actions(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    widget_visible(session, "My Actions").boxed()
}

fn quick_launch(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    widget_visible(session, "Quick Launch").boxed()
}

fn employee_distribution(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    widget_visible(session, "Employee Distribution").boxed()
}

fn quick_launch_body(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.wait_for_page_load().await?;
        DashboardPage::new(session).should_show_widget_body("Quick Launch").await
    }
    .boxed()
}

fn sidebar_modules(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let dashboard = DashboardPage::new(session);
        for module in SIDEBAR_MODULES {
            dashboard.should_show_module(module).await?;
        }
        Ok(())
    }
    .boxed()
}

fn menu_items(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { session.should_have_count_at_least(".oxd-main-menu-item", 1).await.map(|_| ()) }.boxed()
}

fn user_profile(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { DashboardPage::new(session).should_show_user_name().await }.boxed()
}

fn user_dropdown(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let dashboard = DashboardPage::new(session);
        dashboard.open_user_dropdown().await?;
        dashboard.should_show_user_links(USER_MENU_LINKS).await
    }
    .boxed()
}

fn responsive(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let dashboard = DashboardPage::new(session);
        for (preset, viewport) in RESPONSIVE_VIEWPORTS {
            tracing::debug!(preset, "viewport");
            session.set_viewport(viewport.width, viewport.height).await?;
            session.wait_for_page_load().await?;
            dashboard.should_show_breadcrumb().await?;
        }
        let default = Viewport::default();
        session.set_viewport(default.width, default.height).await
    }
    .boxed()
}
