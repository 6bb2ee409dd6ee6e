//! Leave module: dashboard, apply form, my leave, leave list and reports

use futures::future::BoxFuture;
use futures::FutureExt;
use std::time::Duration;

use crate::commands::HrmCommands;
use crate::error::E2eResult;
use crate::hooks::LEAVE_PERIODS_URL;
use crate::intercept::{HttpMethod, StubResponse, StubRule};
use crate::pages::{LeavePage, LeaveTab};
use crate::runner::{Suite, TestCase};
use crate::session::Session;

/// Alias of the suite's own leave-periods stub
pub const LEAVES_ALIAS: &str = "getLeaves";

/// The leave module fires the stubbed request once it has rendered
const STUB_TIMEOUT: Duration = Duration::from_secs(20);

pub fn suite() -> E2eResult<Suite> {
    let leaves = StubRule::new(
        LEAVES_ALIAS,
        HttpMethod::Get,
        LEAVE_PERIODS_URL,
        StubResponse::json(200, serde_json::json!({ "data": [] })),
    )?;

    Ok(Suite::new("Leave - Leave Management")
        .tagged(&["leave"])
        .with_stub(leaves)
        .before_each(open_leave_module)
        .case(TestCase::native("should display leave module dashboard", dashboard).tagged(&["smoke"]))
        .case(TestCase::native("should show leave navigation menu", navigation))
        .case(TestCase::native("should display apply leave form", apply_form))
        .case(TestCase::native("should have required form fields", apply_fields))
        .case(TestCase::native("should display my leave list", my_leave))
        .case(TestCase::native("should have search filters", search_filters))
        .case(TestCase::native("should filter leave by status", filter_by_status))
        .case(TestCase::native("should reset leave filters", reset_filters))
        .case(TestCase::native("should display leave list for all employees", leave_list))
        .case(TestCase::native("should show leave records table", records_table))
        .case(TestCase::native("should navigate to leave reports", reports)))
}

fn open_leave_module(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.login(None, None).await?;
        session.navigate_to_menu("Leave").await?;
        session.wait_for_stub_within(LEAVES_ALIAS, STUB_TIMEOUT).await
    }
    .boxed()
}

fn dashboard(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        LeavePage::new(session).should_show_navigation(&[]).await?;
        session.screenshot_with_timestamp("leave-dashboard").await?;
        Ok(())
    }
    .boxed()
}

fn navigation(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        LeavePage::new(session)
            .should_show_navigation(&[LeaveTab::Apply, LeaveTab::MyLeave, LeaveTab::Entitlements, LeaveTab::Reports])
            .await
    }
    .boxed()
}

fn apply_form(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = LeavePage::new(session);
        page.open_tab(LeaveTab::Apply).await?;
        page.should_show_apply_form().await?;
        session.screenshot_with_timestamp("apply-leave-form").await?;
        Ok(())
    }
    .boxed()
}

fn apply_fields(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = LeavePage::new(session);
        page.open_tab(LeaveTab::Apply).await?;
        page.should_show_apply_form().await?;
        page.should_have_apply_fields().await
    }
    .boxed()
}

fn my_leave(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        LeavePage::new(session).open_tab(LeaveTab::MyLeave).await?;
        session.screenshot_with_timestamp("my-leave-list").await?;
        Ok(())
    }
    .boxed()
}

fn search_filters(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = LeavePage::new(session);
        page.open_tab(LeaveTab::MyLeave).await?;
        page.should_have_search_filters().await
    }
    .boxed()
}

fn filter_by_status(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = LeavePage::new(session);
        page.open_tab(LeaveTab::MyLeave).await?;
        page.filter_by_first_status().await
    }
    .boxed()
}

fn reset_filters(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = LeavePage::new(session);
        page.open_tab(LeaveTab::MyLeave).await?;
        page.reset_filters().await
    }
    .boxed()
}

fn leave_list(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        LeavePage::new(session).open_tab(LeaveTab::LeaveList).await?;
        session.screenshot_with_timestamp("leave-list-all").await?;
        Ok(())
    }
    .boxed()
}

fn records_table(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = LeavePage::new(session);
        page.open_tab(LeaveTab::LeaveList).await?;
        page.should_show_records_or_empty_state().await
    }
    .boxed()
}

fn reports(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        LeavePage::new(session).open_tab(LeaveTab::Reports).await?;
        session.url_should_include("/leave/").await.map(|_| ())
    }
    .boxed()
}
