//! PIM employee management

use futures::future::BoxFuture;
use futures::FutureExt;
use hrm_common::TestDataBuilder;
use std::time::Duration;

use crate::commands::HrmCommands;
use crate::error::E2eResult;
use crate::pages::pim::ADD_EMPLOYEE_ROUTE;
use crate::pages::{HasLoadingIndicator, HasSubmitAction, PimPage};
use crate::runner::{Suite, TestCase};
use crate::session::Session;

const EMPLOYEE_LIST_ROUTE: &str = "/pim/viewEmployeeList";

pub fn suite() -> Suite {
    Suite::new("PIM - Employee Management")
        .tagged(&["pim"])
        .before_each(open_employee_list)
        .case(TestCase::native("should display employee list page", list_page).tagged(&["smoke"]))
        .case(TestCase::native("should display employee table headers", table_headers))
        .case(TestCase::native("should show employee records in table", records))
        .case(TestCase::native("should search employee by name", search_by_name))
        .case(TestCase::native("should search employee by ID", search_by_id))
        .case(TestCase::native("should reset search filters", reset_search))
        .case(TestCase::native("should navigate to add employee page", add_page))
        .case(TestCase::native("should add new employee with required fields", add_employee).tagged(&["data"]))
        .case(TestCase::native("should validate required fields on add employee", add_requires_fields))
        .case(TestCase::native("should toggle create login details", create_login_toggle))
        .case(TestCase::native("should view employee details", view_details))
        .case(TestCase::native("should have edit and delete icons for each employee", row_actions))
        .case(TestCase::native("should filter by employment status", filter_by_status))
        .case(TestCase::native("should show records count", records_count))
        .case(TestCase::native("should show pagination when there are multiple pages", pagination))
}

fn open_employee_list(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.login(None, None).await?;
        session.navigate_to_menu("PIM").await?;
        session.wait_for_page_load().await
    }
    .boxed()
}

fn list_page(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        session.url_should_include(EMPLOYEE_LIST_ROUTE).await?;
        PimPage::new(session).should_show_employee_table().await?;
        session.screenshot_with_timestamp("employee-list").await?;
        Ok(())
    }
    .boxed()
}

fn table_headers(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { PimPage::new(session).should_show_table_headers().await }.boxed()
}

fn records(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { PimPage::new(session).should_show_records().await }.boxed()
}

fn search_by_name(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = PimPage::new(session);
        page.search_by_name("Peter").await?;
        session.should_be_visible(".oxd-table-body").await.map(|_| ())
    }
    .boxed()
}

fn search_by_id(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { PimPage::new(session).search_by_id("0001").await }.boxed()
}

fn reset_search(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = PimPage::new(session);
        page.search_by_name("Test").await?;
        page.reset_search().await?;
        session.sleep(Duration::from_secs(1)).await?;
        session.url_should_include(EMPLOYEE_LIST_ROUTE).await.map(|_| ())
    }
    .boxed()
}

fn add_page(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = PimPage::new(session);
        page.click_add_employee().await?;
        page.should_show_add_form().await?;
        session.screenshot_with_timestamp("add-employee-page").await?;
        Ok(())
    }
    .boxed()
}

fn add_employee(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let employee = TestDataBuilder::generate_employee();
        PimPage::new(session).add_employee(&employee).await?;
        session.screenshot_with_timestamp("employee-added").await?;
        hrm_common::utils::cleanup_test_data(&employee.full_name());
        Ok(())
    }
    .boxed()
}

fn add_requires_fields(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = PimPage::new(session);
        page.click_add_employee().await?;
        page.wait_for_load().await?;
        session.url_should_include(ADD_EMPLOYEE_ROUTE).await?;
        page.click_save().await?;
        page.should_show_required_error().await
    }
    .boxed()
}

fn create_login_toggle(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = PimPage::new(session);
        page.click_add_employee().await?;
        page.wait_for_load().await?;
        page.toggle_create_login().await?;
        page.should_show_login_fields().await
    }
    .boxed()
}

fn view_details(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        PimPage::new(session).open_first_record().await?;
        session.sleep(Duration::from_secs(1)).await?;
        session.url_should_include("/pim").await?;
        session.screenshot_with_timestamp("employee-details").await?;
        Ok(())
    }
    .boxed()
}

fn row_actions(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { PimPage::new(session).should_show_row_actions().await }.boxed()
}

fn filter_by_status(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = PimPage::new(session);
        page.select_first_filter_option().await?;
        page.submit().await?;
        page.wait_for_load().await
    }
    .boxed()
}

fn records_count(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { PimPage::new(session).should_show_record_count().await }.boxed()
}

fn pagination(session: &Session) -> BoxFuture<'_, E2eResult<()>> {
    async move { PimPage::new(session).should_show_pagination_if_paged().await }.boxed()
}
