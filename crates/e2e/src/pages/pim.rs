use async_trait::async_trait;
use hrm_common::Employee;
use tracing::info;

use super::{HasLoadingIndicator, HasSubmitAction, Screen};
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::session::Session;

struct Selectors {
    button: &'static str,
    submit: &'static str,
    table: &'static str,
    table_header: &'static str,
    header_cell: &'static str,
    table_body: &'static str,
    table_card: &'static str,
    row_action: &'static str,
    text_input: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    delete_icon: &'static str,
    edit_icon: &'static str,
    login_switch: &'static str,
    card_container: &'static str,
    label: &'static str,
    select: &'static str,
    select_dropdown: &'static str,
    select_option: &'static str,
    records_found: &'static str,
    pagination: &'static str,
    input_group: &'static str,
}

const SELECTORS: Selectors = Selectors {
    button: "button",
    submit: "button[type=\"submit\"]",
    table: ".oxd-table",
    table_header: ".oxd-table-header",
    header_cell: ".oxd-table-header-cell",
    table_body: ".oxd-table-body",
    table_card: ".oxd-table-card",
    row_action: "i, button, .oxd-icon-button",
    text_input: ".oxd-input",
    first_name: "input[name=\"firstName\"]",
    last_name: "input[name=\"lastName\"]",
    delete_icon: ".bi-trash",
    edit_icon: ".bi-pencil-fill",
    login_switch: ".oxd-switch-input",
    card_container: ".orangehrm-card-container",
    label: "label",
    select: ".oxd-select-text",
    select_dropdown: ".oxd-select-dropdown",
    select_option: ".oxd-select-option",
    records_found: ".orangehrm-horizontal-padding",
    pagination: ".oxd-pagination",
    input_group: ".oxd-input-group",
};

/// Column headers of the employee list
pub const EMPLOYEE_TABLE_HEADERS: &[&str] = &[
    "Id",
    "First (& Middle) Name",
    "Last Name",
    "Job Title",
    "Employment Status",
    "Sub Unit",
    "Supervisor",
    "Actions",
];

pub const ADD_EMPLOYEE_ROUTE: &str = "/pim/addEmployee";
pub const PERSONAL_DETAILS_ROUTE: &str = "/pim/viewPersonalDetails";

pub struct PimPage<'a> {
    session: &'a Session,
}

impl<'a> PimPage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn click_add_employee(&self) -> E2eResult<()> {
        self.session.click(Locator::contains(SELECTORS.button, "Add")).await
    }

    /// Type the names into the add-employee form.
    pub async fn fill_employee_name(&self, first_name: &str, last_name: &str) -> E2eResult<()> {
        self.session.type_into(SELECTORS.first_name, first_name).await?;
        self.session.type_into(SELECTORS.last_name, last_name).await
    }

    pub async fn click_save(&self) -> E2eResult<()> {
        self.submit().await
    }

    /// Add `employee` through the form and wait for the details page.
    pub async fn add_employee(&self, employee: &Employee) -> E2eResult<()> {
        info!(name = %employee.full_name(), "Adding employee");
        self.click_add_employee().await?;
        self.wait_for_load().await?;
        self.fill_employee_name(&employee.first_name, &employee.last_name).await?;
        self.click_save().await?;
        self.wait_for_load().await?;
        self.session.url_should_include(PERSONAL_DETAILS_ROUTE).await.map(|_| ())
    }

    pub async fn search_by_name(&self, name: &str) -> E2eResult<()> {
        self.search_field(0, name).await
    }

    pub async fn search_by_id(&self, id: &str) -> E2eResult<()> {
        self.search_field(1, id).await
    }

    async fn search_field(&self, index: usize, value: &str) -> E2eResult<()> {
        let field = Locator::css(SELECTORS.text_input).nth(index);
        self.session.type_into(field, value).await?;
        self.submit().await?;
        self.wait_for_load().await
    }

    pub async fn reset_search(&self) -> E2eResult<()> {
        self.session.click(Locator::contains(SELECTORS.button, "Reset")).await
    }

    /// Pick the first option of the first filter dropdown.
    pub async fn select_first_filter_option(&self) -> E2eResult<()> {
        self.session.click(Locator::css(SELECTORS.select).first()).await?;
        self.session.should_be_visible(SELECTORS.select_dropdown).await?;
        self.session.click(Locator::css(SELECTORS.select_option).first()).await
    }

    pub async fn toggle_create_login(&self) -> E2eResult<()> {
        self.session.click(SELECTORS.login_switch).await
    }

    pub async fn should_show_login_fields(&self) -> E2eResult<()> {
        self.session.should_be_visible(Locator::contains(SELECTORS.label, "Username")).await?;
        self.session.should_be_visible(Locator::contains(SELECTORS.label, "Password")).await?;
        Ok(())
    }

    pub async fn should_show_employee_table(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.table).await.map(|_| ())
    }

    pub async fn should_show_table_headers(&self) -> E2eResult<()> {
        for header in EMPLOYEE_TABLE_HEADERS {
            let cell = Locator::css(SELECTORS.table_header).find(SELECTORS.header_cell).with_text(*header);
            self.session.should_be_visible(cell).await?;
        }
        Ok(())
    }

    pub async fn should_show_records(&self) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.table_body).await?;
        self.session.should_have_count_at_least(SELECTORS.table_card, 1).await.map(|_| ())
    }

    pub async fn should_show_record_count(&self) -> E2eResult<()> {
        self.session
            .should_contain_text(SELECTORS.records_found, "Records Found")
            .await
    }

    /// The first row offers edit and delete actions.
    pub async fn should_show_row_actions(&self) -> E2eResult<()> {
        let row = Locator::css(SELECTORS.table_card).first();
        self.session.should_be_visible(row.clone().find(SELECTORS.edit_icon)).await?;
        self.session.should_be_visible(row.find(SELECTORS.delete_icon)).await?;
        Ok(())
    }

    /// Click the first action icon of the first row.
    pub async fn open_first_record(&self) -> E2eResult<()> {
        let action = Locator::css(SELECTORS.table_card)
            .first()
            .find(SELECTORS.row_action)
            .first();
        self.session.click_force(action).await
    }

    pub async fn should_show_add_form(&self) -> E2eResult<()> {
        self.session.url_should_include(ADD_EMPLOYEE_ROUTE).await?;
        self.session.should_be_visible(SELECTORS.card_container).await.map(|_| ())
    }

    pub async fn should_show_required_error(&self) -> E2eResult<()> {
        self.session.should_contain_text(SELECTORS.input_group, "Required").await
    }

    /// Pagination is optional; when rendered it must be visible.
    pub async fn should_show_pagination_if_paged(&self) -> E2eResult<()> {
        if self.session.query_now(SELECTORS.pagination).await?.is_empty() {
            return Ok(());
        }
        self.session.should_be_visible(SELECTORS.pagination).await.map(|_| ())
    }
}

impl Screen for PimPage<'_> {
    fn name(&self) -> &'static str {
        "pim"
    }

    fn route(&self) -> &'static str {
        "/web/index.php/pim/viewEmployeeList"
    }

    fn session(&self) -> &Session {
        self.session
    }
}

impl HasLoadingIndicator for PimPage<'_> {}

#[async_trait]
impl HasSubmitAction for PimPage<'_> {
    fn submit_button(&self) -> Locator {
        Locator::css(SELECTORS.submit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakeElement};
    use hrm_common::TestDataBuilder;

    const BASE: &str = "https://opensource-demo.orangehrmlive.com";

    fn employee_list() -> FakeDriver {
        let driver = FakeDriver::new();
        driver.add(FakeElement::new(SELECTORS.table));
        let header = driver.add(FakeElement::new(SELECTORS.table_header));
        for h in EMPLOYEE_TABLE_HEADERS {
            driver.add(FakeElement::new(SELECTORS.header_cell).text(h).child_of(header));
        }
        driver.add(FakeElement::new(SELECTORS.table_body));
        let row = driver.add(FakeElement::new(SELECTORS.table_card).text("0001 Peter Anderson"));
        driver.add(FakeElement::new(SELECTORS.edit_icon).child_of(row));
        driver.add(FakeElement::new(SELECTORS.delete_icon).child_of(row));
        driver.add(FakeElement::new(SELECTORS.records_found).text("(1) Records Found"));
        driver
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_view_assertions() {
        let session = Session::for_test(employee_list());
        let page = PimPage::new(&session);

        page.should_show_employee_table().await.unwrap();
        page.should_show_table_headers().await.unwrap();
        page.should_show_records().await.unwrap();
        page.should_show_record_count().await.unwrap();
        page.should_show_row_actions().await.unwrap();
        page.should_show_pagination_if_paged().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_employee_flow() {
        let driver = employee_list();
        let add = driver.add(FakeElement::new(SELECTORS.button).text(" Add "));
        driver.on_click(add, |view| {
            view.set_url(&format!("{}/web/index.php{}", BASE, ADD_EMPLOYEE_ROUTE));
            view.add(FakeElement::input(SELECTORS.first_name));
            view.add(FakeElement::input(SELECTORS.last_name));
        });
        let save = driver.add(FakeElement::new(SELECTORS.submit).text("Save"));
        driver.on_click(save, |view| {
            view.set_url(&format!("{}/web/index.php{}/empNumber/7", BASE, PERSONAL_DETAILS_ROUTE));
        });

        let employee = TestDataBuilder::generate_employee();
        let session = Session::for_test(driver.clone());
        PimPage::new(&session).add_employee(&employee).await.unwrap();

        let typed: Vec<String> = driver.typed().into_iter().map(|(_, text)| text).collect();
        assert_eq!(typed, vec![employee.first_name.clone(), employee.last_name.clone()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_first_record_clicks_row_action() {
        let driver = FakeDriver::new();
        let first = driver.add(FakeElement::new(SELECTORS.table_card).text("0001 Peter Anderson"));
        let second = driver.add(FakeElement::new(SELECTORS.table_card).text("0002 Linda Anderson"));
        // Icons only render on hover
        let icon = driver.add(FakeElement::new(SELECTORS.row_action).hidden().child_of(first));
        driver.add(FakeElement::new(SELECTORS.row_action).child_of(second));
        driver.on_click(icon, |view| {
            view.set_url(&format!("{}/web/index.php{}/empNumber/7", BASE, PERSONAL_DETAILS_ROUTE));
        });
        let session = Session::for_test(driver.clone());

        PimPage::new(&session).open_first_record().await.unwrap();
        assert_eq!(
            driver.clicks(),
            vec![".oxd-table-card:eq(0) >> i, button, .oxd-icon-button:eq(0)".to_string()]
        );
        assert!(driver.url().contains(PERSONAL_DETAILS_ROUTE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_types_into_indexed_field() {
        let driver = employee_list();
        let name = driver.add(FakeElement::input(SELECTORS.text_input));
        let id = driver.add(FakeElement::input(SELECTORS.text_input));
        driver.add(FakeElement::new(SELECTORS.submit).text("Search"));
        let session = Session::for_test(driver.clone());
        let page = PimPage::new(&session);

        page.search_by_id("0001").await.unwrap();
        assert_eq!(driver.value_of(id).as_deref(), Some("0001"));
        assert_eq!(driver.value_of(name).as_deref(), Some(""));
    }
}
