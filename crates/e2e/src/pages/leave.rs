use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{HasLoadingIndicator, Screen};
use crate::error::E2eResult;
use crate::locator::Locator;
use crate::session::Session;
use crate::wait::Check;

struct Selectors {
    top_nav: &'static str,
    nav_tab: &'static str,
    card_container: &'static str,
    label: &'static str,
    button: &'static str,
    select: &'static str,
    select_dropdown: &'static str,
    select_option: &'static str,
    table: &'static str,
    empty_state: &'static str,
}

const SELECTORS: Selectors = Selectors {
    top_nav: ".oxd-topbar-body-nav",
    nav_tab: ".oxd-topbar-body-nav-tab-item",
    card_container: ".orangehrm-card-container",
    label: "label",
    button: "button",
    select: ".oxd-select-text",
    select_dropdown: ".oxd-select-dropdown",
    select_option: ".oxd-select-option",
    table: ".oxd-table",
    empty_state: "span",
};

/// Budget for the apply form, which renders after several API calls
pub const APPLY_FORM_TIMEOUT: Duration = Duration::from_secs(15);

/// Tabs of the leave module's top bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveTab {
    Apply,
    MyLeave,
    Entitlements,
    Reports,
    LeaveList,
}

impl LeaveTab {
    pub fn label(&self) -> &'static str {
        match self {
            LeaveTab::Apply => "Apply",
            LeaveTab::MyLeave => "My Leave",
            LeaveTab::Entitlements => "Entitlements",
            LeaveTab::Reports => "Reports",
            LeaveTab::LeaveList => "Leave List",
        }
    }

    /// Route fragment the tab lands on, when it navigates directly.
    pub fn route(&self) -> Option<&'static str> {
        match self {
            LeaveTab::Apply => Some("/leave/applyLeave"),
            LeaveTab::MyLeave => Some("/leave/viewMyLeaveList"),
            LeaveTab::LeaveList => Some("/leave/viewLeaveList"),
            LeaveTab::Entitlements | LeaveTab::Reports => None,
        }
    }
}

pub struct LeavePage<'a> {
    session: &'a Session,
}

impl<'a> LeavePage<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub async fn should_show_navigation(&self, tabs: &[LeaveTab]) -> E2eResult<()> {
        self.session.should_be_visible(SELECTORS.top_nav).await?;
        for tab in tabs {
            self.session.should_contain_text(SELECTORS.top_nav, tab.label()).await?;
        }
        Ok(())
    }

    /// Click a top-bar tab and wait for the page to load.
    pub async fn open_tab(&self, tab: LeaveTab) -> E2eResult<()> {
        let item = Locator::contains(SELECTORS.nav_tab, tab.label());
        if tab == LeaveTab::Apply {
            self.session.click_force(item).await?;
        } else {
            self.session.click(item).await?;
        }
        self.wait_for_load().await?;
        if let Some(route) = tab.route() {
            self.session.url_should_include(route).await?;
        }
        Ok(())
    }

    pub async fn should_show_apply_form(&self) -> E2eResult<()> {
        let session = self.session;
        let slow = session.wait_policy().with_timeout(APPLY_FORM_TIMEOUT);
        let form = Locator::css(SELECTORS.card_container);
        slow.until("apply leave form to be visible", || async {
            Ok(match session.query_now(form.clone()).await?.first() {
                Some(el) if el.visible => Check::Pass(()),
                _ => Check::fail("form not rendered"),
            })
        })
        .await
    }

    pub async fn should_have_apply_fields(&self) -> E2eResult<()> {
        for label in ["Leave Type", "From Date", "To Date"] {
            self.session
                .should_be_visible(Locator::contains(SELECTORS.label, label))
                .await?;
        }
        Ok(())
    }

    pub async fn should_have_search_filters(&self) -> E2eResult<()> {
        self.session.should_be_visible(Locator::css(SELECTORS.select).first()).await?;
        self.session
            .should_be_visible(Locator::contains(SELECTORS.button, "Search"))
            .await
            .map(|_| ())
    }

    pub async fn search(&self) -> E2eResult<()> {
        self.session.click(Locator::contains(SELECTORS.button, "Search")).await?;
        self.wait_for_load().await
    }

    /// Pick the first status in the filter dropdown and search.
    pub async fn filter_by_first_status(&self) -> E2eResult<()> {
        self.session.click(Locator::css(SELECTORS.select).first()).await?;
        self.session.should_be_visible(SELECTORS.select_dropdown).await?;
        self.session.click(Locator::css(SELECTORS.select_option).first()).await?;
        self.search().await
    }

    pub async fn reset_filters(&self) -> E2eResult<()> {
        self.session.click(Locator::contains(SELECTORS.button, "Reset")).await?;
        self.wait_for_load().await
    }

    /// Either the records table or the empty-state notice.
    pub async fn should_show_records_or_empty_state(&self) -> E2eResult<()> {
        if self.session.query_now(SELECTORS.table).await?.is_empty() {
            self.session
                .should_be_visible(Locator::contains(SELECTORS.empty_state, "No Records Found"))
                .await
                .map(|_| ())
        } else {
            self.session.should_be_visible(SELECTORS.table).await.map(|_| ())
        }
    }
}

impl Screen for LeavePage<'_> {
    fn name(&self) -> &'static str {
        "leave"
    }

    fn route(&self) -> &'static str {
        "/web/index.php/leave/viewLeaveList"
    }

    fn session(&self) -> &Session {
        self.session
    }
}

impl HasLoadingIndicator for LeavePage<'_> {}
