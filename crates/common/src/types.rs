//! Core record types for the HRM suite
//!
//! All records are transient: created per test invocation and discarded when
//! the test ends. They are shaped after the form-field constraints of the
//! target application.

use serde::{Deserialize, Serialize};

/// Login credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(crate::DEFAULT_USERNAME, crate::DEFAULT_PASSWORD)
    }
}

/// Credential sets known to the suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    pub admin: Credentials,
}

/// Synthetic employee for the PIM module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    /// Fixed-width numeric id
    pub employee_id: String,
    pub email: String,
    pub phone: String,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Synthetic system user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Synthetic leave request, dates rendered `YYYY-MM-DD`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub from_date: String,
    pub to_date: String,
    pub comments: String,
}

/// Synthetic job title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTitle {
    pub title: String,
    pub description: String,
}
