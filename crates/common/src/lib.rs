//! HRM E2E Common Library
//!
//! Pure helpers shared by the end-to-end suite: synthetic record generation,
//! date formatting, unique id stamping and a bounded retry wrapper. Nothing in
//! this crate touches a browser or the network.

pub mod data;
pub mod dates;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use data::TestDataBuilder;
pub use dates::{current_date, format_date, future_date, future_date_from};
pub use types::*;
pub use utils::{generate_unique_id, retry_action, screenshot_name, timestamped};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the login username
pub const USERNAME_ENV: &str = "HRM_USERNAME";

/// Environment variable holding the login password
pub const PASSWORD_ENV: &str = "HRM_PASSWORD";

/// Username used when neither config nor environment provide one
pub const DEFAULT_USERNAME: &str = "Admin";

/// Password used when neither config nor environment provide one
pub const DEFAULT_PASSWORD: &str = "admin123";
