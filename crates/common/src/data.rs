//! Synthetic test data
//!
//! Each generator has a `*_with` variant taking the RNG so callers (and tests)
//! can make runs reproducible with a seeded generator.

use chrono::NaiveDate;
use rand::distributions::{Alphanumeric, DistString};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dates::{format_date, future_date_from, today};
use crate::types::{CredentialSet, Credentials, Employee, JobTitle, LeaveRequest, User};

const FIRST_NAMES: &[&str] = &[
    "Amelia", "Bruno", "Chloe", "Dmitri", "Elena", "Farah", "Gustavo", "Hana", "Ivan", "Jonas",
    "Keiko", "Liam", "Maya", "Nikhil", "Olga", "Pablo", "Quinn", "Rosa", "Sanjay", "Tessa",
];

const MIDDLE_NAMES: &[&str] = &[
    "Alex", "Blake", "Casey", "Drew", "Emery", "Finley", "Gray", "Harper", "Jordan", "Reese",
];

const LAST_NAMES: &[&str] = &[
    "Anders", "Becker", "Costa", "Dubois", "Eriksen", "Fischer", "Garcia", "Hoffman", "Ito",
    "Jensen", "Kowalski", "Lindqvist", "Moreau", "Novak", "Okafor", "Petrov", "Rossi", "Silva",
];

const JOB_TITLES: &[&str] = &[
    "QA Engineer",
    "Payroll Specialist",
    "Recruitment Coordinator",
    "Benefits Analyst",
    "Support Engineer",
    "Facilities Manager",
    "Data Steward",
    "Training Lead",
];

const WORDS: &[&str] = &[
    "annual", "planned", "family", "travel", "visit", "rest", "personal", "holiday", "trip",
    "appointment", "event", "break", "schedule", "request", "time", "off",
];

const ID_WIDTH: usize = 4;
const PASSWORD_LEN: usize = 12;

/// Span of days between `from_date` and `to_date` of a leave request.
pub const LEAVE_SPAN_DAYS: std::ops::RangeInclusive<u64> = 1..=5;

/// Generator for synthetic domain records
pub struct TestDataBuilder;

impl TestDataBuilder {
    pub fn generate_employee() -> Employee {
        Self::employee_with(&mut rand::thread_rng())
    }

    pub fn employee_with<R: Rng + ?Sized>(rng: &mut R) -> Employee {
        let first_name = pick(rng, FIRST_NAMES);
        let last_name = pick(rng, LAST_NAMES);

        Employee {
            email: email_for(rng, &first_name, &last_name),
            middle_name: pick(rng, MIDDLE_NAMES),
            employee_id: numeric(rng, ID_WIDTH),
            phone: format!("555-{}-{}", numeric(rng, 3), numeric(rng, 4)),
            first_name,
            last_name,
        }
    }

    pub fn generate_user() -> User {
        Self::user_with(&mut rand::thread_rng())
    }

    pub fn user_with<R: Rng + ?Sized>(rng: &mut R) -> User {
        let first = pick(rng, FIRST_NAMES);
        let last = pick(rng, LAST_NAMES);

        User {
            username: format!("{}.{}{}", first.to_lowercase(), last.to_lowercase(), numeric(rng, 2)),
            password: Alphanumeric.sample_string(rng, PASSWORD_LEN),
            email: email_for(rng, &first, &last),
        }
    }

    pub fn generate_leave_request() -> LeaveRequest {
        Self::leave_request_with(&mut rand::thread_rng(), today())
    }

    /// Leave request starting 1..=365 days after `base`, lasting 1..=5 days.
    pub fn leave_request_with<R: Rng + ?Sized>(rng: &mut R, base: NaiveDate) -> LeaveRequest {
        let from = future_date_from(base, rng.gen_range(1..=365));
        let to = future_date_from(from, rng.gen_range(LEAVE_SPAN_DAYS));

        LeaveRequest {
            from_date: format_date(from),
            to_date: format_date(to),
            comments: sentence(rng),
        }
    }

    pub fn generate_job_title() -> JobTitle {
        Self::job_title_with(&mut rand::thread_rng())
    }

    pub fn job_title_with<R: Rng + ?Sized>(rng: &mut R) -> JobTitle {
        let description = (0..3).map(|_| sentence(rng)).collect::<Vec<_>>().join(" ");
        JobTitle {
            title: pick(rng, JOB_TITLES),
            description,
        }
    }

    /// Admin credentials from the environment, else the demo defaults.
    pub fn credentials() -> CredentialSet {
        let username = std::env::var(crate::USERNAME_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| crate::DEFAULT_USERNAME.to_string());
        let password = std::env::var(crate::PASSWORD_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| crate::DEFAULT_PASSWORD.to_string());

        CredentialSet {
            admin: Credentials::new(username, password),
        }
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&str]) -> String {
    pool.choose(rng).copied().unwrap_or("Test").to_string()
}

fn numeric<R: Rng + ?Sized>(rng: &mut R, width: usize) -> String {
    (0..width)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn email_for<R: Rng + ?Sized>(rng: &mut R, first: &str, last: &str) -> String {
    format!(
        "{}.{}{}@example.com",
        first.to_lowercase(),
        last.to_lowercase(),
        numeric(rng, 3)
    )
}

fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.gen_range(4..=8);
    let mut words: Vec<String> = (0..len).map(|_| pick(rng, WORDS)).collect();
    if let Some(first) = words.first_mut() {
        let mut chars = first.chars();
        if let Some(c) = chars.next() {
            *first = c.to_uppercase().chain(chars).collect();
        }
    }
    format!("{}.", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_employee_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let e = TestDataBuilder::employee_with(&mut rng);
            assert!(!e.first_name.is_empty());
            assert!(!e.last_name.is_empty());
            assert_eq!(e.employee_id.len(), ID_WIDTH);
            assert!(e.employee_id.chars().all(|c| c.is_ascii_digit()));
            assert!(e.email.contains('@'));
        }
    }

    #[test]
    fn test_leave_request_span() {
        let mut rng = StdRng::seed_from_u64(42);
        let base = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();

        for _ in 0..200 {
            let req = TestDataBuilder::leave_request_with(&mut rng, base);
            let from = NaiveDate::parse_from_str(&req.from_date, "%Y-%m-%d").unwrap();
            let to = NaiveDate::parse_from_str(&req.to_date, "%Y-%m-%d").unwrap();

            assert!(from > base);
            assert!(to > from);
            let gap = (to - from).num_days() as u64;
            assert!(LEAVE_SPAN_DAYS.contains(&gap), "gap {gap} out of range");
        }
    }

    #[test]
    fn test_user_password_length() {
        let mut rng = StdRng::seed_from_u64(3);
        let user = TestDataBuilder::user_with(&mut rng);
        assert_eq!(user.password.len(), PASSWORD_LEN);
        assert!(user.username.contains('.'));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = TestDataBuilder::job_title_with(&mut StdRng::seed_from_u64(11));
        let b = TestDataBuilder::job_title_with(&mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
        assert!(a.description.ends_with('.'));
    }
}
