//! Reachability check of the application under test, run before any browser starts

use hrm_common::retry_action;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone)]
pub struct Preflight {
    pub url: String,
    pub attempts: u32,
    pub interval: Duration,
    pub request_timeout: Duration,
}

impl Preflight {
    pub fn from_config(config: &SuiteConfig) -> Self {
        Self {
            url: config.base_url.clone(),
            attempts: 5,
            interval: Duration::from_secs(2),
            request_timeout: Duration::from_millis(config.timeouts.request_ms),
        }
    }

    pub fn with_attempts(mut self, attempts: u32, interval: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.interval = interval;
        self
    }

    /// Poll the base URL until it answers without a server error.
    pub async fn check(&self) -> E2eResult<()> {
        let client = Client::builder().timeout(self.request_timeout).build()?;
        info!("Waiting for {} ...", self.url);

        match retry_action(self.attempts, self.interval, || request_once(&client, &self.url)).await {
            Ok(status) => {
                info!(url = %self.url, %status, "Application reachable");
                Ok(())
            }
            Err(last) => {
                warn!(url = %self.url, "Reachability check gave up: {}", last);
                Err(E2eError::Unreachable {
                    url: self.url.clone(),
                    attempts: self.attempts,
                })
            }
        }
    }
}

/// One request; any non-5xx answer counts as reachable.
async fn request_once(client: &Client, url: &str) -> Result<StatusCode, String> {
    match client.get(url).send().await {
        Ok(resp) if !resp.status().is_server_error() => Ok(resp.status()),
        Ok(resp) => Err(format!("server answered {}", resp.status())),
        Err(e) => Err(e.to_string()),
    }
}
