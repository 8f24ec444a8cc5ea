use std::time::Duration;

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Addresses every send targets. Policy input, never compiled in.
    pub recipients: Vec<String>,
    pub delivery_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let recipients: Vec<String> = std::env::var("NOTIFY_RECIPIENTS")
            .map_err(|_| AppError::Config("NOTIFY_RECIPIENTS must be set".into()))?
            .split(',')
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect();

        if recipients.is_empty() {
            return Err(AppError::Config(
                "NOTIFY_RECIPIENTS must contain at least one address".into(),
            ));
        }

        let timeout_secs: u64 = std::env::var("DELIVERY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| AppError::Config("DELIVERY_TIMEOUT_SECS must be a number".into()))?;

        Ok(Self {
            recipients,
            delivery_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
