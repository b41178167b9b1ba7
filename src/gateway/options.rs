//! Configurable knobs for the gateway HTTP client along with validation
//! helpers so callers can reason about timeouts before a run starts.

use anyhow::{bail, Result};
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct GatewayClientOptions {
    /// Upper bound on one full request/response round trip.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for GatewayClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl GatewayClientOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }
        if self.connect_timeout.is_zero() {
            bail!("connect_timeout must be greater than 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        GatewayClientOptions::default().validate().unwrap();
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let err = GatewayClientOptions {
            request_timeout: Duration::ZERO,
            ..GatewayClientOptions::default()
        }
        .validate()
        .unwrap_err();
        assert!(format!("{err}").contains("request_timeout"));

        let err = GatewayClientOptions {
            connect_timeout: Duration::ZERO,
            ..GatewayClientOptions::default()
        }
        .validate()
        .unwrap_err();
        assert!(format!("{err}").contains("connect_timeout"));
    }
}
