use anyhow::{bail, Context, Result};
use std::time::Duration;

const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Runtime configuration for one collection-owners run.
///
/// All instances must be constructed via [`CollectorConfig::builder`] or
/// [`CollectorConfig::new`] so invariants are validated before any consumer
/// observes the values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    gateway_url: String,
    collection_ticker: String,
    page_size: usize,
    rate_per_second: usize,
    only_unique: bool,
    exclude_contracts: bool,
    request_timeout: Duration,
}

pub struct CollectorConfigParams {
    pub gateway_url: String,
    pub collection_ticker: String,
    pub page_size: usize,
    pub rate_per_second: usize,
    pub only_unique: bool,
    pub exclude_contracts: bool,
    pub request_timeout: Duration,
}

impl CollectorConfig {
    /// Returns a builder to incrementally construct and validate a configuration.
    pub fn builder() -> CollectorConfigBuilder {
        CollectorConfigBuilder::default()
    }

    /// Constructs a configuration directly from the provided values.
    ///
    /// Prefer [`CollectorConfig::builder`] when many values use defaults.
    pub fn new(params: CollectorConfigParams) -> Result<Self> {
        let CollectorConfigParams {
            gateway_url,
            collection_ticker,
            page_size,
            rate_per_second,
            only_unique,
            exclude_contracts,
            request_timeout,
        } = params;

        let config = Self {
            gateway_url: trimmed_string(gateway_url),
            collection_ticker: trimmed_string(collection_ticker),
            page_size,
            rate_per_second,
            only_unique,
            exclude_contracts,
            request_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Gateway base URL (including scheme).
    pub fn gateway_url(&self) -> &str {
        &self.gateway_url
    }

    /// Collection ticker the run queries.
    pub fn collection_ticker(&self) -> &str {
        &self.collection_ticker
    }

    /// Number of tokens requested per page fetch.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Maximum page fetches initiated per rolling second.
    pub fn rate_per_second(&self) -> usize {
        self.rate_per_second
    }

    /// Whether the owner list is deduplicated after aggregation.
    pub fn only_unique(&self) -> bool {
        self.only_unique
    }

    /// Whether smart-contract addresses are dropped after aggregation.
    pub fn exclude_contracts(&self) -> bool {
        self.exclude_contracts
    }

    /// Per-request timeout applied by the gateway client.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Performs validation on an existing configuration instance.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.gateway_url)?;

        if self.collection_ticker.is_empty() {
            bail!("collection_ticker cannot be empty");
        }

        if self.page_size == 0 {
            bail!("page_size must be greater than 0");
        }

        if self.rate_per_second == 0 {
            bail!("rate_per_second must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CollectorConfigBuilder {
    gateway_url: Option<String>,
    collection_ticker: Option<String>,
    page_size: Option<usize>,
    rate_per_second: Option<usize>,
    only_unique: Option<bool>,
    exclude_contracts: Option<bool>,
    request_timeout: Option<Duration>,
}

impl CollectorConfigBuilder {
    pub fn gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = Some(url.into());
        self
    }

    pub fn collection_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.collection_ticker = Some(ticker.into());
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn rate_per_second(mut self, rate: usize) -> Self {
        self.rate_per_second = Some(rate);
        self
    }

    pub fn only_unique(mut self, only_unique: bool) -> Self {
        self.only_unique = Some(only_unique);
        self
    }

    pub fn exclude_contracts(mut self, exclude: bool) -> Self {
        self.exclude_contracts = Some(exclude);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<CollectorConfig> {
        let params = CollectorConfigParams {
            gateway_url: self.gateway_url.context("gateway_url is required")?,
            collection_ticker: self
                .collection_ticker
                .context("collection_ticker is required")?,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            rate_per_second: self.rate_per_second.context("rate_per_second is required")?,
            only_unique: self.only_unique.unwrap_or(false),
            exclude_contracts: self.exclude_contracts.unwrap_or(false),
            request_timeout: self
                .request_timeout
                .unwrap_or_else(|| Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        };

        CollectorConfig::new(params)
    }
}

fn trimmed_string(value: String) -> String {
    value.trim().to_owned()
}

fn validate_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("gateway_url must start with http:// or https://");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> CollectorConfigBuilder {
        CollectorConfig::builder()
            .gateway_url("https://gateway.example.com")
            .collection_ticker("TICKER-123456")
            .rate_per_second(5)
    }

    #[test]
    fn builder_produces_valid_config_with_defaults() {
        let config = base_builder().build().unwrap();
        assert_eq!(config.gateway_url(), "https://gateway.example.com");
        assert_eq!(config.collection_ticker(), "TICKER-123456");
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.rate_per_second(), 5);
        assert!(!config.only_unique());
        assert!(!config.exclude_contracts());
        assert_eq!(
            config.request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn post_processing_flags_can_be_enabled() {
        let config = base_builder()
            .only_unique(true)
            .exclude_contracts(true)
            .build()
            .unwrap();
        assert!(config.only_unique());
        assert!(config.exclude_contracts());
    }

    #[test]
    fn missing_required_fields_error() {
        let err = CollectorConfig::builder()
            .collection_ticker("TICKER-123456")
            .rate_per_second(5)
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("gateway_url"),
            "error should mention missing gateway_url"
        );

        let err = CollectorConfig::builder()
            .gateway_url("https://gateway.example.com")
            .collection_ticker("TICKER-123456")
            .build()
            .unwrap_err();
        assert!(
            format!("{err}").contains("rate_per_second"),
            "error should mention missing rate_per_second"
        );
    }

    #[test]
    fn validation_catches_invalid_values() {
        let err = base_builder()
            .gateway_url("ftp://invalid")
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("http:// or https://"));

        let err = base_builder().collection_ticker("   ").build().unwrap_err();
        assert!(format!("{err}").contains("collection_ticker"));

        let err = base_builder().page_size(0).build().unwrap_err();
        assert!(format!("{err}").contains("page_size"));

        let err = base_builder().rate_per_second(0).build().unwrap_err();
        assert!(format!("{err}").contains("rate_per_second"));

        let err = base_builder()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(format!("{err}").contains("request_timeout"));
    }

    #[test]
    fn direct_constructor_runs_validation() {
        let err = CollectorConfig::new(CollectorConfigParams {
            gateway_url: "https://gateway.example.com".into(),
            collection_ticker: "TICKER-123456".into(),
            page_size: 100,
            rate_per_second: 0,
            only_unique: false,
            exclude_contracts: false,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        })
        .unwrap_err();

        assert!(
            format!("{err}").contains("rate_per_second"),
            "error should mention invalid rate_per_second"
        );
    }
}
