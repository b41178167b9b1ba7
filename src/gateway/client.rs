//! HTTP client for the read-only collection gateway. Houses the
//! `GatewayClient`, error types, and the `PageClient` trait consumed by the
//! aggregation run.

use crate::aggregator::planner::PageIndex;
use crate::gateway::options::GatewayClientOptions;
use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;

#[derive(Debug)]
pub enum GatewayError {
    Timeout { endpoint: &'static str },
    Status { endpoint: &'static str, status: u16 },
    Decode { endpoint: &'static str },
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::Timeout { endpoint } => {
                write!(f, "gateway {endpoint} request timed out")
            }
            GatewayError::Status { endpoint, status } => {
                write!(f, "gateway {endpoint} request returned HTTP {status}")
            }
            GatewayError::Decode { endpoint } => {
                write!(f, "gateway {endpoint} response could not be decoded")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Seam between the aggregation run and whatever serves page data. The
/// production implementation is [`CollectionPages`]; tests substitute
/// scripted doubles.
pub trait PageClient: Send + Sync {
    fn fetch_page(&self, index: PageIndex) -> BoxFuture<'_, Result<Vec<String>>>;
}

#[derive(Debug, Deserialize)]
struct NftToken {
    owner: String,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Arc<String>,
    client: reqwest::Client,
    options: GatewayClientOptions,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, GatewayClientOptions::default())
    }

    pub fn with_options(base_url: impl Into<String>, options: GatewayClientOptions) -> Result<Self> {
        options.validate()?;

        let base_url = base_url.into().trim().trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            anyhow::bail!("gateway URL must start with http:// or https://");
        }

        let client = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|err| anyhow!("failed to build gateway HTTP client: {err}"))?;

        Ok(Self {
            base_url: Arc::new(base_url),
            client,
            options,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Fetches the collection's total token count. The gateway answers with
    /// the integer as plain text.
    pub async fn collection_nft_count(&self, ticker: &str) -> Result<u64> {
        const ENDPOINT: &str = "nfts/count";

        let url = count_url(&self.base_url, ticker);
        let body = self.get_text(&url, ENDPOINT).await?;
        let count = body
            .trim()
            .parse::<u64>()
            .map_err(|_| GatewayError::Decode { endpoint: ENDPOINT })
            .with_context(|| format!("collection {ticker} count was not an integer"))?;

        tracing::debug!(collection = ticker, count, "fetched collection token count");
        Ok(count)
    }

    /// Fetches one page of tokens with their owners and returns the owner
    /// addresses in the gateway's token order.
    pub async fn collection_owners_page(
        &self,
        ticker: &str,
        from: u64,
        size: usize,
    ) -> Result<Vec<String>> {
        const ENDPOINT: &str = "nfts";

        let url = owners_page_url(&self.base_url, ticker, from, size);
        let tokens: Vec<NftToken> = self.get_json(&url, ENDPOINT).await?;

        tracing::debug!(
            collection = ticker,
            from,
            owners = tokens.len(),
            "fetched owners page"
        );
        Ok(tokens.into_iter().map(|token| token.owner).collect())
    }

    async fn get_text(&self, url: &str, endpoint: &'static str) -> Result<String> {
        self.bounded(endpoint, async {
            let response = self.get_checked(url, endpoint).await?;
            response
                .text()
                .await
                .map_err(|_| GatewayError::Decode { endpoint }.into())
        })
        .await
    }

    async fn get_json<T>(&self, url: &str, endpoint: &'static str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.bounded(endpoint, async {
            let response = self.get_checked(url, endpoint).await?;
            response
                .json()
                .await
                .map_err(|_| GatewayError::Decode { endpoint }.into())
        })
        .await
    }

    // Covers the whole round trip, body read included. A gateway that sends
    // headers and then stalls must still trip the request timeout.
    async fn bounded<T>(
        &self,
        endpoint: &'static str,
        round_trip: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match timeout(self.options.request_timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout { endpoint }.into()),
        }
    }

    async fn get_checked(&self, url: &str, endpoint: &'static str) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| anyhow!("gateway {endpoint} request failed: {err}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint,
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response)
    }
}

fn count_url(base_url: &str, ticker: &str) -> String {
    format!("{base_url}/collections/{ticker}/nfts/count")
}

fn owners_page_url(base_url: &str, ticker: &str, from: u64, size: usize) -> String {
    format!("{base_url}/collections/{ticker}/nfts?withOwner=true&from={from}&size={size}")
}

/// Binds a gateway client to one collection query so the aggregator can fetch
/// by bare page index.
pub struct CollectionPages {
    client: Arc<GatewayClient>,
    ticker: String,
    page_size: usize,
}

impl CollectionPages {
    pub fn new(client: Arc<GatewayClient>, ticker: impl Into<String>, page_size: usize) -> Self {
        Self {
            client,
            ticker: ticker.into(),
            page_size,
        }
    }
}

impl PageClient for CollectionPages {
    fn fetch_page(&self, index: PageIndex) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            let from = (index as u64).saturating_mul(self.page_size as u64);
            self.client
                .collection_owners_page(&self.ticker, from, self.page_size)
                .await
        })
    }
}
