use anyhow::{bail, Result};
use clap::Parser;
use collection_owners::{
    dedup_owners, exclude_contracts, init_tracing, progress_channel, BechPrefixClassifier,
    CollectionPages, CollectorConfig, GatewayClient, GatewayClientOptions, OwnersAggregator,
    PagePlan,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Collects the owner address of every NFT in a collection and writes the
/// list to `nft-collection-owners.json`.
#[derive(Parser, Debug)]
#[command(name = "collection-owners", version)]
struct Cli {
    /// Collection ticker, e.g. TICKER-123456
    #[arg(long)]
    collection: String,

    /// Gateway base URL
    #[arg(long, default_value = "https://gateway.multiversx.com")]
    gateway: String,

    /// Maximum page fetches initiated per second
    #[arg(long, default_value_t = 5)]
    rate: usize,

    /// Tokens requested per page fetch
    #[arg(long, default_value_t = 100)]
    page_size: usize,

    /// Keep each owner address only once
    #[arg(long)]
    only_uniq: bool,

    /// Drop smart contract addresses from the result
    #[arg(long)]
    no_smart_contracts: bool,

    /// Directory the owners file is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = CollectorConfig::builder()
        .gateway_url(cli.gateway)
        .collection_ticker(cli.collection)
        .rate_per_second(cli.rate)
        .page_size(cli.page_size)
        .only_unique(cli.only_uniq)
        .exclude_contracts(cli.no_smart_contracts)
        .request_timeout(Duration::from_secs(cli.timeout_secs))
        .build()?;

    let client = Arc::new(GatewayClient::with_options(
        config.gateway_url(),
        GatewayClientOptions {
            request_timeout: config.request_timeout(),
            ..GatewayClientOptions::default()
        },
    )?);

    let total = client
        .collection_nft_count(config.collection_ticker())
        .await?;
    tracing::info!(
        collection = config.collection_ticker(),
        total,
        "collection token count fetched"
    );
    if total == 0 {
        bail!(
            "collection {} has no tokens",
            config.collection_ticker()
        );
    }

    let plan = PagePlan::new(total, config.page_size())?;
    let pages = Arc::new(CollectionPages::new(
        client,
        config.collection_ticker().to_owned(),
        config.page_size(),
    ));
    let aggregator = OwnersAggregator::new(pages, config.rate_per_second());

    let (progress_tx, mut progress_rx) = progress_channel(plan.page_count());
    let reporter = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let progress = *progress_rx.borrow_and_update();
            tracing::info!(
                completed = progress.completed,
                total = progress.total,
                "pages aggregated"
            );
        }
    });

    let run_result = aggregator.run_with_progress(&plan, progress_tx).await;
    let _ = reporter.await;
    let mut owners = run_result?;

    if config.only_unique() {
        owners = dedup_owners(owners);
    }
    if config.exclude_contracts() {
        owners = exclude_contracts(owners, &BechPrefixClassifier::multiversx());
    }

    match write_filtered_owners(&owners, &cli.out_dir)? {
        Some(path) => {
            let telemetry = aggregator.telemetry().snapshot();
            tracing::info!(
                addresses = owners.len(),
                pages = telemetry.pages_fetched,
                path = %path.display(),
                "owners file written"
            );
        }
        None => tracing::warn!("every owner address was filtered out, nothing to write"),
    }

    Ok(())
}

/// Writes the owners file, unless filtering left nothing to record.
fn write_filtered_owners(owners: &[String], out_dir: &Path) -> Result<Option<PathBuf>> {
    if owners.is_empty() {
        return Ok(None);
    }
    collection_owners::write_owners_file(owners, out_dir).map(Some)
}
