//! The aggregation run: throttled sequential dispatch of page fetches into a
//! task set, index-addressed assembly on the slot board, and first-failure
//! short-circuiting.
//!
//! Dispatch is deliberately sequential: one loop walks the planned indices in
//! order and awaits throttle admission before spawning each fetch. At most
//! one initiation ever waits on the limiter, so nothing queues without bound
//! even for huge collections at low rates, and initiation order trivially
//! follows planner order. Correctness never depends on that order though --
//! results are keyed by page index into the slot board.

use crate::aggregator::planner::{PageIndex, PagePlan};
use crate::aggregator::progress::{progress_channel, Progress, ProgressSender};
use crate::aggregator::slots::{Placement, SlotBoard};
use crate::aggregator::throttle::Throttle;
use crate::gateway::client::{GatewayError, PageClient};
use crate::runtime::telemetry::Telemetry;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Fetches every planned page under a rate cap and returns the flattened
/// owner list in page order.
///
/// A run either fully succeeds or fails as a whole: the first fetch error
/// stops further initiations, already-landed pages are discarded, and the
/// error propagates to the caller. Every spawned fetch is observed before
/// [`OwnersAggregator::run`] returns.
pub struct OwnersAggregator<C> {
    client: Arc<C>,
    rate_per_second: usize,
    telemetry: Arc<Telemetry>,
    shutdown: CancellationToken,
}

impl<C: PageClient + 'static> OwnersAggregator<C> {
    /// Creates an aggregator with its own root cancellation token. Use
    /// [`Self::with_cancellation_token`] to integrate with an existing
    /// shutdown mechanism.
    pub fn new(client: Arc<C>, rate_per_second: usize) -> Self {
        Self::with_cancellation_token(client, rate_per_second, CancellationToken::new())
    }

    pub fn with_cancellation_token(
        client: Arc<C>,
        rate_per_second: usize,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            rate_per_second,
            telemetry: Arc::new(Telemetry::default()),
            shutdown,
        }
    }

    /// Returns a clone of the telemetry handle for observability.
    pub fn telemetry(&self) -> Arc<Telemetry> {
        self.telemetry.clone()
    }

    /// Runs the plan without progress reporting.
    pub async fn run(&self, plan: &PagePlan) -> Result<Vec<String>> {
        let (progress_tx, _progress_rx) = progress_channel(plan.page_count());
        self.run_with_progress(plan, progress_tx).await
    }

    /// Runs the plan, publishing `(completed, total)` on `progress` after
    /// each page lands.
    pub async fn run_with_progress(
        &self,
        plan: &PagePlan,
        progress: ProgressSender,
    ) -> Result<Vec<String>> {
        let page_count = plan.page_count();
        if page_count == 0 {
            return Ok(Vec::new());
        }

        let board = Arc::new(SlotBoard::new(page_count));
        let throttle = Throttle::per_second(self.rate_per_second)?;
        let run_token = self.shutdown.child_token();
        let mut fetches: JoinSet<Result<Option<Vec<String>>>> = JoinSet::new();

        for index in plan.indices() {
            // Stop initiating as soon as a failure (or an external shutdown)
            // cancels the run. Cancellation wins over a ready permit.
            tokio::select! {
                biased;
                _ = run_token.cancelled() => break,
                _ = throttle.admit() => {}
            }

            fetches.spawn(fetch_task(FetchTask {
                index,
                client: self.client.clone(),
                board: board.clone(),
                run_token: run_token.clone(),
                telemetry: self.telemetry.clone(),
                progress: progress.clone(),
                page_count,
            }));
        }

        // Observe every spawned fetch before the run is considered finished.
        let mut completed_owners = None;
        let mut first_error = None;
        while let Some(joined) = fetches.join_next().await {
            match joined {
                Ok(Ok(Some(owners))) => completed_owners = Some(owners),
                Ok(Ok(None)) => {}
                Ok(Err(err)) => {
                    run_token.cancel();
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(join_err) => {
                    run_token.cancel();
                    if first_error.is_none() {
                        first_error = Some(anyhow!(join_err).context("page fetch task failed"));
                    }
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        if let Some(owners) = completed_owners {
            return Ok(owners);
        }
        if run_token.is_cancelled() {
            return Err(anyhow!("aggregation run was cancelled before completing"));
        }

        Err(anyhow!("run ended without filling every page slot"))
    }
}

struct FetchTask<C> {
    index: PageIndex,
    client: Arc<C>,
    board: Arc<SlotBoard>,
    run_token: CancellationToken,
    telemetry: Arc<Telemetry>,
    progress: ProgressSender,
    page_count: usize,
}

async fn fetch_task<C: PageClient>(task: FetchTask<C>) -> Result<Option<Vec<String>>> {
    let FetchTask {
        index,
        client,
        board,
        run_token,
        telemetry,
        progress,
        page_count,
    } = task;

    let owners = match client.fetch_page(index).await {
        Ok(owners) => owners,
        Err(err) => {
            if matches!(
                err.downcast_ref::<GatewayError>(),
                Some(GatewayError::Timeout { .. })
            ) {
                telemetry.record_gateway_timeout();
            } else {
                telemetry.record_gateway_error();
            }
            run_token.cancel();
            return Err(err.context(format!("failed to fetch page {index}")));
        }
    };

    // The run already failed; a late success must not be acted on.
    if run_token.is_cancelled() {
        return Ok(None);
    }

    telemetry.record_page_fetched();

    match board.place(index, owners)? {
        Placement::Completed(owners) => {
            publish_progress(&progress, page_count, page_count);
            tracing::debug!(pages = page_count, "all page slots filled");
            Ok(Some(owners))
        }
        Placement::Pending { completed } => {
            publish_progress(&progress, completed, page_count);
            tracing::debug!(page = index, completed, total = page_count, "page landed");
            Ok(None)
        }
    }
}

// Placements are monotonic under the board lock, but publication happens
// outside it; only ever move the published count forward.
fn publish_progress(progress: &ProgressSender, completed: usize, total: usize) {
    progress.send_if_modified(|current| {
        if completed > current.completed {
            *current = Progress { completed, total };
            true
        } else {
            false
        }
    });
}
