mod support;

use collection_owners::{progress_channel, OwnersAggregator, PagePlan, Progress};
use std::sync::Arc;
use std::time::Duration;
use support::mock_pages::{expected_concat, MockPages};
use tokio::time::Instant;

#[tokio::test]
async fn run_assembles_pages_in_index_order() {
    // Three pages of sizes 100, 100, 50 arriving in order [2, 0, 1].
    let sizes = [100usize, 100, 50];
    let pages = Arc::new(
        MockPages::new(&sizes)
            .delay(0, Duration::from_millis(40))
            .delay(1, Duration::from_millis(80)),
    );
    let aggregator = OwnersAggregator::new(pages.clone(), 1_000);
    let plan = PagePlan::new(250, 100).unwrap();

    let owners = aggregator.run(&plan).await.unwrap();

    assert_eq!(owners.len(), sizes.iter().sum::<usize>());
    assert_eq!(owners, expected_concat(&sizes));
    assert_eq!(aggregator.telemetry().snapshot().pages_fetched, 3);

    let mut initiated = pages.initiated_indices();
    initiated.sort_unstable();
    assert_eq!(initiated, vec![0, 1, 2], "each page initiated exactly once");
}

#[tokio::test(start_paused = true)]
async fn initiations_respect_the_rate_ceiling() {
    let rate = 3usize;
    let page_count = 10usize;
    let sizes = vec![4usize; page_count];

    let pages = Arc::new(MockPages::new(&sizes));
    let aggregator = OwnersAggregator::new(pages.clone(), rate);
    let plan = PagePlan::new((page_count * 4) as u64, 4).unwrap();

    let owners = aggregator.run(&plan).await.unwrap();
    assert_eq!(owners.len(), page_count * 4);

    let instants = pages.initiation_instants();
    assert_eq!(instants.len(), page_count);
    let window = Duration::from_secs(1);
    let max_in_window = instants
        .iter()
        .map(|start| {
            instants
                .iter()
                .filter(|at| **at >= *start && at.duration_since(*start) < window)
                .count()
        })
        .max()
        .unwrap_or(0);
    assert!(
        max_in_window <= rate,
        "no sliding 1s window may see more than {rate} initiations, saw {max_in_window}"
    );
}

#[tokio::test]
async fn failing_page_fails_the_whole_run() {
    let pages = Arc::new(MockPages::new(&[10, 10, 10]).fail_at(1));
    let aggregator = OwnersAggregator::new(pages, 1_000);
    let plan = PagePlan::new(30, 10).unwrap();

    let err = aggregator.run(&plan).await.unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("page 1"), "error names the failed page: {message}");
    assert!(message.contains("injected gateway failure"));
}

#[tokio::test]
async fn failure_stops_further_initiations() {
    // Rate 1/s: the instant failure of page 0 cancels the run before the
    // second admission can be granted.
    let pages = Arc::new(MockPages::new(&[10, 10, 10]).fail_at(0));
    let aggregator = OwnersAggregator::new(pages.clone(), 1);
    let plan = PagePlan::new(30, 10).unwrap();

    aggregator.run(&plan).await.unwrap_err();
    assert_eq!(pages.initiated_indices(), vec![0]);
}

#[tokio::test]
async fn progress_walks_from_zero_to_total() {
    let page_count = 5usize;
    let pages = Arc::new(MockPages::new(&vec![2usize; page_count]));
    let aggregator = OwnersAggregator::new(pages, 1_000);
    let plan = PagePlan::new((page_count * 2) as u64, 2).unwrap();

    let (progress_tx, mut progress_rx) = progress_channel(plan.page_count());
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while progress_rx.changed().await.is_ok() {
            seen.push(*progress_rx.borrow_and_update());
        }
        seen
    });

    aggregator
        .run_with_progress(&plan, progress_tx)
        .await
        .unwrap();
    let seen = observer.await.unwrap();

    // watch coalesces unread updates, so only monotonicity and the final
    // value are guaranteed.
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0].completed <= w[1].completed));
    assert_eq!(
        *seen.last().unwrap(),
        Progress {
            completed: page_count,
            total: page_count
        }
    );
}

#[tokio::test(start_paused = true)]
async fn large_simultaneous_completion_signals_exactly_once() {
    // Every page resolves at the same paused-clock instant; completion must
    // still fire exactly once with all slots accounted for.
    let page_count = 64usize;
    let sizes = vec![1usize; page_count];
    let mut pages = MockPages::new(&sizes);
    for index in 0..page_count {
        pages = pages.delay(index, Duration::from_millis(10));
    }
    let aggregator = OwnersAggregator::new(Arc::new(pages), page_count);
    let plan = PagePlan::new(page_count as u64, 1).unwrap();

    let started = Instant::now();
    let owners = aggregator.run(&plan).await.unwrap();
    assert_eq!(owners.len(), page_count);
    assert_eq!(owners, expected_concat(&sizes));
    assert!(started.elapsed() >= Duration::from_millis(10));
}
