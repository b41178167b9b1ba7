use anyhow::{anyhow, bail, Result};
use collection_owners::{PageClient, PageIndex};
use futures::future::BoxFuture;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Scripted page source driving the aggregator in tests: controls per-page
/// arrival delays, injects failures, and records when each fetch was
/// initiated.
pub struct MockPages {
    fixtures: Vec<PageFixture>,
    initiations: Mutex<Vec<(PageIndex, Instant)>>,
}

struct PageFixture {
    owners: Vec<String>,
    delay: Duration,
    fail: bool,
}

impl MockPages {
    /// One fixture page per entry of `sizes`, with deterministic owner
    /// addresses of the form `owner-{page}-{i}`.
    pub fn new(sizes: &[usize]) -> Self {
        let fixtures = sizes
            .iter()
            .enumerate()
            .map(|(page, len)| PageFixture {
                owners: page_owners(page, *len),
                delay: Duration::ZERO,
                fail: false,
            })
            .collect();
        Self {
            fixtures,
            initiations: Mutex::new(Vec::new()),
        }
    }

    pub fn delay(mut self, index: PageIndex, delay: Duration) -> Self {
        self.fixtures[index].delay = delay;
        self
    }

    pub fn fail_at(mut self, index: PageIndex) -> Self {
        self.fixtures[index].fail = true;
        self
    }

    pub fn initiated_indices(&self) -> Vec<PageIndex> {
        self.initiations
            .lock()
            .unwrap()
            .iter()
            .map(|(index, _)| *index)
            .collect()
    }

    pub fn initiation_instants(&self) -> Vec<Instant> {
        self.initiations
            .lock()
            .unwrap()
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

impl PageClient for MockPages {
    fn fetch_page(&self, index: PageIndex) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            self.initiations.lock().unwrap().push((index, Instant::now()));

            let fixture = self
                .fixtures
                .get(index)
                .ok_or_else(|| anyhow!("no fixture for page {index}"))?;
            if !fixture.delay.is_zero() {
                sleep(fixture.delay).await;
            }
            if fixture.fail {
                bail!("injected gateway failure for page {index}");
            }
            Ok(fixture.owners.clone())
        })
    }
}

pub fn page_owners(page: usize, len: usize) -> Vec<String> {
    (0..len).map(|i| format!("owner-{page}-{i}")).collect()
}

/// Flattened owners for pages `0..sizes.len()` in page order.
pub fn expected_concat(sizes: &[usize]) -> Vec<String> {
    sizes
        .iter()
        .enumerate()
        .flat_map(|(page, len)| page_owners(page, *len))
        .collect()
}
