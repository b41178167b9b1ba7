use tokio::sync::watch;

/// Snapshot of run progress published after each page lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

pub type ProgressSender = watch::Sender<Progress>;
pub type ProgressReceiver = watch::Receiver<Progress>;

/// Creates the progress channel for a run over `total` pages.
///
/// The aggregation core only ever writes to the sender; whatever wants to
/// render progress (spinner, log line, nothing at all) subscribes on the
/// receiver and stays out of the core's way.
pub fn progress_channel(total: usize) -> (ProgressSender, ProgressReceiver) {
    watch::channel(Progress {
        completed: 0,
        total,
    })
}
