//! SIGINT handling
//!
//! The first Ctrl+C asks the controller to abort gracefully through its
//! cancellation token; a second one exits the process immediately.

use futures::stream::StreamExt;
use signal_hook::consts::SIGINT;
use signal_hook_tokio::Signals;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Background SIGINT listener bound to one controller run
pub struct SignalHandler {
    task_handle: JoinHandle<()>,
}

impl SignalHandler {
    /// Start listening; `abort` is the controller's abort handle.
    pub fn start(abort: CancellationToken) -> anyhow::Result<Self> {
        let mut signals = Signals::new([SIGINT])?;
        let task_handle = tokio::spawn(async move {
            while let Some(signal) = signals.next().await {
                if signal != SIGINT {
                    continue;
                }
                if abort.is_cancelled() {
                    tracing::warn!("second interrupt; forcing exit");
                    std::process::exit(130);
                }
                tracing::warn!("interrupt received; stopping the task (Ctrl+C again to force quit)");
                abort.cancel();
            }
        });
        Ok(Self { task_handle })
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}
