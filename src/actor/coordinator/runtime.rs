use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::actor::fs::ChangeSource;
use crate::actor::trigger::DebouncedTrigger;
use crate::core::Shutdown;

/// How long to wait for the change source after the trigger has stopped.
const WATCH_STOP_TIMEOUT: Duration = Duration::from_millis(500);

/// Start the tokio runtime on its own thread and run the pipeline on it.
///
/// The runtime is built here so a failure surfaces to the caller instead
/// of dying silently inside the thread.
pub(super) fn spawn_pipeline(
    source: Option<ChangeSource>,
    trigger: DebouncedTrigger,
    shutdown: Shutdown,
) -> Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("livewasm-pipeline")
        .enable_all()
        .build()
        .context("Failed to start pipeline runtime")?;

    std::thread::Builder::new()
        .name("livewasm-supervisor".into())
        .spawn(move || runtime.block_on(run_pipeline(source, trigger, shutdown)))
        .context("Failed to spawn pipeline thread")
}

/// Run the change source and the trigger concurrently until shutdown.
async fn run_pipeline(source: Option<ChangeSource>, trigger: DebouncedTrigger, shutdown: Shutdown) {
    let watch_handle = source.map(|source| tokio::spawn(source.run(shutdown.clone())));
    if watch_handle.is_none() {
        crate::debug!("watch"; "disabled, building once");
    }

    let trigger_handle = tokio::spawn(trigger.run(shutdown.clone()));
    if let Err(e) = trigger_handle.await {
        crate::log!("error"; "build trigger stopped unexpectedly: {}", e);
        shutdown.trigger();
    }

    if let Some(handle) = watch_handle {
        let _ = tokio::time::timeout(WATCH_STOP_TIMEOUT, handle).await;
    }
}
