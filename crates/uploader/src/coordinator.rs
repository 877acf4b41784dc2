//! Upload coordinator: owns the background worker, the one-slot handoff
//! buffer, the stats, and the stop token.
//!
//! Producer/consumer handoff uses a bounded wake channel of capacity one
//! instead of a condvar monitor: `submit` claims the buffer and pushes a
//! wake token, the worker `select!`s on the wake channel and the stop
//! token, so no wakeup can be missed between a claim and the worker's
//! next wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::buffer::{BufferError, TransferBuffer};
use crate::settings::UploadSettings;
use crate::stats::{StatsTracker, UploadStats};
use crate::transport::{HookAction, TransferError, TransferHooks, Transport};
use crate::UploadError;

/// State shared between the public API, the worker task, and the
/// transport hooks.
struct Shared {
    settings: UploadSettings,
    transport: Box<dyn Transport>,
    buffer: TransferBuffer,
    stats: Mutex<StatsTracker>,
    /// True when no transfer is pending. Starts true so callers can gate
    /// their first submission on `is_complete`.
    complete: AtomicBool,
    /// Write-once stop flag; checked at the worker loop top and inside
    /// both transport hooks.
    stop: CancellationToken,
}

impl TransferHooks for Shared {
    fn on_progress(&self, bytes_sent: u64) -> HookAction {
        if self.stop.is_cancelled() {
            debug!("stop requested, aborting transfer from progress hook");
            return HookAction::Abort;
        }
        self.stats.lock().unwrap().record(bytes_sent);
        HookAction::Continue
    }

    fn on_response_data(&self, data: &[u8]) -> HookAction {
        if self.stop.is_cancelled() {
            debug!("stop requested, aborting transfer from response hook");
            return HookAction::Abort;
        }
        // Response content is not persisted.
        debug!(len = data.len(), "server response data");
        HookAction::Continue
    }
}

/// Drives one [`Transport`] with a single background worker.
///
/// `submit`, `stats`, and `is_complete` may be called from arbitrary
/// tasks or threads concurrently with the worker; none of them block on
/// an in-flight transfer.
pub struct UploadCoordinator {
    shared: Arc<Shared>,
    wake_tx: mpsc::Sender<()>,
    wake_rx: Option<mpsc::Receiver<()>>,
    worker: Option<JoinHandle<()>>,
}

impl UploadCoordinator {
    /// Validates `settings` and wires up the transport collaborator.
    ///
    /// All errors are terminal for the session; the caller must not call
    /// [`run`](Self::run) after a failed `init`.
    pub fn init(
        settings: UploadSettings,
        transport: Box<dyn Transport>,
    ) -> Result<Self, UploadError> {
        settings.validate()?;
        let (wake_tx, wake_rx) = mpsc::channel(1);
        info!(url = %settings.target_url, "uploader initialized");
        Ok(Self {
            shared: Arc::new(Shared {
                settings,
                transport,
                buffer: TransferBuffer::new(),
                stats: Mutex::new(StatsTracker::new()),
                complete: AtomicBool::new(true),
                stop: CancellationToken::new(),
            }),
            wake_tx,
            wake_rx: Some(wake_rx),
            worker: None,
        })
    }

    /// Spawns the background worker.
    ///
    /// # Panics
    ///
    /// Calling `run` twice on the same coordinator is a programming
    /// error and panics rather than spawning a second worker.
    pub fn run(&mut self) {
        assert!(self.worker.is_none(), "uploader worker already running");
        let wake_rx = self
            .wake_rx
            .take()
            .expect("wake receiver consumed without a worker");
        let shared = Arc::clone(&self.shared);
        self.worker = Some(tokio::spawn(worker_loop(shared, wake_rx)));
    }

    /// Hands a chunk to the worker. Non-blocking.
    ///
    /// Returns [`UploadError::UploadInProgress`] while a transfer is in
    /// flight (the in-flight chunk is left untouched) and
    /// [`UploadError::Stopping`] once [`stop`](Self::stop) has been
    /// requested.
    pub fn submit(&self, data: &[u8]) -> Result<(), UploadError> {
        if self.shared.stop.is_cancelled() {
            return Err(UploadError::Stopping);
        }
        self.shared.buffer.try_claim(data).map_err(|e| match e {
            BufferError::AlreadyClaimed => UploadError::UploadInProgress,
            BufferError::EmptyChunk => UploadError::InvalidArgument("empty chunk".into()),
            BufferError::NotClaimed => UploadError::InvalidArgument(e.to_string()),
        })?;
        self.shared.complete.store(false, Ordering::Release);
        debug!(bytes = data.len(), "waking worker");
        // A full wake slot means the worker is already due to wake.
        let _ = self.wake_tx.try_send(());
        Ok(())
    }

    /// Returns a consistent copy of the current transfer stats.
    pub fn stats(&self) -> UploadStats {
        self.shared.stats.lock().unwrap().snapshot()
    }

    /// Non-blocking poll: true when no transfer is pending.
    pub fn is_complete(&self) -> bool {
        self.shared.complete.load(Ordering::Acquire)
    }

    /// Cooperative shutdown: sets the stop flag (which also wakes an idle
    /// worker) and waits for the worker to exit. Further submissions are
    /// rejected with [`UploadError::Stopping`]. Idempotent.
    ///
    /// An in-flight transfer is not drained: the hooks return an abort
    /// signal and the transport decides how quickly `perform` returns.
    pub async fn stop(&mut self) {
        self.shared.stop.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!(error = %e, "upload worker panicked");
            }
        }
        debug!("uploader stopped");
    }

    /// The settings this coordinator was initialized with.
    pub fn settings(&self) -> &UploadSettings {
        &self.shared.settings
    }
}

/// Worker: waits for a wake, drains the claimed buffer through the
/// transport, releases the buffer, loops. Exits when the stop token is
/// cancelled or when woken with a free buffer (a stop-side wake).
async fn worker_loop(shared: Arc<Shared>, mut wake_rx: mpsc::Receiver<()>) {
    debug!("upload worker running");
    loop {
        tokio::select! {
            biased;
            _ = shared.stop.cancelled() => break,
            wake = wake_rx.recv() => {
                if wake.is_none() {
                    // Coordinator dropped without stop().
                    break;
                }
            }
        }
        if shared.stop.is_cancelled() {
            break;
        }
        let Some(chunk) = shared.buffer.view() else {
            debug!("woke with a free buffer, stopping");
            break;
        };

        let length = chunk.len();
        shared.stats.lock().unwrap().reset();
        debug!(bytes = length, "starting transfer");

        let hooks: Arc<dyn TransferHooks> = Arc::clone(&shared) as Arc<dyn TransferHooks>;
        match shared.transport.perform(chunk, hooks).await {
            Ok(status) => {
                info!(status, bytes = length, "transfer complete");
                shared.complete.store(true, Ordering::Release);
            }
            Err(TransferError::Aborted) => {
                debug!("transfer aborted by stop request");
            }
            Err(e) => {
                // Absorbed: the loop keeps waiting for the next
                // submission, failed transfers are never retried.
                warn!(error = %e, bytes = length, "transfer failed");
            }
        }
        if let Err(e) = shared.buffer.release() {
            error!(error = %e, "buffer release failed");
        }
    }
    debug!("upload worker done");
}
