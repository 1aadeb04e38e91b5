//! Execution bridge: the single background execution context.
//!
//! A synchronous caller (UI thread, CLI main) cannot drive async work
//! itself. The bridge owns a dedicated OS thread running a current-thread
//! tokio runtime; callers submit operations to it and get back an
//! [`ExecutionHandle`] to cancel, poll or wait on.
//!
//! Submitted operations run concurrently and may interleave at their
//! suspension points. Serialising effects is the caller's job (see
//! `Session`).

use std::future::Future;
use std::sync::mpsc as std_mpsc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tokio_util::task::TaskTracker;

use hueflow_domain::error::HueError;
use hueflow_domain::id::ExecutionId;

use crate::CancellationToken;

/// Lifecycle of a submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl ExecutionStatus {
    /// Whether the operation has finished, one way or another.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }

    fn settled<T>(result: &Result<T, HueError>, cancelled: bool) -> Self {
        match result {
            Err(_) => Self::Failed,
            Ok(_) if cancelled => Self::Cancelled,
            Ok(_) => Self::Completed,
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Handle to one submitted operation.
///
/// The result is published before the status turns terminal, so once
/// [`status`](Self::status) reports a terminal value, [`wait`](Self::wait)
/// returns without blocking.
pub struct ExecutionHandle<T> {
    id: ExecutionId,
    token: CancellationToken,
    status: watch::Receiver<ExecutionStatus>,
    result: std_mpsc::Receiver<Result<T, HueError>>,
}

impl<T> std::fmt::Debug for ExecutionHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl<T> ExecutionHandle<T> {
    #[must_use]
    pub fn id(&self) -> ExecutionId {
        self.id
    }

    /// The cancellation token handed to the operation.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation. Idempotent; the operation notices at its next
    /// check point.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::info!(id = %self.id, "cancellation requested");
            self.token.cancel();
        }
    }

    #[must_use]
    pub fn status(&self) -> ExecutionStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// Resolves once the operation has settled, without taking its result.
    pub(crate) fn settled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut status = self.status.clone();
        async move {
            // a closed channel means the bridge is gone; nothing left to wait for
            let _ = status.wait_for(|status| status.is_terminal()).await;
        }
    }

    /// Block until the operation finishes.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, [`HueError::Aborted`] if it
    /// panicked, or [`HueError::BridgeClosed`] if the bridge went away
    /// before the operation could finish.
    pub fn wait(self) -> Result<T, HueError> {
        self.result.recv().map_err(|_| HueError::BridgeClosed)?
    }

    /// Block for at most `timeout`. On timeout the operation keeps running
    /// and the handle stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::Timeout`] when `timeout` elapses first, the
    /// operation's own error, or [`HueError::BridgeClosed`] if the result
    /// is no longer available.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<T, HueError> {
        match self.result.recv_timeout(timeout) {
            Ok(result) => result,
            Err(std_mpsc::RecvTimeoutError::Timeout) => Err(HueError::Timeout(timeout)),
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Err(HueError::BridgeClosed),
        }
    }
}

struct Running {
    runtime: Handle,
    shutdown: oneshot::Sender<()>,
}

/// Owns the background thread and its runtime.
///
/// Dropping the bridge has the same effect as [`stop`](Self::stop).
pub struct ExecutionBridge {
    running: Mutex<Option<Running>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    tracker: TaskTracker,
}

impl std::fmt::Debug for ExecutionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionBridge")
            .field("running", &self.is_running())
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ExecutionBridge {
    /// Spawn the background thread and wait until its runtime is ready.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::BridgeStartup`] if the thread or its runtime
    /// cannot be created.
    pub fn start() -> Result<Self, HueError> {
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let tracker = TaskTracker::new();
        let worker_tracker = tracker.clone();

        let worker = thread::Builder::new()
            .name("hueflow-bridge".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(runtime.handle().clone()));

                runtime.block_on(async move {
                    // a dropped sender counts as a shutdown request
                    let _ = shutdown_rx.await;
                    worker_tracker.close();
                    worker_tracker.wait().await;
                });
                tracing::debug!("execution bridge drained");
            })
            .map_err(HueError::BridgeStartup)?;

        let runtime = ready_rx
            .recv()
            .map_err(|_| {
                HueError::BridgeStartup(std::io::Error::other(
                    "bridge thread exited before its runtime was ready",
                ))
            })?
            .map_err(HueError::BridgeStartup)?;

        tracing::info!("execution bridge started");
        Ok(Self {
            running: Mutex::new(Some(Running {
                runtime,
                shutdown: shutdown_tx,
            })),
            worker: Mutex::new(Some(worker)),
            tracker,
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.running).is_some()
    }

    /// Schedule `operation` on the background context and return at once.
    ///
    /// `operation` receives the execution's cancellation token; the future
    /// it returns runs on the bridge thread.
    ///
    /// # Errors
    ///
    /// Returns [`HueError::BridgeClosed`] once the bridge has been stopped.
    pub fn submit<F, Fut, T>(&self, operation: F) -> Result<ExecutionHandle<T>, HueError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, HueError>> + Send + 'static,
        T: Send + 'static,
    {
        let running = lock(&self.running);
        let running = running.as_ref().ok_or(HueError::BridgeClosed)?;

        let id = ExecutionId::new();
        let token = CancellationToken::new();
        let (status_tx, status_rx) = watch::channel(ExecutionStatus::Running);
        let (result_tx, result_rx) = std_mpsc::sync_channel(1);

        let future = operation(token.clone());
        let task_token = token.clone();
        self.tracker.spawn_on(
            async move {
                // its own task, so a panic still settles the handle
                let result = match tokio::spawn(future).await {
                    Ok(result) => result,
                    Err(err) => Err(HueError::Aborted(err.to_string())),
                };
                let status = ExecutionStatus::settled(&result, task_token.is_cancelled());
                match &result {
                    Ok(_) => tracing::debug!(%id, %status, "execution finished"),
                    Err(err) => tracing::warn!(%id, %err, "execution failed"),
                }
                let _ = result_tx.send(result);
                status_tx.send_replace(status);
            },
            &running.runtime,
        );
        tracing::debug!(%id, "execution submitted");

        Ok(ExecutionHandle {
            id,
            token,
            status: status_rx,
            result: result_rx,
        })
    }

    /// Submit `operation` and block until it finishes or `timeout` elapses.
    ///
    /// On timeout the operation's token is cancelled before returning.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error, [`HueError::Timeout`] when the
    /// deadline passes, or [`HueError::BridgeClosed`] after
    /// [`stop`](Self::stop).
    pub fn run_blocking<F, Fut, T>(&self, operation: F, timeout: Duration) -> Result<T, HueError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, HueError>> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.submit(operation)?;
        handle.wait_timeout(timeout).inspect_err(|err| {
            if matches!(err, HueError::Timeout(_)) {
                tracing::warn!(id = %handle.id(), ?timeout, "blocking call timed out");
                handle.cancel();
            }
        })
    }

    /// Request cancellation of a submitted operation. Idempotent.
    pub fn cancel<T>(&self, handle: &ExecutionHandle<T>) {
        handle.cancel();
    }

    /// Refuse new work and let in-flight operations drain. Returns without
    /// waiting; idempotent.
    pub fn stop(&self) {
        if let Some(running) = lock(&self.running).take() {
            tracing::info!(in_flight = self.tracker.len(), "execution bridge stopping");
            let _ = running.shutdown.send(());
        }
    }

    /// [`stop`](Self::stop), then block until every in-flight operation has
    /// finished and the background thread has exited.
    ///
    /// Must not be called from inside a submitted operation.
    pub fn shutdown(&self) {
        self.stop();
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker
            && worker.join().is_err()
        {
            tracing::error!("execution bridge thread panicked");
        }
    }
}
