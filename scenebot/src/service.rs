//! Scheduling work onto the toolkit's UI thread
//!
//! Every read or write of the live scene graph goes through a
//! [`ToolkitService`]: the caller submits a job, gets a [`UiHandle`] back and
//! blocks on it with a bounded timeout.

use crate::errors::RobotError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tokio::task;
use tracing::{debug, error, warn};

/// A unit of work for the UI thread
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

pub trait ToolkitService: Send + Sync {
    /// Queue `job` for execution on the UI thread. Jobs submitted from one
    /// thread run in submission order.
    fn run_later(&self, job: UiJob) -> Result<(), RobotError>;
}

/// Result of a scheduled job, to be awaited with a timeout
pub struct UiHandle<T> {
    rx: mpsc::Receiver<Result<T, RobotError>>,
    label: String,
}

impl<T: Send + 'static> UiHandle<T> {
    /// Block the calling thread until the job finishes or `timeout` passes.
    /// A timed-out job is not cancelled.
    pub fn wait(self, timeout: Duration) -> Result<T, RobotError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!("UI action '{}' did not finish within {:?}", self.label, timeout);
                Err(RobotError::Timeout(format!(
                    "UI action '{}' did not finish within {timeout:?}",
                    self.label
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RobotError::Internal(format!(
                "UI action '{}' was dropped before it ran",
                self.label
            ))),
        }
    }

    /// Same as [`UiHandle::wait`], without stalling the async runtime.
    pub async fn wait_async(self, timeout: Duration) -> Result<T, RobotError> {
        task::spawn_blocking(move || self.wait(timeout))
            .await
            .map_err(|e| RobotError::PlatformError(format!("Task join error: {e}")))?
    }
}

/// Submit `f` to `service` and return a handle to its result. Panics inside
/// `f` are reported as `RobotError::Internal`.
pub fn run_later<T, F>(
    service: &dyn ToolkitService,
    label: impl Into<String>,
    f: F,
) -> Result<UiHandle<T>, RobotError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RobotError> + Send + 'static,
{
    let label = label.into();
    let (tx, rx) = mpsc::sync_channel(1);
    let job_label = label.clone();
    service.run_later(Box::new(move || {
        let result = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("UI action '{}' panicked: {}", job_label, message);
                Err(RobotError::Internal(format!(
                    "UI action '{job_label}' panicked: {message}"
                )))
            }
        };
        // The waiter may have timed out and gone away.
        let _ = tx.send(result);
    }))?;
    Ok(UiHandle { rx, label })
}

/// Run `f` on the UI thread and wait for it.
pub fn run_and_wait<T, F>(
    service: &dyn ToolkitService,
    label: impl Into<String>,
    timeout: Duration,
    f: F,
) -> Result<T, RobotError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RobotError> + Send + 'static,
{
    run_later(service, label, f)?.wait(timeout)
}

/// A dedicated thread that plays the role of the toolkit's UI thread.
///
/// Jobs are drained in FIFO order. Dropping the `UiThread` closes the queue;
/// the thread exits after finishing what was already queued.
pub struct UiThread {
    tx: Mutex<Option<mpsc::Sender<UiJob>>>,
    handle: Option<thread::JoinHandle<()>>,
}

pub const UI_THREAD_NAME: &str = "scenebot-ui";

impl UiThread {
    pub fn spawn() -> Result<Self, RobotError> {
        let (tx, rx) = mpsc::channel::<UiJob>();
        let handle = thread::Builder::new()
            .name(UI_THREAD_NAME.to_string())
            .spawn(move || {
                debug!("UI thread started");
                for job in rx {
                    job();
                }
                debug!("UI thread stopped");
            })
            .map_err(|e| RobotError::PlatformError(format!("Failed to spawn UI thread: {e}")))?;
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            handle: Some(handle),
        })
    }

    /// Whether the current thread is this service's UI thread.
    pub fn is_ui_thread(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.thread().id() == thread::current().id(),
            None => false,
        }
    }
}

impl ToolkitService for UiThread {
    fn run_later(&self, job: UiJob) -> Result<(), RobotError> {
        let guard = self
            .tx
            .lock()
            .map_err(|_| RobotError::Internal("UI thread queue lock poisoned".to_string()))?;
        let tx = guard
            .as_ref()
            .ok_or_else(|| RobotError::Internal("UI thread is shut down".to_string()))?;
        tx.send(job)
            .map_err(|_| RobotError::Internal("UI thread has stopped".to_string()))
    }
}

impl Drop for UiThread {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.tx.lock() {
            guard.take();
        }
        if let Some(handle) = self.handle.take() {
            // Never join ourselves when the last reference dies on the UI thread.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}
