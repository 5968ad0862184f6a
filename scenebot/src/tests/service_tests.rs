use super::init_tracing;
use crate::service::{self, UiJob, UI_THREAD_NAME};
use crate::{RobotError, ToolkitService, UiThread};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Accepts jobs but never runs them, like a UI thread stuck in a long handler.
#[derive(Default)]
struct StalledService {
    queued: Mutex<Vec<UiJob>>,
}

impl ToolkitService for StalledService {
    fn run_later(&self, job: UiJob) -> Result<(), RobotError> {
        self.queued.lock().unwrap().push(job);
        Ok(())
    }
}

/// Drops every job without running it.
struct DiscardingService;

impl ToolkitService for DiscardingService {
    fn run_later(&self, _job: UiJob) -> Result<(), RobotError> {
        Ok(())
    }
}

#[test]
fn test_jobs_run_on_ui_thread_in_order() {
    init_tracing();
    let ui = UiThread::spawn().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for i in 0..5 {
        let seen = seen.clone();
        handles.push(
            service::run_later(&ui, format!("job {i}"), move || {
                seen.lock().unwrap().push(i);
                Ok(std::thread::current().name().map(str::to_string))
            })
            .unwrap(),
        );
    }
    for handle in handles {
        let thread = handle.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(thread.as_deref(), Some(UI_THREAD_NAME));
    }
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    assert!(!ui.is_ui_thread());
}

#[test]
fn test_run_and_wait_returns_job_result() {
    let ui = UiThread::spawn().unwrap();
    let answer = service::run_and_wait(&ui, "answer", Duration::from_secs(5), || Ok(42)).unwrap();
    assert_eq!(answer, 42);

    let err = service::run_and_wait::<(), _>(&ui, "fail", Duration::from_secs(5), || {
        Err(RobotError::InvalidArgument("bad".to_string()))
    })
    .unwrap_err();
    assert!(matches!(err, RobotError::InvalidArgument(_)));
}

#[test]
fn test_panicking_job_reports_internal_error() {
    let ui = UiThread::spawn().unwrap();
    let err = service::run_and_wait::<(), _>(&ui, "explode", Duration::from_secs(5), || {
        panic!("handler blew up")
    })
    .unwrap_err();
    match err {
        RobotError::Internal(message) => assert!(message.contains("handler blew up")),
        other => panic!("unexpected error: {other:?}"),
    }

    // The UI thread survives the panic.
    let value =
        service::run_and_wait(&ui, "after", Duration::from_secs(5), || Ok("alive")).unwrap();
    assert_eq!(value, "alive");
}

#[test]
fn test_stalled_ui_thread_times_out() {
    init_tracing();
    let stalled = StalledService::default();
    let err = service::run_and_wait(&stalled, "stuck", Duration::from_millis(50), || Ok(()))
        .unwrap_err();
    assert!(matches!(err, RobotError::Timeout(_)));
    assert!(err.to_string().contains("stuck"));
    assert_eq!(stalled.queued.lock().unwrap().len(), 1);
}

#[test]
fn test_dropped_job_is_reported() {
    let err = service::run_and_wait(&DiscardingService, "lost", Duration::from_secs(1), || Ok(()))
        .unwrap_err();
    assert!(matches!(err, RobotError::Internal(_)));
}

#[test]
fn test_dropping_ui_thread_finishes_queued_jobs() {
    let ui = UiThread::spawn().unwrap();
    let handle = service::run_later(&ui, "slow", || {
        std::thread::sleep(Duration::from_millis(20));
        Ok("done")
    })
    .unwrap();
    drop(ui);
    assert_eq!(handle.wait(Duration::from_secs(1)).unwrap(), "done");
}

#[tokio::test]
async fn test_wait_async() {
    let ui = UiThread::spawn().unwrap();
    let handle = service::run_later(&ui, "async", || Ok(7)).unwrap();
    assert_eq!(handle.wait_async(Duration::from_secs(5)).await.unwrap(), 7);

    let stalled = StalledService::default();
    let handle = service::run_later(&stalled, "async stuck", || Ok(())).unwrap();
    assert!(matches!(
        handle.wait_async(Duration::from_millis(20)).await,
        Err(RobotError::Timeout(_))
    ));
}
