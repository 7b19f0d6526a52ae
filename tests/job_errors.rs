#![cfg(unix)]

use std::error::Error;

use gitqueue::errors::GitqueueError;
use gitqueue::job::{GitJob, JobState};
use gitqueue_test_utils::builders::JobBuilder;
use gitqueue_test_utils::{init_tracing, wait_until};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn run_without_args_or_preset_fails_immediately() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = GitJob::with_executable("sh", dir.path());
    let err = job.run(None, false).expect_err("no arguments available");
    assert!(matches!(err, GitqueueError::MissingArgs));

    // Signalled before any launch: nothing changed on the job.
    assert_eq!(job.state(), JobState::Idle);
    assert_eq!(job.stdout(), None);
    Ok(())
}

#[tokio::test]
async fn launch_failure_is_surfaced_and_leaves_job_not_running() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = GitJob::with_executable("/definitely/not/a/real/binary", dir.path());
    let err = job
        .run(Some(vec!["--version".to_string()]), false)
        .expect_err("spawn must fail");
    assert!(matches!(err, GitqueueError::Launch { .. }));
    assert!(!job.is_running());
    assert_eq!(job.stdout(), None);
    Ok(())
}

#[tokio::test]
async fn run_while_running_is_rejected() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "sleep 2");
    job.run(None, false)?;
    assert!(job.is_running());

    let err = job.run(None, false).expect_err("already running");
    assert!(matches!(err, GitqueueError::AlreadyRunning));

    job.kill();
    wait_until(|| !job.is_running()).await;
    Ok(())
}

#[tokio::test]
async fn kill_is_safe_when_idle_and_idempotent_when_running() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "sleep 2");
    // Idle: no-op.
    job.kill();
    assert_eq!(job.state(), JobState::Idle);

    job.run(None, false)?;
    job.kill();
    job.kill();
    job.kill();

    wait_until(|| !job.is_running()).await;
    assert_eq!(job.state(), JobState::Completed);
    Ok(())
}
