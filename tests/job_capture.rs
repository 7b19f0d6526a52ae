#![cfg(unix)]

use std::error::Error;

use gitqueue::job::{JobEvent, JobState, Output};
use gitqueue_test_utils::builders::JobBuilder;
use gitqueue_test_utils::{init_tracing, wait_until, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn run_blocking_captures_text_lines() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "echo a; echo b; echo oops >&2");
    let (stdout, stderr) = job.run_blocking(None, false).await?;

    assert_eq!(stdout, Output::Text(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(stderr, Output::Text(vec!["oops".to_string()]));
    // Results stay retrievable through the accessors afterwards.
    assert_eq!(job.stdout(), Some(stdout));
    assert_eq!(job.stderr(), Some(stderr));
    assert_eq!(job.exit_code(), Some(0));
    Ok(())
}

#[tokio::test]
async fn missing_trailing_newline_is_preserved() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "printf 'a\\nb'");
    let (stdout, _stderr) = job.run_blocking(None, false).await?;

    assert_eq!(stdout, Output::Text(vec!["a".to_string(), "b".to_string()]));
    Ok(())
}

#[tokio::test]
async fn binary_mode_round_trips_raw_bytes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::new(dir.path())
        .executable("sh")
        .binary_preset(vec!["-c".to_string(), "printf 'a\\0b'".to_string()])
        .build();
    let (stdout, _stderr) = job.run_blocking(None, false).await?;

    assert_eq!(stdout, Output::Binary(vec![b'a', 0, b'b']));
    Ok(())
}

#[tokio::test]
async fn output_sentinel_is_distinct_from_empty_capture() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "true");

    // Strictly before completion: not available.
    assert_eq!(job.stdout(), None);
    assert_eq!(job.stderr(), None);
    assert_eq!(job.exit_code(), None);
    assert_eq!(job.state(), JobState::Idle);

    let (stdout, stderr) = job.run_blocking(None, false).await?;

    // Strictly after completion: captured, empty but valid.
    assert_eq!(stdout, Output::Text(vec![]));
    assert_eq!(stderr, Output::Text(vec![]));
    assert_eq!(job.stdout(), Some(Output::Text(vec![])));
    assert_eq!(job.state(), JobState::Completed);
    Ok(())
}

#[tokio::test]
async fn rerunning_a_completed_job_resets_its_output() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "echo one");
    let (stdout, _stderr) = job.run_blocking(None, false).await?;
    assert_eq!(stdout, Output::Text(vec!["one".to_string()]));

    // Re-invoke with explicit arguments; slow enough that the reset is
    // observable before the new invocation completes.
    job.run(
        Some(vec!["-c".to_string(), "sleep 0.3; echo two".to_string()]),
        false,
    )?;
    assert_eq!(job.state(), JobState::Running);
    assert_eq!(job.stdout(), None);
    assert_eq!(job.stderr(), None);
    assert_eq!(job.exit_code(), None);

    wait_until(|| !job.is_running()).await;
    assert_eq!(
        job.stdout(),
        Some(Output::Text(vec!["two".to_string()]))
    );
    Ok(())
}

#[tokio::test]
async fn nonzero_exit_code_is_recorded_with_stderr_diagnostics() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "echo bad >&2; exit 3");
    let (stdout, stderr) = job.run_blocking(None, false).await?;

    assert_eq!(job.exit_code(), Some(3));
    assert_eq!(stdout, Output::Text(vec![]));
    assert_eq!(stderr, Output::Text(vec!["bad".to_string()]));
    Ok(())
}

#[tokio::test]
async fn killed_job_still_routes_through_completion() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "sleep 5");
    let mut events = job.subscribe();
    job.run(None, false)?;
    assert!(job.is_running());

    job.kill();

    let exit_code = with_timeout(async {
        loop {
            match events.recv().await {
                Ok(JobEvent::Finished { exit_code }) => break exit_code,
                Ok(_) => {}
                Err(err) => panic!("event channel closed early: {err}"),
            }
        }
    })
    .await;

    // SIGKILL means no regular exit code.
    assert_eq!(exit_code, -1);
    assert_eq!(job.state(), JobState::Completed);
    assert_eq!(job.stdout(), Some(Output::Text(vec![])));
    Ok(())
}

#[tokio::test]
async fn started_notification_is_emitted_on_launch() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let job = JobBuilder::sh(dir.path(), "echo ready");
    let mut events = job.subscribe();
    job.run(None, false)?;

    let started = with_timeout(async {
        loop {
            match events.recv().await {
                Ok(JobEvent::Started) => break true,
                Ok(JobEvent::Finished { .. }) => break false,
                Ok(_) => {}
                Err(err) => panic!("event channel closed early: {err}"),
            }
        }
    })
    .await;

    assert!(started, "Started must precede Finished");
    wait_until(|| !job.is_running()).await;
    Ok(())
}
