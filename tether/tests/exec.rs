//! Process runner tests. These spawn real `sh` processes.

use std::time::Duration;
use tether::{ForwardOutcome, ProcessRunner, ProcessSpec, Streamer, StreamerError, TetherError};
use tether_test_utils::{eventually, within};

const WAIT: Duration = Duration::from_secs(10);

fn shell(script: &str) -> ProcessSpec {
    ProcessSpec::new("sh").arg("-c").arg(script)
}

#[tokio::test]
async fn output_is_forwarded_and_stream_stopped_on_exit() {
    let runner = ProcessRunner::new(Streamer::new(Duration::from_secs(5)), 4);
    let spawned = runner.spawn(&shell("printf hello; printf oops >&2")).await.unwrap();

    let mut stdout = Vec::new();
    let outcome = within(
        WAIT,
        runner.streamer().stream_stdout(spawned.stream_id, Some(&mut stdout)),
    )
    .await;
    assert!(matches!(
        outcome,
        ForwardOutcome::Drained { .. } | ForwardOutcome::ProducerClosed
    ));
    assert_eq!(stdout, b"hello");

    let mut stderr = Vec::new();
    within(
        WAIT,
        runner.streamer().stream_stderr(spawned.stream_id, Some(&mut stderr)),
    )
    .await;
    assert_eq!(stderr, b"oops");

    let streamer = runner.streamer().clone();
    assert!(eventually(WAIT, || streamer.is_stopped(spawned.stream_id)).await);
}

#[tokio::test]
async fn large_output_survives_a_small_channel() {
    let runner = ProcessRunner::new(Streamer::new(Duration::from_secs(5)), 1);
    let spawned = runner
        .spawn(&shell("head -c 200000 /dev/zero"))
        .await
        .unwrap();

    let mut stdout = Vec::new();
    within(
        WAIT,
        runner.streamer().stream_stdout(spawned.stream_id, Some(&mut stdout)),
    )
    .await;

    assert_eq!(stdout.len(), 200_000);
    assert!(stdout.iter().all(|b| *b == 0));
}

#[tokio::test]
async fn environment_and_working_directory_are_applied() {
    let dir = tempfile::tempdir().unwrap();
    let mut spec = shell("printf \"$GREETING\"; pwd");
    spec.env.insert("GREETING".to_string(), "hi ".to_string());
    spec.dir = Some(dir.path().to_path_buf());

    let runner = ProcessRunner::new(Streamer::new(Duration::from_secs(5)), 4);
    let spawned = runner.spawn(&spec).await.unwrap();

    let mut stdout = Vec::new();
    within(
        WAIT,
        runner.streamer().stream_stdout(spawned.stream_id, Some(&mut stdout)),
    )
    .await;

    let text = String::from_utf8(stdout).unwrap();
    let expected_dir = dir.path().canonicalize().unwrap();
    assert!(text.starts_with("hi "), "{text}");
    assert!(
        text.trim_end().ends_with(expected_dir.to_str().unwrap()),
        "{text}"
    );
}

#[tokio::test]
async fn stream_is_removed_after_grace_time() {
    let runner = ProcessRunner::new(Streamer::new(Duration::from_millis(50)), 4);
    let spawned = runner.spawn(&shell("true")).await.unwrap();

    let streamer = runner.streamer().clone();
    assert!(eventually(WAIT, || !streamer.contains(spawned.stream_id)).await);
    assert_eq!(
        streamer.stop(spawned.stream_id),
        Err(StreamerError::UnknownStream(spawned.stream_id))
    );
}

#[tokio::test]
async fn full_registry_refuses_new_processes() {
    let streamer = Streamer::with_limit(Duration::from_secs(5), 1).unwrap();
    let runner = ProcessRunner::new(streamer, 4);

    let first = runner.spawn(&shell("sleep 1")).await.unwrap();
    let err = runner.spawn(&shell("printf never")).await.unwrap_err();

    assert!(matches!(err, TetherError::ResourceExhausted(_)), "{err}");
    assert_eq!(runner.streamer().len(), 1);
    assert!(runner.streamer().contains(first.stream_id));
}
