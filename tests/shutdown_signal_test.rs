#![cfg(unix)]

use coinsnap::interfaces::signals::{ShutdownReason, shutdown_signal};
use std::process::Command;
use std::time::Duration;

#[tokio::test]
async fn test_sigterm_triggers_shutdown() {
    let shutdown = shutdown_signal().unwrap();

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let reason = tokio::time::timeout(Duration::from_secs(5), shutdown)
        .await
        .expect("SIGTERM was not observed");
    assert_eq!(reason, ShutdownReason::Terminate);
}
