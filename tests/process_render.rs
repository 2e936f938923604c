//! End-to-end previews through a real rasterizer subprocess
#![cfg(unix)]

mod common;

use common::{wait_for, RecordingHost};
use std::path::PathBuf;
use uipreview::host::FilePanelHost;
use uipreview::{DisplayState, PreviewConfig, RasterizerCommand};

/// Config whose rasterizer is a shell snippet; the file path arrives as `$1`.
fn shell_config(script: &str) -> PreviewConfig {
    PreviewConfig {
        rasterizer: RasterizerCommand {
            program: "sh".into(),
            args: vec!["-c".into(), script.into(), "sh".into()],
        },
        timeout_ms: 5_000,
        ..Default::default()
    }
}

#[tokio::test]
async fn successful_rasterizer_renders_image() {
    let host = RecordingHost::default();
    let handle = uipreview::start(shell_config("printf 'aGVsbG8=\\n'"), host.clone()).unwrap();

    handle.preview(Some("/a/widget.ui".into()), None).await.unwrap();
    wait_for(&handle, |s| s.display_state == Some(DisplayState::Rendered("aGVsbG8=".into()))).await;
    assert!(host.last_html().unwrap().contains("base64,aGVsbG8="));
}

#[tokio::test]
async fn failing_rasterizer_shows_stderr() {
    let host = RecordingHost::default();
    let config = shell_config("printf 'parse error on line 4' >&2; exit 1");
    let handle = uipreview::start(config, host.clone()).unwrap();

    handle.preview(Some("/a/widget.ui".into()), None).await.unwrap();
    wait_for(&handle, |s| {
        s.display_state == Some(DisplayState::Errored("parse error on line 4".into()))
    })
    .await;
}

#[tokio::test]
async fn missing_rasterizer_is_reported_and_session_survives() {
    let host = RecordingHost::default();
    let mut config = PreviewConfig::default();
    config.rasterizer.program = "/nonexistent/uipreview-rasterizer".into();
    let handle = uipreview::start(config, host.clone()).unwrap();

    handle.preview(Some("/a/widget.ui".into()), None).await.unwrap();
    let snap = wait_for(&handle, |s| matches!(s.display_state, Some(DisplayState::Errored(_)))).await;
    match snap.display_state {
        Some(DisplayState::Errored(msg)) => assert!(msg.contains("Failed to launch rasterizer")),
        other => panic!("unexpected state {:?}", other),
    }

    // Still usable: a later request goes through the same panel.
    handle.preview(Some("/a/other.ui".into()), None).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.generation, 2);
    assert_eq!(host.created(), 1);
}

#[tokio::test]
async fn slow_stale_render_does_not_overwrite_newer_one() {
    let dir = tempfile::tempdir().unwrap();
    let slow = dir.path().join("slow.ui");
    let fast = dir.path().join("fast.ui");
    std::fs::write(&slow, "").unwrap();
    std::fs::write(&fast, "").unwrap();

    // Files named slow.* take a while and print their own name.
    let script = "case \"$1\" in *slow.ui) sleep 0.3;; esac; basename \"$1\"";
    let host = RecordingHost::default();
    let handle = uipreview::start(shell_config(script), host.clone()).unwrap();

    handle.preview(Some(slow.clone()), None).await.unwrap();
    handle.preview(Some(fast.clone()), None).await.unwrap();

    wait_for(&handle, |s| s.display_state == Some(DisplayState::Rendered("fast.ui".into()))).await;
    let snap = wait_for(&handle, |s| s.stale_discards == 1).await;
    assert_eq!(snap.display_state, Some(DisplayState::Rendered("fast.ui".into())));
    assert_eq!(snap.active_file_path, Some(fast));
}

#[tokio::test]
async fn file_host_mirrors_preview_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("preview.html");
    let handle = uipreview::start(shell_config("printf 'aGVsbG8='"), FilePanelHost::new(&out)).unwrap();

    let file: PathBuf = dir.path().join("widget.ui");
    handle.preview(Some(file.clone()), None).await.unwrap();
    wait_for(&handle, |s| matches!(s.display_state, Some(DisplayState::Rendered(_)))).await;

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("data:image/png;base64,aGVsbG8="));

    handle.file_saved(file).unwrap();
    wait_for(&handle, |s| s.generation == 2 && matches!(s.display_state, Some(DisplayState::Rendered(_)))).await;
    handle.shutdown().await.unwrap();
}
