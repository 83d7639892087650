//! `ChromeRenderer` failure paths, driven by fake browser executables.
//!
//! The fakes are shell scripts, so nothing here needs a real browser. Tests
//! are serialised: writing a script while another test forks can make the
//! exec fail with "text file busy".

#![cfg(unix)]

use help2pdf::{convert_sync, ConversionConfig, Help2PdfError};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

fn fake_browser(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A resource tree with the default fragment; returns (root, output dir).
fn resource_tree() -> (TempDir, PathBuf) {
    let root = tempfile::tempdir().unwrap();
    let static_text = root.path().join("InterSpec_resources/static_text");
    std::fs::create_dir_all(&static_text).unwrap();
    std::fs::write(
        static_text.join("peak_manager_help.xml"),
        "<p>Peak manager</p>",
    )
    .unwrap();
    let out = root.path().join("out");
    (root, out)
}

fn config(root: &Path, out: &Path, chrome: &Path, timeout_secs: u64) -> ConversionConfig {
    ConversionConfig::builder()
        .root_dir(root)
        .output_dir(out)
        .chrome_path(chrome)
        .render_timeout_secs(timeout_secs)
        .build()
        .unwrap()
}

/// True once the process is gone or only a zombie is left.
#[cfg(target_os = "linux")]
fn process_is_dead(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit(')')
            .next()
            .map(|rest| rest.trim_start().starts_with('Z'))
            .unwrap_or(false),
    }
}

// ── Engine discovery ─────────────────────────────────────────────────────────

#[test]
fn missing_browser_path_is_engine_not_found() {
    let _serial = serial();
    let (root, out) = resource_tree();
    let chrome = root.path().join("no-such-chrome");

    let err = convert_sync(&config(root.path(), &out, &chrome, 5)).unwrap_err();

    match err {
        Help2PdfError::EngineNotFound(chrome_locate::ChromeLocateError::ExplicitPathMissing {
            path,
        }) => assert_eq!(path, chrome),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!out.join("peak_manager_help.pdf").exists());
}

// ── Launch ───────────────────────────────────────────────────────────────────

#[test]
fn browser_that_exits_is_a_launch_failure() {
    let _serial = serial();
    let (root, out) = resource_tree();
    let chrome = fake_browser(
        root.path(),
        "broken-chrome",
        "echo 'Missing X server or $DISPLAY' >&2\nexit 1",
    );

    let started = Instant::now();
    let err = convert_sync(&config(root.path(), &out, &chrome, 30)).unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
    match err {
        Help2PdfError::BrowserLaunchFailed { path, reason } => {
            assert_eq!(path, chrome);
            assert!(reason.contains("Missing X server"), "reason: {reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!out.join("peak_manager_help.pdf").exists());
}

#[test]
fn non_executable_browser_is_a_launch_failure() {
    let _serial = serial();
    let (root, out) = resource_tree();
    let chrome = root.path().join("not-a-program");
    std::fs::write(&chrome, "plain text").unwrap();

    let err = convert_sync(&config(root.path(), &out, &chrome, 5)).unwrap_err();
    assert!(
        matches!(err, Help2PdfError::BrowserLaunchFailed { .. }),
        "got {err:?}"
    );
}

// ── Timeout ──────────────────────────────────────────────────────────────────

#[test]
fn hung_browser_times_out_and_returns_promptly() {
    let _serial = serial();
    let (root, out) = resource_tree();
    let pid_file = root.path().join("chrome.pid");
    let chrome = fake_browser(
        root.path(),
        "hung-chrome",
        &format!("echo $$ > '{}'\nexec sleep 30", pid_file.display()),
    );

    let started = Instant::now();
    let err = convert_sync(&config(root.path(), &out, &chrome, 1)).unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, Help2PdfError::RenderTimeout { secs: 1 }), "got {err:?}");
    assert!(elapsed < Duration::from_secs(5), "convert_sync took {elapsed:?}");
    assert!(!out.join("peak_manager_help.pdf").exists());

    #[cfg(target_os = "linux")]
    {
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(3);
        while !process_is_dead(pid) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(process_is_dead(pid), "browser process {pid} outlived the timeout");
    }
}
