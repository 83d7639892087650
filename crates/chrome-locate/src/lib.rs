//! # chrome-locate
//!
//! Find a Chromium-family browser executable so that a headless DevTools
//! session can be launched without the user knowing where their browser is
//! installed.
//!
//! ## Resolution order
//!
//! 1. An explicit path passed by the caller (must exist).
//! 2. The `HELP2PDF_CHROME` environment variable (must exist when set).
//! 3. `headless_chrome`'s own discovery: the `CHROME` variable, a `PATH`
//!    search and the usual per-platform install locations.
//!
//! Automatic (non-explicit) lookups are cached for the lifetime of the
//! process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrome_locate::locate_chrome;
//!
//! let chrome = locate_chrome(None).expect("no Chromium-family browser found");
//! println!("using {}", chrome.display());
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

/// Environment variable consulted before falling back to system discovery.
pub const ENV_OVERRIDE: &str = "HELP2PDF_CHROME";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by chrome-locate.
#[derive(Error, Debug)]
pub enum ChromeLocateError {
    /// The caller named a path that does not exist.
    #[error("Browser executable '{path}' does not exist")]
    ExplicitPathMissing { path: PathBuf },

    /// `HELP2PDF_CHROME` points at nothing.
    #[error("{var} is set to '{path}', which does not exist")]
    EnvPathMissing { var: &'static str, path: PathBuf },

    /// System discovery came up empty.
    #[error(
        "No Chromium-family browser found: {reason}\n\
Install Google Chrome or Chromium, or set HELP2PDF_CHROME=/path/to/chrome."
    )]
    NotFound { reason: String },
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Locate a browser executable.
///
/// `explicit` short-circuits every other source; a missing explicit path is
/// an error rather than a fall-through.
pub fn locate_chrome(explicit: Option<&Path>) -> Result<PathBuf, ChromeLocateError> {
    if explicit.is_none() {
        if let Some(path) = RESOLVED_PATH.get() {
            return Ok(path.clone());
        }
    }

    let path = locate_in(
        explicit,
        &|key| std::env::var_os(key),
        &headless_chrome::browser::default_executable,
    )?;

    if explicit.is_none() {
        let _ = RESOLVED_PATH.set(path.clone());
    }
    Ok(path)
}

/// Resolution with injected environment and system discovery.
pub fn locate_in(
    explicit: Option<&Path>,
    env: &dyn Fn(&str) -> Option<OsString>,
    discover: &dyn Fn() -> Result<PathBuf, String>,
) -> Result<PathBuf, ChromeLocateError> {
    if let Some(p) = explicit {
        return if p.is_file() {
            Ok(p.to_path_buf())
        } else {
            Err(ChromeLocateError::ExplicitPathMissing {
                path: p.to_path_buf(),
            })
        };
    }

    if let Some(value) = env(ENV_OVERRIDE).filter(|v| !v.is_empty()) {
        let p = PathBuf::from(value);
        return if p.is_file() {
            Ok(p)
        } else {
            Err(ChromeLocateError::EnvPathMissing {
                var: ENV_OVERRIDE,
                path: p,
            })
        };
    }

    discover().map_err(|reason| ChromeLocateError::NotFound { reason })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_browser(dir: &Path) -> PathBuf {
        let p = dir.join("my-chrome");
        std::fs::write(&p, b"#!/bin/sh\n").unwrap();
        p
    }

    fn no_env(_: &str) -> Option<OsString> {
        None
    }

    fn system_chromium() -> Result<PathBuf, String> {
        Ok(PathBuf::from("/usr/bin/chromium"))
    }

    fn nothing_installed() -> Result<PathBuf, String> {
        Err("Could not auto detect a chrome executable".into())
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let chrome = fake_browser(dir.path());
        let env = |_: &str| Some(OsString::from("/elsewhere/chrome"));
        let found = locate_in(Some(&chrome), &env, &nothing_installed).unwrap();
        assert_eq!(found, chrome);
    }

    #[test]
    fn explicit_path_missing_is_an_error() {
        let err = locate_in(Some(Path::new("/definitely/not/chrome")), &no_env, &system_chromium)
            .unwrap_err();
        assert!(matches!(err, ChromeLocateError::ExplicitPathMissing { .. }));
    }

    #[test]
    fn env_override_before_system_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let chrome = fake_browser(dir.path());
        let value = chrome.clone().into_os_string();
        let env = move |k: &str| (k == ENV_OVERRIDE).then(|| value.clone());

        assert_eq!(locate_in(None, &env, &system_chromium).unwrap(), chrome);
    }

    #[test]
    fn stale_env_override_is_reported() {
        let env = |k: &str| (k == ENV_OVERRIDE).then(|| OsString::from("/nope/chrome"));
        match locate_in(None, &env, &system_chromium).unwrap_err() {
            ChromeLocateError::EnvPathMissing { var, path } => {
                assert_eq!(var, "HELP2PDF_CHROME");
                assert_eq!(path, PathBuf::from("/nope/chrome"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_env_override_is_ignored() {
        let env = |k: &str| (k == ENV_OVERRIDE).then(OsString::new);
        assert_eq!(
            locate_in(None, &env, &system_chromium).unwrap(),
            PathBuf::from("/usr/bin/chromium")
        );
    }

    #[test]
    fn discovery_failure_keeps_its_reason() {
        let err = locate_in(None, &no_env, &nothing_installed).unwrap_err();
        assert!(matches!(err, ChromeLocateError::NotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("Could not auto detect"), "{msg}");
        assert!(msg.contains("HELP2PDF_CHROME"), "{msg}");
    }
}
