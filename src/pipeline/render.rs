//! PDF rendering: hand the wrapped document to a headless browser.
//!
//! ## Who owns the browser?
//!
//! The browser is started here as a `tokio::process::Child` with
//! `kill_on_drop`, and `headless_chrome` only connects to the DevTools
//! endpoint it announces. The whole render (launch, load, print) runs under
//! one `tokio::time::timeout`; when it fires the render future is dropped,
//! the child is killed, and the blocking DevTools calls fail as soon as the
//! socket closes. Nothing keeps running after `RenderTimeout` is returned.
//!
//! ## Why spawn_blocking?
//!
//! `headless_chrome` drives the browser over a synchronous DevTools
//! connection; every call blocks the calling thread until Chromium answers.
//! `tokio::task::spawn_blocking` keeps that off the async worker threads.
//!
//! ## Why a temp file instead of a data: URL?
//!
//! Chromium refuses to load `file://` subresources from a `data:` page. The
//! document is written to a managed temp file and opened by its `file://`
//! URL; the `<base>` element inside points the stylesheet and image hrefs
//! back at the resource root.

use crate::config::{ConversionConfig, Length};
use crate::error::Help2PdfError;
use futures::future::BoxFuture;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::Browser;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};
use url::Url;

/// Flags for a throwaway headless session; the profile dir and sandbox
/// switch are added per launch.
const CHROME_ARGS: &[&str] = &[
    "--headless",
    "--remote-debugging-port=0",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-sync",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Lines of browser stderr kept for launch failure messages.
const STDERR_TAIL: usize = 5;

static RE_DEVTOOLS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DevTools listening on (ws://\S+)").expect("valid regex"));

/// Layout and resolution settings for one render.
#[derive(Debug, Clone, Serialize)]
pub struct RenderOptions {
    pub page_width: Length,
    pub page_height: Length,
    /// Applied to all four sides; None means no margin.
    pub margin: Option<Length>,
    /// `file://` URI (trailing slash) relative hrefs resolve against.
    pub base_uri: String,
    pub print_background: bool,
    pub timeout_secs: u64,
}

impl RenderOptions {
    pub fn from_config(config: &ConversionConfig, base_uri: String) -> Self {
        Self {
            page_width: config.page_width,
            page_height: config.page_height,
            margin: config.margin,
            base_uri,
            print_background: config.print_background,
            timeout_secs: config.render_timeout_secs,
        }
    }
}

/// An HTML-to-PDF engine.
///
/// Implementations return the complete PDF as bytes; writing it anywhere is
/// the caller's job.
pub trait Renderer: Send + Sync {
    fn render<'a>(
        &'a self,
        html: &'a str,
        options: &'a RenderOptions,
    ) -> BoxFuture<'a, Result<Vec<u8>, Help2PdfError>>;
}

/// Renders through a headless Chromium-family browser.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    executable: Option<PathBuf>,
    sandbox: bool,
}

impl Default for ChromeRenderer {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
        }
    }
}

impl ChromeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            executable: config.chrome_path.clone(),
            sandbox: config.sandbox,
        }
    }

    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.sandbox = v;
        self
    }

    /// Launch, load and print. Dropping this future kills the browser.
    async fn render_page(
        &self,
        html: &str,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, Help2PdfError> {
        let executable = chrome_locate::locate_chrome(self.executable.as_deref())?;
        debug!("Using browser {}", executable.display());

        let page = write_page(html)?;
        let page_url = Url::from_file_path(page.path()).map_err(|_| {
            Help2PdfError::Internal(format!(
                "cannot express '{}' as a file URI",
                page.path().display()
            ))
        })?;

        let browser = BrowserProcess::launch(&executable, self.sandbox).await?;
        debug!("DevTools endpoint {}", browser.ws_url);

        let ws_url = browser.ws_url.clone();
        let print = options.clone();
        let pdf = tokio::task::spawn_blocking(move || print_blocking(ws_url, &page_url, &print))
            .await
            .map_err(|e| Help2PdfError::Internal(format!("Render task panicked: {}", e)))??;
        check_pdf_magic(&pdf)?;

        drop(browser);
        info!(
            "Rendered {}×{} page → {} bytes",
            options.page_width,
            options.page_height,
            pdf.len()
        );
        Ok(pdf)
    }
}

impl Renderer for ChromeRenderer {
    fn render<'a>(
        &'a self,
        html: &'a str,
        options: &'a RenderOptions,
    ) -> BoxFuture<'a, Result<Vec<u8>, Help2PdfError>> {
        Box::pin(async move {
            let secs = options.timeout_secs;
            match tokio::time::timeout(Duration::from_secs(secs), self.render_page(html, options))
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    warn!("Render exceeded {}s; browser killed", secs);
                    Err(Help2PdfError::RenderTimeout { secs })
                }
            }
        })
    }
}

/// A browser started for one render.
///
/// Fields drop in order: the child is killed before its profile directory
/// is removed.
struct BrowserProcess {
    _child: Child,
    ws_url: String,
    _profile: tempfile::TempDir,
}

impl BrowserProcess {
    /// Start the browser and wait for it to announce its DevTools endpoint.
    async fn launch(executable: &Path, sandbox: bool) -> Result<Self, Help2PdfError> {
        let launch_failed = |reason: String| Help2PdfError::BrowserLaunchFailed {
            path: executable.to_path_buf(),
            reason,
        };

        let profile = tempfile::Builder::new()
            .prefix("help2pdf-profile-")
            .tempdir()
            .map_err(|e| Help2PdfError::Internal(format!("tempdir: {e}")))?;

        let mut cmd = Command::new(executable);
        cmd.args(CHROME_ARGS)
            .arg(format!("--user-data-dir={}", profile.path().display()));
        if !sandbox {
            cmd.arg("--no-sandbox");
        }
        cmd.arg("about:blank")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| launch_failed(e.to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| launch_failed("stderr was not captured".into()))?;

        let mut lines = BufReader::new(stderr).lines();
        let mut tail: Vec<String> = Vec::new();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| launch_failed(e.to_string()))?
        {
            if let Some(caps) = RE_DEVTOOLS_URL.captures(&line) {
                let ws_url = caps[1].to_string();
                // Keep draining so the browser never blocks on a full pipe.
                tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });
                return Ok(Self {
                    _child: child,
                    ws_url,
                    _profile: profile,
                });
            }
            if tail.len() == STDERR_TAIL {
                tail.remove(0);
            }
            tail.push(line);
        }

        let status = match child.wait().await {
            Ok(status) => status.to_string(),
            Err(e) => e.to_string(),
        };
        let reason = if tail.is_empty() {
            format!("browser exited ({status}) without opening a DevTools endpoint")
        } else {
            format!(
                "browser exited ({status}) without opening a DevTools endpoint: {}",
                tail.join(" | ")
            )
        };
        Err(launch_failed(reason))
    }
}

fn write_page(html: &str) -> Result<tempfile::NamedTempFile, Help2PdfError> {
    let mut page = tempfile::Builder::new()
        .prefix("help2pdf-")
        .suffix(".html")
        .tempfile()
        .map_err(|e| Help2PdfError::Internal(format!("tempfile: {e}")))?;
    page.write_all(html.as_bytes())
        .and_then(|_| page.flush())
        .map_err(|e| Help2PdfError::Internal(format!("tempfile write: {e}")))?;
    Ok(page)
}

/// Blocking DevTools round-trip against an already running browser.
fn print_blocking(
    ws_url: String,
    page_url: &Url,
    options: &RenderOptions,
) -> Result<Vec<u8>, Help2PdfError> {
    let timeout = Duration::from_secs(options.timeout_secs);
    let browser = Browser::connect_with_timeout(ws_url, timeout).map_err(render_failed)?;

    let tab = browser.new_tab().map_err(render_failed)?;
    tab.set_default_timeout(timeout);
    tab.navigate_to(page_url.as_str()).map_err(render_failed)?;
    tab.wait_until_navigated().map_err(render_failed)?;

    tab.print_to_pdf(Some(print_options(options)))
        .map_err(render_failed)
}

/// DevTools print settings. The configured size always wins over any
/// `@page` rule in the stylesheets.
pub fn print_options(options: &RenderOptions) -> PrintToPdfOptions {
    let margin = options.margin.map_or(0.0, |m| m.to_inches());
    PrintToPdfOptions {
        print_background: Some(options.print_background),
        paper_width: Some(options.page_width.to_inches()),
        paper_height: Some(options.page_height.to_inches()),
        margin_top: Some(margin),
        margin_bottom: Some(margin),
        margin_left: Some(margin),
        margin_right: Some(margin),
        prefer_css_page_size: Some(false),
        ..Default::default()
    }
}

/// Reject engine output that is not a PDF.
pub fn check_pdf_magic(bytes: &[u8]) -> Result<(), Help2PdfError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(Help2PdfError::NotAPdf {
            magic: bytes.iter().take(8).copied().collect(),
        })
    }
}

fn render_failed(e: impl std::fmt::Display) -> Help2PdfError {
    Help2PdfError::RenderFailed(format!("{e:#}"))
}
