//! Conversion entry points.
//!
//! [`convert`] is the whole job: read the fragment, wrap it, render it,
//! write `<basename>.pdf`. It resolves only after the PDF is on disk (or a
//! stage failed), so callers can sequence anything after it without racing
//! the engine. [`convert_with`] does the same with a caller-supplied
//! [`Renderer`]; [`build_document`] stops before rendering.

use crate::config::ConversionConfig;
use crate::error::Help2PdfError;
use crate::output::ConversionReport;
use crate::pipeline::document::{self, DocumentShell};
use crate::pipeline::render::{self, ChromeRenderer, RenderOptions, Renderer};
use crate::pipeline::{input, write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Convert the configured fragment to PDF with headless Chromium.
///
/// # Errors
/// Returns `Err(Help2PdfError)` if any stage fails:
/// - fragment missing, unreadable, or already a full document
/// - no browser found, browser failed, timeout, non-PDF output
/// - output directory not writable
pub async fn convert(config: &ConversionConfig) -> Result<ConversionReport, Help2PdfError> {
    let renderer = ChromeRenderer::from_config(config);
    convert_with(&renderer, config).await
}

/// Convert using an explicit rendering engine.
pub async fn convert_with<R: Renderer + ?Sized>(
    renderer: &R,
    config: &ConversionConfig,
) -> Result<ConversionReport, Help2PdfError> {
    let result = run(renderer, config).await;

    if let Some(ref cb) = config.progress_callback {
        match &result {
            Ok(report) => cb.on_conversion_complete(report),
            Err(e) => cb.on_conversion_error(e),
        }
    }
    result
}

/// How long a finished runtime waits for blocking DevTools calls to notice
/// their browser is gone.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally and shuts it down with
/// [`SHUTDOWN_GRACE`], so a timed-out render cannot hold the caller.
pub fn convert_sync(config: &ConversionConfig) -> Result<ConversionReport, Help2PdfError> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Help2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?;
    let result = rt.block_on(convert(config));
    rt.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

/// Read and wrap the fragment without rendering it.
///
/// Does not need a browser.
pub async fn build_document(config: &ConversionConfig) -> Result<String, Help2PdfError> {
    let fragment_path = config.fragment_path();
    let fragment = input::read_fragment(&fragment_path).await?;
    let base_uri = input::resolve_base_uri(config.base_dir()).await?;
    wrap(&fragment_path, &fragment, &base_uri, config)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run<R: Renderer + ?Sized>(
    renderer: &R,
    config: &ConversionConfig,
) -> Result<ConversionReport, Help2PdfError> {
    let total_start = Instant::now();
    let fragment_path = config.fragment_path();
    info!("Starting conversion: {}", fragment_path.display());

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(&fragment_path);
    }

    // ── Step 1: Read fragment ────────────────────────────────────────────
    let fragment = input::read_fragment(&fragment_path).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_fragment_read(fragment.len());
    }

    // ── Step 2: Wrap ─────────────────────────────────────────────────────
    let base_uri = input::resolve_base_uri(config.base_dir()).await?;
    debug!("Base URI: {}", base_uri);
    let html = wrap(&fragment_path, &fragment, &base_uri, config)?;

    // ── Step 3: Render ───────────────────────────────────────────────────
    let options = RenderOptions::from_config(config, base_uri);
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_start(html.len());
    }
    let render_start = Instant::now();
    let pdf = renderer.render(&html, &options).await?;
    render::check_pdf_magic(&pdf)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!("Rendered {} bytes in {}ms", pdf.len(), render_duration_ms);
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(pdf.len());
    }

    // ── Step 4: Write ────────────────────────────────────────────────────
    let name = write::output_file_name(&config.fragment);
    let output = write::write_pdf(&config.output_dir, &name, &pdf).await?;

    let report = ConversionReport {
        fragment: fragment_path,
        output,
        base_uri: options.base_uri,
        html_bytes: html.len(),
        pdf_bytes: pdf.len(),
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} ({}ms total)",
        report.output.display(),
        report.total_duration_ms
    );
    Ok(report)
}

fn wrap(
    fragment_path: &Path,
    fragment: &str,
    base_uri: &str,
    config: &ConversionConfig,
) -> Result<String, Help2PdfError> {
    if let Some(found) = document::find_document_markup(fragment) {
        return Err(Help2PdfError::NotAFragment {
            path: fragment_path.to_path_buf(),
            found,
        });
    }
    Ok(document::wrap_fragment(
        fragment,
        &DocumentShell {
            title: &config.title,
            base_uri,
            stylesheets: &config.stylesheets,
        },
    ))
}
