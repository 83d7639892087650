//! # help2pdf
//!
//! Render an HTML help-topic fragment to a standalone PDF with headless
//! Chromium.
//!
//! Help topics are stored as body fragments and styled by the application's
//! stylesheets. This crate wraps one fragment in a complete document that
//! links those stylesheets, points a `<base>` element at the resource root,
//! prints it to a tall single page, and writes `<basename>.pdf`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! fragment
//!  │
//!  ├─ 1. Input     read <root>/<resource_dir>/<fragment> as UTF-8
//!  ├─ 2. Document  doctype + head (title, <base>, stylesheets) + body
//!  ├─ 3. Render    headless Chromium print-to-PDF (spawn_blocking)
//!  └─ 4. Write     <basename>.pdf, temp file + rename
//! ```
//!
//! No stage touches the process working directory; the base directory is
//! passed to the engine as an absolute `file://` URI.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use help2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .root_dir("/src/InterSpec")
//!         .fragment("energy_calibration_help.xml")
//!         .build()?;
//!     let report = convert(&config).await?;
//!     eprintln!("wrote {} ({} bytes)", report.output.display(), report.pdf_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `help2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, Length, LengthUnit};
pub use convert::{build_document, convert, convert_sync, convert_with};
pub use error::Help2PdfError;
pub use output::ConversionReport;
pub use pipeline::document::{wrap_fragment, DocumentShell};
pub use pipeline::render::{ChromeRenderer, RenderOptions, Renderer};
pub use pipeline::write::output_file_name;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
